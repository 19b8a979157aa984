//! Rule-based customer segments from RFM scores

use std::fmt;

use crate::scoring::Score;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Champion,
    Loyal,
    Hibernating,
    Potential,
}

impl Segment {
    pub const ALL: [Segment; 4] = [
        Segment::Champion,
        Segment::Loyal,
        Segment::Hibernating,
        Segment::Potential,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Champion => "Champion",
            Segment::Loyal => "Loyal",
            Segment::Hibernating => "Hibernating",
            Segment::Potential => "Potential",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an (R, F, M) score triple to its segment
///
/// Rules are checked top to bottom and the first match wins, so a customer
/// who would also qualify as `Loyal` is still a `Champion`.
pub fn classify(r: Score, f: Score, m: Score) -> Segment {
    let (r, f, m) = (r.get(), f.get(), m.get());
    if r >= 4 && f >= 4 && m >= 4 {
        Segment::Champion
    } else if r >= 3 && f >= 3 {
        Segment::Loyal
    } else if r >= 2 {
        Segment::Hibernating
    } else {
        Segment::Potential
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(value: u8) -> Score {
        Score::new(value).unwrap()
    }

    #[test]
    fn test_decision_table() {
        assert_eq!(classify(s(4), s(4), s(4)), Segment::Champion);
        assert_eq!(classify(s(5), s(5), s(3)), Segment::Loyal);
        assert_eq!(classify(s(3), s(3), s(1)), Segment::Loyal);
        assert_eq!(classify(s(3), s(2), s(5)), Segment::Hibernating);
        assert_eq!(classify(s(2), s(5), s(5)), Segment::Hibernating);
        assert_eq!(classify(s(1), s(5), s(5)), Segment::Potential);
    }

    #[test]
    fn test_exhaustive_properties() {
        for r in 1..=5 {
            for f in 1..=5 {
                for m in 1..=5 {
                    let segment = classify(s(r), s(f), s(m));
                    if segment == Segment::Champion {
                        assert!(r >= 4 && f >= 4 && m >= 4);
                    }
                    if segment == Segment::Loyal {
                        assert!(r >= 3 && f >= 3);
                    }
                    if r >= 4 && f >= 4 && m >= 4 {
                        assert_eq!(segment, Segment::Champion);
                    }
                    if r == 1 {
                        assert_eq!(segment, Segment::Potential);
                    }
                }
            }
        }
    }

    #[test]
    fn test_display() {
        let names: Vec<String> = Segment::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["Champion", "Loyal", "Hibernating", "Potential"]);
    }
}
