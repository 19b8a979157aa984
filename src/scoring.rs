//! Quintile scoring of a numeric series

use std::fmt;

use crate::error::AnalyticsError;

/// Number of equal-population bins
pub const QUINTILES: usize = 5;

/// Ordinal score in 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(u8);

impl Score {
    pub fn new(value: u8) -> Option<Self> {
        (1..=QUINTILES as u8).contains(&value).then_some(Score(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Score {
    type Error = AnalyticsError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Score::new(value)
            .ok_or_else(|| AnalyticsError::InvalidData(format!("score {value} outside 1..=5")))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which end of a metric earns the top score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Smaller values score 5 (recency)
    LowerIsBetter,
    /// Larger values score 5 (frequency, monetary)
    HigherIsBetter,
}

/// Quantile edges at 0, 20, 40, 60, 80 and 100 percent
///
/// Uses linear interpolation between order statistics. `sorted` must be
/// ascending and non-empty.
pub fn quintile_edges(sorted: &[f64]) -> [f64; QUINTILES + 1] {
    let last = sorted.len() - 1;
    let mut edges = [0.0; QUINTILES + 1];
    for (i, edge) in edges.iter_mut().enumerate() {
        let position = last as f64 * i as f64 / QUINTILES as f64;
        let lower = position.floor() as usize;
        let upper = (lower + 1).min(last);
        let fraction = position - lower as f64;
        *edge = sorted[lower] + (sorted[upper] - sorted[lower]) * fraction;
    }
    edges
}

/// Assign every value a score from its quintile
///
/// A value lands in the first bin whose upper edge it does not exceed; the
/// lowest edge belongs to bin 1. Fails on NaN or infinite values, and when
/// equal-population bins cannot be formed (fewer than five distinct values
/// or coinciding edges).
pub fn quintile_scores(
    metric: &str,
    values: &[f64],
    orientation: Orientation,
) -> crate::Result<Vec<Score>> {
    if values.is_empty() {
        return Err(AnalyticsError::InputEmpty { what: "metric" });
    }

    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(AnalyticsError::InvalidData(format!(
            "non-finite {metric} value {bad}"
        )));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut distinct = sorted.clone();
    distinct.dedup();
    let insufficient = || AnalyticsError::InsufficientDistinctValues {
        metric: metric.to_string(),
        distinct: distinct.len(),
    };

    if distinct.len() < QUINTILES {
        return Err(insufficient());
    }

    let edges = quintile_edges(&sorted);
    if edges.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(insufficient());
    }

    let scores = values
        .iter()
        .map(|&value| {
            let bin = edges[1..]
                .iter()
                .position(|&upper| value <= upper)
                .unwrap_or(QUINTILES - 1)
                + 1;
            let label = match orientation {
                Orientation::HigherIsBetter => bin,
                Orientation::LowerIsBetter => QUINTILES + 1 - bin,
            };
            Score(label as u8)
        })
        .collect();

    Ok(scores)
}
