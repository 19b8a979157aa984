//! Level-wise frequent itemset mining (Apriori)

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::basket::BasketMatrix;
use crate::error::AnalyticsError;

pub const DEFAULT_MIN_SUPPORT: f64 = 0.03;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AprioriParams {
    /// Minimum fraction of rows an itemset must appear in (inclusive)
    pub min_support: f64,
    /// Largest itemset size to mine, unbounded when `None`
    pub max_len: Option<usize>,
}

impl Default for AprioriParams {
    fn default() -> Self {
        Self {
            min_support: DEFAULT_MIN_SUPPORT,
            max_len: None,
        }
    }
}

/// Itemset as ascending basket column indices
#[derive(Debug, Clone, PartialEq)]
pub struct Itemset {
    pub items: Vec<usize>,
    pub support: f64,
}

impl Itemset {
    /// Number of items, always at least one
    pub fn size(&self) -> usize {
        self.items.len()
    }
}

/// All frequent itemsets, ordered by size then lexicographically
#[derive(Debug, Clone, Default)]
pub struct FrequentItemsets {
    itemsets: Vec<Itemset>,
    index: HashMap<Vec<usize>, usize>,
}

impl FrequentItemsets {
    fn push(&mut self, itemset: Itemset) {
        self.index.insert(itemset.items.clone(), self.itemsets.len());
        self.itemsets.push(itemset);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Itemset> {
        self.itemsets.iter()
    }

    pub fn len(&self) -> usize {
        self.itemsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itemsets.is_empty()
    }

    /// Support of a frequent itemset given as ascending column indices
    pub fn support_of(&self, items: &[usize]) -> Option<f64> {
        self.index.get(items).map(|&i| self.itemsets[i].support)
    }

    /// Largest itemset size found
    pub fn max_len(&self) -> usize {
        self.itemsets.last().map_or(0, Itemset::size)
    }
}

/// Mine every itemset whose support reaches `params.min_support`
///
/// Level k candidates are joined from level k-1 itemsets sharing their first
/// k-2 items, and dropped unless every (k-1)-subset is already frequent.
pub fn mine_frequent_itemsets(
    basket: &BasketMatrix,
    params: &AprioriParams,
) -> crate::Result<FrequentItemsets> {
    if !(params.min_support > 0.0 && params.min_support <= 1.0) {
        return Err(AnalyticsError::Config(format!(
            "minimum support must be in (0, 1], got {}",
            params.min_support
        )));
    }
    if basket.n_rows() == 0 {
        return Err(AnalyticsError::InputEmpty { what: "basket" });
    }

    let max_len = params.max_len.unwrap_or(usize::MAX);
    let mut frequent = FrequentItemsets::default();

    let mut level: Vec<Vec<usize>> = (0..basket.items().len()).map(|c| vec![c]).collect();
    let mut size = 1;
    while !level.is_empty() && size <= max_len {
        let mut survivors = Vec::new();
        for items in level {
            let support = basket.support(&items);
            if support >= params.min_support {
                survivors.push(items.clone());
                frequent.push(Itemset { items, support });
            }
        }
        debug!(size, frequent = survivors.len(), "apriori level");

        level = generate_candidates(&survivors);
        size += 1;
    }

    Ok(frequent)
}

/// Join step plus subset pruning over a lexicographically sorted level
fn generate_candidates(level: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let known: HashSet<&[usize]> = level.iter().map(Vec::as_slice).collect();
    let mut candidates = Vec::new();

    for (i, left) in level.iter().enumerate() {
        let prefix = &left[..left.len() - 1];
        for right in &level[i + 1..] {
            if &right[..right.len() - 1] != prefix {
                break;
            }
            let mut candidate = left.clone();
            candidate.push(right[right.len() - 1]);

            let all_subsets_frequent = (0..candidate.len()).all(|skip| {
                let subset: Vec<usize> = candidate
                    .iter()
                    .enumerate()
                    .filter(|&(pos, _)| pos != skip)
                    .map(|(_, &item)| item)
                    .collect();
                known.contains(subset.as_slice())
            });
            if all_subsets_frequent {
                candidates.push(candidate);
            }
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn matrix(cells: ndarray::Array2<u8>, items: &[&str]) -> BasketMatrix {
        let customers = (1..=cells.nrows() as i64).collect();
        let items = items.iter().map(|s| s.to_string()).collect();
        BasketMatrix::from_cells(customers, items, cells).unwrap()
    }

    #[test]
    fn test_support_is_anti_monotone() {
        // A in all ten rows, A and B together in three
        let mut cells = ndarray::Array2::<u8>::zeros((10, 2));
        for row in 0..10 {
            cells[[row, 0]] = 1;
        }
        for row in 0..3 {
            cells[[row, 1]] = 1;
        }
        let basket = matrix(cells, &["A", "B"]);

        let frequent = mine_frequent_itemsets(&basket, &AprioriParams::default()).unwrap();
        let a = frequent.support_of(&[0]).unwrap();
        let ab = frequent.support_of(&[0, 1]).unwrap();
        assert!((a - 1.0).abs() < 1e-12);
        assert!((ab - 0.3).abs() < 1e-12);
        assert!(ab <= a);
    }

    #[test]
    fn test_levels_and_threshold() {
        let basket = matrix(
            array![
                [1, 1, 0],
                [1, 1, 1],
                [1, 0, 1],
                [0, 1, 0],
                [1, 1, 0],
            ],
            &["A", "B", "C"],
        );
        let params = AprioriParams {
            min_support: 0.4,
            max_len: None,
        };
        let frequent = mine_frequent_itemsets(&basket, &params).unwrap();
        let found: Vec<(Vec<usize>, f64)> = frequent
            .iter()
            .map(|s| (s.items.clone(), s.support))
            .collect();

        let expected = vec![
            (vec![0], 0.8),
            (vec![1], 0.8),
            (vec![2], 0.4),
            (vec![0, 1], 0.6),
            (vec![0, 2], 0.4),
        ];
        assert_eq!(found.len(), expected.len());
        for ((items, support), (want_items, want_support)) in found.iter().zip(&expected) {
            assert_eq!(items, want_items);
            assert!((support - want_support).abs() < 1e-12);
        }
        // {B, C} at 0.2 is infrequent, so {A, B, C} is never counted
        assert!(frequent.support_of(&[0, 1, 2]).is_none());
        assert_eq!(frequent.max_len(), 2);
    }

    #[test]
    fn test_every_subset_of_frequent_set_is_frequent() {
        let basket = matrix(
            array![
                [1, 1, 1, 0],
                [1, 1, 1, 1],
                [1, 1, 0, 1],
                [0, 1, 1, 1],
                [1, 0, 1, 1],
                [1, 1, 1, 1],
            ],
            &["A", "B", "C", "D"],
        );
        let frequent = mine_frequent_itemsets(&basket, &AprioriParams::default()).unwrap();
        for itemset in frequent.iter().filter(|s| s.size() > 1) {
            for skip in 0..itemset.size() {
                let mut subset = itemset.items.clone();
                subset.remove(skip);
                let sub_support = frequent.support_of(&subset).expect("subset must be frequent");
                assert!(itemset.support <= sub_support);
            }
        }
        assert_eq!(frequent.max_len(), 4);
    }

    #[test]
    fn test_max_len_caps_levels() {
        let basket = matrix(array![[1, 1, 1], [1, 1, 1]], &["A", "B", "C"]);
        let params = AprioriParams {
            min_support: 0.5,
            max_len: Some(2),
        };
        let frequent = mine_frequent_itemsets(&basket, &params).unwrap();
        assert_eq!(frequent.len(), 6);
        assert_eq!(frequent.max_len(), 2);
    }

    #[test]
    fn test_rejects_zero_support() {
        let basket = matrix(array![[1]], &["A"]);
        let params = AprioriParams {
            min_support: 0.0,
            max_len: None,
        };
        assert!(matches!(
            mine_frequent_itemsets(&basket, &params),
            Err(AnalyticsError::Config(_))
        ));
    }

    #[test]
    fn test_candidate_join_requires_shared_prefix() {
        let level = vec![vec![0, 1], vec![0, 2], vec![1, 2], vec![1, 3]];
        // {1,2,3} is missing its {2,3} subset
        assert_eq!(generate_candidates(&level), vec![vec![0, 1, 2]]);
    }
}
