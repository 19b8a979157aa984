//! Association rules derived from frequent itemsets

use std::fmt;

use clap::ValueEnum;
use itertools::Itertools;
use tracing::warn;

use crate::apriori::FrequentItemsets;
use crate::basket::BasketMatrix;

/// Metric used to discard candidate rules as they are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RuleMetric {
    Support,
    Confidence,
    #[default]
    Lift,
    Leverage,
    Conviction,
}

pub const DEFAULT_METRIC_THRESHOLD: f64 = 1.0;

/// Ordered set of item names, rendered as `{A, B}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemNames(Vec<String>);

impl ItemNames {
    fn from_columns(columns: &[usize], basket: &BasketMatrix) -> Self {
        ItemNames(columns.iter().map(|&c| basket.items()[c].clone()).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ItemNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0.join(", "))
    }
}

/// Directional rule `antecedent -> consequent`
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationRule {
    pub antecedent: ItemNames,
    pub consequent: ItemNames,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    /// Support of antecedent and consequent together
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub leverage: f64,
    /// Infinite when the rule always holds
    pub conviction: f64,
}

impl AssociationRule {
    pub fn metric(&self, metric: RuleMetric) -> f64 {
        match metric {
            RuleMetric::Support => self.support,
            RuleMetric::Confidence => self.confidence,
            RuleMetric::Lift => self.lift,
            RuleMetric::Leverage => self.leverage,
            RuleMetric::Conviction => self.conviction,
        }
    }
}

impl fmt::Display for AssociationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} (support {:.3}, confidence {:.3}, lift {:.3})",
            self.antecedent, self.consequent, self.support, self.confidence, self.lift
        )
    }
}

/// Hard thresholds a rule must meet to be reported
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrengthFilter {
    pub min_confidence: f64,
    pub min_lift: f64,
    pub min_support: f64,
}

impl Default for StrengthFilter {
    fn default() -> Self {
        Self {
            min_confidence: 0.6,
            min_lift: 1.1,
            min_support: 0.02,
        }
    }
}

impl StrengthFilter {
    pub fn accepts(&self, rule: &AssociationRule) -> bool {
        rule.confidence >= self.min_confidence
            && rule.lift >= self.min_lift
            && rule.support >= self.min_support
    }
}

/// Split every frequent itemset of two or more items into rules
///
/// Antecedents are enumerated from the largest proper subset down to single
/// items, each size in lexicographic column order. Rules whose `metric` falls
/// below `min_threshold` are dropped.
pub fn generate_rules(
    frequent: &FrequentItemsets,
    basket: &BasketMatrix,
    metric: RuleMetric,
    min_threshold: f64,
) -> Vec<AssociationRule> {
    let mut rules = Vec::new();

    for itemset in frequent.iter().filter(|s| s.size() >= 2) {
        for size in (1..itemset.size()).rev() {
            for antecedent in itemset.items.iter().copied().combinations(size) {
                let consequent: Vec<usize> = itemset
                    .items
                    .iter()
                    .copied()
                    .filter(|item| !antecedent.contains(item))
                    .collect();

                // subsets of a frequent itemset are always frequent
                let (Some(antecedent_support), Some(consequent_support)) = (
                    frequent.support_of(&antecedent),
                    frequent.support_of(&consequent),
                ) else {
                    warn!(?antecedent, ?consequent, "subset support missing, rule skipped");
                    continue;
                };

                let support = itemset.support;
                let confidence = support / antecedent_support;
                let lift = confidence / consequent_support;
                let leverage = support - antecedent_support * consequent_support;
                let conviction = if confidence >= 1.0 {
                    f64::INFINITY
                } else {
                    (1.0 - consequent_support) / (1.0 - confidence)
                };

                let rule = AssociationRule {
                    antecedent: ItemNames::from_columns(&antecedent, basket),
                    consequent: ItemNames::from_columns(&consequent, basket),
                    antecedent_support,
                    consequent_support,
                    support,
                    confidence,
                    lift,
                    leverage,
                    conviction,
                };
                if rule.metric(metric) >= min_threshold {
                    rules.push(rule);
                }
            }
        }
    }

    rules
}

/// Keep rules passing `filter`, strongest lift first
///
/// The sort is stable: equal lifts keep their generation order.
pub fn strong_rules(
    mut rules: Vec<AssociationRule>,
    filter: &StrengthFilter,
) -> Vec<AssociationRule> {
    rules.retain(|rule| filter.accepts(rule));
    rules.sort_by(|a, b| b.lift.total_cmp(&a.lift));
    rules
}
