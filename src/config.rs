//! Tunable parameters for a pipeline run

use crate::apriori::AprioriParams;
use crate::basket::DEFAULT_TOP_ITEMS;
use crate::error::AnalyticsError;
use crate::rfm::FrequencyMode;
use crate::rules::{RuleMetric, StrengthFilter, DEFAULT_METRIC_THRESHOLD};

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub frequency_mode: FrequencyMode,
    /// Number of most frequent items kept for basket mining
    pub top_items: usize,
    pub apriori: AprioriParams,
    /// Metric and floor applied while rules are generated
    pub metric: RuleMetric,
    pub metric_threshold: f64,
    pub strength: StrengthFilter,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frequency_mode: FrequencyMode::default(),
            top_items: DEFAULT_TOP_ITEMS,
            apriori: AprioriParams::default(),
            metric: RuleMetric::default(),
            metric_threshold: DEFAULT_METRIC_THRESHOLD,
            strength: StrengthFilter::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if self.top_items == 0 {
            return Err(AnalyticsError::Config("top items must be at least 1".into()));
        }
        if !(self.apriori.min_support > 0.0 && self.apriori.min_support <= 1.0) {
            return Err(AnalyticsError::Config(format!(
                "min support must be in (0, 1], got {}",
                self.apriori.min_support
            )));
        }
        if self.apriori.max_len == Some(0) {
            return Err(AnalyticsError::Config(
                "max itemset length must be at least 1".into(),
            ));
        }

        let fractions = [
            ("min confidence", self.strength.min_confidence),
            ("min rule support", self.strength.min_support),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(AnalyticsError::Config(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        if self.strength.min_lift < 0.0 || self.metric_threshold.is_nan() {
            return Err(AnalyticsError::Config(
                "rule thresholds must be non-negative numbers".into(),
            ));
        }
        Ok(())
    }
}
