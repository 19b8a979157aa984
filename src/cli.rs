//! Command-line interface definitions and argument parsing

use clap::Parser;

use crate::apriori::AprioriParams;
use crate::config::PipelineConfig;
use crate::rfm::FrequencyMode;
use crate::rules::{RuleMetric, StrengthFilter};

/// Customer RFM segmentation and market basket analysis over sales history
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// CSV with customer_id, region, order_id, order_date, total_price
    #[arg(short, long, default_value = "transactions.csv")]
    pub transactions: String,

    /// CSV with customer_id, item_name
    #[arg(short, long, default_value = "purchases.csv")]
    pub purchases: String,

    /// Directory the result tables are written to
    #[arg(short, long, env = "SEGFORGE_OUTPUT_DIR", default_value = "output")]
    pub output_dir: String,

    /// Number of most frequently bought items kept for basket mining
    #[arg(long, default_value = "30")]
    pub top_items: usize,

    /// Minimum itemset support as a fraction of customers
    #[arg(long, default_value = "0.03")]
    pub min_support: f64,

    /// Largest itemset size to mine
    #[arg(long)]
    pub max_len: Option<usize>,

    /// Metric used to discard rules while they are generated
    #[arg(long, value_enum, default_value_t = RuleMetric::Lift)]
    pub metric: RuleMetric,

    /// Floor for --metric
    #[arg(long, default_value = "1.0")]
    pub min_threshold: f64,

    /// Minimum confidence of a reported rule
    #[arg(long, default_value = "0.6")]
    pub min_confidence: f64,

    /// Minimum lift of a reported rule
    #[arg(long, default_value = "1.1")]
    pub min_lift: f64,

    /// Minimum support of a reported rule
    #[arg(long, default_value = "0.02")]
    pub min_rule_support: f64,

    /// Count frequency per transaction row or per distinct order
    #[arg(long, value_enum, default_value_t = FrequencyMode::Rows)]
    pub frequency: FrequencyMode,

    /// Append logs to this file instead of stderr
    #[arg(long, env = "SEGFORGE_LOG_FILE")]
    pub log_file: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Build a validated pipeline configuration from the flags
    pub fn to_config(&self) -> crate::Result<PipelineConfig> {
        let config = PipelineConfig {
            frequency_mode: self.frequency,
            top_items: self.top_items,
            apriori: AprioriParams {
                min_support: self.min_support,
                max_len: self.max_len,
            },
            metric: self.metric,
            metric_threshold: self.min_threshold,
            strength: StrengthFilter {
                min_confidence: self.min_confidence,
                min_lift: self.min_lift,
                min_support: self.min_rule_support,
            },
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_produce_default_config() {
        let args = Args::parse_from(["segforge"]);
        assert_eq!(args.to_config().unwrap(), PipelineConfig::default());
        assert_eq!(args.transactions, "transactions.csv");
        assert!(!args.verbose);
    }

    #[test]
    fn test_flags_reach_config() {
        let args = Args::parse_from([
            "segforge",
            "--min-support",
            "0.1",
            "--max-len",
            "3",
            "--metric",
            "confidence",
            "--min-threshold",
            "0.5",
            "--frequency",
            "distinct-orders",
        ]);
        let config = args.to_config().unwrap();
        assert_eq!(config.apriori.min_support, 0.1);
        assert_eq!(config.apriori.max_len, Some(3));
        assert_eq!(config.metric, RuleMetric::Confidence);
        assert_eq!(config.metric_threshold, 0.5);
        assert_eq!(config.frequency_mode, FrequencyMode::DistinctOrders);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let args = Args::parse_from(["segforge", "--min-support", "0"]);
        assert!(args.to_config().is_err());

        let args = Args::parse_from(["segforge", "--top-items", "0"]);
        assert!(args.to_config().is_err());
    }
}
