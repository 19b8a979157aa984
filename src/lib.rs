//! SegForge: customer segmentation and market basket analysis over sales history
//!
//! Scores every customer on Recency, Frequency and Monetary quintiles, labels
//! them with a rule-based segment, mines association rules from purchase
//! baskets with Apriori and summarizes orders and revenue per calendar week.

pub mod apriori;
pub mod basket;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod report;
pub mod rfm;
pub mod rules;
pub mod scoring;
pub mod segment;
pub mod weekly;

// Re-export public items for easier access
pub use cli::Args;
pub use config::PipelineConfig;
pub use data::{load_purchases, load_transactions, PurchaseRecord, TransactionRecord};
pub use error::{AnalyticsError, Result};
pub use export::{CsvDirectorySink, ResultTables, TableSink};
pub use pipeline::{run_pipeline, AnalyticsReport};
pub use rfm::{aggregate_rfm, FrequencyMode, RfmProfile};
pub use rules::{AssociationRule, RuleMetric, StrengthFilter};
pub use segment::{classify, Segment};
pub use weekly::{summarize_weeks, WeeklySummary};
