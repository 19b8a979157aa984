//! Error taxonomy for the analytics engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("no {what} records supplied")]
    InputEmpty { what: &'static str },

    #[error(
        "insufficient distinct values for quantile scoring of {metric}: {distinct} distinct"
    )]
    InsufficientDistinctValues { metric: String, distinct: usize },

    #[error(
        "customer sets disagree: {missing_in_transactions} purchase customer(s) without transactions, \
         {missing_in_purchases} transaction customer(s) without purchases (e.g. customer {example})"
    )]
    InconsistentJoin {
        missing_in_transactions: usize,
        missing_in_purchases: usize,
        example: i64,
    },

    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("invalid value {value:?} in column {column} at row {row}")]
    Parse {
        column: String,
        row: usize,
        value: String,
    },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl AnalyticsError {
    /// Whether a rerun against the same data could succeed.
    ///
    /// Only source and sink I/O qualifies; every other variant describes the
    /// shape of the data or the configuration and will fail again.
    pub fn is_transient(&self) -> bool {
        matches!(self, AnalyticsError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let io = AnalyticsError::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "slow"));
        assert!(io.is_transient());

        let shape = AnalyticsError::InsufficientDistinctValues {
            metric: "recency".to_string(),
            distinct: 3,
        };
        assert!(!shape.is_transient());
        assert!(shape.to_string().contains("insufficient distinct values"));
    }
}
