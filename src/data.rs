//! Sales records and CSV loading using Polars

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::{debug, warn};

use crate::error::AnalyticsError;

/// One (order, line) row of the sales history
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub customer_id: i64,
    pub region: String,
    pub order_id: String,
    pub order_date: NaiveDateTime,
    pub total_price: f64,
}

/// One (customer, purchased item) pair; repeats across orders are kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRecord {
    pub customer_id: i64,
    pub item_name: String,
}

impl PurchaseRecord {
    pub fn new(customer_id: i64, item_name: impl Into<String>) -> Self {
        Self {
            customer_id,
            item_name: item_name.into(),
        }
    }
}

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

/// Load the sales history from a CSV file
///
/// Expected columns: `customer_id, region, order_id, order_date, total_price`.
/// Rows without a customer id are dropped.
pub fn load_transactions(file_path: &str) -> crate::Result<Vec<TransactionRecord>> {
    let df = read_string_frame(file_path)?;

    let customer_ids = string_column(&df, "customer_id")?;
    let regions = string_column(&df, "region")?;
    let order_ids = string_column(&df, "order_id")?;
    let order_dates = string_column(&df, "order_date")?;
    let prices = string_column(&df, "total_price")?;

    let mut records = Vec::with_capacity(df.height());
    let rows = customer_ids
        .into_iter()
        .zip(regions)
        .zip(order_ids)
        .zip(order_dates)
        .zip(prices)
        .enumerate();

    for (row, ((((customer_id, region), order_id), order_date), total_price)) in rows {
        let order_date = required("order_date", row, order_date)?;
        let total_price = required("total_price", row, total_price)?;
        records.push(TransactionRecord {
            customer_id: parse_customer_id(row, required("customer_id", row, customer_id)?)?,
            region: required("region", row, region)?.to_string(),
            order_id: required("order_id", row, order_id)?.to_string(),
            order_date: parse_timestamp(order_date)
                .ok_or_else(|| parse_error("order_date", row, order_date))?,
            total_price: parse_price(row, total_price)?,
        });
    }

    debug!(rows = records.len(), path = file_path, "loaded transactions");
    Ok(records)
}

/// Load (customer, item) purchase pairs from a CSV file
///
/// Expected columns: `customer_id, item_name`.
pub fn load_purchases(file_path: &str) -> crate::Result<Vec<PurchaseRecord>> {
    let df = read_string_frame(file_path)?;

    let customer_ids = string_column(&df, "customer_id")?;
    let item_names = string_column(&df, "item_name")?;

    let mut records = Vec::with_capacity(df.height());
    for (row, (customer_id, item_name)) in customer_ids.into_iter().zip(item_names).enumerate() {
        records.push(PurchaseRecord {
            customer_id: parse_customer_id(row, required("customer_id", row, customer_id)?)?,
            item_name: required("item_name", row, item_name)?.to_string(),
        });
    }

    debug!(rows = records.len(), path = file_path, "loaded purchases");
    Ok(records)
}

/// Read every column as a string and drop rows without a customer id
fn read_string_frame(file_path: &str) -> crate::Result<DataFrame> {
    let df = LazyCsvReader::new(file_path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()?
        .collect()?;

    let mask = df
        .column("customer_id")
        .map_err(|_| AnalyticsError::MissingColumn("customer_id".to_string()))?
        .is_not_null();
    let filtered = df.filter(&mask)?;

    let dropped = df.height() - filtered.height();
    if dropped > 0 {
        warn!(dropped, path = file_path, "dropped rows without customer_id");
    }

    Ok(filtered)
}

fn string_column<'a>(df: &'a DataFrame, name: &str) -> crate::Result<&'a StringChunked> {
    let series = df
        .column(name)
        .map_err(|_| AnalyticsError::MissingColumn(name.to_string()))?;
    Ok(series.str()?)
}

fn required<'a>(column: &str, row: usize, value: Option<&'a str>) -> crate::Result<&'a str> {
    value.ok_or_else(|| parse_error(column, row, "<null>"))
}

fn parse_error(column: &str, row: usize, value: &str) -> AnalyticsError {
    AnalyticsError::Parse {
        column: column.to_string(),
        row,
        value: value.to_string(),
    }
}

/// Customer ids may come through as floats ("17850.0") from spreadsheet exports
fn parse_customer_id(row: usize, value: &str) -> crate::Result<i64> {
    let trimmed = value.trim();
    if let Ok(id) = trimmed.parse::<i64>() {
        return Ok(id);
    }
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
    match trimmed.parse::<f64>() {
        Ok(id)
            if id.is_finite()
                && id.fract() == 0.0
                && id >= i64::MIN as f64
                && id < i64::MAX as f64 =>
        {
            Ok(id as i64)
        }
        _ => Err(parse_error("customer_id", row, value)),
    }
}

/// Prices must be finite; `NaN` and `inf` parse as f64 but are rejected
fn parse_price(row: usize, value: &str) -> crate::Result<f64> {
    match value.trim().parse::<f64>() {
        Ok(price) if price.is_finite() => Ok(price),
        _ => Err(parse_error("total_price", row, value)),
    }
}

/// Parse an order timestamp; a bare date means midnight
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim().trim_end_matches('Z');
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
