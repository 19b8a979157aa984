//! RFM (Recency, Frequency, Monetary) aggregation and scoring

use std::collections::{BTreeMap, HashSet};

use chrono::{Duration, NaiveDateTime};
use clap::ValueEnum;

use crate::data::TransactionRecord;
use crate::error::AnalyticsError;
use crate::scoring::{quintile_scores, Orientation, Score};
use crate::segment::{classify, Segment};

/// How a customer's frequency is counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FrequencyMode {
    /// One per transaction row, so multi-line orders count once per line
    #[default]
    Rows,
    /// One per distinct order id
    DistinctOrders,
}

/// Scored RFM profile for one customer
#[derive(Debug, Clone, PartialEq)]
pub struct RfmProfile {
    pub customer_id: i64,
    /// Whole days between the reference instant and the latest order
    pub recency: i64,
    pub frequency: u64,
    pub monetary: f64,
    pub r_score: Score,
    pub f_score: Score,
    pub m_score: Score,
    /// R, F and M digits in that order, e.g. "545"
    pub rfm_code: String,
    pub segment: Segment,
    /// Region of the customer's latest transaction
    pub region: String,
}

#[derive(Debug)]
struct CustomerTotals<'a> {
    latest: NaiveDateTime,
    region: &'a str,
    rows: u64,
    orders: HashSet<&'a str>,
    monetary: f64,
}

/// Instant recency is measured from: one day after the latest order overall
pub fn reference_instant(records: &[TransactionRecord]) -> crate::Result<NaiveDateTime> {
    records
        .iter()
        .map(|record| record.order_date)
        .max()
        .map(|latest| latest + Duration::days(1))
        .ok_or(AnalyticsError::InputEmpty {
            what: "transaction",
        })
}

/// Reduce transactions to one scored profile per customer, ordered by id
pub fn aggregate_rfm(
    records: &[TransactionRecord],
    mode: FrequencyMode,
) -> crate::Result<Vec<RfmProfile>> {
    let reference = reference_instant(records)?;

    let mut totals: BTreeMap<i64, CustomerTotals<'_>> = BTreeMap::new();
    for record in records {
        let entry = totals
            .entry(record.customer_id)
            .or_insert_with(|| CustomerTotals {
                latest: record.order_date,
                region: &record.region,
                rows: 0,
                orders: HashSet::new(),
                monetary: 0.0,
            });

        // ties on the latest timestamp go to the later row
        if record.order_date >= entry.latest {
            entry.latest = record.order_date;
            entry.region = &record.region;
        }
        entry.rows += 1;
        entry.orders.insert(&record.order_id);
        entry.monetary += record.total_price;
    }

    let customers: Vec<(i64, i64, u64, f64, &str)> = totals
        .iter()
        .map(|(&customer_id, t)| {
            let frequency = match mode {
                FrequencyMode::Rows => t.rows,
                FrequencyMode::DistinctOrders => t.orders.len() as u64,
            };
            let recency = (reference - t.latest).num_days();
            (customer_id, recency, frequency, t.monetary, t.region)
        })
        .collect();

    let recency: Vec<f64> = customers.iter().map(|c| c.1 as f64).collect();
    let frequency: Vec<f64> = customers.iter().map(|c| c.2 as f64).collect();
    let monetary: Vec<f64> = customers.iter().map(|c| c.3).collect();

    let r_scores = quintile_scores("recency", &recency, Orientation::LowerIsBetter)?;
    let f_scores = quintile_scores("frequency", &frequency, Orientation::HigherIsBetter)?;
    let m_scores = quintile_scores("monetary", &monetary, Orientation::HigherIsBetter)?;

    let profiles = customers
        .into_iter()
        .zip(r_scores)
        .zip(f_scores)
        .zip(m_scores)
        .map(
            |((((customer_id, recency, frequency, monetary, region), r), f), m)| RfmProfile {
                customer_id,
                recency,
                frequency,
                monetary,
                r_score: r,
                f_score: f,
                m_score: m,
                rfm_code: format!("{r}{f}{m}"),
                segment: classify(r, f, m),
                region: region.to_string(),
            },
        )
        .collect();

    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn tx(
        customer_id: i64,
        region: &str,
        order_id: &str,
        date: NaiveDateTime,
        total: f64,
    ) -> TransactionRecord {
        TransactionRecord {
            customer_id,
            region: region.to_string(),
            order_id: order_id.to_string(),
            order_date: date,
            total_price: total,
        }
    }

    /// Five customers with strictly ordered recency, frequency and spend
    fn create_test_records() -> Vec<TransactionRecord> {
        let mut records = Vec::new();
        for customer in 1..=5i64 {
            for line in 0..customer {
                records.push(tx(
                    customer,
                    "North",
                    &format!("{customer}-{line}"),
                    at(customer as u32 * 2, 9),
                    100.0 * customer as f64,
                ));
            }
        }
        records
    }

    #[test]
    fn test_reference_instant() {
        let records = create_test_records();
        assert_eq!(reference_instant(&records).unwrap(), at(11, 9));
        assert!(reference_instant(&[]).is_err());
    }

    #[test]
    fn test_aggregate_rfm() {
        let profiles = aggregate_rfm(&create_test_records(), FrequencyMode::Rows).unwrap();
        assert_eq!(profiles.len(), 5);

        let best = &profiles[4];
        assert_eq!(best.customer_id, 5);
        assert_eq!(best.recency, 1);
        assert_eq!(best.frequency, 5);
        assert!((best.monetary - 2500.0).abs() < 1e-9);
        assert_eq!(best.rfm_code, "555");
        assert_eq!(best.segment, Segment::Champion);

        let worst = &profiles[0];
        assert_eq!(worst.recency, 9);
        assert_eq!(worst.rfm_code, "111");
        assert_eq!(worst.segment, Segment::Potential);

        let middle = &profiles[2];
        assert_eq!(middle.rfm_code, "333");
        assert_eq!(middle.segment, Segment::Loyal);
    }

    #[test]
    fn test_latest_order_has_recency_one() {
        let profiles = aggregate_rfm(&create_test_records(), FrequencyMode::Rows).unwrap();
        let min = profiles.iter().map(|p| p.recency).min().unwrap();
        assert_eq!(min, 1);
    }

    #[test]
    fn test_region_follows_latest_transaction() {
        let mut records = create_test_records();
        // customer 3 has three rows at the same instant; the last one wins
        let regions = ["South", "East", "West"];
        for (record, region) in records.iter_mut().filter(|r| r.customer_id == 3).zip(regions) {
            record.region = region.to_string();
        }
        // customer 4's first row is its latest
        let first = records.iter_mut().find(|r| r.customer_id == 4).unwrap();
        first.order_date = at(9, 9);
        first.region = "South".to_string();

        let profiles = aggregate_rfm(&records, FrequencyMode::Rows).unwrap();
        assert_eq!(profiles[1].region, "North");
        assert_eq!(profiles[2].region, "West");
        assert_eq!(profiles[3].region, "South");
        assert_eq!(profiles[3].recency, 2);
    }

    #[test]
    fn test_frequency_modes() {
        let records = create_test_records();
        let mut multi_line = records.clone();
        // a second line on an existing order for customer 5
        multi_line.push(tx(5, "North", "5-0", at(10, 9), 0.0));

        let rows = aggregate_rfm(&multi_line, FrequencyMode::Rows).unwrap();
        let distinct = aggregate_rfm(&multi_line, FrequencyMode::DistinctOrders).unwrap();
        assert_eq!(rows[4].frequency, 6);
        assert_eq!(distinct[4].frequency, 5);
    }

    #[test]
    fn test_too_few_customers() {
        let records: Vec<TransactionRecord> = create_test_records()
            .into_iter()
            .filter(|r| r.customer_id <= 3)
            .collect();
        let err = aggregate_rfm(&records, FrequencyMode::Rows).unwrap_err();
        assert!(matches!(err, AnalyticsError::InsufficientDistinctValues { .. }));
    }

    #[test]
    fn test_nan_spend_is_not_scored() {
        let mut records = create_test_records();
        records[0].total_price = f64::NAN;
        let err = aggregate_rfm(&records, FrequencyMode::Rows).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidData(_)));
    }

    #[test]
    fn test_customer_ids_unique() {
        let profiles = aggregate_rfm(&create_test_records(), FrequencyMode::Rows).unwrap();
        let ids: HashSet<i64> = profiles.iter().map(|p| p.customer_id).collect();
        assert_eq!(ids.len(), profiles.len());
    }
}
