//! Weekly order and revenue totals

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::data::TransactionRecord;

/// ISO calendar week, identified by its Monday
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarWeek {
    monday: NaiveDate,
}

impl CalendarWeek {
    pub fn containing(instant: NaiveDateTime) -> Self {
        let date = instant.date();
        let offset = date.weekday().num_days_from_monday();
        Self {
            monday: date - Duration::days(i64::from(offset)),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.monday
    }

    pub fn end(&self) -> NaiveDate {
        self.monday + Duration::days(6)
    }
}

impl fmt::Display for CalendarWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let iso = self.monday.iso_week();
        write!(f, "{}-W{:02}", iso.year(), iso.week())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklySummary {
    pub week: CalendarWeek,
    /// Distinct order ids seen in the week
    pub total_orders: u64,
    pub total_revenue: f64,
}

/// Sum orders and revenue per calendar week, earliest week first
///
/// Weeks without transactions are not reported.
pub fn summarize_weeks(records: &[TransactionRecord]) -> Vec<WeeklySummary> {
    let mut weeks: BTreeMap<CalendarWeek, (HashSet<&str>, f64)> = BTreeMap::new();
    for record in records {
        let (orders, revenue) = weeks
            .entry(CalendarWeek::containing(record.order_date))
            .or_default();
        orders.insert(&record.order_id);
        *revenue += record.total_price;
    }

    weeks
        .into_iter()
        .map(|(week, (orders, revenue))| WeeklySummary {
            week,
            total_orders: orders.len() as u64,
            total_revenue: revenue,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(order_id: &str, y: i32, m: u32, d: u32, total: f64) -> TransactionRecord {
        TransactionRecord {
            customer_id: 1,
            region: "North".to_string(),
            order_id: order_id.to_string(),
            order_date: NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            total_price: total,
        }
    }

    #[test]
    fn test_same_week_totals() {
        // Tuesday and Sunday of the same ISO week
        let summary = summarize_weeks(&[tx("A", 2024, 1, 2, 100.0), tx("B", 2024, 1, 7, 50.0)]);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].total_orders, 2);
        assert!((summary[0].total_revenue - 150.0).abs() < 1e-9);
        assert_eq!(summary[0].week.to_string(), "2024-W01");
    }

    #[test]
    fn test_orders_are_distinct() {
        let summary = summarize_weeks(&[tx("A", 2024, 1, 2, 10.0), tx("A", 2024, 1, 3, 5.0)]);
        assert_eq!(summary[0].total_orders, 1);
        assert!((summary[0].total_revenue - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_weeks_are_omitted() {
        let summary = summarize_weeks(&[
            tx("C", 2024, 1, 29, 5.0),
            tx("A", 2024, 1, 1, 10.0),
            tx("B", 2024, 1, 8, 20.0),
        ]);
        let weeks: Vec<String> = summary.iter().map(|s| s.week.to_string()).collect();
        assert_eq!(weeks, vec!["2024-W01", "2024-W02", "2024-W05"]);
    }

    #[test]
    fn test_week_boundaries() {
        // 2020-12-31 is a Thursday in ISO week 53 of 2020
        let week = CalendarWeek::containing(tx("A", 2020, 12, 31, 0.0).order_date);
        assert_eq!(week.start(), NaiveDate::from_ymd_opt(2020, 12, 28).unwrap());
        assert_eq!(week.end(), NaiveDate::from_ymd_opt(2021, 1, 3).unwrap());
        assert_eq!(week.to_string(), "2020-W53");

        let sunday = CalendarWeek::containing(tx("B", 2021, 1, 3, 0.0).order_date);
        assert_eq!(week, sunday);
    }
}
