//! Console summary of an analytics run

use crate::pipeline::AnalyticsReport;
use crate::rfm::RfmProfile;
use crate::segment::Segment;

/// Number of customers per segment, in decision-table order
pub fn segment_counts(profiles: &[RfmProfile]) -> Vec<(Segment, usize)> {
    Segment::ALL
        .iter()
        .map(|&segment| {
            let count = profiles.iter().filter(|p| p.segment == segment).count();
            (segment, count)
        })
        .collect()
}

/// Print segment sizes, the strongest rules and weekly coverage
pub fn print_run_summary(report: &AnalyticsReport, top_rules: usize) {
    let total = report.profiles.len();

    println!("\n=== Customer Segments ===");
    println!("Total customers: {}", total);
    for (segment, count) in segment_counts(&report.profiles) {
        let percentage = if total == 0 {
            0.0
        } else {
            count as f64 / total as f64 * 100.0
        };
        println!("  {:<12} {:>6} ({:.1}%)", segment.as_str(), count, percentage);
    }

    println!("\n=== Market Basket ===");
    println!(
        "Items: {}  Customers: {}  Frequent itemsets: {}",
        report.basket_items.len(),
        report.basket_customers,
        report.frequent_itemsets
    );
    println!(
        "Rules: {} strong of {} candidates",
        report.rules.len(),
        report.candidate_rules
    );
    for rule in report.rules.iter().take(top_rules) {
        println!("  {}", rule);
    }

    println!("\n=== Weekly Sales ===");
    match (report.weekly.first(), report.weekly.last()) {
        (Some(first), Some(last)) => {
            let revenue: f64 = report.weekly.iter().map(|w| w.total_revenue).sum();
            println!(
                "{} weeks from {} to {}, revenue {:.2}",
                report.weekly.len(),
                first.week,
                last.week,
                revenue
            );
        }
        _ => println!("No weeks"),
    }
}
