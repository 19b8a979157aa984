//! Full-batch run of the three analytics branches

use std::collections::BTreeSet;
use std::time::Instant;

use tracing::{debug, info};

use crate::apriori::mine_frequent_itemsets;
use crate::basket::encode_baskets;
use crate::config::PipelineConfig;
use crate::data::{PurchaseRecord, TransactionRecord};
use crate::error::AnalyticsError;
use crate::rfm::{aggregate_rfm, RfmProfile};
use crate::rules::{generate_rules, strong_rules, AssociationRule};
use crate::weekly::{summarize_weeks, WeeklySummary};

/// Everything one run produces
#[derive(Debug, Clone)]
pub struct AnalyticsReport {
    pub profiles: Vec<RfmProfile>,
    /// Items that made it into the basket matrix
    pub basket_items: Vec<String>,
    pub basket_customers: usize,
    pub frequent_itemsets: usize,
    /// Rules before the strength filter
    pub candidate_rules: usize,
    pub rules: Vec<AssociationRule>,
    pub weekly: Vec<WeeklySummary>,
}

/// Output of the basket branch
#[derive(Debug, Clone)]
pub struct BasketAnalysis {
    pub items: Vec<String>,
    pub customers: usize,
    pub frequent_itemsets: usize,
    pub candidate_rules: usize,
    pub rules: Vec<AssociationRule>,
}

/// Reject inputs no branch can work with
///
/// Both collections must be non-empty and describe the same customers.
pub fn validate_inputs(
    transactions: &[TransactionRecord],
    purchases: &[PurchaseRecord],
) -> crate::Result<()> {
    if transactions.is_empty() {
        return Err(AnalyticsError::InputEmpty {
            what: "transaction",
        });
    }
    if purchases.is_empty() {
        return Err(AnalyticsError::InputEmpty { what: "purchase" });
    }

    let sold: BTreeSet<i64> = transactions.iter().map(|t| t.customer_id).collect();
    let bought: BTreeSet<i64> = purchases.iter().map(|p| p.customer_id).collect();
    if sold == bought {
        return Ok(());
    }

    let missing_in_transactions: Vec<i64> = bought.difference(&sold).copied().collect();
    let missing_in_purchases: Vec<i64> = sold.difference(&bought).copied().collect();
    let example = missing_in_transactions
        .first()
        .or(missing_in_purchases.first())
        .copied()
        .unwrap_or_default();

    Err(AnalyticsError::InconsistentJoin {
        missing_in_transactions: missing_in_transactions.len(),
        missing_in_purchases: missing_in_purchases.len(),
        example,
    })
}

/// Basket encoding, itemset mining and rule filtering
pub fn analyze_baskets(
    purchases: &[PurchaseRecord],
    config: &PipelineConfig,
) -> crate::Result<BasketAnalysis> {
    let basket = encode_baskets(purchases, config.top_items)?;
    debug!(
        customers = basket.n_rows(),
        items = basket.items().len(),
        "basket matrix ready"
    );

    let frequent = mine_frequent_itemsets(&basket, &config.apriori)?;
    let candidates = generate_rules(&frequent, &basket, config.metric, config.metric_threshold);
    let candidate_rules = candidates.len();
    let rules = strong_rules(candidates, &config.strength);

    info!(
        frequent_itemsets = frequent.len(),
        candidate_rules,
        strong_rules = rules.len(),
        "market basket analysis completed"
    );

    Ok(BasketAnalysis {
        items: basket.items().to_vec(),
        customers: basket.n_rows(),
        frequent_itemsets: frequent.len(),
        candidate_rules,
        rules,
    })
}

/// Run RFM scoring, basket mining and the weekly summary over one snapshot
///
/// The branches share no state and run concurrently. Any failure aborts the
/// whole run; nothing is returned partially.
pub fn run_pipeline(
    transactions: &[TransactionRecord],
    purchases: &[PurchaseRecord],
    config: &PipelineConfig,
) -> crate::Result<AnalyticsReport> {
    let start = Instant::now();
    config.validate()?;
    validate_inputs(transactions, purchases)?;
    info!(
        transactions = transactions.len(),
        purchases = purchases.len(),
        "starting analytics run"
    );

    let (profiles, (baskets, weekly)) = rayon::join(
        || aggregate_rfm(transactions, config.frequency_mode),
        || {
            rayon::join(
                || analyze_baskets(purchases, config),
                || summarize_weeks(transactions),
            )
        },
    );
    let profiles = profiles?;
    let baskets = baskets?;
    info!(customers = profiles.len(), "RFM analysis completed");
    info!(weeks = weekly.len(), "weekly sales summary created");

    info!(elapsed_ms = start.elapsed().as_millis() as u64, "analytics run finished");
    Ok(AnalyticsReport {
        profiles,
        basket_items: baskets.items,
        basket_customers: baskets.customers,
        frequent_itemsets: baskets.frequent_itemsets,
        candidate_rules: baskets.candidate_rules,
        rules: baskets.rules,
        weekly,
    })
}
