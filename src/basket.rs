//! Customer x item presence matrix over the most frequent items

use std::collections::{BTreeMap, BTreeSet, HashMap};

use ndarray::{Array2, ArrayView1};
use tracing::debug;

use crate::data::PurchaseRecord;
use crate::error::AnalyticsError;

/// Default number of items kept for basket mining
pub const DEFAULT_TOP_ITEMS: usize = 30;

/// Binary customer x item matrix
///
/// Rows are customers in ascending id order, columns are the selected items
/// in lexicographic order. A cell is 1 when the customer bought the item at
/// least once.
#[derive(Debug, Clone, PartialEq)]
pub struct BasketMatrix {
    customers: Vec<i64>,
    items: Vec<String>,
    cells: Array2<u8>,
}

impl BasketMatrix {
    /// Build a matrix from raw parts, checking the shape agrees
    pub fn from_cells(
        customers: Vec<i64>,
        items: Vec<String>,
        cells: Array2<u8>,
    ) -> crate::Result<Self> {
        if cells.dim() != (customers.len(), items.len()) {
            return Err(AnalyticsError::InvalidData(format!(
                "basket cells {:?} do not match {} customers x {} items",
                cells.dim(),
                customers.len(),
                items.len()
            )));
        }
        Ok(Self {
            customers,
            items,
            cells,
        })
    }

    pub fn customers(&self) -> &[i64] {
        &self.customers
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn cells(&self) -> &Array2<u8> {
        &self.cells
    }

    pub fn n_rows(&self) -> usize {
        self.cells.nrows()
    }

    pub fn column(&self, item: usize) -> ArrayView1<'_, u8> {
        self.cells.column(item)
    }

    /// Rows holding a 1 in every listed column
    pub fn count_containing(&self, columns: &[usize]) -> usize {
        self.cells
            .outer_iter()
            .filter(|row| columns.iter().all(|&c| row[c] == 1))
            .count()
    }

    /// Fraction of rows holding a 1 in every listed column
    pub fn support(&self, columns: &[usize]) -> f64 {
        if self.n_rows() == 0 {
            return 0.0;
        }
        self.count_containing(columns) as f64 / self.n_rows() as f64
    }
}

/// Item names ranked by raw occurrence count, ties in first-seen order
pub fn top_items(records: &[PurchaseRecord], top_k: usize) -> Vec<&str> {
    let mut position: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for record in records {
        let name = record.item_name.as_str();
        match position.get(name) {
            Some(&idx) => counts[idx].1 += 1,
            None => {
                position.insert(name, counts.len());
                counts.push((name, 1));
            }
        }
    }

    // stable, so equal counts keep first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(top_k).map(|(name, _)| name).collect()
}

/// Encode purchases as a presence matrix restricted to the `top_k` items
///
/// Customers with no purchase among the selected items get no row.
pub fn encode_baskets(records: &[PurchaseRecord], top_k: usize) -> crate::Result<BasketMatrix> {
    if records.is_empty() {
        return Err(AnalyticsError::InputEmpty { what: "purchase" });
    }
    if top_k == 0 {
        return Err(AnalyticsError::Config("top item count must be at least 1".into()));
    }

    let mut items: Vec<&str> = top_items(records, top_k);
    items.sort_unstable();
    let column: HashMap<&str, usize> = items.iter().enumerate().map(|(i, &n)| (n, i)).collect();

    let mut baskets: BTreeMap<i64, BTreeSet<usize>> = BTreeMap::new();
    for record in records {
        if let Some(&col) = column.get(record.item_name.as_str()) {
            baskets.entry(record.customer_id).or_default().insert(col);
        }
    }

    let mut cells = Array2::<u8>::zeros((baskets.len(), items.len()));
    for (row, present) in baskets.values().enumerate() {
        for &col in present {
            cells[[row, col]] = 1;
        }
    }

    debug!(
        customers = baskets.len(),
        items = items.len(),
        "encoded basket matrix"
    );

    Ok(BasketMatrix {
        customers: baskets.into_keys().collect(),
        items: items.into_iter().map(String::from).collect(),
        cells,
    })
}
