// Usage Aggregator - Per-category totals for the month summary chart

use crate::store::UserRegistrationStore;
use serde::Serialize;

/// Labeled series for the summary chart: one (label, value) pair per
/// category, in store iteration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageSummary {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Sum the snapshot usage of every registered appliance, per category.
/// A category with nothing registered still gets a pair with total 0;
/// an empty store yields empty sequences.
pub fn aggregate(store: &UserRegistrationStore) -> UsageSummary {
    let mut summary = UsageSummary::default();

    for slot in store.categories() {
        let total: f64 = slot.appliances().iter().map(|a| a.usage).sum();
        summary.labels.push(slot.category.name().to_string());
        summary.values.push(total);
    }

    summary
}

// ============================================================================
// TESTS
// ============================================================================
