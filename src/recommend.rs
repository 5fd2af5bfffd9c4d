// Recommendation Filter - Lower-usage catalog matches for a registered appliance

use crate::catalog::CatalogEntry;
use crate::store::RegisteredAppliance;

/// How many recommendations the popup shows per registered appliance
pub const RECOMMENDATION_LIMIT: usize = 2;

/// Baseline figure shown next to the user's own usage
pub const AVERAGE_USAGE_KWH: f64 = 500.0;

/// Catalog entries with strictly lower rated usage than the reference's
/// snapshot, in catalog order, truncated to the first `limit`.
///
/// Ties are excluded, and entries whose usage read as 0 at load time can
/// never qualify. The catalog and reference are expected to share a
/// category; nothing here checks that.
pub fn recommend<'a>(
    catalog: &'a [CatalogEntry],
    reference: &RegisteredAppliance,
    limit: usize,
) -> Vec<&'a CatalogEntry> {
    catalog
        .iter()
        .filter(|entry| entry.rated_usage < reference.usage)
        .take(limit)
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
