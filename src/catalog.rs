// Appliance Catalogs - Bundled ENERGY STAR reference data
// Static read-only tables of appliance models with rated energy usage

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// APPLIANCE CATEGORY
// ============================================================================

/// ApplianceCategory - Every appliance a floor-plan screen can open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplianceCategory {
    Tv,
    Lamp,
    AirConditioner,
    Fridge,
    Oven,
    Blender,
    Toaster,
    Washer,
    Dryer,
    CeilingLamp,
}

impl ApplianceCategory {
    /// Display name, matches the labels the screens pass around
    pub fn name(&self) -> &'static str {
        match self {
            ApplianceCategory::Tv => "TV",
            ApplianceCategory::Lamp => "Lamp",
            ApplianceCategory::AirConditioner => "Air Conditioner",
            ApplianceCategory::Fridge => "Fridge",
            ApplianceCategory::Oven => "Oven",
            ApplianceCategory::Blender => "Blender",
            ApplianceCategory::Toaster => "Toaster",
            ApplianceCategory::Washer => "Washer",
            ApplianceCategory::Dryer => "Dryer",
            ApplianceCategory::CeilingLamp => "Ceiling Lamp",
        }
    }

    /// Short code for CLI arguments and internal use
    pub fn code(&self) -> &'static str {
        match self {
            ApplianceCategory::Tv => "tv",
            ApplianceCategory::Lamp => "lamp",
            ApplianceCategory::AirConditioner => "ac",
            ApplianceCategory::Fridge => "fridge",
            ApplianceCategory::Oven => "oven",
            ApplianceCategory::Blender => "blender",
            ApplianceCategory::Toaster => "toaster",
            ApplianceCategory::Washer => "washer",
            ApplianceCategory::Dryer => "dryer",
            ApplianceCategory::CeilingLamp => "ceiling-lamp",
        }
    }

    /// Parse a display name or short code (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase();
        ApplianceCategory::all()
            .iter()
            .find(|c| c.name().to_lowercase() == normalized || c.code() == normalized)
            .copied()
    }

    pub fn all() -> &'static [ApplianceCategory] {
        &[
            ApplianceCategory::Tv,
            ApplianceCategory::Lamp,
            ApplianceCategory::AirConditioner,
            ApplianceCategory::Fridge,
            ApplianceCategory::Oven,
            ApplianceCategory::Blender,
            ApplianceCategory::Toaster,
            ApplianceCategory::Washer,
            ApplianceCategory::Dryer,
            ApplianceCategory::CeilingLamp,
        ]
    }

    /// Column holding the rated-usage figure in this category's dataset.
    /// Categories without a bundled dataset have no usage column.
    pub fn usage_field(&self) -> Option<&'static str> {
        match self {
            ApplianceCategory::Tv => Some("Reported Annual Energy Consumption (kWh)"),
            ApplianceCategory::Lamp => Some("Total Input Power (Watts)"),
            ApplianceCategory::AirConditioner => Some("Annual Energy Use (kWh/yr)"),
            _ => None,
        }
    }

    /// Unit of the rated-usage figure
    pub fn usage_unit(&self) -> &'static str {
        match self {
            ApplianceCategory::Lamp => "Watts",
            _ => "kWh/year",
        }
    }
}

impl std::fmt::Display for ApplianceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// CATALOG ENTRY
// ============================================================================

// Column names shared by all three datasets
const COL_BRAND: &str = "Brand Name";
const COL_MODEL: &str = "Model Number";
const COL_UNIQUE_ID: &str = "ENERGY STAR Unique ID";

/// One row of a bundled dataset, normalized.
/// Immutable after load; never created at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub category: ApplianceCategory,
    pub brand: String,
    pub model: String,
    pub unique_id: String,
    pub rated_usage: f64,
}

impl CatalogEntry {
    /// "Brand - Model" label, the way the dropdown showed entries
    pub fn label(&self) -> String {
        format!("{} - {}", self.brand, self.model)
    }
}

// ============================================================================
// CATALOG REGISTRY
// ============================================================================

/// Registry of all bundled catalogs, loaded once.
pub struct CatalogRegistry {
    televisions: Vec<CatalogEntry>,
    downlights: Vec<CatalogEntry>,
    air_conditioners: Vec<CatalogEntry>,
}

impl CatalogRegistry {
    /// Load the three bundled datasets
    pub fn load() -> Result<Self> {
        Ok(CatalogRegistry {
            televisions: parse_catalog(
                include_str!("../data/televisions.json"),
                ApplianceCategory::Tv,
            )
            .context("Failed to load television catalog")?,
            downlights: parse_catalog(
                include_str!("../data/downlights.json"),
                ApplianceCategory::Lamp,
            )
            .context("Failed to load downlight catalog")?,
            air_conditioners: parse_catalog(
                include_str!("../data/air_conditioners.json"),
                ApplianceCategory::AirConditioner,
            )
            .context("Failed to load air conditioner catalog")?,
        })
    }

    /// Entries for a category, in dataset order.
    /// Categories without a bundled dataset return an empty slice.
    pub fn entries(&self, category: ApplianceCategory) -> &[CatalogEntry] {
        match category {
            ApplianceCategory::Tv => &self.televisions,
            ApplianceCategory::Lamp => &self.downlights,
            ApplianceCategory::AirConditioner => &self.air_conditioners,
            _ => &[],
        }
    }

    /// Look up an entry by its catalog-unique identifier
    pub fn find(&self, category: ApplianceCategory, unique_id: &str) -> Option<&CatalogEntry> {
        self.entries(category)
            .iter()
            .find(|e| e.unique_id == unique_id)
    }
}

/// Parse one dataset. The rated-usage column differs per category, so rows
/// are read as raw JSON objects and extracted through the category's
/// accessor; missing or null usage reads as 0.
fn parse_catalog(raw: &str, category: ApplianceCategory) -> Result<Vec<CatalogEntry>> {
    let usage_field = match category.usage_field() {
        Some(field) => field,
        None => return Ok(Vec::new()),
    };

    let rows: Vec<Value> = serde_json::from_str(raw).context("Failed to parse catalog JSON")?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in &rows {
        entries.push(CatalogEntry {
            category,
            brand: string_field(row, COL_BRAND),
            model: string_field(row, COL_MODEL),
            unique_id: string_field(row, COL_UNIQUE_ID),
            rated_usage: row.get(usage_field).and_then(Value::as_f64).unwrap_or(0.0),
        });
    }

    Ok(entries)
}

fn string_field(row: &Value, field: &str) -> String {
    match row.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_bundled_catalogs() {
        let registry = CatalogRegistry::load().unwrap();

        assert_eq!(registry.entries(ApplianceCategory::Tv).len(), 12);
        assert_eq!(registry.entries(ApplianceCategory::Lamp).len(), 10);
        assert_eq!(registry.entries(ApplianceCategory::AirConditioner).len(), 10);
    }

    #[test]
    fn test_categories_without_dataset_are_empty() {
        let registry = CatalogRegistry::load().unwrap();

        assert!(registry.entries(ApplianceCategory::Fridge).is_empty());
        assert!(registry.entries(ApplianceCategory::Washer).is_empty());
        assert!(registry.entries(ApplianceCategory::CeilingLamp).is_empty());
    }

    #[test]
    fn test_find_by_unique_id() {
        let registry = CatalogRegistry::load().unwrap();

        let entry = registry.find(ApplianceCategory::Tv, "2318695").unwrap();
        assert_eq!(entry.brand, "Samsung");
        assert_eq!(entry.model, "QN55Q60D");
        assert_eq!(entry.rated_usage, 142.0);
        assert_eq!(entry.label(), "Samsung - QN55Q60D");

        assert!(registry.find(ApplianceCategory::Tv, "no-such-id").is_none());
        // Ids are unique per catalog, not across catalogs
        assert!(registry.find(ApplianceCategory::Lamp, "2318695").is_none());
    }

    #[test]
    fn test_missing_usage_reads_as_zero() {
        let registry = CatalogRegistry::load().unwrap();

        // The Commercial Electric downlight has a null usage column
        let entry = registry.find(ApplianceCategory::Lamp, "2412278").unwrap();
        assert_eq!(entry.rated_usage, 0.0);
    }

    #[test]
    fn test_dataset_order_is_preserved() {
        let registry = CatalogRegistry::load().unwrap();

        let ids: Vec<&str> = registry
            .entries(ApplianceCategory::AirConditioner)
            .iter()
            .take(3)
            .map(|e| e.unique_id.as_str())
            .collect();
        assert_eq!(ids, vec!["2523119", "2523228", "2523341"]);
    }

    #[test]
    fn test_category_from_name() {
        assert_eq!(
            ApplianceCategory::from_name("Air Conditioner"),
            Some(ApplianceCategory::AirConditioner)
        );
        assert_eq!(ApplianceCategory::from_name("ac"), Some(ApplianceCategory::AirConditioner));
        assert_eq!(ApplianceCategory::from_name("TV"), Some(ApplianceCategory::Tv));
        assert_eq!(ApplianceCategory::from_name("tv"), Some(ApplianceCategory::Tv));
        assert_eq!(
            ApplianceCategory::from_name("ceiling lamp"),
            Some(ApplianceCategory::CeilingLamp)
        );
        assert_eq!(ApplianceCategory::from_name("Microwave"), None);
    }

    #[test]
    fn test_usage_field_table() {
        assert_eq!(
            ApplianceCategory::Tv.usage_field(),
            Some("Reported Annual Energy Consumption (kWh)")
        );
        assert_eq!(
            ApplianceCategory::Lamp.usage_field(),
            Some("Total Input Power (Watts)")
        );
        assert_eq!(
            ApplianceCategory::AirConditioner.usage_field(),
            Some("Annual Energy Use (kWh/yr)")
        );
        assert_eq!(ApplianceCategory::Toaster.usage_field(), None);

        assert_eq!(ApplianceCategory::Lamp.usage_unit(), "Watts");
        assert_eq!(ApplianceCategory::Tv.usage_unit(), "kWh/year");
    }
}
