// Registration Store - Per-user registered appliances
// In-memory model of the user document's AppliancesMap field

use crate::catalog::{ApplianceCategory, CatalogEntry};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Document field holding the per-user registrations
pub const APPLIANCES_MAP_FIELD: &str = "AppliancesMap";

// ============================================================================
// REGISTERED APPLIANCE
// ============================================================================

/// One registered appliance, exactly the shape written to the user document.
/// `usage` is a snapshot of the catalog entry's rated usage at add-time;
/// later catalog revisions do not touch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredAppliance {
    pub name: String,
    pub usage: f64,
    pub aid: String,
    pub brand: String,
}

impl RegisteredAppliance {
    /// Snapshot a catalog entry at registration time
    pub fn snapshot_of(entry: &CatalogEntry) -> Self {
        RegisteredAppliance {
            name: entry.model.clone(),
            usage: entry.rated_usage,
            aid: entry.unique_id.clone(),
            brand: entry.brand.clone(),
        }
    }

    /// "Brand - Name" when a brand is present, plain name otherwise
    pub fn display_name(&self) -> String {
        if self.brand.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.brand, self.name)
        }
    }
}

// ============================================================================
// USER REGISTRATION STORE
// ============================================================================

/// Registrations under one category, keyed by catalog unique id
#[derive(Debug, Clone)]
pub struct CategoryRegistrations {
    pub category: ApplianceCategory,
    appliances: Vec<RegisteredAppliance>,
}

impl CategoryRegistrations {
    pub fn appliances(&self) -> &[RegisteredAppliance] {
        &self.appliances
    }
}

/// The per-user registration store: category -> (aid -> appliance).
/// Iteration follows insertion order at both levels, matching how the
/// document's map fields grow as the user adds appliances.
#[derive(Debug, Clone, Default)]
pub struct UserRegistrationStore {
    categories: Vec<CategoryRegistrations>,
}

impl UserRegistrationStore {
    pub fn new() -> Self {
        UserRegistrationStore::default()
    }

    /// Insert or overwrite the appliance under (category, aid).
    /// Re-adding the same aid overwrites rather than duplicates.
    pub fn upsert(&mut self, category: ApplianceCategory, appliance: RegisteredAppliance) {
        let slot = match self.categories.iter_mut().find(|c| c.category == category) {
            Some(slot) => slot,
            None => {
                self.categories.push(CategoryRegistrations {
                    category,
                    appliances: Vec::new(),
                });
                self.categories.last_mut().unwrap()
            }
        };

        match slot.appliances.iter_mut().find(|a| a.aid == appliance.aid) {
            Some(existing) => *existing = appliance,
            None => slot.appliances.push(appliance),
        }
    }

    /// Registered appliances under a category, empty when none
    pub fn appliances(&self, category: ApplianceCategory) -> &[RegisteredAppliance] {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.appliances.as_slice())
            .unwrap_or(&[])
    }

    /// Categories in insertion order, including ones with no appliances left
    pub fn categories(&self) -> impl Iterator<Item = &CategoryRegistrations> {
        self.categories.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Total registered appliances across all categories
    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.appliances.len()).sum()
    }

    // ========================================================================
    // DOCUMENT CONVERSION
    // ========================================================================

    /// Build the AppliancesMap JSON object for the user document
    pub fn to_appliances_map(&self) -> Value {
        let mut map = Map::new();
        for slot in &self.categories {
            let mut inner = Map::new();
            for appliance in &slot.appliances {
                inner.insert(appliance.aid.clone(), json!(appliance));
            }
            map.insert(slot.category.name().to_string(), Value::Object(inner));
        }
        Value::Object(map)
    }

    /// Read the store back out of a user document.
    /// Absent AppliancesMap, unknown category keys, and malformed entries
    /// all read as "nothing registered there"; a category key holding an
    /// empty object is kept (its total is still reported as 0).
    pub fn from_document(document: &Value) -> Self {
        let mut store = UserRegistrationStore::new();

        let map = match document.get(APPLIANCES_MAP_FIELD).and_then(Value::as_object) {
            Some(map) => map,
            None => return store,
        };

        for (category_name, entries) in map {
            let category = match ApplianceCategory::from_name(category_name) {
                Some(category) => category,
                None => continue,
            };

            store.categories.push(CategoryRegistrations {
                category,
                appliances: Vec::new(),
            });

            if let Some(entries) = entries.as_object() {
                for (_aid, raw) in entries {
                    if let Ok(appliance) =
                        serde_json::from_value::<RegisteredAppliance>(raw.clone())
                    {
                        store.upsert(category, appliance);
                    }
                }
            }
        }

        store
    }
}

/// Dot-delimited document path for one registration,
/// `AppliancesMap.<category>.<aid>`
pub fn registration_field_path(category: ApplianceCategory, aid: &str) -> String {
    format!("{}.{}.{}", APPLIANCES_MAP_FIELD, category.name(), aid)
}

// ============================================================================
// TESTS
// ============================================================================
