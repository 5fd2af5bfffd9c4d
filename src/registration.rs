// Registration Writer - Adds catalog entries to the user's document
// Persistence stays behind a repository seam; the logic above it is pure

use crate::catalog::{ApplianceCategory, CatalogEntry};
use crate::db;
use crate::store::{registration_field_path, RegisteredAppliance, UserRegistrationStore};
use anyhow::Result;
use rusqlite::Connection;
use serde_json::json;

// ============================================================================
// ERROR TAXONOMY
// ============================================================================

/// Why a registration was refused. All of these surface as dismissible
/// notices; none is fatal and retrying via another user action is always
/// allowed.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationError {
    /// No signed-in identity at action time
    Authentication,
    /// Save attempted without choosing a catalog entry
    SelectionMissing,
    /// The document store rejected the read/write
    Storage(String),
}

impl std::fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationError::Authentication => write!(f, "No logged-in user"),
            RegistrationError::SelectionMissing => write!(f, "Select an appliance first"),
            RegistrationError::Storage(detail) => write!(f, "Failed to save: {}", detail),
        }
    }
}

impl std::error::Error for RegistrationError {}

// ============================================================================
// REPOSITORY SEAM
// ============================================================================

/// Document-store access the registration logic needs. The single per-user
/// document is the source of truth; writes are per-field, last write wins.
pub trait RegistrationRepository {
    /// Read the user's registrations. Absent document means empty store.
    fn load(&self, user_id: &str) -> Result<UserRegistrationStore>;

    /// Persist one registration under `AppliancesMap.<category>.<aid>`
    fn save_entry(
        &self,
        user_id: &str,
        category: ApplianceCategory,
        appliance: &RegisteredAppliance,
    ) -> Result<()>;
}

/// Repository over the local documents table
pub struct SqliteRegistrations<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteRegistrations<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        SqliteRegistrations { conn }
    }
}

impl RegistrationRepository for SqliteRegistrations<'_> {
    fn load(&self, user_id: &str) -> Result<UserRegistrationStore> {
        let store = match db::get_document(self.conn, user_id)? {
            Some(document) => UserRegistrationStore::from_document(&document),
            None => UserRegistrationStore::new(),
        };

        Ok(store)
    }

    fn save_entry(
        &self,
        user_id: &str,
        category: ApplianceCategory,
        appliance: &RegisteredAppliance,
    ) -> Result<()> {
        db::update_document_field(
            self.conn,
            user_id,
            &registration_field_path(category, &appliance.aid),
            json!(appliance),
        )
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Register a catalog entry for the signed-in user. The write is persisted
/// before success is reported; re-adding the same entry overwrites its slot
/// rather than duplicating it.
pub fn register(
    repo: &dyn RegistrationRepository,
    current_user: Option<&str>,
    category: ApplianceCategory,
    selection: Option<&CatalogEntry>,
) -> Result<RegisteredAppliance, RegistrationError> {
    let user_id = current_user.ok_or(RegistrationError::Authentication)?;
    let entry = selection.ok_or(RegistrationError::SelectionMissing)?;

    let appliance = RegisteredAppliance::snapshot_of(entry);
    repo.save_entry(user_id, category, &appliance)
        .map_err(|e| RegistrationError::Storage(e.to_string()))?;

    Ok(appliance)
}

/// Registrations for screen entry. A missing document or a failing store
/// reads as an empty registration set; the error is not surfaced here.
pub fn load_registrations(
    repo: &dyn RegistrationRepository,
    user_id: &str,
) -> UserRegistrationStore {
    repo.load(user_id).unwrap_or_default()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;
    use anyhow::anyhow;
    use std::cell::RefCell;

    fn entry(id: &str, usage: f64) -> CatalogEntry {
        CatalogEntry {
            category: ApplianceCategory::Tv,
            brand: "Brand".to_string(),
            model: format!("Model-{}", id),
            unique_id: id.to_string(),
            rated_usage: usage,
        }
    }

    /// In-memory repository: a plain store plus a switch to make every
    /// call fail like an unreachable backend.
    struct FakeRepo {
        store: RefCell<UserRegistrationStore>,
        fail: bool,
    }

    impl FakeRepo {
        fn new() -> Self {
            FakeRepo {
                store: RefCell::new(UserRegistrationStore::new()),
                fail: false,
            }
        }

        fn unreachable() -> Self {
            FakeRepo {
                store: RefCell::new(UserRegistrationStore::new()),
                fail: true,
            }
        }
    }

    impl RegistrationRepository for FakeRepo {
        fn load(&self, _user_id: &str) -> Result<UserRegistrationStore> {
            if self.fail {
                return Err(anyhow!("backend unavailable"));
            }
            Ok(self.store.borrow().clone())
        }

        fn save_entry(
            &self,
            _user_id: &str,
            category: ApplianceCategory,
            appliance: &RegisteredAppliance,
        ) -> Result<()> {
            if self.fail {
                return Err(anyhow!("backend unavailable"));
            }
            self.store.borrow_mut().upsert(category, appliance.clone());
            Ok(())
        }
    }

    #[test]
    fn test_register_requires_signed_in_user() {
        let repo = FakeRepo::new();

        let result = register(&repo, None, ApplianceCategory::Tv, Some(&entry("a1", 142.0)));

        assert_eq!(result.unwrap_err(), RegistrationError::Authentication);
        assert!(repo.store.borrow().is_empty());
    }

    #[test]
    fn test_register_requires_selection() {
        let repo = FakeRepo::new();

        let result = register(&repo, Some("u1"), ApplianceCategory::Tv, None);

        assert_eq!(result.unwrap_err(), RegistrationError::SelectionMissing);
        assert!(repo.store.borrow().is_empty());
    }

    #[test]
    fn test_register_snapshots_and_persists() {
        let repo = FakeRepo::new();

        let saved = register(
            &repo,
            Some("u1"),
            ApplianceCategory::Tv,
            Some(&entry("a1", 142.0)),
        )
        .unwrap();

        assert_eq!(saved.aid, "a1");
        assert_eq!(saved.usage, 142.0);
        assert_eq!(repo.store.borrow().appliances(ApplianceCategory::Tv).len(), 1);
    }

    #[test]
    fn test_register_twice_is_idempotent() {
        let repo = FakeRepo::new();
        let e = entry("a1", 142.0);

        register(&repo, Some("u1"), ApplianceCategory::Tv, Some(&e)).unwrap();
        register(&repo, Some("u1"), ApplianceCategory::Tv, Some(&e)).unwrap();

        assert_eq!(repo.store.borrow().len(), 1);
    }

    #[test]
    fn test_storage_failure_is_reported() {
        let repo = FakeRepo::unreachable();

        let result = register(
            &repo,
            Some("u1"),
            ApplianceCategory::Tv,
            Some(&entry("a1", 142.0)),
        );

        match result.unwrap_err() {
            RegistrationError::Storage(detail) => assert!(detail.contains("unavailable")),
            other => panic!("expected Storage error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_defaults_to_empty_on_failure() {
        let repo = FakeRepo::unreachable();
        assert!(load_registrations(&repo, "u1").is_empty());
    }

    #[test]
    fn test_sqlite_repository_round_trip() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        let repo = SqliteRegistrations::new(&conn);

        // Nothing registered yet
        assert!(load_registrations(&repo, "u1").is_empty());

        register(&repo, Some("u1"), ApplianceCategory::Tv, Some(&entry("a1", 142.0))).unwrap();
        register(&repo, Some("u1"), ApplianceCategory::Lamp, Some(&entry("b1", 12.0))).unwrap();

        let store = load_registrations(&repo, "u1");
        assert_eq!(store.len(), 2);
        assert_eq!(store.appliances(ApplianceCategory::Tv)[0].name, "Model-a1");

        // Another user sees nothing
        assert!(load_registrations(&repo, "u2").is_empty());
    }
}
