// Home Energy Tracker - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod db;
pub mod catalog;
pub mod store;
pub mod recommend;
pub mod aggregate;
pub mod auth;
pub mod registration;
pub mod usage_log;
pub mod rooms;

// Re-export commonly used types
pub use db::{setup_database, StoredUser};
pub use catalog::{ApplianceCategory, CatalogEntry, CatalogRegistry};
pub use store::{
    registration_field_path, RegisteredAppliance, UserRegistrationStore, APPLIANCES_MAP_FIELD,
};
pub use recommend::{recommend, AVERAGE_USAGE_KWH, RECOMMENDATION_LIMIT};
pub use aggregate::{aggregate, UsageSummary};
pub use registration::{
    load_registrations, register, RegistrationError, RegistrationRepository, SqliteRegistrations,
};
pub use usage_log::{
    current_month_range, default_month_ranges, log_usage, month_ranges, UsageEntry,
};
pub use rooms::Room;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
