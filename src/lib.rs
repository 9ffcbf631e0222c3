// Money Manager - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod import;
pub mod logging;
pub mod mapper;
pub mod pagination;
pub mod reconciliation; // Reference reuse for Person / IncomeSource
pub mod service;
pub mod validation;
pub mod views;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::Config;
pub use db::{
    Event,
    open_database, setup_database,
    find_income_by_id, find_all_incomes, save_income, delete_income_by_id, count_incomes,
    insert_event, get_events_for_entity,
};
pub use entities::{Income, IncomeSource, MatchMode, Person, Sex};
pub use error::{Error, Result};
pub use import::{load_csv, read_csv, CsvRow};
pub use pagination::PageRequest;
pub use reconciliation::{reconcile_income_source, reconcile_person, Reconciled};
pub use service::{ImportSummary, IncomeService};
pub use validation::{ValidationError, ValidationResult};
pub use views::{IncomeSourceView, IncomeView, PersonView};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
