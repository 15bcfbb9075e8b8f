pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::salesforce::SalesforceClient;
pub use config::credentials::Credentials;
pub use config::toml_config::RelocatorConfig;
pub use core::mapping::MappingTable;
pub use core::relocator::{RelocatorOptions, ReportRelocator};
pub use domain::model::{BatchSummary, MappingRow, MoveOutcome};
pub use utils::error::{RelocatorError, Result};
