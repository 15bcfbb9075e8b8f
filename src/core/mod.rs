pub mod folder_cache;
pub mod mapping;
pub mod relocator;

pub use crate::domain::model::{BatchSummary, MappingRow, MoveOutcome};
pub use crate::domain::ports::CrmApi;
pub use crate::utils::error::Result;
