use crate::utils::error::RelocatorError;
use std::collections::HashMap;

/// Why a folder name could not be turned into an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderLookupFailure {
    NotFound,
    Ambiguous(u64),
    Failed(String),
}

impl FolderLookupFailure {
    pub fn from_error(error: &RelocatorError) -> Self {
        match error {
            RelocatorError::FolderNotFound { .. } => Self::NotFound,
            RelocatorError::AmbiguousFolder { count, .. } => Self::Ambiguous(*count),
            other => Self::Failed(other.to_string()),
        }
    }

    pub fn to_error(&self, folder: &str) -> RelocatorError {
        match self {
            Self::NotFound => RelocatorError::FolderNotFound {
                folder: folder.to_string(),
            },
            Self::Ambiguous(count) => RelocatorError::AmbiguousFolder {
                folder: folder.to_string(),
                count: *count,
            },
            Self::Failed(reason) => RelocatorError::FolderLookupFailed {
                folder: folder.to_string(),
                reason: reason.clone(),
            },
        }
    }
}

pub type CachedFolder = std::result::Result<String, FolderLookupFailure>;

/// Folder name to folder id, for the lifetime of one batch run.
///
/// Failed lookups are remembered too, so every distinct name costs at most
/// one remote query per run.
#[derive(Debug, Default)]
pub struct FolderIdCache {
    entries: HashMap<String, CachedFolder>,
}

impl FolderIdCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, folder_name: &str) -> Option<&CachedFolder> {
        self.entries.get(folder_name)
    }

    pub fn insert_resolved(&mut self, folder_name: &str, folder_id: &str) {
        self.entries
            .insert(folder_name.to_string(), Ok(folder_id.to_string()));
    }

    pub fn insert_failure(&mut self, folder_name: &str, failure: FolderLookupFailure) {
        self.entries.insert(folder_name.to_string(), Err(failure));
    }

    /// Number of distinct names looked up so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
