use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One instruction from the mapping file: move `report_id` into `destination_folder`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRow {
    pub report_id: String,
    pub destination_folder: String,
    pub is_private: bool,
    pub owner_username: Option<String>,
}

impl MappingRow {
    pub fn has_owner(&self) -> bool {
        self.owner_username
            .as_deref()
            .is_some_and(|owner| !owner.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Success,
    SkippedValidation(String),
    Failed(String),
    /// Dry run: the row was valid and the folder resolved, but nothing was sent.
    Planned,
}

impl fmt::Display for MoveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveOutcome::Success => write!(f, "success"),
            MoveOutcome::SkippedValidation(reason) => write!(f, "skipped ({})", reason),
            MoveOutcome::Failed(reason) => write!(f, "failed ({})", reason),
            MoveOutcome::Planned => write!(f, "planned"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub started_at: DateTime<Utc>,
    pub total_rows: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub planned: usize,
    pub folder_lookups: usize,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            total_rows: 0,
            succeeded: 0,
            skipped: 0,
            failed: 0,
            planned: 0,
            folder_lookups: 0,
            elapsed: Duration::ZERO,
        }
    }

    pub fn record(&mut self, outcome: &MoveOutcome) {
        self.total_rows += 1;
        match outcome {
            MoveOutcome::Success => self.succeeded += 1,
            MoveOutcome::SkippedValidation(_) => self.skipped += 1,
            MoveOutcome::Failed(_) => self.failed += 1,
            MoveOutcome::Planned => self.planned += 1,
        }
    }
}

/// What to do when more than one report folder carries the requested name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbiguousFolderPolicy {
    /// Use the first record returned, with a warning.
    #[default]
    First,
    /// Fail the row.
    Fail,
}

/// A folder record as returned by a SOQL query (`SELECT Id FROM Folder ...`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRecord {
    #[serde(rename = "Id")]
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub total_size: u64,
    #[serde(default = "default_done")]
    pub done: bool,
    #[serde(default)]
    pub records: Vec<FolderRecord>,
}

fn default_done() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_result_ignores_extra_record_fields() {
        let body = serde_json::json!({
            "totalSize": 1,
            "done": true,
            "records": [
                {
                    "attributes": {"type": "Folder", "url": "/services/data/v59.0/sobjects/Folder/00l1"},
                    "Id": "00l1"
                }
            ]
        });

        let result: QueryResult = serde_json::from_value(body).unwrap();
        assert_eq!(result.total_size, 1);
        assert_eq!(result.records[0].id, "00l1");
    }

    #[test]
    fn test_summary_counts_each_outcome() {
        let mut summary = BatchSummary::new(Utc::now());
        summary.record(&MoveOutcome::Success);
        summary.record(&MoveOutcome::Success);
        summary.record(&MoveOutcome::SkippedValidation("missing owner".to_string()));
        summary.record(&MoveOutcome::Failed("not found".to_string()));
        summary.record(&MoveOutcome::Planned);

        assert_eq!(summary.total_rows, 5);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.planned, 1);
    }

    #[test]
    fn test_blank_owner_is_not_an_owner() {
        let row = MappingRow {
            report_id: "00O1".to_string(),
            destination_folder: "Sales".to_string(),
            is_private: true,
            owner_username: Some("   ".to_string()),
        };
        assert!(!row.has_owner());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(MoveOutcome::Success.to_string(), "success");
        assert_eq!(MoveOutcome::Planned.to_string(), "planned");
        assert_eq!(
            MoveOutcome::SkippedValidation("private report without owner username".to_string())
                .to_string(),
            "skipped (private report without owner username)"
        );
        assert_eq!(
            MoveOutcome::Failed("Folder not found: Archive".to_string()).to_string(),
            "failed (Folder not found: Archive)"
        );
    }
}
