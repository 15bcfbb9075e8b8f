use crate::adapters::soql;
use crate::core::folder_cache::{FolderIdCache, FolderLookupFailure};
use crate::core::mapping::{MappingEntry, MappingTable};
use crate::domain::model::{AmbiguousFolderPolicy, BatchSummary, MappingRow, MoveOutcome};
use crate::domain::ports::CrmApi;
use crate::utils::error::{RelocatorError, Result};
use chrono::Utc;
use serde_json::{Map, Value};
use std::io::Read;
use std::time::Instant;
use tracing::Instrument;

const REPORT_OBJECT: &str = "Report";
const FOLDER_FIELD: &str = "FolderId";

#[derive(Debug, Clone, Default)]
pub struct RelocatorOptions {
    /// Resolve and validate every row but send no updates.
    pub dry_run: bool,
    pub on_ambiguous: AmbiguousFolderPolicy,
}

/// Moves reports between folders according to a mapping table.
pub struct ReportRelocator<C: CrmApi> {
    api: C,
    options: RelocatorOptions,
}

impl<C: CrmApi> ReportRelocator<C> {
    pub fn new(api: C) -> Self {
        Self::with_options(api, RelocatorOptions::default())
    }

    pub fn with_options(api: C, options: RelocatorOptions) -> Self {
        Self { api, options }
    }

    /// Cache-or-fetch the id of the report folder called `folder_name`.
    ///
    /// Both hits and misses are stored in `cache`, so a name is queried at most
    /// once per run.
    pub async fn resolve_folder_id(
        &self,
        cache: &mut FolderIdCache,
        folder_name: &str,
    ) -> Result<String> {
        if let Some(cached) = cache.get(folder_name) {
            tracing::debug!("Folder '{}' served from cache", folder_name);
            return cached
                .clone()
                .map_err(|failure| failure.to_error(folder_name));
        }

        match self.lookup_folder(folder_name).await {
            Ok(folder_id) => {
                tracing::debug!("Resolved folder '{}' to {}", folder_name, folder_id);
                cache.insert_resolved(folder_name, &folder_id);
                Ok(folder_id)
            }
            Err(e) => {
                tracing::error!("Error getting folder ID for {}: {}", folder_name, e);
                cache.insert_failure(folder_name, FolderLookupFailure::from_error(&e));
                Err(e)
            }
        }
    }

    async fn lookup_folder(&self, folder_name: &str) -> Result<String> {
        let result = self
            .api
            .query(&soql::report_folder_query(folder_name))
            .await?;

        let count = result.total_size.max(result.records.len() as u64);
        let first = result
            .records
            .into_iter()
            .next()
            .ok_or_else(|| RelocatorError::FolderNotFound {
                folder: folder_name.to_string(),
            })?;

        if count > 1 {
            match self.options.on_ambiguous {
                AmbiguousFolderPolicy::Fail => {
                    return Err(RelocatorError::AmbiguousFolder {
                        folder: folder_name.to_string(),
                        count,
                    });
                }
                AmbiguousFolderPolicy::First => {
                    tracing::warn!(
                        "⚠️ {} report folders are named '{}'; using the first ({})",
                        count,
                        folder_name,
                        first.id
                    );
                }
            }
        }

        Ok(first.id)
    }

    /// Point the report at a new folder. Failures are logged, never raised.
    pub async fn move_report(&self, report_id: &str, destination_folder_id: &str) -> bool {
        let mut fields = Map::new();
        fields.insert(
            FOLDER_FIELD.to_string(),
            Value::String(destination_folder_id.to_string()),
        );

        match self.api.update(REPORT_OBJECT, report_id, &fields).await {
            Ok(()) => {
                tracing::info!(
                    "Successfully moved report {} to folder {}",
                    report_id,
                    destination_folder_id
                );
                true
            }
            Err(e) => {
                tracing::error!("Failed to move report {}: {}", report_id, e);
                false
            }
        }
    }

    /// Parse a mapping file and process every row.
    ///
    /// Only an unreadable source or a missing required column is an error;
    /// row problems end up in the returned summary.
    pub async fn process_mapping_file<R: Read>(&self, reader: R) -> Result<BatchSummary> {
        let table = MappingTable::from_reader(reader).inspect_err(|e| {
            tracing::error!("Error processing mapping file: {}", e);
        })?;
        Ok(self.process_table(&table).await)
    }

    pub async fn process_table(&self, table: &MappingTable) -> BatchSummary {
        let started = Instant::now();
        let mut summary = BatchSummary::new(Utc::now());
        let mut cache = FolderIdCache::new();

        tracing::info!("📋 Processing {} mapping rows", table.len());
        if self.options.dry_run {
            tracing::info!("🔍 DRY RUN MODE - reports will not be moved");
        }

        for entry in table.entries() {
            let report_id = entry
                .parsed
                .as_ref()
                .map(|row| row.report_id.as_str())
                .unwrap_or("-");
            let span = tracing::info_span!("row", row = entry.row, report_id = %report_id);

            let outcome = self.process_entry(entry, &mut cache).instrument(span).await;
            summary.record(&outcome);
        }

        summary.folder_lookups = cache.len();
        summary.elapsed = started.elapsed();

        tracing::info!(
            "📊 Batch complete - rows: {}, moved: {}, planned: {}, skipped: {}, failed: {}, folder lookups: {}, time: {:?}",
            summary.total_rows,
            summary.succeeded,
            summary.planned,
            summary.skipped,
            summary.failed,
            summary.folder_lookups,
            summary.elapsed
        );
        summary
    }

    async fn process_entry(&self, entry: &MappingEntry, cache: &mut FolderIdCache) -> MoveOutcome {
        let outcome = match &entry.parsed {
            Ok(row) => self.process_row(row, cache).await.unwrap_or_else(|e| {
                tracing::error!("❌ Error processing row {}: {}", entry.row, e);
                MoveOutcome::Failed(e.to_string())
            }),
            Err(e) => {
                tracing::error!("❌ {}", e);
                MoveOutcome::Failed(e.to_string())
            }
        };

        tracing::debug!("Row {} outcome: {}", entry.row, outcome);
        outcome
    }

    async fn process_row(&self, row: &MappingRow, cache: &mut FolderIdCache) -> Result<MoveOutcome> {
        let destination_id = self
            .resolve_folder_id(cache, &row.destination_folder)
            .await?;

        // presence only; who the owner is does not matter here
        if row.is_private && !row.has_owner() {
            tracing::warn!(
                "⚠️ Skipping private report {}: missing owner username",
                row.report_id
            );
            return Ok(MoveOutcome::SkippedValidation(
                "private report without owner username".to_string(),
            ));
        }

        if self.options.dry_run {
            tracing::info!(
                "🔍 Would move report {} to folder '{}' ({})",
                row.report_id,
                row.destination_folder,
                destination_id
            );
            return Ok(MoveOutcome::Planned);
        }

        if self.move_report(&row.report_id, &destination_id).await {
            tracing::info!("✅ Processed report {} successfully", row.report_id);
            Ok(MoveOutcome::Success)
        } else {
            tracing::error!("Failed to process report {}", row.report_id);
            Ok(MoveOutcome::Failed(format!(
                "update of report {} was rejected",
                row.report_id
            )))
        }
    }
}
