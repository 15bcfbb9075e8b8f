use crate::domain::model::MappingRow;
use crate::utils::error::{RelocatorError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const REQUIRED_COLUMNS: [&str; 4] = [
    "report_id",
    "destination_folder",
    "is_private",
    "owner_username",
];

/// A data row of the mapping file. `row` is the 1-based position among data rows.
#[derive(Debug)]
pub struct MappingEntry {
    pub row: usize,
    pub parsed: Result<MappingRow>,
}

/// Parsed mapping file. The header has passed the schema check; individual
/// rows may still be invalid and are failed one by one during processing.
#[derive(Debug)]
pub struct MappingTable {
    entries: Vec<MappingEntry>,
}

struct ColumnIndex {
    report_id: usize,
    destination_folder: usize,
    is_private: usize,
    owner_username: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let names: Vec<&str> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim())
            .collect();
        let position = |column: &str| names.iter().position(|name| *name == column);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| position(**column).is_none())
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(RelocatorError::SchemaError { missing });
        }

        // every required column was found above
        let index = |column: &str| position(column).unwrap_or_default();
        Ok(Self {
            report_id: index("report_id"),
            destination_folder: index("destination_folder"),
            is_private: index("is_private"),
            owner_username: index("owner_username"),
        })
    }

    fn parse(&self, row: usize, record: &StringRecord) -> Result<MappingRow> {
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();
        let invalid = |message: String| RelocatorError::InvalidRowError { row, message };

        let report_id = field(self.report_id);
        if report_id.is_empty() {
            return Err(invalid("report_id is empty".to_string()));
        }

        let destination_folder = field(self.destination_folder);
        if destination_folder.is_empty() {
            return Err(invalid("destination_folder is empty".to_string()));
        }

        let raw_private = field(self.is_private);
        let is_private = parse_bool_ish(raw_private).ok_or_else(|| {
            invalid(format!("is_private has unrecognised value '{}'", raw_private))
        })?;

        let owner = field(self.owner_username);
        let owner_username = (!owner.is_empty()).then(|| owner.to_string());

        Ok(MappingRow {
            report_id: report_id.to_string(),
            destination_folder: destination_folder.to_string(),
            is_private,
            owner_username,
        })
    }
}

/// Accepts the usual spreadsheet spellings of a boolean. Empty means false.
pub fn parse_bool_ish(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "f" | "no" | "n" | "0" => Some(false),
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        _ => None,
    }
}

impl MappingTable {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Opening mapping file: {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Reads the whole table. Fails on an unreadable source or a missing
    /// required column; malformed rows are kept as row-level errors.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().trim(Trim::Headers).from_reader(reader);
        let headers = rdr.headers()?.clone();
        let columns = ColumnIndex::from_headers(&headers)?;

        let mut entries = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let row = i + 1;
            let parsed = match record {
                Ok(record) => columns.parse(row, &record),
                Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
                Err(e) => Err(RelocatorError::InvalidRowError {
                    row,
                    message: e.to_string(),
                }),
            };
            entries.push(MappingEntry { row, parsed });
        }

        tracing::debug!("Mapping file contains {} data rows", entries.len());
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
