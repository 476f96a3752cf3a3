//! Dataset loading: report tables in, one immutable [`Dataset`] out.
//!
//! ```text
//! ┌──────────────┐   ┌────────┐   ┌────────────┐   ┌────────────┐
//! │ 6 report     │──▶│ parser │──▶│ units +    │──▶│  Dataset   │
//! │ tables (CSV) │   │        │   │ classify   │   │ + report   │
//! └──────────────┘   └────────┘   └────────────┘   └────────────┘
//! ```
//!
//! Failure policy:
//!
//! - a bad row (missing field, malformed unit) is skipped and recorded
//! - a bad table (unknown identity, missing file, unusable header) is
//!   recorded and the other tables still load
//!
//! Tables are always concatenated in source-catalog order, rows in file
//! order, duplicates preserved.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::classify::{Classifier, SourceTable};
use crate::error::{RowError, SourceError};
use crate::logs::{
    log_error, log_info, log_info_indent, log_success, log_warning, log_warning_indent,
};
use crate::models::{Dataset, Period, RawBenchmarkRow, Technology, UnifiedRecord};
use crate::parser::{self, BenchmarkColumns, MEAN_COLUMN};
use crate::units::{normalize_memory, normalize_time};

/// Skipped rows listed individually in the log before summarizing.
const MAX_LOGGED_ROWS: usize = 5;

/// An in-memory source table: raw rows plus the identity of the report.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Source identity (report file name).
    pub identity: String,
    pub rows: Vec<RawBenchmarkRow>,
    /// Rows already rejected while extracting fields.
    pub rejected: Vec<(usize, RowError)>,
    /// Encoding and delimiter when the table came from a file.
    pub encoding: Option<String>,
    pub delimiter: Option<char>,
}

impl RawTable {
    pub fn new(identity: impl Into<String>, rows: Vec<RawBenchmarkRow>) -> Self {
        Self {
            identity: identity.into(),
            rows,
            ..Self::default()
        }
    }

    /// Read and parse a report file. The identity is the file name.
    pub fn from_file(path: &Path) -> Result<Self, SourceError> {
        let identity = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        let bytes = std::fs::read(path).map_err(|source| SourceError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_bytes(identity, &bytes)
    }

    /// Parse report bytes (encoding and delimiter auto-detected).
    pub fn from_bytes(identity: impl Into<String>, bytes: &[u8]) -> Result<Self, SourceError> {
        let identity = identity.into();
        let invalid = |source| SourceError::InvalidTable {
            identity: identity.clone(),
            source,
        };

        let parsed = parser::parse_bytes_auto(bytes).map_err(invalid)?;
        let columns = BenchmarkColumns::locate(&parsed.headers).map_err(invalid)?;

        let mut rows = Vec::with_capacity(parsed.rows.len());
        let mut rejected = Vec::new();
        for row in &parsed.rows {
            match columns.extract(row) {
                Ok(raw) => rows.push(raw),
                Err(e) => rejected.push((row.line, e)),
            }
        }

        Ok(Self {
            identity,
            rows,
            rejected,
            encoding: Some(parsed.encoding),
            delimiter: Some(parsed.delimiter),
        })
    }
}

/// A row that was skipped.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedRow {
    /// Source identity of the table.
    pub table: String,
    /// 1-based line number in the source file.
    pub line: usize,
    pub reason: String,
    #[serde(skip)]
    pub error: RowError,
}

/// A table that could not be loaded.
#[derive(Debug, Serialize)]
pub struct TableFailure {
    pub identity: String,
    pub reason: String,
    #[serde(skip)]
    pub error: SourceError,
}

impl TableFailure {
    fn new(identity: impl Into<String>, error: SourceError) -> Self {
        Self {
            identity: identity.into(),
            reason: error.to_string(),
            error,
        }
    }
}

/// Per-table loading statistics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub identity: String,
    pub technology: Technology,
    pub period: Period,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
    pub rows_read: usize,
    pub rows_loaded: usize,
    pub rows_skipped: usize,
    pub ambiguous_labels: usize,
}

/// Everything a load produced: the dataset and an account of what was left out.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub dataset: Dataset,
    pub tables: Vec<TableSummary>,
    pub skipped_rows: Vec<SkippedRow>,
    pub failed_tables: Vec<TableFailure>,
    /// When the load finished (serialized as RFC 3339).
    pub loaded_at: DateTime<Utc>,
}

impl LoadReport {
    pub fn failed_table_count(&self) -> usize {
        self.failed_tables.len()
    }

    pub fn skipped_row_count(&self) -> usize {
        self.skipped_rows.len()
    }

    /// No table failed and no row was skipped.
    pub fn is_complete(&self) -> bool {
        self.failed_tables.is_empty() && self.skipped_rows.is_empty()
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        format!(
            "Loaded: {} records from {} table(s), {} row(s) skipped, {} table(s) failed",
            self.dataset.len(),
            self.tables.len(),
            self.skipped_rows.len(),
            self.failed_tables.len()
        )
    }
}

/// Load every table of the classifier's catalog from a directory.
///
/// Missing files are recorded as [`SourceError::SourceUnavailable`]; the
/// other tables load normally.
pub fn load_directory(dir: &Path, classifier: &Classifier) -> LoadReport {
    log_info(format!("📂 Loading benchmark reports from {}", dir.display()));

    let mut inputs = Vec::new();
    let mut failures = Vec::new();
    for table in classifier.catalog().tables() {
        match RawTable::from_file(&dir.join(&table.file)) {
            Ok(raw) => inputs.push(raw),
            Err(e) => failures.push(TableFailure::new(table.file.clone(), e)),
        }
    }

    finish(inputs, failures, classifier)
}

/// Load an explicit list of report files. Identities are the file names.
pub fn load_files(paths: &[PathBuf], classifier: &Classifier) -> LoadReport {
    log_info(format!("📂 Loading {} benchmark report(s)", paths.len()));

    let mut inputs = Vec::new();
    let mut failures = Vec::new();
    for path in paths {
        match RawTable::from_file(path) {
            Ok(raw) => inputs.push(raw),
            Err(e) => failures.push(TableFailure::new(path.display().to_string(), e)),
        }
    }

    finish(inputs, failures, classifier)
}

/// Load in-memory tables.
pub fn load_tables(tables: Vec<RawTable>, classifier: &Classifier) -> LoadReport {
    finish(tables, Vec::new(), classifier)
}

fn finish(
    inputs: Vec<RawTable>,
    mut failed_tables: Vec<TableFailure>,
    classifier: &Classifier,
) -> LoadReport {
    // Unknown identities fail here; known ones are put in catalog order
    let mut resolved: Vec<(usize, RawTable)> = Vec::with_capacity(inputs.len());
    for raw in inputs {
        match classifier.catalog().position(&raw.identity) {
            Some(pos) => resolved.push((pos, raw)),
            None => {
                let identity = raw.identity.clone();
                failed_tables.push(TableFailure::new(
                    identity.clone(),
                    SourceError::UnknownSource(identity),
                ));
            }
        }
    }
    // Stable sort: the first copy of a repeated identity stays first
    resolved.sort_by_key(|(pos, _)| *pos);
    let mut unique: Vec<(usize, RawTable)> = Vec::with_capacity(resolved.len());
    for (pos, raw) in resolved {
        if unique.last().is_some_and(|(last, _)| *last == pos) {
            let identity = raw.identity.clone();
            failed_tables.push(TableFailure::new(
                identity.clone(),
                SourceError::DuplicateSource(identity),
            ));
        } else {
            unique.push((pos, raw));
        }
    }

    let mut records = Vec::new();
    let mut tables = Vec::new();
    let mut skipped_rows = Vec::new();

    for (pos, raw) in unique {
        let table = &classifier.catalog().tables()[pos];
        let summary = load_table(&raw, table, classifier, &mut records, &mut skipped_rows);
        tables.push(summary);
    }

    for failure in &failed_tables {
        log_error(format!("Table skipped: {}", failure.reason));
    }
    if !failed_tables.is_empty() {
        log_warning(format!(
            "Partial dataset: {} of {} table(s) could not be used",
            failed_tables.len(),
            failed_tables.len() + tables.len()
        ));
    }

    let report = LoadReport {
        dataset: Dataset::new(records),
        tables,
        skipped_rows,
        failed_tables,
        loaded_at: Utc::now(),
    };
    log_success(report.summary());
    report
}

/// Normalize and classify one table, appending to `records`.
fn load_table(
    raw: &RawTable,
    table: &SourceTable,
    classifier: &Classifier,
    records: &mut Vec<UnifiedRecord>,
    skipped: &mut Vec<SkippedRow>,
) -> TableSummary {
    log_info(format!(
        "📄 {} ({} / {})",
        raw.identity, table.technology, table.period
    ));

    let skipped_before = skipped.len();
    let mut loaded = 0;
    let mut ambiguous = 0;

    for (line, error) in &raw.rejected {
        skipped.push(SkippedRow {
            table: raw.identity.clone(),
            line: *line,
            reason: error.to_string(),
            error: error.clone(),
        });
    }

    for row in &raw.rows {
        match unify_row(row, table, classifier) {
            Ok(record) => {
                if record.ambiguous {
                    ambiguous += 1;
                    log_warning_indent(
                        format!(
                            "Ambiguous method label '{}' classified as {}",
                            row.method, record.operation
                        ),
                        1,
                    );
                }
                records.push(record);
                loaded += 1;
            }
            Err(error) => skipped.push(SkippedRow {
                table: raw.identity.clone(),
                line: row.line,
                reason: error.to_string(),
                error,
            }),
        }
    }

    // Rejected rows were recorded first; put the table's skips back in line order
    skipped[skipped_before..].sort_by_key(|s| s.line);
    let table_skips = &skipped[skipped_before..];

    for skip in table_skips.iter().take(MAX_LOGGED_ROWS) {
        log_warning_indent(format!("Line {} skipped: {}", skip.line, skip.reason), 1);
    }
    if table_skips.len() > MAX_LOGGED_ROWS {
        let more = table_skips.len() - MAX_LOGGED_ROWS;
        log_warning_indent(format!("... +{} more skipped rows", more), 1);
    }
    log_info_indent(format!("{} record(s) loaded", loaded), 1);

    TableSummary {
        identity: raw.identity.clone(),
        technology: table.technology,
        period: table.period,
        encoding: raw.encoding.clone(),
        delimiter: raw.delimiter,
        rows_read: raw.rows.len() + raw.rejected.len(),
        rows_loaded: loaded,
        rows_skipped: table_skips.len(),
        ambiguous_labels: ambiguous,
    }
}

/// Normalize and classify a single raw row.
pub fn unify_row(
    row: &RawBenchmarkRow,
    table: &SourceTable,
    classifier: &Classifier,
) -> Result<UnifiedRecord, RowError> {
    let mean_time_us =
        normalize_time(&row.mean_text)?.ok_or(RowError::MissingField(MEAN_COLUMN))?;
    let allocated_kb = match row.allocated_text.as_deref() {
        Some(text) => normalize_memory(text)?,
        None => None,
    };
    let class = classifier.classify_in(&row.method, table);

    Ok(UnifiedRecord {
        technology: class.technology,
        period: class.period,
        operation: class.operation,
        method: class.method,
        mean_time_us,
        allocated_kb,
        ambiguous: class.ambiguous,
    })
}
