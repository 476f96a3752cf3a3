//! Error types for the benchdiff pipeline.
//!
//! - [`UnitError`] - Magnitude/unit parsing errors (row-local)
//! - [`RowError`] - Why a single report row was skipped
//! - [`CsvError`] - Report file parsing errors
//! - [`SourceError`] - Table-level failures (fatal to one table only)
//! - [`ConfigError`] - Configuration override errors
//! - [`ExportError`] - Writing records and views out
//! - [`PipelineError`] - Top-level errors of the binary
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;
use thiserror::Error;

use crate::units::UnitKind;

// =============================================================================
// Unit Normalization Errors
// =============================================================================

/// A magnitude + unit token that could not be normalized.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UnitError {
    /// No recognized unit suffix.
    #[error("Malformed {kind} value '{input}': unknown unit '{unit}'")]
    UnknownUnit {
        kind: UnitKind,
        input: String,
        unit: String,
    },

    /// The numeric portion is not a number.
    #[error("Malformed {kind} value '{input}': cannot parse magnitude")]
    BadMagnitude { kind: UnitKind, input: String },

    /// Canonical values are never negative.
    #[error("Malformed {kind} value '{input}': negative magnitude")]
    Negative { kind: UnitKind, input: String },
}

impl UnitError {
    /// The raw token that failed.
    pub fn input(&self) -> &str {
        match self {
            Self::UnknownUnit { input, .. }
            | Self::BadMagnitude { input, .. }
            | Self::Negative { input, .. } => input,
        }
    }
}

// =============================================================================
// Row Errors
// =============================================================================

/// Why a report row was skipped. Never fatal to the table.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RowError {
    /// A required column is missing or empty on this row.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// `Mean` or `Allocated` could not be normalized.
    #[error(transparent)]
    MalformedUnit(#[from] UnitError),
}

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors while reading a report file.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid CSV format.
    #[error("Invalid CSV format: {0}")]
    ParseError(String),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// A header the loader needs is not present.
    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),
}

impl From<csv::Error> for CsvError {
    fn from(e: csv::Error) -> Self {
        CsvError::ParseError(e.to_string())
    }
}

// =============================================================================
// Source Table Errors
// =============================================================================

/// A source table that could not be loaded. Sibling tables are unaffected.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The identity is not one of the configured source tables.
    #[error("Unknown source table '{0}'")]
    UnknownSource(String),

    /// A second table with an identity that was already loaded.
    #[error("Duplicate source table '{0}' ignored")]
    DuplicateSource(String),

    /// The table file is missing or unreadable.
    #[error("Source table unavailable at {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The table was read but is not a usable report.
    #[error("Source table '{identity}' is not a valid report: {source}")]
    InvalidTable {
        identity: String,
        #[source]
        source: CsvError,
    },
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading configuration overrides.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error.
    #[error("Config IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error.
    #[error("Config JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Schema validation failed.
    #[error("Config validation failed: {}", errors.join("; "))]
    SchemaError { errors: Vec<String> },

    /// Well-formed but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while serializing records or views.
#[derive(Debug, Error)]
pub enum ExportError {
    /// JSON serialization failed.
    #[error("JSON export error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization failed.
    #[error("CSV export error: {0}")]
    Csv(String),

    /// The view has no single table of aggregates to write as CSV.
    #[error("View '{0}' has no tabular form; use JSON")]
    NotTabular(String),

    /// IO error.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        ExportError::Csv(e.to_string())
    }
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level errors surfaced by the command line.
///
/// The library reports partial loads through [`crate::loader::LoadReport`];
/// this type is only for conditions where there is nothing left to analyse.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Source table error.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Unit error.
    #[error("Unit error: {0}")]
    Unit(#[from] UnitError),

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Every table failed or every row was skipped.
    #[error("No benchmark records loaded ({failed_tables} table(s) failed, {skipped_rows} row(s) skipped)")]
    NoData {
        failed_tables: usize,
        skipped_rows: usize,
    },

    /// IO error while writing output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for unit normalization.
pub type UnitResult<T> = Result<T, UnitError>;

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for source table operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
