//! # benchdiff - Before/after comparison of data-access benchmark reports
//!
//! benchdiff loads BenchmarkDotNet-style reports for Entity Framework Core,
//! ADO.NET and Dapper, measured before and after an optimization pass, and
//! turns them into one normalized dataset with aggregate views on top.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  6 reports  │────▶│   Parser    │────▶│   Loader    │────▶│  Analysis   │
//! │ (ISO/UTF8)  │     │  (auto-enc) │     │ units+class │     │   (views)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use benchdiff::{compute_view, load_directory, AnalysisView, Classifier};
//!
//! let report = load_directory("./reports".as_ref(), &Classifier::default());
//! println!("{}", report.summary());
//! let view = compute_view(&report.dataset, AnalysisView::PerformanceImprovement);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (Technology, Period, Operation, UnifiedRecord, Dataset)
//! - [`units`] - Time and memory unit normalization
//! - [`classify`] - Source table and keyword-group classification
//! - [`parser`] - Report parsing with auto-detection
//! - [`loader`] - Dataset loading and the load report
//! - [`analysis`] - Aggregation engine and named views
//! - [`config`] - Configuration defaults and JSON overrides
//! - [`validation`] - JSON Schema validation of overrides
//! - [`export`] - JSON and CSV export
//! - [`logs`] - Pipeline progress logging

// Core modules
pub mod error;
pub mod models;

// Normalization and classification
pub mod classify;
pub mod units;

// Parsing and loading
pub mod loader;
pub mod parser;

// Aggregation
pub mod analysis;

// Configuration
pub mod config;
pub mod validation;

// Output
pub mod export;
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, CsvError, ExportError, PipelineError, PipelineResult, RowError, SourceError,
    UnitError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Dataset, Operation, Period, RawBenchmarkRow, Technology, UnifiedRecord};

// =============================================================================
// Re-exports - Units
// =============================================================================

pub use units::{normalize, normalize_memory, normalize_time, UnitKind};

// =============================================================================
// Re-exports - Classification
// =============================================================================

pub use classify::{
    clean_method_label, Classification, ClassificationRules, Classifier, GroupTarget,
    KeywordGroup, ReadPolicy, SourceCatalog, SourceTable,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto,
    BenchmarkColumns, ParseResult,
};

// =============================================================================
// Re-exports - Loader
// =============================================================================

pub use loader::{
    load_directory, load_files, load_tables, LoadReport, RawTable, SkippedRow, TableFailure,
    TableSummary,
};

// =============================================================================
// Re-exports - Analysis
// =============================================================================

pub use analysis::stats::Distribution;
pub use analysis::{
    aggregate, by_period, by_technology, by_technology_operation, compute_view, counts,
    crud_comparison, distribution, improvement, improvement_by_technology,
    improvement_by_technology_operation, improvement_pct, method_comparison, overall_improvement,
    period_average, technology_average, technology_operation_average, Aggregate, AnalysisView,
    GroupBy, GroupKey, Improvement, ImprovementReport, ImprovementRow, ViewOutput,
};

// =============================================================================
// Re-exports - Configuration & Export
// =============================================================================

pub use config::AnalysisConfig;
pub use export::{aggregates_to_csv, export_records, export_view, to_json, ExportFormat};
