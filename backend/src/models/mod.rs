//! Domain models for the benchdiff pipeline.
//!
//! This module contains the core data structures shared by every stage:
//!
//! - [`Technology`] - Data-access technology under benchmark
//! - [`Period`] - Measurement epoch (before / after the optimization work)
//! - [`Operation`] - CRUD-style category of a benchmarked method
//! - [`RawBenchmarkRow`] - One line of a report, before normalization
//! - [`UnifiedRecord`] - Canonical, normalized benchmark record
//! - [`Dataset`] - Immutable snapshot of every record of a load

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Technology
// =============================================================================

/// Data-access technology that produced a benchmark report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Technology {
    /// Entity Framework Core (full ORM).
    #[serde(rename = "EFCore")]
    EfCore,
    /// ADO.NET (low-level driver API).
    AdoNet,
    /// Dapper (micro-ORM).
    Dapper,
}

impl Technology {
    /// All technologies, in report order.
    pub const ALL: [Technology; 3] = [Technology::EfCore, Technology::AdoNet, Technology::Dapper];

    /// Display name used by the presentation layer.
    pub fn label(&self) -> &'static str {
        match self {
            Self::EfCore => "Entity Framework",
            Self::AdoNet => "ADO.NET",
            Self::Dapper => "Dapper",
        }
    }

    /// Short identifier, as used in configuration and exports.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EfCore => "EFCore",
            Self::AdoNet => "AdoNet",
            Self::Dapper => "Dapper",
        }
    }

    /// Prefixes the report generator puts in front of method labels
    /// (`"EF: Get customers"`, `"ADO.NET: Get customers"`).
    pub fn method_prefixes(&self) -> &'static [&'static str] {
        match self {
            Self::EfCore => &["EF Core:", "EFCore:", "EF:"],
            Self::AdoNet => &["ADO.NET:", "AdoNet:", "ADO:"],
            Self::Dapper => &["Dapper:"],
        }
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Period
// =============================================================================

/// Measurement epoch of a report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Period {
    /// Before the optimization work (original CRUD benchmarks).
    Before,
    /// After the optimization work (optimized query benchmarks).
    After,
}

impl Period {
    /// Both periods, baseline first.
    pub const ALL: [Period; 2] = [Period::Before, Period::After];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Before => "Before",
            Self::After => "After",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Operation
// =============================================================================

/// CRUD-style category of a benchmarked method.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    /// Read-style method of the optimized (after) benchmarks.
    Query,
    /// No keyword group matched.
    Other,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Create,
        Operation::Read,
        Operation::Update,
        Operation::Delete,
        Operation::Query,
        Operation::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Read => "Read",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::Query => "Query",
            Self::Other => "Other",
        }
    }

    /// True for the four CRUD categories.
    pub fn is_crud(&self) -> bool {
        matches!(self, Self::Create | Self::Read | Self::Update | Self::Delete)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Raw row
// =============================================================================

/// One line from a source table, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBenchmarkRow {
    /// 1-based line number in the source file (header is line 1).
    pub line: usize,
    /// Free-text method label.
    pub method: String,
    /// Magnitude + unit string of the mean elapsed time.
    pub mean_text: String,
    /// Magnitude + unit string of the allocated memory, if the table has the column.
    pub allocated_text: Option<String>,
}

// =============================================================================
// Unified record
// =============================================================================

/// Canonical benchmark record after normalization and classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedRecord {
    pub technology: Technology,
    pub period: Period,
    pub operation: Operation,
    /// Method label with quotes and technology prefix removed.
    pub method: String,
    /// Mean elapsed time in microseconds.
    pub mean_time_us: f64,
    /// Allocated memory in kilobytes; absent when the table has no such column.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub allocated_kb: Option<f64>,
    /// More than one keyword group matched the method label.
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub ambiguous: bool,
}

// =============================================================================
// Dataset
// =============================================================================

/// Immutable snapshot of every record produced by one load.
///
/// Built once by the loader and passed by reference to the analysis
/// functions. There is no way to mutate it after construction.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Dataset {
    records: Vec<UnifiedRecord>,
}

impl Dataset {
    pub(crate) fn new(records: Vec<UnifiedRecord>) -> Self {
        Self { records }
    }

    /// All records, in load order.
    pub fn records(&self) -> &[UnifiedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records matching a predicate.
    pub fn filter<'a, F>(&'a self, predicate: F) -> impl Iterator<Item = &'a UnifiedRecord> + 'a
    where
        F: Fn(&UnifiedRecord) -> bool + 'a,
    {
        self.records.iter().filter(move |r| predicate(r))
    }
}

impl FromIterator<UnifiedRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = UnifiedRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// =============================================================================
// Tests
// =============================================================================
