//! Record classification.
//!
//! Two lookup tables drive classification, both plain data so they can be
//! replaced by a configuration override:
//!
//! - [`SourceCatalog`] - which report file is which (technology, period)
//! - [`ClassificationRules`] - ordered keyword groups mapping a method
//!   label to an [`Operation`]
//!
//! ```text
//! "CrudBenchmarks-report.csv" ──▶ SourceCatalog ──▶ (EFCore, Before)
//! "ReadCustomer"              ──▶ KeywordGroups  ──▶ Read
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{SourceError, SourceResult};
use crate::models::{Operation, Period, Technology};

// =============================================================================
// Source catalog
// =============================================================================

/// One entry of the source table: a report file and what it measured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceTable {
    /// File name of the report (the source identity).
    pub file: String,
    pub technology: Technology,
    pub period: Period,
}

impl SourceTable {
    pub fn new(file: impl Into<String>, technology: Technology, period: Period) -> Self {
        Self {
            file: file.into(),
            technology,
            period,
        }
    }
}

/// The fixed, ordered set of source tables.
///
/// Order matters: the loader concatenates tables in catalog order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceCatalog {
    tables: Vec<SourceTable>,
}

impl Default for SourceCatalog {
    /// The six report files of the original benchmark runs.
    fn default() -> Self {
        Self {
            tables: vec![
                SourceTable::new("CrudBenchmarks-report.csv", Technology::EfCore, Period::Before),
                SourceTable::new("AdonetBenchmarks-report.csv", Technology::AdoNet, Period::Before),
                SourceTable::new("DapperBenchmarks-report.csv", Technology::Dapper, Period::Before),
                SourceTable::new(
                    "PruebasDeRendimiento.BenchMarks_Despues.EfBenchmarkTests-report.csv",
                    Technology::EfCore,
                    Period::After,
                ),
                SourceTable::new(
                    "PruebasDeRendimiento.BenchMarks_Despues.AdoNetBenchmarkTests-report.csv",
                    Technology::AdoNet,
                    Period::After,
                ),
                SourceTable::new(
                    "PruebasDeRendimiento.BenchMarks_Despues.DapperBenchmarkTests-report.csv",
                    Technology::Dapper,
                    Period::After,
                ),
            ],
        }
    }
}

impl SourceCatalog {
    /// Build a catalog from explicit entries.
    ///
    /// Each (technology, period) pair and each file may appear only once.
    pub fn new(tables: Vec<SourceTable>) -> Result<Self, String> {
        for (i, a) in tables.iter().enumerate() {
            for b in &tables[i + 1..] {
                if a.file == b.file {
                    return Err(format!("duplicate source file '{}'", a.file));
                }
                if a.technology == b.technology && a.period == b.period {
                    return Err(format!(
                        "duplicate source for {} / {}",
                        a.technology, a.period
                    ));
                }
            }
        }
        Ok(Self { tables })
    }

    /// Tables in load order.
    pub fn tables(&self) -> &[SourceTable] {
        &self.tables
    }

    /// Resolve a source identity (a file name or a path to one).
    ///
    /// The exact identity is tried first, then its final path component.
    pub fn resolve(&self, identity: &str) -> SourceResult<&SourceTable> {
        self.position(identity)
            .map(|i| &self.tables[i])
            .ok_or_else(|| SourceError::UnknownSource(identity.to_string()))
    }

    /// Load-order index of a source identity.
    pub fn position(&self, identity: &str) -> Option<usize> {
        if let Some(i) = self.tables.iter().position(|t| t.file == identity) {
            return Some(i);
        }
        let file_name = Path::new(identity).file_name()?.to_str()?;
        self.tables.iter().position(|t| t.file == file_name)
    }

    /// The table for a (technology, period) pair.
    pub fn table_for(&self, technology: Technology, period: Period) -> Option<&SourceTable> {
        self.tables
            .iter()
            .find(|t| t.technology == technology && t.period == period)
    }
}

// =============================================================================
// Keyword groups
// =============================================================================

/// What a keyword group classifies into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroupTarget {
    /// Always this operation.
    Fixed(Operation),
    /// Read-style method; the period decides via [`ReadPolicy`].
    ReadLike,
}

/// An ordered keyword group: any keyword as a substring selects the target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeywordGroup {
    pub target: GroupTarget,
    /// Keywords, matched case-insensitively.
    pub keywords: Vec<String>,
}

impl KeywordGroup {
    pub fn new(target: GroupTarget, keywords: &[&str]) -> Self {
        Self {
            target,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    fn matches(&self, label_lower: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && label_lower.contains(k.to_lowercase().as_str()))
    }
}

/// How read-style methods are categorized in each period.
///
/// The before-period benchmarks are CRUD suites, so their reads are `Read`;
/// the after-period suites are optimized queries, so their reads are `Query`.
/// This is a naming convention of the reports, hence configurable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadPolicy {
    pub before: Operation,
    pub after: Operation,
}

impl Default for ReadPolicy {
    fn default() -> Self {
        Self {
            before: Operation::Read,
            after: Operation::Query,
        }
    }
}

impl ReadPolicy {
    pub fn resolve(&self, period: Period) -> Operation {
        match period {
            Period::Before => self.before,
            Period::After => self.after,
        }
    }
}

/// Ordered keyword groups plus the read policy. First matching group wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationRules {
    pub groups: Vec<KeywordGroup>,
    #[serde(default)]
    pub read_policy: ReadPolicy,
}

impl Default for ClassificationRules {
    fn default() -> Self {
        Self {
            groups: vec![
                KeywordGroup::new(GroupTarget::Fixed(Operation::Create), &["create", "insert"]),
                KeywordGroup::new(
                    GroupTarget::ReadLike,
                    &["read", "get", "query", "select", "find"],
                ),
                KeywordGroup::new(GroupTarget::Fixed(Operation::Update), &["update"]),
                KeywordGroup::new(GroupTarget::Fixed(Operation::Delete), &["delete", "remove"]),
            ],
            read_policy: ReadPolicy::default(),
        }
    }
}

/// Operation assigned to a method label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationMatch {
    pub operation: Operation,
    /// Number of keyword groups that matched; more than one is ambiguous.
    pub matched_groups: usize,
}

impl OperationMatch {
    pub fn is_ambiguous(&self) -> bool {
        self.matched_groups > 1
    }
}

impl ClassificationRules {
    /// Classify a method label drawn from a table of the given period.
    pub fn operation_for(&self, method: &str, period: Period) -> OperationMatch {
        let lower = method.to_lowercase();
        let mut matching = self.groups.iter().filter(|g| g.matches(&lower));

        let Some(first) = matching.next() else {
            return OperationMatch {
                operation: Operation::Other,
                matched_groups: 0,
            };
        };
        let operation = match first.target {
            GroupTarget::Fixed(op) => op,
            GroupTarget::ReadLike => self.read_policy.resolve(period),
        };

        OperationMatch {
            operation,
            matched_groups: 1 + matching.count(),
        }
    }
}

// =============================================================================
// Classifier
// =============================================================================

/// Full classification of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Method label with quotes and technology prefix removed.
    pub method: String,
    pub technology: Technology,
    pub period: Period,
    pub operation: Operation,
    pub ambiguous: bool,
}

/// Combines the source catalog and the keyword rules.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    catalog: SourceCatalog,
    rules: ClassificationRules,
}

impl Classifier {
    pub fn new(catalog: SourceCatalog, rules: ClassificationRules) -> Self {
        Self { catalog, rules }
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    pub fn rules(&self) -> &ClassificationRules {
        &self.rules
    }

    /// Classify a method label from the given source table.
    pub fn classify(&self, method: &str, identity: &str) -> SourceResult<Classification> {
        let table = self.catalog.resolve(identity)?;
        Ok(self.classify_in(method, table))
    }

    /// Classify a method label from an already-resolved table.
    pub fn classify_in(&self, method: &str, table: &SourceTable) -> Classification {
        let cleaned = clean_method_label(method, table.technology);
        let found = self.rules.operation_for(&cleaned, table.period);
        Classification {
            technology: table.technology,
            period: table.period,
            operation: found.operation,
            ambiguous: found.is_ambiguous(),
            method: cleaned,
        }
    }
}

/// Strip quotes and a leading `"<Technology>: "` prefix from a method label.
pub fn clean_method_label(method: &str, technology: Technology) -> String {
    let unquoted: String = method.chars().filter(|c| !matches!(c, '\'' | '"')).collect();
    let trimmed = unquoted.trim();

    for prefix in technology.method_prefixes() {
        if let Some(rest) = strip_prefix_ignore_case(trimmed, prefix) {
            return rest.trim().to_string();
        }
    }
    trimmed.to_string()
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        s.get(prefix.len()..)
    } else {
        None
    }
}
