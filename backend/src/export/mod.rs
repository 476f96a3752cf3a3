//! Export of unified records and computed views.
//!
//! - JSON: pretty-printed, camelCase keys, absent values omitted
//! - CSV: one row per record (or per aggregate), absent values as empty cells

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::analysis::{Aggregate, ViewOutput};
use crate::error::{ExportError, ExportResult};
use crate::models::Dataset;

/// Output format of the `export` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown export format '{}' (expected json or csv)", other)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Csv => f.write_str("csv"),
        }
    }
}

/// Pretty JSON of any serializable value.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> ExportResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

const RECORD_HEADERS: [&str; 7] = [
    "technology",
    "period",
    "operation",
    "method",
    "mean_time_us",
    "allocated_kb",
    "ambiguous",
];

/// CSV of every record, in load order.
pub fn records_to_csv(dataset: &Dataset) -> ExportResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(RECORD_HEADERS)?;

    for r in dataset.records() {
        writer.write_record([
            r.technology.code().to_string(),
            r.period.to_string(),
            r.operation.to_string(),
            r.method.clone(),
            r.mean_time_us.to_string(),
            r.allocated_kb.map(|kb| kb.to_string()).unwrap_or_default(),
            r.ambiguous.to_string(),
        ])?;
    }

    finish(writer)
}

/// CSV of aggregates. Dimensions that were not grouped on are empty.
pub fn aggregates_to_csv(aggregates: &[Aggregate]) -> ExportResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "period",
        "technology",
        "operation",
        "count",
        "avg_time_us",
        "avg_allocated_kb",
    ])?;

    for a in aggregates {
        writer.write_record([
            a.key.period.map(|p| p.to_string()).unwrap_or_default(),
            a.key.technology.map(|t| t.code().to_string()).unwrap_or_default(),
            a.key.operation.map(|o| o.to_string()).unwrap_or_default(),
            a.count.to_string(),
            a.avg_time_us.to_string(),
            a.avg_allocated_kb.map(|kb| kb.to_string()).unwrap_or_default(),
        ])?;
    }

    finish(writer)
}

/// Records in the requested format.
pub fn export_records(dataset: &Dataset, format: ExportFormat) -> ExportResult<String> {
    match format {
        ExportFormat::Json => to_json(dataset.records()),
        ExportFormat::Csv => records_to_csv(dataset),
    }
}

/// A computed view in the requested format. CSV holds the view's
/// aggregate table; views without one are [`ExportError::NotTabular`].
pub fn export_view(view: &ViewOutput, format: ExportFormat) -> ExportResult<String> {
    match format {
        ExportFormat::Json => to_json(view),
        ExportFormat::Csv => match view.aggregates() {
            Some(rows) => aggregates_to_csv(rows),
            None => Err(ExportError::NotTabular(view.view().to_string())),
        },
    }
}

fn finish(writer: csv::Writer<Vec<u8>>) -> ExportResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Csv(e.to_string()))
}
