//! Benchmark report parser with encoding and delimiter auto-detection.
//!
//! Reads a delimited report (BenchmarkDotNet CSV export or similar) into
//! raw string rows, then picks out the `Method`, `Mean` and `Allocated`
//! columns. No unit or classification logic here.

use crate::error::{CsvError, CsvResult, RowError};
use crate::models::RawBenchmarkRow;

/// Required column holding the method label.
pub const METHOD_COLUMN: &str = "Method";
/// Required column holding the mean elapsed time.
pub const MEAN_COLUMN: &str = "Mean";
/// Optional column holding the allocated memory.
pub const ALLOCATED_COLUMN: &str = "Allocated";

/// One data row with its 1-based line number.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Data rows, in file order
    pub rows: Vec<ParsedRow>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
///
/// Valid UTF-8 is taken as UTF-8 without asking chardet: short reports with
/// a handful of `μ` characters are otherwise easily misdetected.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let text = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        // UTF-8 and anything unknown: lossy UTF-8
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ';';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse report text with an explicit delimiter.
///
/// Quoted fields are honoured, blank lines skipped and rows may have fewer
/// or more fields than the header.
pub fn parse_str(content: &str, delimiter: char, encoding: String) -> CsvResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }
    if !delimiter.is_ascii() {
        return Err(CsvError::ParseError(format!(
            "delimiter '{}' is not a single-byte character",
            delimiter
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let line = record.position().map_or(0, |p| p.line() as usize);
        rows.push(ParsedRow {
            line,
            fields: record.iter().map(str::to_string).collect(),
        });
    }

    Ok(ParseResult {
        rows,
        encoding,
        delimiter,
        headers,
    })
}

/// Parse report bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    parse_str(&content, delimiter, encoding)
}

/// Column positions of the benchmark fields within a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkColumns {
    pub method: usize,
    pub mean: usize,
    pub allocated: Option<usize>,
}

impl BenchmarkColumns {
    /// Locate the columns (case-insensitive). `Method` and `Mean` are required.
    pub fn locate(headers: &[String]) -> CsvResult<Self> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        Ok(Self {
            method: find(METHOD_COLUMN).ok_or(CsvError::MissingColumn(METHOD_COLUMN))?,
            mean: find(MEAN_COLUMN).ok_or(CsvError::MissingColumn(MEAN_COLUMN))?,
            allocated: find(ALLOCATED_COLUMN),
        })
    }

    /// Extract a benchmark row. Missing or empty `Method`/`Mean` fails the row.
    pub fn extract(&self, row: &ParsedRow) -> Result<RawBenchmarkRow, RowError> {
        let field = |i: usize| row.fields.get(i).map(String::as_str).filter(|s| !s.is_empty());

        let method = field(self.method).ok_or(RowError::MissingField(METHOD_COLUMN))?;
        let mean = field(self.mean).ok_or(RowError::MissingField(MEAN_COLUMN))?;

        Ok(RawBenchmarkRow {
            line: row.line,
            method: method.to_string(),
            mean_text: mean.to_string(),
            allocated_text: self.allocated.and_then(field).map(str::to_string),
        })
    }
}
