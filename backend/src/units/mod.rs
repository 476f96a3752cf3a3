//! Unit normalization for benchmark magnitudes.
//!
//! Report cells carry a magnitude and a unit (`"1,234.5 μs"`, `"12.3 KB"`,
//! `"-"`). This module converts them into the canonical units used by the
//! rest of the pipeline:
//!
//! | kind   | canonical | accepted units            |
//! |--------|-----------|---------------------------|
//! | time   | μs        | `ns`, `μs`/`µs`/`us`, `ms`, `s` |
//! | memory | KB        | `B`, `KB`, `MB`, `GB`     |
//!
//! Every function here is pure.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{UnitError, UnitResult};

/// What a token measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Time,
    Memory,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Time => f.write_str("time"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

impl FromStr for UnitKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "time" => Ok(Self::Time),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(format!("unknown unit kind '{}' (expected time or memory)", other)),
        }
    }
}

/// Time units and their factor to microseconds.
const TIME_UNITS: &[(&str, f64)] = &[
    ("ns", 0.001),
    ("μs", 1.0),
    ("µs", 1.0),
    ("us", 1.0),
    ("ms", 1000.0),
    ("s", 1_000_000.0),
];

/// Memory units and their factor to kilobytes.
const MEMORY_UNITS: &[(&str, f64)] = &[
    ("B", 0.000_976_562_5),
    ("KB", 1.0),
    ("MB", 1024.0),
    ("GB", 1_048_576.0),
];

/// Cells meaning "measured, nothing there" rather than "not measured".
const ZERO_MARKERS: &[&str] = &["-", "—", "0"];

/// `<magnitude> <unit>`: digits and separators (a space may group digits),
/// then an optional unit symbol with no spaces or digits in it.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<num>[+-]?[0-9.,](?:[0-9.,]|\s[0-9])*)?\s*(?P<unit>[^\s0-9]*)$")
        .expect("valid token regex")
});

impl UnitKind {
    fn table(&self) -> &'static [(&'static str, f64)] {
        match self {
            Self::Time => TIME_UNITS,
            Self::Memory => MEMORY_UNITS,
        }
    }

    /// Canonical unit symbol.
    pub fn canonical_unit(&self) -> &'static str {
        match self {
            Self::Time => "μs",
            Self::Memory => "KB",
        }
    }

    /// Factor from `unit` to the canonical unit.
    ///
    /// Exact (case-sensitive) symbols win; otherwise the first
    /// case-insensitive match in table order is used.
    pub fn factor(&self, unit: &str) -> Option<f64> {
        let table = self.table();
        table
            .iter()
            .find(|(symbol, _)| *symbol == unit)
            .or_else(|| table.iter().find(|(symbol, _)| symbol.eq_ignore_ascii_case(unit)))
            .map(|(_, factor)| *factor)
    }
}

/// Normalize an elapsed-time token to microseconds.
///
/// Returns `Ok(None)` for an empty cell.
pub fn normalize_time(text: &str) -> UnitResult<Option<f64>> {
    normalize(text, UnitKind::Time)
}

/// Normalize an allocated-memory token to kilobytes.
///
/// Returns `Ok(None)` for an empty cell.
pub fn normalize_memory(text: &str) -> UnitResult<Option<f64>> {
    normalize(text, UnitKind::Memory)
}

/// Normalize a magnitude + unit token into the canonical unit of `kind`.
///
/// - empty or whitespace-only → `Ok(None)` (absent)
/// - `-`, a bare `0` or a zero magnitude with a known unit → `Ok(Some(0.0))`
/// - unknown unit, unparseable or negative magnitude → [`UnitError`]
pub fn normalize(text: &str, kind: UnitKind) -> UnitResult<Option<f64>> {
    let token = trim_token(text);
    if token.is_empty() {
        return Ok(None);
    }
    if ZERO_MARKERS.contains(&token) {
        return Ok(Some(0.0));
    }

    let caps = TOKEN_RE
        .captures(token)
        .ok_or_else(|| UnitError::BadMagnitude {
            kind,
            input: text.to_string(),
        })?;
    let num = caps.name("num").map_or("", |m| m.as_str());
    let unit = caps.name("unit").map_or("", |m| m.as_str());

    let magnitude = parse_magnitude(num).ok_or_else(|| UnitError::BadMagnitude {
        kind,
        input: text.to_string(),
    })?;

    if magnitude < 0.0 {
        return Err(UnitError::Negative {
            kind,
            input: text.to_string(),
        });
    }

    // A bare zero needs no unit; anything else must name a known one
    if unit.is_empty() && magnitude == 0.0 {
        return Ok(Some(0.0));
    }
    let factor = kind.factor(unit).ok_or_else(|| UnitError::UnknownUnit {
        kind,
        input: text.to_string(),
        unit: unit.to_string(),
    })?;

    Ok(Some(magnitude * factor))
}

/// Strip surrounding quotes and whitespace (including non-breaking spaces).
fn trim_token(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || matches!(c, '\'' | '"'))
}

/// Parse a magnitude that may use either `.` or `,` as decimal separator.
///
/// - both present: the right-most one is the decimal separator
/// - a single `,` followed by exactly three digits is digit grouping
/// - a separator occurring more than once is digit grouping
pub fn parse_magnitude(num: &str) -> Option<f64> {
    let digits = num.trim_start_matches(['+', '-']);
    if !digits.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let negative = num.starts_with('-');

    let last_dot = digits.rfind('.');
    let last_comma = digits.rfind(',');
    let dots = digits.matches('.').count();
    let commas = digits.matches(',').count();

    let decimal = match (last_dot, last_comma) {
        (Some(d), Some(c)) => Some(if d > c { '.' } else { ',' }),
        (Some(_), None) if dots == 1 => Some('.'),
        (None, Some(c)) if commas == 1 => {
            let tail = &digits[c + 1..];
            let int_part = digits[..c].trim_start_matches('0');
            if tail.len() == 3 && tail.chars().all(|ch| ch.is_ascii_digit()) && !int_part.is_empty() {
                None
            } else {
                Some(',')
            }
        }
        _ => None,
    };

    let mut normalized = String::with_capacity(digits.len() + 1);
    if negative {
        normalized.push('-');
    }
    for ch in digits.chars() {
        match ch {
            '0'..='9' => normalized.push(ch),
            c if Some(c) == decimal => normalized.push('.'),
            _ => {}
        }
    }

    normalized.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(s: &str) -> f64 {
        normalize_time(s).unwrap().unwrap()
    }

    fn memory(s: &str) -> f64 {
        normalize_memory(s).unwrap().unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_time_units() {
        assert_close(time("500 ns"), 0.5);
        assert_eq!(time("12.5 μs"), 12.5);
        assert_eq!(time("12.5 µs"), 12.5);
        assert_eq!(time("12.5 us"), 12.5);
        assert_eq!(time("1.5 ms"), 1500.0);
        assert_eq!(time("2 s"), 2_000_000.0);
    }

    #[test]
    fn test_memory_units() {
        assert_eq!(memory("1024 B"), 1.0);
        assert_eq!(memory("3.25 KB"), 3.25);
        assert_eq!(memory("2 MB"), 2048.0);
        assert_eq!(memory("1.5 GB"), 1_572_864.0);
    }

    #[test]
    fn test_microseconds_match_milliseconds() {
        assert_eq!(time("1000 μs"), 1000.0);
        assert_eq!(time("1 ms"), 1000.0);
    }

    #[test]
    fn test_linear_in_magnitude() {
        for (unit, _) in TIME_UNITS {
            let one = time(&format!("3.5 {}", unit));
            let two = time(&format!("7 {}", unit));
            assert!((two - 2.0 * one).abs() < 1e-9, "time unit {}", unit);
        }
        for (unit, _) in MEMORY_UNITS {
            let one = memory(&format!("3.5 {}", unit));
            let two = memory(&format!("7 {}", unit));
            assert!((two - 2.0 * one).abs() < 1e-9, "memory unit {}", unit);
        }
    }

    #[test]
    fn test_case_insensitive_fallback() {
        assert_eq!(memory("4 kb"), 4.0);
        assert_eq!(memory("1 mb"), 1024.0);
        assert_eq!(time("3 MS"), 3000.0);
        // Exact symbol wins over the case-insensitive scan
        assert_eq!(memory("1 B"), 0.000_976_562_5);
    }

    #[test]
    fn test_special_characters_stripped() {
        assert_eq!(time("\"1,234.56\u{a0}μs\""), 1234.56);
        assert_eq!(memory("  12.5\u{a0}KB  "), 12.5);
        assert_close(time("'42 ns'"), 0.042);
    }

    #[test]
    fn test_locale_separators() {
        assert_eq!(time("1.234,5 μs"), 1234.5);
        assert_eq!(time("12,5 ms"), 12_500.0);
        assert_eq!(time("1,234 μs"), 1234.0);
        assert_close(time("1,234,567 ns"), 1234.567);
        assert_eq!(parse_magnitude("0,123"), Some(0.123));
    }

    #[test]
    fn test_absent_vs_zero() {
        assert_eq!(normalize_memory("").unwrap(), None);
        assert_eq!(normalize_memory("   ").unwrap(), None);
        assert_eq!(normalize_memory("-").unwrap(), Some(0.0));
        assert_eq!(normalize_memory("0").unwrap(), Some(0.0));
        assert_eq!(normalize_time("0 ms").unwrap(), Some(0.0));
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            normalize_time("12 fortnights"),
            Err(UnitError::UnknownUnit { .. })
        ));
        assert!(matches!(
            normalize_time("12"),
            Err(UnitError::UnknownUnit { .. })
        ));
        assert!(matches!(
            normalize_time("NA"),
            Err(UnitError::BadMagnitude { .. })
        ));
        assert!(matches!(
            normalize_memory("-5 KB"),
            Err(UnitError::Negative { .. })
        ));
        assert!(matches!(
            normalize_memory("1.2.3x4 KB"),
            Err(UnitError::BadMagnitude { .. })
        ));
    }

    #[test]
    fn test_garbled_unit_is_not_seconds() {
        for token in ["12.5 ?s", "12.5 \u{FFFD}s", "12.5 ?μs"] {
            assert!(
                matches!(normalize_time(token), Err(UnitError::UnknownUnit { .. })),
                "{:?} should be rejected",
                token
            );
        }
        assert!(matches!(
            normalize_memory("3 ?KB"),
            Err(UnitError::UnknownUnit { .. })
        ));
    }

    #[test]
    fn test_zero_with_unknown_unit_rejected() {
        assert!(matches!(
            normalize_time("0 fortnights"),
            Err(UnitError::UnknownUnit { .. })
        ));
        assert!(matches!(
            normalize_memory("0 TB"),
            Err(UnitError::UnknownUnit { .. })
        ));
        assert_eq!(normalize_memory("0 B").unwrap(), Some(0.0));
        assert_eq!(normalize_time("0,0").unwrap(), Some(0.0));
    }

    #[test]
    fn test_space_grouped_magnitude() {
        assert_eq!(time("1 234 μs"), 1234.0);
        assert_close(time("1\u{a0}234,5 ns"), 1.2345);
    }
}
