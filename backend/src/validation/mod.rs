//! JSON Schema validation for configuration overrides.
//!
//! Override files are checked against JSON Schema Draft 7 before they are
//! deserialized, so a typo in a key or an unknown technology is reported
//! instead of being silently ignored.
//!
//! # Embedded Schemas
//!
//! Schemas are embedded at compile time from the `schemas/` directory:
//! - `analysis-config.json`
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use benchdiff::validation::validate_analysis_config;
//!
//! let config = json!({ "data_dir": "./reports" });
//! assert!(validate_analysis_config(&config).is_ok());
//!
//! let config = json!({ "sources": [{ "file": "a.csv", "technology": "Hibernate", "period": "Before" }] });
//! assert!(validate_analysis_config(&config).is_err());
//! ```

use serde_json::Value;

const ANALYSIS_CONFIG_SCHEMA: &str = include_str!("../../schemas/analysis-config.json");

/// Validate a JSON value against a JSON schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with one message per violation
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator =
        jsonschema::draft7::new(schema).map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick check: true/false.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

fn analysis_config_schema() -> Result<Value, Vec<String>> {
    serde_json::from_str(ANALYSIS_CONFIG_SCHEMA)
        .map_err(|e| vec![format!("Invalid embedded schema: {}", e)])
}

/// Validate a configuration override against the embedded schema.
pub fn validate_analysis_config(data: &Value) -> Result<(), Vec<String>> {
    validate(&analysis_config_schema()?, data)
}

/// Quick check against the configuration schema.
pub fn is_valid_analysis_config(data: &Value) -> bool {
    analysis_config_schema().is_ok_and(|schema| is_valid(&schema, data))
}
