//! Analysis configuration.
//!
//! Built-in defaults cover the six original reports. A JSON override file
//! may replace any part of them:
//!
//! ```json
//! {
//!   "data_dir": "./reports",
//!   "sources": [{ "file": "ef-before.csv", "technology": "EFCore", "period": "Before" }],
//!   "rules": { "groups": [{ "target": "read_like", "keywords": ["get"] }] }
//! }
//! ```
//!
//! Resolution order, later wins:
//!
//! 1. defaults
//! 2. override file (`--config`, else `BENCHDIFF_CONFIG`)
//! 3. `BENCHDIFF_DATA_DIR`

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::classify::{ClassificationRules, Classifier, SourceCatalog, SourceTable};
use crate::error::{ConfigError, ConfigResult};
use crate::logs::log_info;
use crate::validation::validate_analysis_config;

/// Environment variable naming an override file.
pub const CONFIG_ENV: &str = "BENCHDIFF_CONFIG";
/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "BENCHDIFF_DATA_DIR";

/// Default directory holding the report files.
const DEFAULT_DATA_DIR: &str = ".";

/// The active configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisConfig {
    /// Directory holding the report files.
    pub data_dir: PathBuf,
    pub sources: SourceCatalog,
    pub rules: ClassificationRules,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            sources: SourceCatalog::default(),
            rules: ClassificationRules::default(),
        }
    }
}

/// Shape of an override file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigOverride {
    data_dir: Option<PathBuf>,
    sources: Option<Vec<SourceTable>>,
    rules: Option<ClassificationRules>,
}

impl AnalysisConfig {
    /// Resolve the configuration from an explicit file, the environment and defaults.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        Self::load_with(explicit, |key| std::env::var(key).ok())
    }

    /// Same as [`AnalysisConfig::load`] with a custom environment lookup.
    pub fn load_with<F>(explicit: Option<&Path>, env: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = explicit
            .map(Path::to_path_buf)
            .or_else(|| env(CONFIG_ENV).filter(|s| !s.is_empty()).map(PathBuf::from));

        let mut config = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Some(dir) = env(DATA_DIR_ENV).filter(|s| !s.is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    /// Defaults with an override file applied.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        log_info(format!("⚙️  Loading configuration from {}", path.display()));
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Defaults with a JSON override applied. The override is schema-checked first.
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(content)?;
        validate_analysis_config(&value).map_err(|errors| ConfigError::SchemaError { errors })?;

        let overrides: ConfigOverride = serde_json::from_value(value)?;
        let mut config = Self::default();

        if let Some(dir) = overrides.data_dir {
            config.data_dir = dir;
        }
        if let Some(tables) = overrides.sources {
            config.sources = SourceCatalog::new(tables).map_err(ConfigError::Invalid)?;
        }
        if let Some(rules) = overrides.rules {
            if rules.groups.is_empty() {
                return Err(ConfigError::Invalid(
                    "classification rules need at least one keyword group".into(),
                ));
            }
            config.rules = rules;
        }
        Ok(config)
    }

    /// Classifier over this configuration's catalog and rules.
    pub fn classifier(&self) -> Classifier {
        Classifier::new(self.sources.clone(), self.rules.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::GroupTarget;
    use crate::models::{Operation, Period, Technology};
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::load_with(None, no_env).unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.sources.tables().len(), 6);
        assert_eq!(config.data_dir, PathBuf::from("."));
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = AnalysisConfig::from_json_str(r#"{ "data_dir": "/tmp/reports" }"#).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/reports"));
        assert_eq!(config.sources, SourceCatalog::default());
        assert_eq!(config.rules, ClassificationRules::default());
    }

    #[test]
    fn test_rules_override() {
        let config = AnalysisConfig::from_json_str(
            r#"{
                "rules": {
                    "groups": [
                        { "target": "read_like", "keywords": ["Fetch"] },
                        { "target": { "fixed": "Delete" }, "keywords": ["purge"] }
                    ],
                    "read_policy": { "before": "Read", "after": "Read" }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.rules.groups[0].target, GroupTarget::ReadLike);
        let classifier = config.classifier();
        let source = "PruebasDeRendimiento.BenchMarks_Despues.DapperBenchmarkTests-report.csv";
        let c = classifier.classify("FetchOrders", source).unwrap();
        assert_eq!(c.operation, Operation::Read);
        let c = classifier.classify("PurgeLogs", source).unwrap();
        assert_eq!(c.operation, Operation::Delete);
    }

    #[test]
    fn test_sources_override() {
        let config = AnalysisConfig::from_json_str(
            r#"{ "sources": [
                { "file": "ef-old.csv", "technology": "EFCore", "period": "Before" },
                { "file": "ef-new.csv", "technology": "EFCore", "period": "After" }
            ] }"#,
        )
        .unwrap();
        let t = config.sources.resolve("ef-new.csv").unwrap();
        assert_eq!((t.technology, t.period), (Technology::EfCore, Period::After));
        assert!(config.sources.resolve("CrudBenchmarks-report.csv").is_err());
    }

    #[test]
    fn test_duplicate_sources_invalid() {
        let err = AnalysisConfig::from_json_str(
            r#"{ "sources": [
                { "file": "a.csv", "technology": "Dapper", "period": "Before" },
                { "file": "a.csv", "technology": "Dapper", "period": "After" }
            ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_schema_violation() {
        let err = AnalysisConfig::from_json_str(r#"{ "sources": [{ "file": "a.csv" }] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::SchemaError { .. }));

        let err = AnalysisConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, ConfigError::JsonError(_)));
    }

    #[test]
    fn test_env_precedence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("benchdiff.json");
        fs::write(&path, r#"{ "data_dir": "from-file" }"#).unwrap();

        let env: HashMap<&str, String> = [
            (CONFIG_ENV, path.display().to_string()),
            (DATA_DIR_ENV, "from-env".to_string()),
        ]
        .into_iter()
        .collect();

        // Config file named by the environment, data dir overridden on top
        let config = AnalysisConfig::load_with(None, |k| env.get(k).cloned()).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("from-env"));

        // Explicit file wins over the environment's file
        let other = dir.path().join("other.json");
        fs::write(&other, r#"{ "rules": { "groups": [{ "target": "read_like", "keywords": ["x"] }] } }"#)
            .unwrap();
        let config = AnalysisConfig::load_with(Some(&other), |k| {
            (k == CONFIG_ENV).then(|| path.display().to_string())
        })
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("."));
        assert_eq!(config.rules.groups.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = AnalysisConfig::from_file(Path::new("/nonexistent/benchdiff.json")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
