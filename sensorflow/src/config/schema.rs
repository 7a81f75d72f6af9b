//! Schema configuration loaded from YAML.

use crate::errors::{Result, SensorError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One entry of the schema's `columns` list.
///
/// Entries are either a bare column name or a single-key `{name: dtype}` map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnEntry {
    /// `- sensor_00`
    Name(String),
    /// `- sensor_00: float`
    Typed(BTreeMap<String, String>),
}

impl ColumnEntry {
    /// Returns the column name(s) declared by this entry.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        let (single, typed) = match self {
            Self::Name(name) => (Some(name.as_str()), None),
            Self::Typed(map) => (None, Some(map.keys().map(String::as_str))),
        };
        single.into_iter().chain(typed.into_iter().flatten())
    }
}

/// Expected shape of the sensor dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Expected columns, in order. Only the count is checked.
    #[serde(default)]
    pub columns: Vec<ColumnEntry>,
    /// Columns that must be present.
    #[serde(default)]
    pub numerical_columns: Vec<String>,
    /// Columns discarded after ingestion.
    #[serde(default)]
    pub drop_columns: Vec<String>,
}

impl SchemaConfig {
    /// Loads the schema from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::Config` if the file is missing or malformed.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SensorError::config_with_source(
                format!("cannot read schema file '{}'", path.display()),
                e,
            )
        })?;
        Self::from_yaml_str(&content).map_err(|e| match e {
            SensorError::Config { source, .. } => SensorError::Config {
                message: format!("malformed schema file '{}'", path.display()),
                source,
            },
            other => other,
        })
    }

    /// Parses the schema from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::Config` if the text is not a valid schema.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| SensorError::config_with_source("malformed schema", e))
    }

    /// Number of declared columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.iter().map(|entry| entry.names().count()).sum()
    }

    /// Declared column names, in order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().flat_map(ColumnEntry::names).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SCHEMA: &str = r"
columns:
  - class: category
  - aa_000: int64
  - ab_000
numerical_columns:
  - aa_000
  - ab_000
drop_columns:
  - cd_000
";

    #[test]
    fn test_parse_mixed_column_entries() {
        let schema = SchemaConfig::from_yaml_str(SCHEMA).unwrap();

        assert_eq!(schema.column_count(), 3);
        assert_eq!(schema.column_names(), vec!["class", "aa_000", "ab_000"]);
        assert_eq!(schema.numerical_columns, vec!["aa_000", "ab_000"]);
        assert_eq!(schema.drop_columns, vec!["cd_000"]);
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let schema = SchemaConfig::from_yaml_str("columns: [a, b]").unwrap();
        assert_eq!(schema.column_count(), 2);
        assert!(schema.drop_columns.is_empty());
    }

    #[test]
    fn test_malformed_schema_is_config_error() {
        let err = SchemaConfig::from_yaml_str("columns: 12").unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Config);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = SchemaConfig::from_yaml_file("/nonexistent/schema.yaml").unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Config);
        assert!(err.to_string().contains("schema.yaml"));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("schema.yaml");
        std::fs::write(&path, SCHEMA).unwrap();

        let schema = SchemaConfig::from_yaml_file(&path).unwrap();
        assert_eq!(schema.column_count(), 3);
    }
}
