//! Column-wise drift detection between two tables.

use super::ks::{ks_2samp, KsResult};
use crate::config::constants::DATA_VALIDATION_DRIFT_THRESHOLD;
use crate::data::{Cell, Column, Dataset};
use crate::errors::{Result, SensorError};
use crate::utils::ensure_parent_dir;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Drift result of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnDrift {
    /// KS p-value; `NaN` if either side had no values.
    pub p_value: f64,
    /// True when `p_value` is below the threshold.
    pub drift_status: bool,
}

/// Per-column drift results in base-table column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriftReport {
    columns: Vec<(String, ColumnDrift)>,
}

impl DriftReport {
    /// True when no column drifted.
    #[must_use]
    pub fn no_drift_overall(&self) -> bool {
        self.columns.iter().all(|(_, drift)| !drift.drift_status)
    }

    /// Names of drifted columns.
    #[must_use]
    pub fn drifted_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|(_, drift)| drift.drift_status)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Result for one column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&ColumnDrift> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, drift)| drift)
    }

    /// Iterates results in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnDrift)> {
        self.columns.iter().map(|(name, drift)| (name.as_str(), drift))
    }

    /// Number of columns tested.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True if no column was tested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Renders the report as YAML.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::Serialization` if encoding fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| SensorError::serialization("drift report", e))
    }

    /// Writes the report as YAML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::Io` or `SensorError::Serialization`.
    pub fn write_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;
        std::fs::write(path, self.to_yaml()?).map_err(|e| SensorError::io(path, e))
    }
}

impl Serialize for DriftReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, drift) in &self.columns {
            map.serialize_entry(name, drift)?;
        }
        map.end()
    }
}

/// Flags columns whose distribution differs between a base and a current table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftDetector {
    threshold: f64,
}

impl Default for DriftDetector {
    fn default() -> Self {
        Self::new(DATA_VALIDATION_DRIFT_THRESHOLD)
    }
}

/// Mixed-type ordering: numbers sort before text.
#[derive(Debug, PartialEq, PartialOrd)]
enum Ordinal<'a> {
    Number(f64),
    Text(&'a str),
}

impl DriftDetector {
    /// Creates a detector with the given p-value threshold.
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// The p-value threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Tests every column of `base` against the same column of `current`.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::InvalidData` if `current` lacks a base column.
    pub fn detect(&self, base: &Dataset, current: &Dataset) -> Result<DriftReport> {
        let mut columns = Vec::with_capacity(base.n_columns());
        for base_column in base.columns() {
            let current_column = current.column(base_column.name()).ok_or_else(|| {
                SensorError::invalid_data(format!(
                    "column '{}' missing from the compared table",
                    base_column.name()
                ))
            })?;

            let result = compare_columns(base_column, current_column);
            // NaN never compares below the threshold.
            let drift_status = result.p_value < self.threshold;
            if drift_status {
                tracing::warn!(
                    column = base_column.name(),
                    p_value = result.p_value,
                    statistic = result.statistic,
                    threshold = self.threshold,
                    "Drift detected"
                );
            }
            columns.push((
                base_column.name().to_string(),
                ColumnDrift {
                    p_value: result.p_value,
                    drift_status,
                },
            ));
        }
        Ok(DriftReport { columns })
    }
}

fn compare_columns(base: &Column, current: &Column) -> KsResult {
    if base.is_numeric() && current.is_numeric() {
        return ks_2samp(&base.numbers(), &current.numbers());
    }
    ks_2samp(&ordinals(base), &ordinals(current))
}

fn ordinals(column: &Column) -> Vec<Ordinal<'_>> {
    column
        .values()
        .iter()
        .filter_map(|cell| match cell {
            Cell::Missing => None,
            Cell::Number(n) => Some(Ordinal::Number(*n)),
            Cell::Text(s) => Some(Ordinal::Text(s)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(offset: f64) -> Dataset {
        Dataset::new(vec![
            Column::numeric("stable", (0..300).map(|v| f64::from(v % 50))),
            Column::numeric("moving", (0..300).map(|v| f64::from(v) + offset)),
            Column::text("class", (0..300).map(|v| if v % 10 == 0 { "pos" } else { "neg" })),
        ])
        .unwrap()
    }

    #[test]
    fn test_self_comparison_has_no_drift() {
        let ds = table(0.0);
        let report = DriftDetector::default().detect(&ds, &ds).unwrap();

        assert!(report.no_drift_overall());
        assert_eq!(report.len(), 3);
        for (_, drift) in report.iter() {
            assert_eq!(drift.p_value, 1.0);
        }
    }

    #[test]
    fn test_shifted_column_is_flagged() {
        let report = DriftDetector::new(0.05)
            .detect(&table(0.0), &table(150.0))
            .unwrap();

        assert!(!report.no_drift_overall());
        assert_eq!(report.drifted_columns(), vec!["moving"]);
        assert!(!report.get("stable").unwrap().drift_status);
    }

    #[test]
    fn test_empty_column_is_not_flagged() {
        let base = Dataset::new(vec![Column::new("a", vec![Cell::Missing, Cell::Missing])]).unwrap();
        let current = Dataset::new(vec![Column::numeric("a", [1.0, 2.0])]).unwrap();
        let report = DriftDetector::default().detect(&base, &current).unwrap();

        let drift = report.get("a").unwrap();
        assert!(drift.p_value.is_nan());
        assert!(!drift.drift_status);
        assert!(report.no_drift_overall());
    }

    #[test]
    fn test_missing_column_in_current() {
        let base = table(0.0);
        let (current, _) = base.drop_columns(&["moving"]);
        let err = DriftDetector::default().detect(&base, &current).unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::InvalidData);
    }

    #[test]
    fn test_mixed_cells_compare_as_ordinals() {
        let base = Dataset::new(vec![Column::new(
            "mixed",
            vec![Cell::Number(1.0), Cell::Text("x".into()), Cell::Number(2.0)],
        )])
        .unwrap();
        let report = DriftDetector::default().detect(&base, &base).unwrap();
        assert_eq!(report.get("mixed").unwrap().p_value, 1.0);
    }

    #[test]
    fn test_yaml_keeps_column_order() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("drift_report/report.yaml");
        let ds = table(0.0);
        let report = DriftDetector::default().detect(&ds, &ds).unwrap();

        report.write_yaml(&path).unwrap();

        let parsed: serde_yaml::Mapping =
            serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let keys: Vec<_> = parsed.keys().filter_map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["stable", "moving", "class"]);

        let entry: ColumnDrift =
            serde_yaml::from_value(parsed["class"].clone()).unwrap();
        assert!(!entry.drift_status);
    }
}
