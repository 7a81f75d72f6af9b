//! Feature preprocessing fitted on the training split.

use crate::config::constants::DATA_TRANSFORMATION_IMPUTE_VALUE;
use crate::data::{Cell, Column, Dataset};
use crate::errors::{Result, SensorError};
use serde::{Deserialize, Serialize};

/// Constant imputation followed by robust scaling.
///
/// Missing cells become `impute_value`; each feature is then centred on its
/// training median and divided by its training interquartile range. A zero
/// range scales by one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    /// Feature names in model input order.
    pub feature_names: Vec<String>,
    /// Replacement for missing cells.
    pub impute_value: f64,
    /// Per-feature median.
    pub centers: Vec<f64>,
    /// Per-feature interquartile range.
    pub scales: Vec<f64>,
}

impl Preprocessor {
    /// Fits on a feature table with the default impute value.
    ///
    /// # Errors
    ///
    /// See [`Self::fit_with_impute`].
    pub fn fit(features: &Dataset) -> Result<Self> {
        Self::fit_with_impute(features, DATA_TRANSFORMATION_IMPUTE_VALUE)
    }

    /// Fits on a feature table.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::EmptyDataset` for a table without rows or
    /// columns and `SensorError::InvalidData` for a non-numeric cell.
    pub fn fit_with_impute(features: &Dataset, impute_value: f64) -> Result<Self> {
        if features.is_empty() {
            return Err(SensorError::EmptyDataset(
                "cannot fit preprocessor on an empty table".to_string(),
            ));
        }

        let mut feature_names = Vec::with_capacity(features.n_columns());
        let mut centers = Vec::with_capacity(features.n_columns());
        let mut scales = Vec::with_capacity(features.n_columns());

        for column in features.columns() {
            let mut values = imputed(column, impute_value)?;
            values.sort_by(f64::total_cmp);
            let q1 = quantile(&values, 0.25);
            let median = quantile(&values, 0.5);
            let q3 = quantile(&values, 0.75);
            let iqr = q3 - q1;

            feature_names.push(column.name().to_string());
            centers.push(median);
            scales.push(if iqr > 0.0 && iqr.is_finite() { iqr } else { 1.0 });
        }

        Ok(Self {
            feature_names,
            impute_value,
            centers,
            scales,
        })
    }

    /// Number of features.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Transforms a table into the fitted feature order.
    ///
    /// Extra columns are ignored.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::InvalidData` if a fitted feature is absent or
    /// holds a non-numeric cell.
    pub fn transform(&self, table: &Dataset) -> Result<Dataset> {
        let mut columns = Vec::with_capacity(self.n_features());
        for (index, name) in self.feature_names.iter().enumerate() {
            let column = table.column(name).ok_or_else(|| {
                SensorError::invalid_data(format!("feature '{name}' missing from input"))
            })?;
            let values = imputed(column, self.impute_value)?
                .into_iter()
                .map(|v| (v - self.centers[index]) / self.scales[index]);
            columns.push(Column::numeric(name.clone(), values));
        }
        Dataset::new(columns)
    }

    /// Transforms a table into row-major feature vectors.
    ///
    /// # Errors
    ///
    /// See [`Self::transform`].
    pub fn transform_rows(&self, table: &Dataset) -> Result<Vec<Vec<f64>>> {
        let transformed = self.transform(table)?;
        Ok(feature_rows(&transformed))
    }
}

/// Row-major numeric view of an all-numeric table; missing cells read as 0.
#[must_use]
pub fn feature_rows(table: &Dataset) -> Vec<Vec<f64>> {
    (0..table.n_rows())
        .map(|row| {
            table
                .columns()
                .iter()
                .map(|c| c.values()[row].as_f64().unwrap_or(0.0))
                .collect()
        })
        .collect()
}

fn imputed(column: &Column, impute_value: f64) -> Result<Vec<f64>> {
    column
        .values()
        .iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            Cell::Missing => Ok(impute_value),
            Cell::Number(n) => Ok(*n),
            Cell::Text(text) => Err(SensorError::invalid_data(format!(
                "non-numeric value '{text}' in feature '{}' at row {}",
                column.name(),
                row + 1
            ))),
        })
        .collect()
}

/// Linear-interpolated quantile of sorted, non-empty values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn features() -> Dataset {
        Dataset::new(vec![
            Column::numeric("aa_000", [1.0, 2.0, 3.0, 4.0, 5.0]),
            Column::new(
                "ab_000",
                vec![Cell::Missing, Cell::Number(0.0), Cell::Missing, Cell::Missing, Cell::Number(0.0)],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile(&sorted, 0.25) - 1.75).abs() < 1e-12);
        assert!((quantile(&sorted, 0.5) - 2.5).abs() < 1e-12);
        assert!((quantile(&[7.0], 0.75) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_fit_median_and_iqr() {
        let pre = Preprocessor::fit(&features()).unwrap();

        assert_eq!(pre.feature_names, vec!["aa_000", "ab_000"]);
        assert_eq!(pre.centers, vec![3.0, 0.0]);
        // IQR of 1..=5 is 2; the all-zero column falls back to 1.
        assert_eq!(pre.scales, vec![2.0, 1.0]);
    }

    #[test]
    fn test_transform_imputes_then_scales() {
        let pre = Preprocessor::fit(&features()).unwrap();
        let rows = pre.transform_rows(&features()).unwrap();

        assert_eq!(rows[0], vec![-1.0, 0.0]);
        assert_eq!(rows[4], vec![1.0, 0.0]);
    }

    #[test]
    fn test_transform_selects_fitted_columns_in_order() {
        let pre = Preprocessor::fit(&features()).unwrap();
        let input = Dataset::new(vec![
            Column::numeric("ab_000", [0.0]),
            Column::text("class", ["neg"]),
            Column::numeric("aa_000", [7.0]),
        ])
        .unwrap();

        let out = pre.transform(&input).unwrap();
        assert_eq!(out.column_names(), vec!["aa_000", "ab_000"]);
        assert_eq!(out.column("aa_000").unwrap().numbers(), vec![2.0]);
    }

    #[test]
    fn test_missing_feature_is_invalid_data() {
        let pre = Preprocessor::fit(&features()).unwrap();
        let (input, _) = features().drop_columns(&["ab_000"]);
        assert_eq!(
            pre.transform(&input).unwrap_err().kind(),
            crate::errors::ErrorKind::InvalidData
        );
    }

    #[test]
    fn test_text_feature_is_invalid_data() {
        let table = Dataset::new(vec![Column::new(
            "aa_000",
            vec![Cell::Number(1.0), Cell::Text("high".into())],
        )])
        .unwrap();
        let err = Preprocessor::fit(&table).unwrap_err();
        assert!(err.to_string().contains("high"));
    }

    #[test]
    fn test_empty_table() {
        let err = Preprocessor::fit(&Dataset::default()).unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::EmptyDataset);
    }
}
