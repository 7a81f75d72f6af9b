//! The served model: a fitted preprocessor plus a classifier.

use super::mapping::TargetValueMapping;
use super::preprocessor::Preprocessor;
use crate::data::Dataset;
use crate::errors::{Result, SensorError};
use crate::utils::ensure_parent_dir;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A binary classifier over preprocessed feature rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    /// Predicts code 1 when `weights · x + intercept > 0`, else 0.
    Linear {
        /// One weight per feature.
        weights: Vec<f64>,
        /// Bias term.
        intercept: f64,
    },
}

impl Estimator {
    /// Baseline linear classifier separating the two class centroids.
    ///
    /// The weight vector points from the class-0 centroid to the class-1
    /// centroid and the boundary passes through their midpoint.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::InvalidData` if the inputs are ragged, a code
    /// other than 0 or 1 appears, or either class is absent.
    pub fn nearest_centroid(rows: &[Vec<f64>], codes: &[u32]) -> Result<Self> {
        if rows.len() != codes.len() {
            return Err(SensorError::invalid_data(format!(
                "{} feature rows but {} targets",
                rows.len(),
                codes.len()
            )));
        }
        let width = rows.first().map_or(0, Vec::len);
        let mut sums = [vec![0.0; width], vec![0.0; width]];
        let mut counts = [0usize; 2];

        for (row, &code) in rows.iter().zip(codes) {
            if row.len() != width {
                return Err(SensorError::invalid_data("feature rows differ in width"));
            }
            let class = usize::try_from(code)
                .ok()
                .filter(|c| *c < 2)
                .ok_or_else(|| SensorError::invalid_data(format!("target code {code} is not binary")))?;
            counts[class] += 1;
            for (sum, value) in sums[class].iter_mut().zip(row) {
                *sum += value;
            }
        }
        if counts.contains(&0) {
            return Err(SensorError::invalid_data(
                "both classes are needed to fit a classifier",
            ));
        }

        let centroid = |class: usize| -> Vec<f64> {
            sums[class].iter().map(|s| s / counts[class] as f64).collect()
        };
        let (negative, positive) = (centroid(0), centroid(1));
        let weights: Vec<f64> = positive.iter().zip(&negative).map(|(p, n)| p - n).collect();
        let midpoint_projection: f64 = weights
            .iter()
            .zip(positive.iter().zip(&negative))
            .map(|(w, (p, n))| w * (p + n) / 2.0)
            .sum();

        Ok(Self::Linear {
            weights,
            intercept: -midpoint_projection,
        })
    }

    /// Number of inputs the estimator expects.
    #[must_use]
    pub fn n_features(&self) -> usize {
        match self {
            Self::Linear { weights, .. } => weights.len(),
        }
    }

    /// Raw decision value of one row.
    #[must_use]
    pub fn decision(&self, row: &[f64]) -> f64 {
        match self {
            Self::Linear { weights, intercept } => {
                weights.iter().zip(row).map(|(w, x)| w * x).sum::<f64>() + intercept
            }
        }
    }

    /// Predicted code of one row.
    #[must_use]
    pub fn predict_code(&self, row: &[f64]) -> u32 {
        u32::from(self.decision(row) > 0.0)
    }
}

/// Everything needed to score raw sensor rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorModel {
    /// Fitted feature preprocessing.
    pub preprocessor: Preprocessor,
    /// The classifier.
    pub estimator: Estimator,
    /// Label decoding for predictions.
    #[serde(default)]
    pub target_mapping: TargetValueMapping,
}

impl SensorModel {
    /// Bundles a preprocessor and an estimator.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::InvalidData` if their feature counts differ.
    pub fn new(
        preprocessor: Preprocessor,
        estimator: Estimator,
        target_mapping: TargetValueMapping,
    ) -> Result<Self> {
        if preprocessor.n_features() != estimator.n_features() {
            return Err(SensorError::invalid_data(format!(
                "preprocessor yields {} features, estimator expects {}",
                preprocessor.n_features(),
                estimator.n_features()
            )));
        }
        Ok(Self {
            preprocessor,
            estimator,
            target_mapping,
        })
    }

    /// Loads a model file.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::Io` or `SensorError::Serialization`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SensorError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| {
            SensorError::serialization(format!("model file '{}'", path.display()), e)
        })
    }

    /// Writes the model file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::Io` or `SensorError::Serialization`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SensorError::serialization("model", e))?;
        std::fs::write(path, content).map_err(|e| SensorError::io(path, e))
    }

    /// Predicted codes for raw rows.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::InvalidData` if a feature is absent or non-numeric.
    pub fn predict_codes(&self, table: &Dataset) -> Result<Vec<u32>> {
        let rows = self.preprocessor.transform_rows(table)?;
        Ok(rows.iter().map(|row| self.estimator.predict_code(row)).collect())
    }

    /// Predicted labels for raw rows.
    ///
    /// # Errors
    ///
    /// See [`Self::predict_codes`].
    pub fn predict(&self, table: &Dataset) -> Result<Vec<String>> {
        self.predict_codes(table)?
            .into_iter()
            .map(|code| self.target_mapping.decode(code).map(str::to_string))
            .collect()
    }
}
