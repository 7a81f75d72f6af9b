//! Label encoding for the target column.

use crate::errors::{Result, SensorError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maps class labels to integer codes and back.
///
/// A label's code is its position in `labels`. The default is `neg = 0`,
/// `pos = 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetValueMapping {
    labels: Vec<String>,
}

impl Default for TargetValueMapping {
    fn default() -> Self {
        Self {
            labels: vec!["neg".to_string(), "pos".to_string()],
        }
    }
}

impl TargetValueMapping {
    /// The default `neg`/`pos` mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A mapping over custom labels.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::Config` if the labels are empty or repeat.
    pub fn from_labels<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Result<Self> {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(SensorError::config("target mapping needs at least one label"));
        }
        for (index, label) in labels.iter().enumerate() {
            if labels[..index].contains(label) {
                return Err(SensorError::config(format!("duplicate target label '{label}'")));
            }
        }
        Ok(Self { labels })
    }

    /// Code of a label.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::InvalidData` for an unknown label.
    pub fn encode(&self, label: &str) -> Result<u32> {
        self.labels
            .iter()
            .position(|l| l == label)
            .and_then(|i| u32::try_from(i).ok())
            .ok_or_else(|| SensorError::invalid_data(format!("unknown target label '{label}'")))
    }

    /// Label of a code.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::InvalidData` for an unknown code.
    pub fn decode(&self, code: u32) -> Result<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|i| self.labels.get(i))
            .map(String::as_str)
            .ok_or_else(|| SensorError::invalid_data(format!("unknown target code {code}")))
    }

    /// Labels in code order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Label to code.
    #[must_use]
    pub fn to_dict(&self) -> BTreeMap<String, u32> {
        self.labels
            .iter()
            .zip(0u32..)
            .map(|(label, code)| (label.clone(), code))
            .collect()
    }

    /// Code to label.
    #[must_use]
    pub fn reverse_mapping(&self) -> BTreeMap<u32, String> {
        self.labels
            .iter()
            .zip(0u32..)
            .map(|(label, code)| (code, label.clone()))
            .collect()
    }
}
