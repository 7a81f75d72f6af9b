//! Locates the newest promoted model.
//!
//! Promoted models live under `<model_dir>/<version>/model.json`, where
//! `<version>` is an integer. The best model is the one under the numerically
//! largest version, so `10` wins over `9`.

use crate::config::constants::MODEL_FILE_NAME;
use crate::errors::{Result, SensorError};
use crate::utils::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Integer name of a version directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelVersion(pub u64);

impl ModelVersion {
    /// Version for a model promoted at `timestamp`: its unix seconds.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::InvalidData` for a timestamp before the epoch.
    pub fn from_timestamp(timestamp: &Timestamp) -> Result<Self> {
        u64::try_from(timestamp.timestamp()).map(Self).map_err(|_| {
            SensorError::invalid_data(format!(
                "cannot derive a model version from {timestamp}, which predates the unix epoch"
            ))
        })
    }

    /// The raw integer.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ModelVersion {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl From<u64> for ModelVersion {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Read-only view of the version directory root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResolver {
    model_dir: PathBuf,
}

impl ModelResolver {
    /// Creates a resolver over `model_dir`. The directory is never created.
    #[must_use]
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    /// The version directory root.
    #[must_use]
    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// All version directories, ascending. Plain files are ignored.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::InvalidData` for a directory whose name is not
    /// an integer, or `SensorError::Io` if the root cannot be listed.
    pub fn versions(&self) -> Result<Vec<ModelVersion>> {
        if !self.model_dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries =
            std::fs::read_dir(&self.model_dir).map_err(|e| SensorError::io(&self.model_dir, e))?;

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SensorError::io(&self.model_dir, e))?;
            let file_type = entry
                .file_type()
                .map_err(|e| SensorError::io(entry.path(), e))?;
            if !file_type.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let version = name.parse::<ModelVersion>().map_err(|_| {
                SensorError::invalid_data(format!(
                    "version directory '{}' in '{}' is not an integer",
                    name,
                    self.model_dir.display()
                ))
            })?;
            versions.push(version);
        }
        versions.sort_unstable();
        Ok(versions)
    }

    /// The newest version, if any.
    ///
    /// # Errors
    ///
    /// See [`Self::versions`].
    pub fn latest_version(&self) -> Result<Option<ModelVersion>> {
        Ok(self.versions()?.last().copied())
    }

    /// Path of the model file under a given version.
    #[must_use]
    pub fn model_path(&self, version: ModelVersion) -> PathBuf {
        self.model_dir.join(version.to_string()).join(MODEL_FILE_NAME)
    }

    /// Path of the model file under the newest version.
    ///
    /// The file itself is not checked.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::NoModelAvailable` when there is no version
    /// directory, plus the errors of [`Self::versions`].
    pub fn get_best_model_path(&self) -> Result<PathBuf> {
        self.latest_version()?
            .map(|version| self.model_path(version))
            .ok_or_else(|| SensorError::NoModelAvailable {
                model_dir: self.model_dir.clone(),
            })
    }

    /// True when the newest version directory holds a model file.
    ///
    /// # Errors
    ///
    /// See [`Self::versions`].
    pub fn is_model_exists(&self) -> Result<bool> {
        match self.latest_version()? {
            Some(version) => Ok(self.model_path(version).is_file()),
            None => Ok(false),
        }
    }
}
