//! Error types for the sensor training pipeline.
//!
//! Every stage wraps the failures of the libraries it calls into
//! [`SensorError`]. Callers that only care about the category of a failure
//! use [`SensorError::kind`], which looks through stage wrappers.

use crate::core::StageName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Boxed error used as an opaque cause.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience result alias.
pub type Result<T, E = SensorError> = std::result::Result<T, E>;

/// The main error type for pipeline operations.
#[derive(Debug, Error)]
pub enum SensorError {
    /// Missing or malformed configuration or schema.
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// The source yielded no usable rows.
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// Column-count or required-column mismatch, aggregated across checks.
    #[error("{0}")]
    SchemaValidation(#[from] SchemaValidationError),

    /// No promoted model could be found.
    #[error("No model available under '{}'", model_dir.display())]
    NoModelAvailable {
        /// The version-directory root that was searched.
        model_dir: PathBuf,
    },

    /// Filesystem access failed.
    #[error("IO error at '{}': {source}", path.display())]
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing a CSV table failed.
    #[error("CSV error at '{}': {source}", path.display())]
    Csv {
        /// The table path.
        path: PathBuf,
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// Serializing or deserializing a document failed.
    #[error("Serialization error: {context}: {source}")]
    Serialization {
        /// What was being (de)serialized.
        context: String,
        /// The underlying serde error.
        #[source]
        source: BoxError,
    },

    /// The document store failed.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Data was present but not usable (bad label, non-numeric feature, ...).
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A background task panicked or was cancelled by runtime shutdown.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A training run is already in progress.
    #[error("Training pipeline is already running")]
    PipelineBusy,

    /// A stage failed; carries the original error.
    #[error("{stage} stage failed: {source}")]
    Stage {
        /// The failing stage.
        stage: StageName,
        /// The original error.
        #[source]
        source: Box<SensorError>,
    },
}

/// Flat error category, independent of stage wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or missing configuration.
    Config,
    /// No usable rows.
    EmptyDataset,
    /// Schema conformance failure.
    SchemaValidation,
    /// Resolver found nothing.
    NoModelAvailable,
    /// Filesystem, store, serialization or background task failure.
    Io,
    /// Unusable data values.
    InvalidData,
    /// Concurrent run rejected.
    PipelineBusy,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "config"),
            Self::EmptyDataset => write!(f, "empty_dataset"),
            Self::SchemaValidation => write!(f, "schema_validation"),
            Self::NoModelAvailable => write!(f, "no_model_available"),
            Self::Io => write!(f, "io"),
            Self::InvalidData => write!(f, "invalid_data"),
            Self::PipelineBusy => write!(f, "pipeline_busy"),
        }
    }
}

impl SensorError {
    /// Creates a configuration error without a cause.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a configuration error wrapping a cause.
    #[must_use]
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates an IO error bound to a path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a CSV error bound to a path.
    #[must_use]
    pub fn csv(path: impl AsRef<Path>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Serialization {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Creates an invalid data error.
    #[must_use]
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    /// Wraps this error as a failure of `stage`.
    ///
    /// Errors already attributed to a stage are returned unchanged so a
    /// failure is never double-wrapped.
    #[must_use]
    pub fn in_stage(self, stage: StageName) -> Self {
        match self {
            Self::Stage { .. } => self,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Returns the stage this error was raised in, if any.
    #[must_use]
    pub fn stage(&self) -> Option<StageName> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Returns the innermost non-stage error.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns the flat category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Config,
            Self::EmptyDataset(_) => ErrorKind::EmptyDataset,
            Self::SchemaValidation(_) => ErrorKind::SchemaValidation,
            Self::NoModelAvailable { .. } => ErrorKind::NoModelAvailable,
            Self::Io { .. }
            | Self::Csv { .. }
            | Self::Serialization { .. }
            | Self::Store(_)
            | Self::Task(_) => ErrorKind::Io,
            Self::InvalidData(_) => ErrorKind::InvalidData,
            Self::PipelineBusy => ErrorKind::PipelineBusy,
            Self::Stage { source, .. } => source.kind(),
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("kind".to_string(), serde_json::json!(self.kind().to_string()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        if let Some(stage) = self.stage() {
            map.insert("stage".to_string(), serde_json::json!(stage.to_string()));
        }
        if let Self::SchemaValidation(err) = self.root() {
            map.insert("failures".to_string(), serde_json::json!(err.failures));
        }
        map
    }
}

/// Aggregated schema conformance failure.
///
/// Holds one entry per failed check, in the order the checks ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("Schema validation failed:\n{}", failures.join("\n"))]
pub struct SchemaValidationError {
    /// One message per failed check.
    pub failures: Vec<String>,
}

impl SchemaValidationError {
    /// Creates an empty error accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failed check.
    pub fn push(&mut self, failure: impl Into<String>) {
        self.failures.push(failure.into());
    }

    /// Returns true if no check failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns `Ok(())` when nothing failed, or the aggregate otherwise.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Errors raised by document store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store location could not be parsed or opened.
    #[error("Invalid store URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The collection does not exist.
    #[error("Collection not found: {database}.{collection}")]
    CollectionNotFound {
        /// The database name.
        database: String,
        /// The collection name.
        collection: String,
    },

    /// A stored document could not be decoded.
    #[error("Malformed document in {collection} at line {line}: {reason}")]
    MalformedDocument {
        /// The collection name.
        collection: String,
        /// 1-based line number.
        line: usize,
        /// Decoder message.
        reason: String,
    },

    /// Backend IO failed.
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Creates a collection-not-found error.
    #[must_use]
    pub fn collection_not_found(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self::CollectionNotFound {
            database: database.into(),
            collection: collection.into(),
        }
    }
}
