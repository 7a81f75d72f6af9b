//! Span attributes, timing and emitters for training runs.

use crate::core::{StageName, StageStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// Span attributes for a training run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSpanAttributes {
    /// Pipeline name.
    pub pipeline_name: Option<String>,
    /// Run ID.
    pub run_id: Option<String>,
    /// Run timestamp segment.
    pub timestamp: Option<String>,
    /// Run artifact directory.
    pub artifact_dir: Option<String>,
}

impl PipelineSpanAttributes {
    /// Creates empty attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pipeline name.
    #[must_use]
    pub fn with_pipeline_name(mut self, name: impl Into<String>) -> Self {
        self.pipeline_name = Some(name.into());
        self
    }

    /// Sets the run ID.
    #[must_use]
    pub fn with_run_id(mut self, id: impl Into<String>) -> Self {
        self.run_id = Some(id.into());
        self
    }

    /// Sets the run timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Sets the artifact directory.
    #[must_use]
    pub fn with_artifact_dir(mut self, dir: impl Into<String>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    /// Flattens to dotted attribute keys.
    #[must_use]
    pub fn to_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();

        if let Some(ref v) = self.pipeline_name {
            attrs.insert("pipeline.name".to_string(), v.clone());
        }
        if let Some(ref v) = self.run_id {
            attrs.insert("pipeline.run_id".to_string(), v.clone());
        }
        if let Some(ref v) = self.timestamp {
            attrs.insert("pipeline.timestamp".to_string(), v.clone());
        }
        if let Some(ref v) = self.artifact_dir {
            attrs.insert("pipeline.artifact_dir".to_string(), v.clone());
        }

        attrs
    }
}

/// Span attributes for one stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSpanAttributes {
    /// Stage name.
    pub stage: StageName,
    /// Stage status.
    pub status: Option<StageStatus>,
    /// Duration in milliseconds.
    pub duration_ms: Option<f64>,
    /// Error message if failed.
    pub error: Option<String>,
    /// Files the stage wrote.
    pub outputs: Vec<String>,
}

impl StageSpanAttributes {
    /// Creates attributes for a stage.
    #[must_use]
    pub fn new(stage: StageName) -> Self {
        Self {
            stage,
            status: None,
            duration_ms: None,
            error: None,
            outputs: Vec::new(),
        }
    }

    /// Sets the stage status.
    #[must_use]
    pub fn with_status(mut self, status: StageStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the error.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Adds an output file.
    #[must_use]
    pub fn with_output(mut self, path: impl Into<String>) -> Self {
        self.outputs.push(path.into());
        self
    }

    /// Flattens to dotted attribute keys.
    #[must_use]
    pub fn to_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();

        attrs.insert("stage.name".to_string(), self.stage.to_string());

        if let Some(v) = self.status {
            attrs.insert("stage.status".to_string(), v.to_string());
        }
        if let Some(v) = self.duration_ms {
            attrs.insert("stage.duration_ms".to_string(), v.to_string());
        }
        if let Some(ref v) = self.error {
            attrs.insert("stage.error".to_string(), v.clone());
        }
        if !self.outputs.is_empty() {
            attrs.insert("stage.outputs".to_string(), self.outputs.join(","));
        }

        attrs
    }
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}

/// Receives stage span events from the orchestrator.
pub trait TracingEmitter: Send + Sync {
    /// A span started.
    fn span_start(&self, name: &str, attributes: &HashMap<String, String>);

    /// A span ended.
    fn span_end(&self, name: &str, duration_ms: f64, attributes: &HashMap<String, String>);

    /// A span failed.
    fn span_error(&self, name: &str, error: &str, attributes: &HashMap<String, String>);
}

/// Discards all span events.
#[derive(Debug, Clone, Default)]
pub struct NoOpTracingEmitter;

impl TracingEmitter for NoOpTracingEmitter {
    fn span_start(&self, _name: &str, _attributes: &HashMap<String, String>) {}
    fn span_end(&self, _name: &str, _duration_ms: f64, _attributes: &HashMap<String, String>) {}
    fn span_error(&self, _name: &str, _error: &str, _attributes: &HashMap<String, String>) {}
}

/// Writes span events to the `tracing` log.
#[derive(Debug, Clone, Default)]
pub struct LoggingTracingEmitter;

impl TracingEmitter for LoggingTracingEmitter {
    fn span_start(&self, name: &str, attributes: &HashMap<String, String>) {
        tracing::info!(
            span_name = name,
            ?attributes,
            "Span started"
        );
    }

    fn span_end(&self, name: &str, duration_ms: f64, attributes: &HashMap<String, String>) {
        tracing::info!(
            span_name = name,
            duration_ms,
            ?attributes,
            "Span ended"
        );
    }

    fn span_error(&self, name: &str, error: &str, attributes: &HashMap<String, String>) {
        tracing::error!(
            span_name = name,
            error,
            ?attributes,
            "Span error"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_span_attributes() {
        let attrs = PipelineSpanAttributes::new()
            .with_pipeline_name("sensor")
            .with_run_id("run-123")
            .with_timestamp("01_02_2024_03_04_05");

        let flat = attrs.to_attributes();
        assert_eq!(flat.get("pipeline.name"), Some(&"sensor".to_string()));
        assert_eq!(flat.get("pipeline.run_id"), Some(&"run-123".to_string()));
        assert!(!flat.contains_key("pipeline.artifact_dir"));
    }

    #[test]
    fn test_stage_span_attributes() {
        let attrs = StageSpanAttributes::new(StageName::DataValidation)
            .with_status(StageStatus::Ok)
            .with_duration_ms(123.45)
            .with_output("artifact/x/data_validation/drift_report/report.yaml");

        let flat = attrs.to_attributes();
        assert_eq!(flat.get("stage.name"), Some(&"data_validation".to_string()));
        assert_eq!(flat.get("stage.status"), Some(&"ok".to_string()));
        assert_eq!(flat.get("stage.duration_ms"), Some(&"123.45".to_string()));
        assert!(flat["stage.outputs"].ends_with("report.yaml"));
    }

    #[test]
    fn test_span_timer() {
        let timer = SpanTimer::start("data_ingestion");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(timer.name(), "data_ingestion");
        assert!(timer.finish() >= 10.0);
    }

    #[test]
    fn test_noop_emitter() {
        let emitter = NoOpTracingEmitter;
        emitter.span_start("test", &HashMap::new());
        emitter.span_end("test", 100.0, &HashMap::new());
        emitter.span_error("test", "error", &HashMap::new());
    }
}
