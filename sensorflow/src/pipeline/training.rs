//! The training run orchestrator.

use super::guard::RunGuard;
use crate::config::{
    DataIngestionConfig, DataTransformationConfig, DataValidationConfig, ModelPusherConfig,
    PipelineSettings, TrainingPipelineConfig,
};
use crate::core::{
    ArtifactFiles, DataIngestionArtifact, DataTransformationArtifact, DataValidationArtifact,
    ModelEvaluationArtifact, ModelPusherArtifact, StageName, StageStatus,
};
use crate::errors::{Result, SensorError};
use crate::observability::{
    LoggingTracingEmitter, PipelineSpanAttributes, SpanTimer, StageSpanAttributes, TracingEmitter,
};
use crate::stages::{DataIngestion, DataTransformation, DataValidation, ModelPusher, StageResult};
use crate::store::DocumentStore;
use crate::utils::{now_utc, Timestamp};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRunSummary {
    /// Run ID.
    pub run_id: Uuid,
    /// Run timestamp segment.
    pub timestamp: String,
    /// Run artifact directory.
    pub artifact_dir: PathBuf,
    /// Ingestion output.
    pub data_ingestion: DataIngestionArtifact,
    /// Validation output.
    pub data_validation: DataValidationArtifact,
    /// Transformation output.
    pub data_transformation: DataTransformationArtifact,
    /// Per-stage timing, in execution order.
    pub stages: Vec<StageResult>,
}

impl PipelineRunSummary {
    /// Total stage time in milliseconds.
    #[must_use]
    pub fn total_duration_ms(&self) -> f64 {
        self.stages.iter().map(|s| s.duration_ms).sum()
    }
}

/// Runs ingestion, validation and transformation for one timestamp.
///
/// Clones share the store, the guard and the emitter.
#[derive(Clone)]
pub struct TrainPipeline {
    config: TrainingPipelineConfig,
    settings: PipelineSettings,
    store: Arc<dyn DocumentStore>,
    guard: RunGuard,
    emitter: Arc<dyn TracingEmitter>,
}

impl std::fmt::Debug for TrainPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainPipeline")
            .field("config", &self.config)
            .field("store", &self.store.describe())
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

impl TrainPipeline {
    /// Creates a pipeline for a run starting now.
    #[must_use]
    pub fn new(settings: PipelineSettings, store: Arc<dyn DocumentStore>, guard: RunGuard) -> Self {
        Self::with_timestamp(settings, store, guard, now_utc())
    }

    /// Creates a pipeline for a run starting at `timestamp`.
    #[must_use]
    pub fn with_timestamp(
        settings: PipelineSettings,
        store: Arc<dyn DocumentStore>,
        guard: RunGuard,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            config: TrainingPipelineConfig::new(&settings.artifact_root, timestamp),
            settings,
            store,
            guard,
            emitter: Arc::new(LoggingTracingEmitter),
        }
    }

    /// Replaces the span emitter.
    #[must_use]
    pub fn with_emitter(mut self, emitter: Arc<dyn TracingEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    /// The run's root config.
    #[must_use]
    pub fn config(&self) -> &TrainingPipelineConfig {
        &self.config
    }

    /// Whether any run sharing this pipeline's guard is in progress.
    #[must_use]
    pub fn is_pipeline_running(&self) -> bool {
        self.guard.is_running()
    }

    /// Exports and splits the collection.
    ///
    /// # Errors
    ///
    /// Errors are attributed to `data_ingestion`.
    pub async fn run_ingestion(&self) -> Result<DataIngestionArtifact> {
        let stage = StageName::DataIngestion;
        let config = DataIngestionConfig::new(&self.config, &self.settings)
            .map_err(|e| e.in_stage(stage))?;
        let ingestion = DataIngestion::new(config, &self.settings.schema_file_path, Arc::clone(&self.store))
            .map_err(|e| e.in_stage(stage))?;
        ingestion.initiate_data_ingestion().await
    }

    /// Checks the splits against the schema and for drift.
    ///
    /// # Errors
    ///
    /// Errors are attributed to `data_validation`.
    pub fn run_validation(&self, artifact: DataIngestionArtifact) -> Result<DataValidationArtifact> {
        let config = DataValidationConfig::new(&self.config, &self.settings);
        DataValidation::new(artifact, config, &self.settings.schema_file_path)
            .map_err(|e| e.in_stage(StageName::DataValidation))?
            .initiate_data_validation()
    }

    /// Fits and applies feature preprocessing.
    ///
    /// # Errors
    ///
    /// Errors are attributed to `data_transformation`.
    pub fn run_transformation(&self, artifact: DataValidationArtifact) -> Result<DataTransformationArtifact> {
        let config = DataTransformationConfig::new(&self.config, &self.settings);
        DataTransformation::new(artifact, config).initiate_data_transformation()
    }

    /// Promotes an accepted model under this run's version.
    ///
    /// # Errors
    ///
    /// Errors are attributed to `model_pusher`.
    pub fn run_model_pusher(&self, artifact: ModelEvaluationArtifact) -> Result<ModelPusherArtifact> {
        let config = ModelPusherConfig::new(&self.config, &self.settings)
            .map_err(|e| e.in_stage(StageName::ModelPusher))?;
        ModelPusher::new(artifact, config).initiate_model_pusher()
    }

    /// Runs ingestion, validation and transformation under the run guard.
    ///
    /// Drift does not stop the run; it is logged as a warning.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::PipelineBusy` without side effects if another
    /// run holds the guard, otherwise the first stage error.
    pub async fn run_pipeline(&self) -> Result<PipelineRunSummary> {
        let _permit = self.guard.try_acquire(self.config.run_id)?;

        let span = tracing::info_span!(
            "training_run",
            run_id = %self.config.run_id,
            timestamp = %self.config.timestamp,
        );
        self.run_stages().instrument(span).await
    }

    async fn run_stages(&self) -> Result<PipelineRunSummary> {
        let attributes = PipelineSpanAttributes::new()
            .with_pipeline_name(&self.config.pipeline_name)
            .with_run_id(self.config.run_id.to_string())
            .with_timestamp(&self.config.timestamp)
            .with_artifact_dir(self.config.artifact_dir.display().to_string())
            .to_attributes();
        let run_timer = SpanTimer::start(&self.config.pipeline_name);
        self.emitter.span_start(run_timer.name(), &attributes);

        let mut stages = Vec::with_capacity(3);
        let outcome = async {
            let data_ingestion = self
                .timed(StageName::DataIngestion, &mut stages, self.run_ingestion())
                .await?;
            let artifact = data_ingestion.clone();
            let data_validation = self
                .timed(
                    StageName::DataValidation,
                    &mut stages,
                    self.blocking(move |pipeline| pipeline.run_validation(artifact)),
                )
                .await?;
            if !data_validation.validation_status {
                tracing::warn!(
                    report = %data_validation.drift_report_file_path.display(),
                    "Drift detected between train and test splits; continuing"
                );
            }
            let artifact = data_validation.clone();
            let data_transformation = self
                .timed(
                    StageName::DataTransformation,
                    &mut stages,
                    self.blocking(move |pipeline| pipeline.run_transformation(artifact)),
                )
                .await?;
            Ok::<_, SensorError>((data_ingestion, data_validation, data_transformation))
        }
        .await;

        let elapsed = run_timer.finish();
        match outcome {
            Ok((data_ingestion, data_validation, data_transformation)) => {
                self.emitter
                    .span_end(&self.config.pipeline_name, elapsed, &attributes);
                tracing::info!(duration_ms = elapsed, "Training pipeline completed");
                Ok(PipelineRunSummary {
                    run_id: self.config.run_id,
                    timestamp: self.config.timestamp.clone(),
                    artifact_dir: self.config.artifact_dir.clone(),
                    data_ingestion,
                    data_validation,
                    data_transformation,
                    stages,
                })
            }
            Err(e) => {
                self.emitter
                    .span_error(&self.config.pipeline_name, &e.to_string(), &attributes);
                Err(e)
            }
        }
    }

    /// Runs a synchronous stage on the blocking pool.
    async fn blocking<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Self) -> Result<T> + Send + 'static,
    {
        let pipeline = self.clone();
        tokio::task::spawn_blocking(move || work(&pipeline)).await?
    }

    async fn timed<T, F>(&self, stage: StageName, results: &mut Vec<StageResult>, work: F) -> Result<T>
    where
        T: ArtifactFiles,
        F: Future<Output = Result<T>>,
    {
        let started_at = now_utc();
        let timer = SpanTimer::start(stage.to_string());
        self.emitter
            .span_start(timer.name(), &StageSpanAttributes::new(stage).to_attributes());

        let outcome = work.await;
        let duration_ms = timer.finish();
        let attributes = StageSpanAttributes::new(stage).with_duration_ms(duration_ms);

        match &outcome {
            Ok(artifact) => {
                let attributes = artifact
                    .output_files()
                    .into_iter()
                    .fold(attributes.with_status(StageStatus::Ok), |attributes, path| {
                        attributes.with_output(path.display().to_string())
                    })
                    .to_attributes();
                self.emitter.span_end(&stage.to_string(), duration_ms, &attributes);
                results.push(StageResult::completed(stage, started_at, duration_ms));
            }
            Err(e) => {
                let message = e.to_string();
                let attributes = attributes
                    .with_status(StageStatus::Fail)
                    .with_error(&message)
                    .to_attributes();
                self.emitter.span_error(&stage.to_string(), &message, &attributes);
                results.push(StageResult::failed(stage, started_at, duration_ms, message));
            }
        }
        outcome
    }
}
