use super::AppState;
use crate::data::{read_csv_from, Column, Dataset, Record};
use crate::errors::{ErrorKind, Result, SensorError};
use crate::model::{ModelResolver, SensorModel};
use crate::pipeline::TrainPipeline;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::path::PathBuf;

pub use crate::config::constants::PREDICTION_COLUMN;

/// `GET /`
pub async fn index() -> &'static str {
    "Sensor fault detection service. GET /train to retrain, POST /predict with a CSV body."
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let resolver = ModelResolver::new(&state.settings.saved_model_dir);
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "training_running": state.guard.is_running(),
        "model_available": resolver.is_model_exists().unwrap_or(false),
        "store": state.store.describe(),
    }))
}

/// `GET /train`
///
/// The run is spawned onto the runtime, so a client that disconnects does
/// not cancel it.
pub async fn train(State(state): State<AppState>) -> Response {
    if state.guard.is_running() {
        return busy();
    }

    let pipeline = TrainPipeline::new(state.settings.clone(), state.store.clone(), state.guard.clone());
    let run = tokio::spawn(async move { pipeline.run_pipeline().await });
    let outcome = run.await.unwrap_or_else(|e| Err(SensorError::from(e)));
    match outcome {
        Ok(summary) => {
            tracing::info!(
                run_id = %summary.run_id,
                artifact_dir = %summary.artifact_dir.display(),
                "Training triggered over HTTP completed"
            );
            (StatusCode::OK, "Training successfully completed!").into_response()
        }
        Err(e) if e.kind() == ErrorKind::PipelineBusy => busy(),
        Err(e) => {
            tracing::error!(error = %e, "Training triggered over HTTP failed");
            error_response(&e)
        }
    }
}

/// `POST /predict`
///
/// The body is a CSV table with the feature columns of the served model.
/// The response is the same rows as JSON records with an extra
/// [`PREDICTION_COLUMN`]. Parsing and model loading run on the blocking pool.
pub async fn predict(State(state): State<AppState>, body: Bytes) -> Response {
    let model_dir = state.settings.saved_model_dir.clone();
    tokio::task::spawn_blocking(move || predict_blocking(model_dir, &body))
        .await
        .unwrap_or_else(|e| error_response(&SensorError::from(e)))
}

fn predict_blocking(model_dir: PathBuf, body: &[u8]) -> Response {
    let resolver = ModelResolver::new(model_dir);
    match resolver.is_model_exists() {
        Ok(true) => {}
        Ok(false) => return (StatusCode::NOT_FOUND, "Model is not available").into_response(),
        Err(e) => return error_response(&e),
    }

    let table = match read_csv_from(body, "request body") {
        Ok(table) if table.is_empty() => {
            return (StatusCode::BAD_REQUEST, "Request body contains no rows").into_response();
        }
        Ok(table) => table,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected prediction request");
            return (StatusCode::BAD_REQUEST, format!("Invalid CSV body: {e}")).into_response();
        }
    };

    match predict_table(&resolver, &table) {
        Ok(records) => Json(records).into_response(),
        Err(e) => {
            tracing::error!(error = %e, rows = table.n_rows(), "Prediction failed");
            error_response(&e)
        }
    }
}

fn predict_table(resolver: &ModelResolver, table: &Dataset) -> Result<Vec<Record>> {
    let model_path = resolver.get_best_model_path()?;
    let model = SensorModel::load(&model_path)?;
    let labels = model.predict(table)?;
    tracing::info!(
        model = %model_path.display(),
        rows = labels.len(),
        "Served predictions"
    );
    Ok(table
        .with_column(Column::text(PREDICTION_COLUMN, labels))?
        .to_records())
}

fn busy() -> Response {
    (StatusCode::CONFLICT, "Training pipeline is already running.").into_response()
}

fn error_response(error: &SensorError) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, format!("Error Occurred! {error}")).into_response()
}
