//! HTTP surface for triggering training and serving predictions.
//!
//! | Route | Method | Purpose |
//! |---|---|---|
//! | `/` | GET | Service banner |
//! | `/health` | GET | JSON status |
//! | `/train` | GET | Run the training pipeline once |
//! | `/predict` | POST | Predict labels for a CSV body |

mod handlers;

pub use handlers::{health, index, predict, train, PREDICTION_COLUMN};

use crate::config::PipelineSettings;
use crate::pipeline::RunGuard;
use crate::store::DocumentStore;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Settings each training run is created from.
    pub settings: PipelineSettings,
    /// Source collection store.
    pub store: Arc<dyn DocumentStore>,
    /// Guard shared by every run this service starts.
    pub guard: RunGuard,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("settings", &self.settings)
            .field("store", &self.store.describe())
            .field("guard", &self.guard)
            .finish()
    }
}

impl AppState {
    /// Creates state with a fresh run guard.
    #[must_use]
    pub fn new(settings: PipelineSettings, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            settings,
            store,
            guard: RunGuard::new(),
        }
    }
}

/// Builds the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/train", get(train))
        .route("/predict", post(predict))
        .with_state(state)
}
