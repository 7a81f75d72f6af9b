//! Per-stage execution records kept in a run summary.

use crate::core::{StageName, StageStatus};
use crate::utils::Timestamp;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Outcome and timing of one stage execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// Stage that ran.
    pub stage: StageName,
    /// Outcome.
    pub status: StageStatus,
    /// When the stage started.
    pub started_at: Timestamp,
    /// When the stage ended.
    pub ended_at: Timestamp,
    /// Wall time measured with a monotonic clock.
    pub duration_ms: f64,
    /// Error message if failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageResult {
    /// Records a completed stage.
    #[must_use]
    pub fn completed(stage: StageName, started_at: Timestamp, duration_ms: f64) -> Self {
        Self {
            stage,
            status: StageStatus::Ok,
            started_at,
            ended_at: Utc::now(),
            duration_ms,
            error: None,
        }
    }

    /// Records a failed stage.
    #[must_use]
    pub fn failed(
        stage: StageName,
        started_at: Timestamp,
        duration_ms: f64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            status: StageStatus::Fail,
            started_at,
            ended_at: Utc::now(),
            duration_ms,
            error: Some(error.into()),
        }
    }

    /// Returns true if the stage succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, StageStatus::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_result_completed() {
        let result = StageResult::completed(StageName::DataIngestion, Utc::now(), 12.5);

        assert!(result.is_success());
        assert!(result.error.is_none());
        assert!(result.ended_at >= result.started_at);
    }

    #[test]
    fn test_stage_result_failed() {
        let result =
            StageResult::failed(StageName::DataValidation, Utc::now(), 3.0, "schema mismatch");

        assert!(!result.is_success());
        assert_eq!(result.error, Some("schema mismatch".to_string()));
    }

    #[test]
    fn test_stage_result_serialization() {
        let result = StageResult::completed(StageName::DataTransformation, Utc::now(), 1.0);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["stage"], "data_transformation");
        assert_eq!(json["status"], "ok");
        assert!(json.get("error").is_none());

        let back: StageResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }
}
