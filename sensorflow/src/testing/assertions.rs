//! Test assertions for pipeline errors.

use crate::core::StageName;
use crate::errors::{ErrorKind, SensorError};

/// Asserts that a result failed with the expected kind.
pub fn assert_error_kind<T: std::fmt::Debug>(result: &Result<T, SensorError>, expected: ErrorKind) {
    match result {
        Ok(value) => panic!("Expected {expected} error, got Ok({value:?})"),
        Err(err) => assert_eq!(
            err.kind(),
            expected,
            "Expected {expected} error, got {}: {err}",
            err.kind()
        ),
    }
}

/// Asserts that an error is attributed to `stage` with the expected kind.
pub fn assert_stage_error(err: &SensorError, stage: StageName, expected: ErrorKind) {
    assert_eq!(
        err.stage(),
        Some(stage),
        "Expected failure in {stage}, got {:?}: {err}",
        err.stage()
    );
    assert_eq!(err.kind(), expected, "Expected {expected} error, got: {err}");
}
