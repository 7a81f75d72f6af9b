//! Testing utilities for sensor pipelines.
//!
//! This module provides:
//! - Synthetic sensor records and an on-disk workspace with a schema
//! - Store doubles for concurrency and call-count checks
//! - Assertions on error kinds and stages

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_error_kind, assert_stage_error};
pub use fixtures::{sensor_dataset, sensor_records, SensorFixture, FIXTURE_SCHEMA};
pub use mocks::{FailingStore, GatedStore};
