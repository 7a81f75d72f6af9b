//! Training run orchestration.
//!
//! A [`TrainPipeline`] owns the root config of one run and chains the
//! stages. All pipelines created by one service share a [`RunGuard`] so at
//! most one run is active.

mod guard;
mod training;

pub use guard::{RunGuard, RunPermit};
pub use training::{PipelineRunSummary, TrainPipeline};
