//! The pipeline stages.
//!
//! Each stage is bound to its config and the artifact of the stage before
//! it, runs once through its `initiate_*` method and returns its own
//! artifact. Failures come back wrapped with the stage name.

mod ingestion;
mod pusher;
mod result;
mod transformation;
mod validation;

pub use ingestion::{split_train_test, DataIngestion};
pub use pusher::ModelPusher;
pub use result::StageResult;
pub use transformation::{load_preprocessor, save_preprocessor, DataTransformation};
pub use validation::{drop_zero_std_columns, DataValidation};
