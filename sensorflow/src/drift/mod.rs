//! Distribution drift between a training and a test table.

mod detector;
mod ks;

pub use detector::{ColumnDrift, DriftDetector, DriftReport};
pub use ks::{
    kolmogorov_q, ks_2samp, ks_p_value, ks_p_value_exact, two_sided_p_value, KsResult,
    EXACT_MAX_SAMPLE_SIZE,
};
