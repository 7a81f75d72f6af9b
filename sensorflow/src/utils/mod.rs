//! Utility functions for timestamps and filesystem layout.

mod fs;
pub mod timestamps;

pub use fs::{ensure_parent_dir, write_atomic};
pub use timestamps::{format_run_timestamp, now_utc, Timestamp};
