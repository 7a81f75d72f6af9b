//! Timestamp helpers for run directories and model versions.

use chrono::{DateTime, Utc};

use crate::config::constants::TIMESTAMP_FORMAT;

/// Represents a timestamp that can be serialized/deserialized.
pub type Timestamp = DateTime<Utc>;

/// Returns the current UTC timestamp.
#[must_use]
pub fn now_utc() -> Timestamp {
    Utc::now()
}

/// Formats a timestamp as a run directory name (`MM_DD_YYYY_HH_MM_SS`).
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use sensorflow::utils::format_run_timestamp;
///
/// let ts = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
/// assert_eq!(format_run_timestamp(&ts), "03_09_2024_07_05_01");
/// ```
#[must_use]
pub fn format_run_timestamp(dt: &Timestamp) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_run_timestamp() {
        let ts = Utc.with_ymd_and_hms(2023, 10, 5, 14, 30, 0).unwrap();
        assert_eq!(format_run_timestamp(&ts), "10_05_2023_14_30_00");
    }

    #[test]
    fn test_run_timestamp_sorts_by_second() {
        let first = Utc.with_ymd_and_hms(2023, 10, 5, 14, 30, 0).unwrap();
        let second = first + chrono::Duration::seconds(1);
        assert_ne!(format_run_timestamp(&first), format_run_timestamp(&second));
    }
}
