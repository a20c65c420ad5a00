//! Human-readable elapsed time formatting
//!
//! Per-patient timings are reported in minutes (two decimals); batch totals
//! pick a format by magnitude.

use std::time::Duration;

/// Format selection thresholds (seconds)
const SHORT_FORMAT_MAX: u64 = 100; // < 100s → X.XXs
const MEDIUM_FORMAT_MAX: u64 = 6000; // < 100m → M:SS
                                     // >= 100m → H:MM:SS

/// Format a duration as fractional minutes rounded to two decimals.
///
/// Sub-second precision is dropped before conversion, so 90.9s reports as
/// `1.50`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tseg_common::human_time::format_minutes;
///
/// assert_eq!(format_minutes(Duration::from_secs(0)), "0.00");
/// assert_eq!(format_minutes(Duration::from_secs(90)), "1.50");
/// assert_eq!(format_minutes(Duration::from_secs(125)), "2.08");
/// ```
pub fn format_minutes(elapsed: Duration) -> String {
    let minutes = elapsed.as_secs() as f64 / 60.0;
    format!("{:.2}", minutes)
}

/// Format a duration with a layout chosen by its magnitude.
///
/// - `X.XXs` below 100 seconds
/// - `M:SS` below 100 minutes
/// - `H:MM:SS` otherwise
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tseg_common::human_time::format_elapsed;
///
/// assert_eq!(format_elapsed(Duration::from_millis(4500)), "4.50s");
/// assert_eq!(format_elapsed(Duration::from_secs(330)), "5:30");
/// assert_eq!(format_elapsed(Duration::from_secs(7261)), "2:01:01");
/// ```
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();

    if secs < SHORT_FORMAT_MAX {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else if secs < MEDIUM_FORMAT_MAX {
        format!("{}:{:02}", secs / 60, secs % 60)
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}:{:02}:{:02}", hours, mins, secs % 60)
    }
}
