// crates/framecut-core/src/helpers/time.rs
//
// Human-readable timestamps for messages, storyboard entry names and file
// names.

/// Format seconds as `M:SS.D` (minutes, seconds, tenths).
///
/// Tenths are truncated, not rounded, so a frame captured at 1.96 s reads
/// `0:01.9`. A tiny epsilon absorbs float representation error so that
/// `3.0 * 0.1` still reads `0:00.3`.
///
/// ```
/// use framecut_core::helpers::time::format_time;
/// assert_eq!(format_time(0.0),   "0:00.0");
/// assert_eq!(format_time(61.5),  "1:01.5");
/// assert_eq!(format_time(3.0 * 0.1), "0:00.3");
/// ```
pub fn format_time(seconds: f64) -> String {
    let tenths = (seconds.max(0.0) * 10.0 + 1e-6).floor() as u64;
    let mins   = tenths / 600;
    let secs   = (tenths / 10) % 60;
    let frac   = tenths % 10;
    format!("{mins}:{secs:02}.{frac}")
}

/// Filesystem-safe form of [`format_time`]: `:` → `-`, `.` → `_`.
///
/// ```
/// use framecut_core::helpers::time::time_suffix;
/// assert_eq!(time_suffix(61.5), "1-01_5");
/// ```
pub fn time_suffix(seconds: f64) -> String {
    format_time(seconds).replace(':', "-").replace('.', "_")
}
