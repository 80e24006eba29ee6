//! Human-readable durations for log output
//!
//! Render logs report buffer lengths in samples; these helpers add the
//! equivalent wall-clock duration so the numbers are easier to sanity check.

/// Durations below this many seconds use the short format (`X.XXs`)
const SHORT_FORMAT_MAX: f64 = 100.0;

/// Durations below this many seconds use the medium format (`M:SS.Xs`)
const MEDIUM_FORMAT_MAX: f64 = 6000.0;

/// Convert an interleaved sample count to seconds.
///
/// # Arguments
/// * `samples` - Total number of interleaved samples (all channels combined)
/// * `sample_rate` - Frames per second
/// * `channels` - Samples per frame
///
/// Returns 0.0 if either rate or channel count is zero.
pub fn samples_to_seconds(samples: usize, sample_rate: u32, channels: u16) -> f64 {
    if sample_rate == 0 || channels == 0 {
        return 0.0;
    }
    samples as f64 / (sample_rate as f64 * channels as f64)
}

/// Format seconds as a human-readable duration.
///
/// - Short format (`X.XXs`): under 100 seconds
/// - Medium format (`M:SS.Xs`): under 100 minutes
/// - Long format (`H:MM:SS`): everything longer
///
/// # Examples
///
/// ```
/// use requencer_common::human_time::format_duration;
///
/// assert_eq!(format_duration(1.5), "1.50s");
/// assert_eq!(format_duration(150.0), "2:30.0s");
/// assert_eq!(format_duration(7261.0), "2:01:01");
/// ```
pub fn format_duration(seconds: f64) -> String {
    let is_negative = seconds < 0.0;
    let abs_seconds = seconds.abs();

    let formatted = if abs_seconds < SHORT_FORMAT_MAX {
        format!("{:.2}s", abs_seconds)
    } else if abs_seconds < MEDIUM_FORMAT_MAX {
        let minutes = (abs_seconds / 60.0).floor();
        let secs = abs_seconds - minutes * 60.0;
        format!("{}:{:04.1}s", minutes as u64, secs)
    } else {
        let total = abs_seconds.floor() as u64;
        let hours = total / 3600;
        let mins = (total % 3600) / 60;
        let secs = total % 60;
        format!("{}:{:02}:{:02}", hours, mins, secs)
    };

    if is_negative {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

/// Format an interleaved sample count as a human-readable duration
pub fn format_samples(samples: usize, sample_rate: u32, channels: u16) -> String {
    format_duration(samples_to_seconds(samples, sample_rate, channels))
}
