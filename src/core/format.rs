//! Display formatting for the stats tiles.

/// Download rates at or above this many KB/s are shown in MB/s.
pub const MB_THRESHOLD_KB: f64 = 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
pub enum RateUnit {
    #[strum(serialize = "KB/s")]
    KilobytesPerSec,
    #[strum(serialize = "MB/s")]
    MegabytesPerSec,
}

/// Rounded integer percentage, e.g. `37.6` -> `"38%"`.
pub fn format_percent(value: f64) -> String {
    format!("{}%", value.round() as i64)
}

/// Scale a download rate for display.
///
/// `2048.0` -> `("2.0", MB/s)`, `500.0` -> `("500", KB/s)`, and the boundary
/// `1024.0` is already megabytes. Halves round away from zero, so `1280.0`
/// is `"1.3"` rather than the `"1.2"` that `{:.1}` alone would give.
pub fn format_rate(kb_per_sec: f64) -> (String, RateUnit) {
    if kb_per_sec >= MB_THRESHOLD_KB {
        let tenths = (kb_per_sec / MB_THRESHOLD_KB * 10.0).round() / 10.0;
        (
            format!("{tenths:.1}"),
            RateUnit::MegabytesPerSec,
        )
    } else {
        (
            format!("{}", kb_per_sec.round() as i64),
            RateUnit::KilobytesPerSec,
        )
    }
}
