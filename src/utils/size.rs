//! Human-readable byte sizes.

const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

/// Format a byte count, e.g. `1536` -> `"1.5 KiB"`.
#[allow(clippy::cast_precision_loss)]
pub fn human_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
