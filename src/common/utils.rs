use std::time::Duration;

/// Human-readable elapsed time: "850ms", "12.34s", "3m 05s", "1h 02m 03s"
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    if total_secs >= 3600 {
        format!(
            "{}h {:02}m {:02}s",
            total_secs / 3600,
            (total_secs % 3600) / 60,
            total_secs % 60
        )
    } else if total_secs >= 60 {
        format!("{}m {:02}s", total_secs / 60, total_secs % 60)
    } else if elapsed.as_millis() >= 1000 {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else {
        format!("{}ms", elapsed.as_millis())
    }
}
