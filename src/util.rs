use chrono::{DateTime, Local, TimeZone};

// Format a KiB quantity with a binary unit suffix
pub fn format_kb(kb: f64) -> String {
    const MB: f64 = 1024.0;
    const GB: f64 = 1024.0 * MB;

    if kb.abs() >= GB {
        format!("{:.2} GiB", kb / GB)
    } else if kb.abs() >= MB {
        format!("{:.2} MiB", kb / MB)
    } else {
        format!("{:.0} KiB", kb)
    }
}

pub fn local_time(millis: f64) -> Option<DateTime<Local>> {
    if !millis.is_finite() {
        return None;
    }
    Local.timestamp_millis_opt(millis as i64).single()
}

// Wall-clock axis label, second resolution
pub fn format_clock(millis: f64) -> String {
    match local_time(millis) {
        Some(t) => t.format("%-I:%M:%S %p").to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kb_units_scale() {
        assert_eq!(format_kb(512.0), "512 KiB");
        assert_eq!(format_kb(2048.0), "2.00 MiB");
        assert_eq!(format_kb(3.0 * 1024.0 * 1024.0), "3.00 GiB");
    }

    #[test]
    fn clock_label_has_seconds_and_meridiem() {
        let label = format_clock(1_700_000_000_000.0);
        assert_eq!(label.matches(':').count(), 2);
        assert!(label.ends_with("AM") || label.ends_with("PM"));
    }

    #[test]
    fn clock_label_for_nonsense_time() {
        assert_eq!(format_clock(f64::NAN), "-");
    }
}
