// Human-readable formatting for progress fields

/// Format the raw `total_size` field from the progress stream. Non-numeric
/// or empty values (ffmpeg emits "N/A" early in a run) format as "N/A B".
pub fn format_size_field(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.parse::<u64>() {
        Ok(bytes) => format_bytes(bytes),
        Err(_) => "N/A B".to_string(),
    }
}

/// Binary (1024-step) size with one decimal place: 1536000 -> "1.5MiB".
pub fn format_bytes(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["", "Ki", "Mi", "Gi"] {
        if size < 1024.0 {
            return format!("{size:.1}{unit}B");
        }
        size /= 1024.0;
    }
    format!("{size:.1}TiB")
}

/// Duration in seconds as "1h 2m" / "3m 20s" / "45s".
pub fn format_duration(seconds: f64) -> String {
    let total_secs = seconds.max(0.0) as u64;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_field() {
        assert_eq!(format_size_field("1536000"), "1.5MiB");
        assert_eq!(format_size_field("512"), "512.0B");
        assert_eq!(format_size_field("1048576"), "1.0MiB");
        assert_eq!(format_size_field(""), "N/A B");
        assert_eq!(format_size_field("N/A"), "N/A B");
    }

    #[test]
    fn test_format_bytes_units() {
        assert_eq!(format_bytes(0), "0.0B");
        assert_eq!(format_bytes(1023), "1023.0B");
        assert_eq!(format_bytes(1024), "1.0KiB");
        assert_eq!(format_bytes(1536), "1.5KiB");
        assert_eq!(format_bytes(1073741824), "1.0GiB");
        assert_eq!(format_bytes(1099511627776), "1.0TiB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0s");
        assert_eq!(format_duration(45.0), "45s");
        assert_eq!(format_duration(90.0), "1m 30s");
        assert_eq!(format_duration(3665.0), "1h 1m");
    }
}
