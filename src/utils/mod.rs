const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Formats a byte count as megabytes with two decimals, or "Unknown".
pub fn format_size_mb(bytes: Option<f64>) -> String {
    match bytes {
        Some(bytes) if bytes > 0.0 => format!("{:.2} MB", bytes / BYTES_PER_MB),
        _ => "Unknown".to_string(),
    }
}

/// Trimmed value, or `None` when empty.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
