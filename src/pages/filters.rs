//! Template filters used by the page templates.

use std::fmt::Display;

use chrono::{DateTime, NaiveDateTime};

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const BYTE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// `{{ ts|format_timestamp }}`
pub fn format_timestamp<T: Display>(value: T) -> askama::Result<String> {
    Ok(timestamp_display(&value.to_string()))
}

/// `{{ n|format_bytes }}`
pub fn format_bytes<T: Display>(value: T) -> askama::Result<String> {
    let raw = value.to_string();
    let bytes = raw.trim().parse::<f64>().unwrap_or(0.0);
    Ok(bytes_display(bytes))
}

/// ISO-8601 timestamp as `YYYY-MM-DD HH:MM:SS` in its own offset.
/// Anything unparseable is returned as given.
pub(crate) fn timestamp_display(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format(DISPLAY_FORMAT).to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return dt.format(DISPLAY_FORMAT).to_string();
        }
    }

    tracing::warn!(timestamp = %raw, "could not parse timestamp for display");
    raw.to_string()
}

/// Human-readable size with two decimals, capped at GB.
pub(crate) fn bytes_display(bytes: f64) -> String {
    if bytes == 0.0 || !bytes.is_finite() {
        return "0 B".to_string();
    }

    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, BYTE_UNITS[unit])
}
