//! Small display helpers for the views.

use chrono::{DateTime, TimeZone};
use url::Url;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable size with 1024-based units: `0 B`, `512 B`, `1.5 KB`, `10 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{} {}", rounded as u64, SIZE_UNITS[unit])
    } else {
        format!("{rounded:.1} {}", SIZE_UNITS[unit])
    }
}

/// `HH:MM` in the timestamp's own zone.
pub fn format_time<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    at.format("%H:%M").to_string()
}

/// Host of a URL without a leading `www.`; the input itself if it is not a URL.
pub fn extract_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| url.to_string())
}

/// Icon for a file attachment, by mime type.
pub fn file_icon(mime_type: &str) -> &'static str {
    let mime = mime_type.to_ascii_lowercase();
    if mime.starts_with("image/") {
        "🖼️"
    } else if mime.starts_with("video/") {
        "🎬"
    } else if mime.starts_with("audio/") {
        "🎵"
    } else if mime == "application/pdf" {
        "📄"
    } else if mime.contains("zip") || mime.contains("compressed") || mime.contains("tar") {
        "📦"
    } else if mime.contains("word") || mime.starts_with("text/") {
        "📝"
    } else if mime.contains("sheet") || mime.contains("excel") {
        "📊"
    } else {
        "📎"
    }
}
