//! Human-readable sizes and audio MIME handling for uploads.

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format a byte count as e.g. `"1.5 MB"`: base 1024, at most two decimals,
/// trailing zeros dropped. Anything past GB stays in GB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

pub fn is_audio_mime(content_type: &str) -> bool {
    content_type.trim().to_lowercase().starts_with("audio/")
}

/// Recorders report things like `audio/webm;codecs=opus` or `video/webm`;
/// anything WebM is sent upstream as plain `audio/webm`.
pub fn normalize_audio_mime(content_type: &str) -> String {
    let content_type = content_type.trim().to_lowercase();
    if content_type.contains("webm") {
        "audio/webm".to_string()
    } else {
        content_type
    }
}
