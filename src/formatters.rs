use crate::types::FileRecord;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human-readable size in powers of 1024, at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", SIZE_UNITS[unit])
}

/// Date part of the upload timestamp. The server sends naive ISO
/// timestamps; RFC 3339 is accepted too. Unparseable input is shown as is.
pub fn format_uploaded_at(value: &str) -> String {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.date_naive().format("%Y-%m-%d").to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, pattern) {
            return dt.date().format("%Y-%m-%d").to_string();
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    value.to_string()
}

pub(crate) fn format_file_line(record: &FileRecord, public_url: Option<&str>) -> String {
    let description = record
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or("No description");
    let uploaded = record
        .uploaded_at
        .as_deref()
        .map(format_uploaded_at)
        .unwrap_or_else(|| "unknown".to_string());

    let mut out = format!(
        "[{}] {}\n    {}\n    Size: {} | Uploaded: {}",
        record.id,
        record.title,
        description,
        format_file_size(record.file_size),
        uploaded
    );
    if let Some(url) = public_url {
        out.push_str(&format!("\n    Public URL: {url}"));
    }
    out
}

pub(crate) fn format_file_list(
    records: &[FileRecord],
    public_url: impl Fn(&FileRecord) -> Option<String>,
) -> String {
    if records.is_empty() {
        return "No files uploaded yet.".to_string();
    }
    records
        .iter()
        .map(|r| format_file_line(r, public_url(r).as_deref()))
        .collect::<Vec<_>>()
        .join("\n")
}
