use crate::utils::error::{Result, ServiceError};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// 寫入 stringValue 的固定格式
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a gateway date-time. Offsets are kept as given: the wall-clock
/// time in the value's own zone is what gets formatted.
pub fn parse_gateway_datetime(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::DateFormat {
            value: value.to_string(),
            reason: "empty value".to_string(),
        });
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%z") {
        return Ok(dt.naive_local());
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight);
        }
    }

    Err(ServiceError::DateFormat {
        value: value.to_string(),
        reason: "not a recognised date-time format".to_string(),
    })
}

pub fn to_canonical_string(value: &str) -> Result<String> {
    Ok(parse_gateway_datetime(value)?
        .format(CANONICAL_FORMAT)
        .to_string())
}
