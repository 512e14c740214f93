use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

use crate::error::ValidationError;

/// Parse a commit timestamp as handed over by an ingestion pipeline.
///
/// Accepts RFC 3339 (`git log --format=%cI`), git's ISO-like default
/// (`2024-05-01 10:00:00 +0200`, `%ci`) and bare Unix seconds (`%ct`).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(invalid(raw, "empty"));
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::<FixedOffset>::parse_from_str(value, "%Y-%m-%d %H:%M:%S %z") {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(secs) = value.parse::<i64>() {
        return Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| invalid(raw, "out of range"));
    }

    Err(invalid(raw, "unrecognized format"))
}

/// Render a timestamp the way every HTTP response body carries it.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn invalid(raw: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidTimestamp {
        value: raw.to_string(),
        reason: reason.to_string(),
    }
}
