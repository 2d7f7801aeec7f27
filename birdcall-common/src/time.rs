//! Timestamp utilities

use chrono::{DateTime, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current UTC time as ISO-8601 with millisecond precision, e.g. `2025-03-01T12:00:00.123Z`
pub fn iso_now() -> String {
    now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Convert seconds to duration
pub fn secs_to_duration(secs: u64) -> std::time::Duration {
    std::time::Duration::from_secs(secs)
}
