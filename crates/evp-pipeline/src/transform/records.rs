//! Record extraction and normalization
//!
//! Missing or malformed field data never aborts a record: identifiers and
//! names fall back to a default, ages degrade to null, and event times
//! degrade to a fixed sentinel. Every degraded field leaves a diagnostic in
//! the log.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Placeholder written when no valid event time can be derived.
pub const SENTINEL_EVENT_TIME: &str = "0000-00-00T00:00:00.000Z";

/// Default for missing identifier and name fields.
pub const UNKNOWN: &str = "Unknown";

const EVENT_TIME_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const EVENT_TIME_OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// One `<User>` element as it appears in a source document
#[derive(Debug, Default, Deserialize)]
pub struct RawUser {
    #[serde(rename = "UserID", default)]
    pub user_id: Option<String>,

    #[serde(rename = "UserName", default)]
    pub user_name: Option<String>,

    #[serde(rename = "UserAge", default)]
    pub user_age: Option<String>,

    #[serde(rename = "EventTime", default)]
    pub event_time: Option<String>,
}

/// A normalized user record, serialized one-per-line into bucket files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "UserID")]
    pub user_id: String,

    #[serde(rename = "UserName")]
    pub user_name: String,

    /// Null when the source value was missing or not an integer
    #[serde(rename = "UserAge")]
    pub age: Option<i64>,

    /// Millisecond-precision UTC timestamp, or [`SENTINEL_EVENT_TIME`]
    #[serde(rename = "EventTime")]
    pub event_time: String,
}

impl UserRecord {
    /// Normalize one raw record, degrading bad fields instead of failing
    pub fn from_raw(raw: &RawUser) -> Self {
        let user_id = extract_field(raw.user_id.as_deref(), "UserID", Some(UNKNOWN));
        let user_name = extract_field(raw.user_name.as_deref(), "UserName", Some(UNKNOWN));
        let age = coerce_age(extract_field(raw.user_age.as_deref(), "UserAge", None).as_deref());
        let event_time =
            normalize_event_time(extract_field(raw.event_time.as_deref(), "EventTime", None).as_deref());

        Self {
            user_id: user_id.unwrap_or_else(|| UNKNOWN.to_string()),
            user_name: user_name.unwrap_or_else(|| UNKNOWN.to_string()),
            age,
            event_time,
        }
    }
}

/// Return the field's text when present and non-empty, otherwise the
/// caller-supplied default. Absence is data, not an error, but it is logged.
pub fn extract_field(value: Option<&str>, field_name: &str, default: Option<&str>) -> Option<String> {
    match value {
        Some(text) if !text.is_empty() => Some(text.to_string()),
        _ => {
            warn!("Missing or empty field: {}", field_name);
            default.map(str::to_string)
        },
    }
}

/// Coerce a raw age value to an integer; anything unparseable becomes null.
pub fn coerce_age(raw: Option<&str>) -> Option<i64> {
    match raw {
        Some(text) => match text.trim().parse::<i64>() {
            Ok(age) => Some(age),
            Err(_) => {
                error!("Invalid UserAge value: {}", text);
                None
            },
        },
        None => {
            error!("Invalid UserAge value: (missing)");
            None
        },
    }
}

/// Normalize a raw event time to millisecond-precision UTC.
///
/// The input is expected as `YYYY-MM-DDTHH:MM:SS` with no timezone and no
/// fractional seconds; the value is treated as already UTC. Missing input
/// yields the sentinel silently; malformed input yields the sentinel and a
/// diagnostic naming the bad value.
pub fn normalize_event_time(raw: Option<&str>) -> String {
    let Some(text) = raw else {
        return SENTINEL_EVENT_TIME.to_string();
    };

    match NaiveDateTime::parse_from_str(text, EVENT_TIME_INPUT_FORMAT) {
        Ok(instant) => instant.format(EVENT_TIME_OUTPUT_FORMAT).to_string(),
        Err(_) => {
            error!("Invalid EventTime format: {}", text);
            SENTINEL_EVENT_TIME.to_string()
        },
    }
}
