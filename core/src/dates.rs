//! Platform date handling.
//!
//! The platform exchanges date-times as `yyyy-MM-ddTHH:mm:ss+zzzz`. A few
//! endpoints want bare `yyyy-MM-dd` dates instead; specs for those carry
//! `DateFormat::Date`, and the engine rewrites every date-time string of the
//! outgoing payload to its date part.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde_json::Value;

pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateFormat {
    #[default]
    DateTime,
    Date,
}

pub fn format_date_time(value: &DateTime<Utc>) -> String {
    value.format(DATE_TIME_FORMAT).to_string()
}

/// Parse a full platform date-time (RFC 3339 offsets are accepted too).
pub fn parse_date_time(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(text, DATE_TIME_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .ok()
}

/// Parse either a full date-time or a bare date (taken as midnight UTC).
pub fn parse_lenient(text: &str) -> Option<DateTime<Utc>> {
    if let Some(value) = parse_date_time(text) {
        return Some(value.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Rewrite the date-time strings of `tree` according to `format`.
pub fn apply_date_format(tree: Value, format: DateFormat) -> Value {
    match format {
        DateFormat::DateTime => tree,
        DateFormat::Date => to_dates(tree),
    }
}

fn to_dates(tree: Value) -> Value {
    match tree {
        Value::String(text) => match parse_date_time(&text) {
            Some(value) => Value::String(value.format(DATE_FORMAT).to_string()),
            None => Value::String(text),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(to_dates).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, to_dates(v))).collect()),
        other => other,
    }
}

/// Serde adapter for optional platform date-times on domain types.
pub mod optional_date_time {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_str(&super::format_date_time(value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => super::parse_lenient(&text)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid platform date '{text}'"))),
            None => Ok(None),
        }
    }
}
