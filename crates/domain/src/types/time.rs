//! QDM timestamp handling
//!
//! The API exchanges naive local timestamps in [`TIME_LAYOUT`]. Record fields
//! are frequently empty strings, so decoding is lenient: anything that does not
//! parse becomes `None` instead of failing the whole page.

use chrono::{DateTime, Local, NaiveDateTime};

use crate::constants::TIME_LAYOUT;

/// Render a local timestamp the way query parameters expect it.
pub fn format_api_time(ts: &DateTime<Local>) -> String {
    ts.format(TIME_LAYOUT).to_string()
}

/// Parse a QDM timestamp, returning `None` for empty or malformed input.
pub fn parse_api_time(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(trimmed, TIME_LAYOUT).ok()
}

/// `#[serde(with = "qdm_time")]` adapter for `Option<NaiveDateTime>` fields.
pub mod qdm_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::parse_api_time;
    use crate::constants::TIME_LAYOUT;

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format(TIME_LAYOUT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse_api_time))
    }
}
