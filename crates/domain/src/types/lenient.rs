//! Deserializers for fields the API encodes inconsistently.
//!
//! Counts arrive either as JSON numbers or numeric strings, and some
//! identifiers flip between the two depending on the record.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Int(i64),
    Float(f64),
    Str(String),
}

/// Decode an integer that may be encoded as a number or a numeric string.
pub fn int_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(n) => Ok(n),
        #[allow(clippy::cast_possible_truncation)]
        NumberOrString::Float(f) if f.fract() == 0.0 => Ok(f as i64),
        NumberOrString::Float(f) => {
            Err(serde::de::Error::custom(format!("expected an integer, got {f}")))
        }
        NumberOrString::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid integer {s:?}: {e}"))),
    }
}

/// Decode an identifier that may be encoded as a number or a string.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(n) => n.to_string(),
        NumberOrString::Float(f) => f.to_string(),
        NumberOrString::Str(s) => s,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Count {
        #[serde(deserialize_with = "int_or_string")]
        count: i64,
    }

    #[derive(Deserialize)]
    struct Ident {
        #[serde(deserialize_with = "string_or_number")]
        id: String,
    }

    #[test]
    fn count_accepts_number_and_string() {
        let a: Count = serde_json::from_str(r#"{"count": 25}"#).unwrap();
        let b: Count = serde_json::from_str(r#"{"count": "25"}"#).unwrap();
        assert_eq!(a.count, 25);
        assert_eq!(b.count, 25);
    }

    #[test]
    fn count_rejects_non_numeric_string() {
        let result: Result<Count, _> = serde_json::from_str(r#"{"count": "many"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn identifier_accepts_both_encodings() {
        let a: Ident = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        let b: Ident = serde_json::from_str(r#"{"id": "42"}"#).unwrap();
        assert_eq!(a.id, "42");
        assert_eq!(b.id, "42");
    }
}
