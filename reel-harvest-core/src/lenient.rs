//! Tolerant serde adapters for checkpoint fields written by older runs.
//!
//! Older checkpoints store missing strings as `""` and numbers either as JSON
//! numbers or as text. Both read back as `None` when they carry no value.

use std::str::FromStr;

use serde::{Deserialize, Deserializer};

/// Deserialize an optional string, treating `""` (after trimming) as absent.
pub fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<T> {
    Number(T),
    Text(String),
}

/// Deserialize an optional number that may have been written as text.
///
/// Text that does not parse yields `None` rather than an error.
pub fn number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
{
    let value: Option<NumberOrText<T>> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "super::empty_as_none")]
        text: Option<String>,
        #[serde(default, deserialize_with = "super::number")]
        year: Option<i32>,
    }

    fn probe(json: &str) -> Probe {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn empty_strings_are_absent() {
        assert_eq!(probe(r#"{"text": ""}"#).text, None);
        assert_eq!(probe(r#"{"text": "  "}"#).text, None);
        assert_eq!(probe(r#"{"text": "x"}"#).text.as_deref(), Some("x"));
        assert_eq!(probe(r#"{}"#).text, None);
    }

    #[test]
    fn numbers_accept_text() {
        assert_eq!(probe(r#"{"year": 2019}"#).year, Some(2019));
        assert_eq!(probe(r#"{"year": "2019"}"#).year, Some(2019));
        assert_eq!(probe(r#"{"year": "unknown"}"#).year, None);
        assert_eq!(probe(r#"{"year": null}"#).year, None);
    }
}
