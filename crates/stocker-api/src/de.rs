// Lenient field decoders.
//
// The server is loose about scalar types: quantities come back as numbers
// or numeric strings, identifiers as strings or numbers, and nested lists
// are occasionally `null` or a bare string. These helpers are used through
// `#[serde(default, deserialize_with = "...")]`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Number or numeric string; anything else is `None`.
pub(crate) fn f64_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_f64))
}

/// String or number rendered as a string; anything else is `None`.
pub(crate) fn string_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_string))
}

/// Like [`string_opt`], collapsing absence into an empty string.
pub(crate) fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    string_opt(deserializer).map(Option::unwrap_or_default)
}

/// An array of `T`; non-arrays become empty and undecodable elements are skipped.
pub(crate) fn vec_lenient<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "super::f64_opt")]
        qty: Option<f64>,
        #[serde(default, deserialize_with = "super::string_opt")]
        id: Option<String>,
        #[serde(default, deserialize_with = "super::vec_lenient")]
        tags: Vec<String>,
    }

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        let p: Probe = serde_json::from_value(json!({"qty": "12.5", "id": 42})).unwrap();
        assert_eq!(p.qty, Some(12.5));
        assert_eq!(p.id.as_deref(), Some("42"));

        let p: Probe = serde_json::from_value(json!({"qty": 3, "id": "X-1"})).unwrap();
        assert_eq!(p.qty, Some(3.0));
        assert_eq!(p.id.as_deref(), Some("X-1"));
    }

    #[test]
    fn garbage_scalars_become_none() {
        let p: Probe = serde_json::from_value(json!({"qty": "lots", "id": null})).unwrap();
        assert_eq!(p.qty, None);
        assert_eq!(p.id, None);
    }

    #[test]
    fn non_array_lists_are_empty() {
        let p: Probe = serde_json::from_value(json!({"tags": "oops"})).unwrap();
        assert!(p.tags.is_empty());

        let p: Probe = serde_json::from_value(json!({"tags": ["a", 1, "b"]})).unwrap();
        assert_eq!(p.tags, vec!["a".to_string(), "b".to_string()]);

        let p: Probe = serde_json::from_value(json!({})).unwrap();
        assert!(p.tags.is_empty());
    }
}
