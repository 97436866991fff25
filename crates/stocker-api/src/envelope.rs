// Response envelope normalization
//
// Server methods wrap their payload as `{"data": ...}` or, for plain
// whitelisted methods, `{"message": ...}`. Which key is used varies per
// endpoint and sometimes per server version, so every endpoint goes
// through `normalize`, which checks `data` first and `message` second.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;

/// Which envelope key carried the payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<T> {
    /// Found under `data`.
    Data(T),
    /// Found under `message` (no usable `data`).
    Message(T),
    /// Neither key present, or both `null`.
    Missing,
}

impl<T> Payload<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Data(v) | Self::Message(v) => Some(v),
            Self::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Payload<U> {
        match self {
            Self::Data(v) => Payload::Data(f(v)),
            Self::Message(v) => Payload::Message(f(v)),
            Self::Missing => Payload::Missing,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
}

/// Extract the payload from a response body, `data` taking priority.
pub fn normalize<T: DeserializeOwned>(body: &str) -> Result<Payload<T>, Error> {
    let raw: RawEnvelope = decode(body)?;
    if let Some(data) = raw.data {
        return from_value(data, body).map(Payload::Data);
    }
    if let Some(message) = raw.message {
        return from_value(message, body).map(Payload::Message);
    }
    Ok(Payload::Missing)
}

/// Decode a whole body, keeping it around for diagnostics on failure.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| deserialization(&e, body))
}

pub(crate) fn from_value<T: DeserializeOwned>(value: Value, body: &str) -> Result<T, Error> {
    serde_json::from_value(value).map_err(|e| deserialization(&e, body))
}

fn deserialization(e: &serde_json::Error, body: &str) -> Error {
    Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(body)),
        body: body.to_owned(),
    }
}

/// First 200 characters of a body, for error messages.
pub(crate) fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn data_wins_over_message() {
        let p: Payload<Vec<u32>> = normalize(r#"{"message": [9], "data": [1, 2]}"#).unwrap();
        assert_eq!(p, Payload::Data(vec![1, 2]));
    }

    #[test]
    fn falls_back_to_message() {
        let p: Payload<Vec<u32>> = normalize(r#"{"message": [3]}"#).unwrap();
        assert_eq!(p, Payload::Message(vec![3]));
    }

    #[test]
    fn null_data_counts_as_absent() {
        let p: Payload<String> = normalize(r#"{"data": null, "message": "hi"}"#).unwrap();
        assert_eq!(p, Payload::Message("hi".into()));
    }

    #[test]
    fn empty_object_is_missing() {
        let p: Payload<Value> = normalize("{}").unwrap();
        assert!(p.is_missing());
        assert_eq!(p.into_option(), None);
    }

    #[test]
    fn wrong_shape_reports_body() {
        let err = normalize::<Vec<u32>>(r#"{"data": "nope"}"#).unwrap_err();
        match err {
            Error::Deserialization { body, .. } => assert!(body.contains("nope")),
            other => panic!("expected Deserialization, got {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_a_deserialization_error() {
        assert!(matches!(
            normalize::<Value>("<html>502</html>"),
            Err(Error::Deserialization { .. })
        ));
    }
}
