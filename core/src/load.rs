//! Entity loading helpers.
//!
//! Every domain entity implements `Load` with the helpers below so required
//! and optional keys are treated the same way everywhere: a missing required
//! key fails with `Error::MissingField`, a missing or `null` optional key
//! yields `None`.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Builds an entity from decoded JSON.
pub trait Load: Sized {
    fn load(data: &Value) -> Result<Self>;
}

pub fn object(data: &Value) -> Result<&Map<String, Value>> {
    data.as_object()
        .ok_or_else(|| Error::Deserialization(format!("expected a JSON object, got {data}")))
}

fn decode<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|e| Error::Deserialization(format!("field `{key}`: {e}")))
}

/// A key that must be present. `null` is accepted when `T` allows it.
pub fn required<T: DeserializeOwned>(data: &Map<String, Value>, key: &'static str) -> Result<T> {
    let value = data.get(key).ok_or(Error::MissingField(key))?;
    decode(key, value)
}

/// A key that may be absent or `null`.
pub fn optional<T: DeserializeOwned>(data: &Map<String, Value>, key: &'static str) -> Result<Option<T>> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => decode(key, value).map(Some),
    }
}

/// A required key converted by `convert`.
pub fn required_with<T>(
    data: &Map<String, Value>,
    key: &'static str,
    convert: impl FnOnce(&Value) -> Result<T>,
) -> Result<T> {
    convert(data.get(key).ok_or(Error::MissingField(key))?)
}

/// An optional key converted by `convert` when present.
pub fn optional_with<T>(
    data: &Map<String, Value>,
    key: &'static str,
    convert: impl FnOnce(&Value) -> Result<T>,
) -> Result<Option<T>> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => convert(value).map(Some),
    }
}

/// Load each element of a JSON array, keeping source order.
pub fn load_list<T: Load>(data: &Value) -> Result<Vec<T>> {
    data.as_array()
        .ok_or_else(|| Error::Deserialization(format!("expected a JSON array, got {data}")))?
        .iter()
        .map(T::load)
        .collect()
}

/// Parse an engine timestamp.
///
/// Accepts RFC 3339, the engine's default `2013-01-23T13:42:42.000+0200`,
/// and offset-less timestamps, which are taken as UTC.
pub fn parse_datetime(text: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(dt);
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc().fixed_offset())
        .map_err(|e| Error::Deserialization(format!("invalid timestamp {text:?}: {e}")))
}

/// `convert` adapter for timestamp fields.
pub fn datetime(value: &Value) -> Result<DateTime<FixedOffset>> {
    let text = String::deserialize(value).map_err(|e| Error::Deserialization(e.to_string()))?;
    parse_datetime(&text)
}
