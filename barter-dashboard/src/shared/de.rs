//! Lenient serde helpers for dashboard payloads.
//!
//! Upstream producers send numbers either as JSON numbers or as numeric strings, and timestamps
//! either as epoch milliseconds or RFC 3339 strings. The `de_opt_*` variants never fail: a value
//! with the wrong shape deserializes as `None` ("unknown").

use chrono::{DateTime, TimeZone, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

/// Coerce a JSON number or numeric string into an `f64`.
pub fn value_to_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}

/// Coerce a JSON integer, integral float or numeric string into a `u64`.
pub fn value_to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|float| *float >= 0.0 && float.fract() == 0.0)
                .map(|float| float as u64)
        }),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Interpret a JSON value as a timestamp: epoch milliseconds (number or numeric string) or an
/// RFC 3339 string.
pub fn value_to_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let millis = match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        Value::String(text) => match text.trim().parse::<i64>() {
            Ok(millis) => Some(millis),
            Err(_) => {
                return DateTime::parse_from_rfc3339(text.trim())
                    .ok()
                    .map(|time| time.with_timezone(&Utc))
            }
        },
        _ => None,
    }?;

    Utc.timestamp_millis_opt(millis).single()
}

/// Deserialize a required `f64` from a number or numeric string.
pub fn de_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_f64(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected numeric value, found {value}")))
}

/// Deserialize a required timestamp from epoch milliseconds or an RFC 3339 string.
pub fn de_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_timestamp(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected timestamp, found {value}")))
}

/// Deserialize an optional `f64`, treating anything non-numeric as unknown.
pub fn de_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_f64(&Value::deserialize(deserializer)?))
}

/// Deserialize an optional count, treating anything non-numeric as unknown.
pub fn de_opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_u64(&Value::deserialize(deserializer)?))
}

/// Deserialize an optional timestamp, treating anything unparseable as unknown.
pub fn de_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_timestamp(&Value::deserialize(deserializer)?))
}

/// Deserialize any `T`, treating a value of the wrong shape as unknown instead of failing the
/// enclosing payload.
pub fn de_lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => Ok(serde_json::from_value(value).ok()),
    }
}
