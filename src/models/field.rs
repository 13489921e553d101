use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer};
use serde_json::{Number, Value};
use std::str::FromStr;

use super::parse_expiration_date;

/// One field of a partial body: left out, sent as `null`, or sent with a value
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Field<T> {
    #[default]
    Missing,
    Null,
    Value(T),
}

impl<T> Field<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(value) => Some(value),
            Field::Missing | Field::Null => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Field::Value(value) => Some(value),
            Field::Missing | Field::Null => None,
        }
    }

    pub fn as_ref(&self) -> Field<&T> {
        match self {
            Field::Missing => Field::Missing,
            Field::Null => Field::Null,
            Field::Value(value) => Field::Value(value),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Field::Missing => Field::Missing,
            Field::Null => Field::Null,
            Field::Value(value) => Field::Value(f(value)),
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Field::Value(_))
    }

    /// Write this field onto a stored one: a value replaces it, `null` clears
    /// it, a missing field leaves it alone
    pub fn apply_to(self, target: &mut Option<T>) {
        match self {
            Field::Missing => {}
            Field::Null => *target = None,
            Field::Value(value) => *target = Some(value),
        }
    }

    /// Deserialize a present field, converting its JSON value with `cast`
    pub fn deserialize_with<'de, D>(
        deserializer: D,
        path: &str,
        cast: fn(&Value, &str) -> Result<Option<T>, String>,
    ) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        if raw.is_null() {
            return Ok(Field::Null);
        }

        match cast(&raw, path).map_err(de::Error::custom)? {
            Some(value) => Ok(Field::Value(value)),
            None => Ok(Field::Null),
        }
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Field::Value(value)
    }
}

/// Strings, numbers and booleans become text
pub fn cast_string(raw: &Value, path: &str) -> Result<Option<String>, String> {
    match raw {
        Value::String(text) => Ok(Some(text.clone())),
        Value::Number(number) => Ok(Some(number.to_string())),
        Value::Bool(flag) => Ok(Some(flag.to_string())),
        _ => Err(cast_error("string", raw, path)),
    }
}

/// Numbers are kept as sent; numeric strings and booleans are converted and
/// an empty string reads as `null`
pub fn cast_number(raw: &Value, path: &str) -> Result<Option<Number>, String> {
    match raw {
        Value::Number(number) => Ok(Some(number.clone())),
        Value::Bool(flag) => Ok(Some(Number::from(u8::from(*flag)))),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => {
            let trimmed = text.trim();
            Number::from_str(trimmed)
                .ok()
                .or_else(|| f64::from_str(trimmed).ok().and_then(Number::from_f64))
                .map(Some)
                .ok_or_else(|| cast_error("Number", raw, path))
        }
        _ => Err(cast_error("Number", raw, path)),
    }
}

/// Like [`cast_number`], producing a decimal
pub fn cast_decimal(raw: &Value, path: &str) -> Result<Option<Decimal>, String> {
    let text = match raw {
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => return Ok(Some(Decimal::from(u8::from(*flag)))),
        Value::String(text) if text.trim().is_empty() => return Ok(None),
        Value::String(text) => text.trim().to_string(),
        _ => return Err(cast_error("Number", raw, path)),
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
        .or_else(|| f64::from_str(&text).ok().and_then(Decimal::from_f64))
        .map(Some)
        .ok_or_else(|| cast_error("Number", raw, path))
}

/// Date strings as accepted by [`parse_expiration_date`], or epoch milliseconds
pub fn cast_date(raw: &Value, path: &str) -> Result<Option<DateTime<Utc>>, String> {
    match raw {
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => parse_expiration_date(text)
            .map(Some)
            .map_err(|_| cast_error("Date", raw, path)),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|millis| millis.trunc() as i64))
            .and_then(DateTime::from_timestamp_millis)
            .map(Some)
            .ok_or_else(|| cast_error("Date", raw, path)),
        _ => Err(cast_error("Date", raw, path)),
    }
}

fn cast_error(target: &str, raw: &Value, path: &str) -> String {
    let kind = match raw {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    };

    format!(
        "Cast to {} failed for value {} (type {}) at path \"{}\"",
        target, raw, kind, path
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_apply_to() {
        let mut stored = Some("Apple".to_string());

        Field::Missing.apply_to(&mut stored);
        assert_eq!(stored.as_deref(), Some("Apple"));

        Field::Value("Pear".to_string()).apply_to(&mut stored);
        assert_eq!(stored.as_deref(), Some("Pear"));

        Field::Null.apply_to(&mut stored);
        assert_eq!(stored, None);
    }

    #[test]
    fn test_cast_string_converts_scalars() {
        assert_eq!(cast_string(&json!("Apple"), "name").unwrap().as_deref(), Some("Apple"));
        assert_eq!(cast_string(&json!(123), "name").unwrap().as_deref(), Some("123"));
        assert_eq!(cast_string(&json!(true), "name").unwrap().as_deref(), Some("true"));

        let err = cast_string(&json!({"first": "Apple"}), "name").unwrap_err();
        assert_eq!(
            err,
            "Cast to string failed for value {\"first\":\"Apple\"} (type Object) at path \"name\""
        );
    }

    #[test]
    fn test_cast_number_accepts_numeric_strings() {
        assert_eq!(cast_number(&json!(10), "quantity").unwrap(), Some(Number::from(10)));
        assert_eq!(cast_number(&json!("10"), "quantity").unwrap(), Some(Number::from(10)));
        assert_eq!(
            cast_number(&json!(" 2.5 "), "quantity").unwrap(),
            Number::from_f64(2.5)
        );
        assert_eq!(cast_number(&json!(true), "quantity").unwrap(), Some(Number::from(1)));
        assert_eq!(cast_number(&json!(""), "quantity").unwrap(), None);

        let err = cast_number(&json!("ten"), "quantity").unwrap_err();
        assert_eq!(
            err,
            "Cast to Number failed for value \"ten\" (type string) at path \"quantity\""
        );
        assert!(cast_number(&json!("NaN"), "quantity").is_err());
        assert!(cast_number(&json!([1]), "quantity").is_err());
    }

    #[test]
    fn test_cast_decimal() {
        assert_eq!(cast_decimal(&json!(2.5), "price").unwrap(), Some(dec!(2.5)));
        assert_eq!(cast_decimal(&json!("3.75"), "price").unwrap(), Some(dec!(3.75)));
        assert_eq!(cast_decimal(&json!("1e2"), "price").unwrap(), Some(dec!(100)));
        assert_eq!(cast_decimal(&json!(false), "price").unwrap(), Some(dec!(0)));
        assert!(cast_decimal(&json!("cheap"), "price").is_err());
    }

    #[test]
    fn test_cast_date() {
        let midnight = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

        assert_eq!(cast_date(&json!("2024-05-01"), "expirationDate").unwrap(), Some(midnight));
        assert_eq!(
            cast_date(&json!(midnight.timestamp_millis()), "expirationDate").unwrap(),
            Some(midnight)
        );
        assert_eq!(cast_date(&json!(""), "expirationDate").unwrap(), None);

        let err = cast_date(&json!("next tuesday"), "expirationDate").unwrap_err();
        assert!(err.starts_with("Cast to Date failed"), "{}", err);
        assert!(cast_date(&json!(true), "expirationDate").is_err());
    }
}
