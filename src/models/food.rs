use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;

use super::{cast_date, cast_decimal, cast_number, cast_string, Field, FoodId};

/// Current document schema version written on insert
pub const SCHEMA_VERSION: u32 = 0;

/// A food item as stored in the document collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Number>,
    #[serde(
        rename = "expirationDate",
        default,
        skip_serializing_if = "Option::is_none",
        with = "expiration_date"
    )]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Decimal>,
    #[serde(rename = "__v", default)]
    pub schema_version: u32,
}

/// Partial food body accepted by create and update.
///
/// Every field is optional and unknown fields are ignored. Values are cast
/// to the field's type where possible (`"10"` for a quantity, `123` for a
/// name); `null` is kept apart from a missing field so updates can clear it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FoodPayload {
    #[serde(default, deserialize_with = "name_field")]
    pub name: Field<String>,
    #[serde(default, deserialize_with = "category_field")]
    pub category: Field<String>,
    #[serde(default, deserialize_with = "quantity_field")]
    pub quantity: Field<Number>,
    #[serde(
        rename = "expirationDate",
        default,
        deserialize_with = "expiration_date_field"
    )]
    pub expiration_date: Field<DateTime<Utc>>,
    #[serde(default, deserialize_with = "price_field")]
    pub price: Field<Decimal>,
}

fn name_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Field<String>, D::Error> {
    Field::deserialize_with(deserializer, "name", cast_string)
}

fn category_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Field<String>, D::Error> {
    Field::deserialize_with(deserializer, "category", cast_string)
}

fn quantity_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Field<Number>, D::Error> {
    Field::deserialize_with(deserializer, "quantity", cast_number)
}

fn expiration_date_field<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Field<DateTime<Utc>>, D::Error> {
    Field::deserialize_with(deserializer, "expirationDate", cast_date)
}

fn price_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Field<Decimal>, D::Error> {
    Field::deserialize_with(deserializer, "price", cast_decimal)
}

/// Confirmation body returned by delete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl Food {
    /// Build a new document from a payload under a store-assigned id
    pub fn new(id: FoodId, payload: FoodPayload) -> Self {
        Self {
            id: id.into_string(),
            name: payload.name.into_value(),
            category: payload.category.into_value(),
            quantity: payload.quantity.into_value(),
            expiration_date: payload.expiration_date.into_value(),
            price: payload.price.into_value(),
            schema_version: SCHEMA_VERSION,
        }
    }

    /// Overwrite every field the payload supplies and clear the ones sent as
    /// `null`; missing fields are kept
    pub fn apply(&mut self, payload: FoodPayload) {
        payload.name.apply_to(&mut self.name);
        payload.category.apply_to(&mut self.category);
        payload.quantity.apply_to(&mut self.quantity);
        payload.expiration_date.apply_to(&mut self.expiration_date);
        payload.price.apply_to(&mut self.price);
    }
}

impl FoodPayload {
    /// True when at least one field carries a value (null counts as absent)
    pub fn has_any_field(&self) -> bool {
        self.name.is_value()
            || self.category.is_value()
            || self.quantity.is_value()
            || self.expiration_date.is_value()
            || self.price.is_value()
    }

    /// True when at least one field carries a truthy value.
    ///
    /// Empty strings and zero numbers are falsy, so `{"quantity": 0}` has no
    /// truthy field.
    pub fn has_truthy_field(&self) -> bool {
        self.name.value().is_some_and(|name| !name.is_empty())
            || self
                .category
                .value()
                .is_some_and(|category| !category.is_empty())
            || self.quantity.value().is_some_and(is_truthy_number)
            || self.expiration_date.is_value()
            || self.price.value().is_some_and(|price| !price.is_zero())
    }
}

fn is_truthy_number(number: &Number) -> bool {
    number.as_f64().is_some_and(|value| value != 0.0 && !value.is_nan())
}

/// Render a timestamp the way the API returns dates: UTC, millisecond precision
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parse an expiration date given as `YYYY-MM-DD`, an RFC 3339 timestamp, or
/// a naive `YYYY-MM-DDTHH:MM:SS[.fff]` timestamp (read as UTC)
pub fn parse_expiration_date(raw: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = raw.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }

    Err(format!(
        "Cast to date failed for value \"{}\" at path \"expirationDate\"",
        raw
    ))
}

/// Serde adapter for optional expiration dates
pub mod expiration_date {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{format_timestamp, parse_expiration_date};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(timestamp) => serializer.serialize_str(&format_timestamp(timestamp)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(text) if text.trim().is_empty() => Ok(None),
            Some(text) => parse_expiration_date(&text)
                .map(Some)
                .map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}
