//! Raw record normalization
//!
//! The only place where the nested upstream shape is flattened and where
//! `address` is composed.

use super::types::{NormalizedUserRecord, RawUserRecord};
use crate::error::{Error, Result};
use crate::types::JsonValue;

/// Flatten a raw upstream record into the topic schema
///
/// Fails with [`Error::MissingField`] naming the dotted key path of the first
/// absent, null or blank required key. No partial record is ever returned.
pub fn normalize(raw: &RawUserRecord) -> Result<NormalizedUserRecord> {
    let number = required_text(raw, "location.street.number")?;
    let street = required_text(raw, "location.street.name")?;
    let city = required_text(raw, "location.city")?;
    let state = required_text(raw, "location.state")?;
    let country = required_text(raw, "location.country")?;

    Ok(NormalizedUserRecord {
        first_name: required_text(raw, "name.first")?,
        last_name: required_text(raw, "name.last")?,
        gender: required_text(raw, "gender")?,
        address: compose_address(&number, &street, &city, &state, &country),
        postcode: required_text(raw, "location.postcode")?,
        email: required_text(raw, "email")?,
        username: required_text(raw, "login.username")?,
        dob: required_text(raw, "dob.date")?,
        registered_date: required_text(raw, "registered.date")?,
        phone: required_text(raw, "phone")?,
        picture: required_text(raw, "picture.medium")?,
    })
}

/// Compose the single-line address string
///
/// Two spaces follow the comma after the city.
pub fn compose_address(
    number: &str,
    street: &str,
    city: &str,
    state: &str,
    country: &str,
) -> String {
    format!("{number} {street} {city},  {state}, {country}")
}

/// Read a scalar leaf as text
///
/// Strings are taken verbatim and a blank string counts as missing; numbers
/// and booleans use their JSON text (the upstream API sends `street.number`
/// and some postcodes as numbers).
fn required_text(raw: &RawUserRecord, path: &str) -> Result<String> {
    match raw.get_path(path) {
        None | Some(JsonValue::Null) => Err(Error::missing_field(path)),
        Some(JsonValue::String(s)) if s.trim().is_empty() => Err(Error::missing_field(path)),
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(JsonValue::Number(n)) => Ok(n.to_string()),
        Some(JsonValue::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(Error::malformed(format!(
            "field '{path}' must be a scalar, got {}",
            json_type_name(other)
        ))),
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
