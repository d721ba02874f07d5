//! Validation and normalization of campaign payloads.
//!
//! Payloads arrive as untyped json so that every field can be checked and
//! reported at once. Creation requires every field except `state`, `city`
//! and `zip`; updates accept any subset. Cross-field rules only compare
//! fields supplied in the same payload.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use strum::IntoEnumIterator;

use super::{Gender, Publisher, Screen};

pub const ROOT_PATH: &str = "_errors";

const MIN_NAME_LENGTH: usize = 2;
const MIN_COUNTRY_LENGTH: usize = 2;
const MIN_AGE: i64 = 13;
const MAX_AGE: i64 = 120;

const REQUIRED_FIELDS: &[&str] = &[
    "name",
    "budget_usd",
    "start_date",
    "end_date",
    "age_min",
    "age_max",
    "gender",
    "country",
    "inventory",
    "screens",
];

/// Field path to the messages reported for it, in path order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.entry(path.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    #[cfg(test)]
    pub fn messages(&self, path: &str) -> &[String] {
        self.0.get(path).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CampaignInput {
    pub name: String,
    pub budget_usd: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub age_min: i32,
    pub age_max: i32,
    pub gender: Gender,
    pub country: String,
    pub state: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub inventory: Vec<Publisher>,
    pub screens: Vec<Screen>,
}

/// A normalized partial update. `None` means "leave unchanged"; for the
/// nullable location fields `Some(None)` clears the stored value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CampaignPatch {
    pub name: Option<String>,
    pub budget_usd: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
    pub gender: Option<Gender>,
    pub country: Option<String>,
    pub state: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub zip: Option<Option<String>>,
    pub inventory: Option<Vec<Publisher>>,
    pub screens: Option<Vec<Screen>>,
}

impl CampaignPatch {
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        *self == CampaignPatch::default()
    }
}

#[tracing::instrument(skip(payload))]
pub fn validate_create(payload: &Value) -> Result<CampaignInput, ValidationErrors> {
    let object = expect_object(payload)?;
    let (patch, mut errors) = parse_fields(object);

    for field in REQUIRED_FIELDS {
        if !object.contains_key(*field) {
            errors.add(*field, "Required");
        }
    }

    check_cross_fields(&patch, &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }

    match patch {
        CampaignPatch {
            name: Some(name),
            budget_usd: Some(budget_usd),
            start_date: Some(start_date),
            end_date: Some(end_date),
            age_min: Some(age_min),
            age_max: Some(age_max),
            gender: Some(gender),
            country: Some(country),
            state,
            city,
            zip,
            inventory: Some(inventory),
            screens: Some(screens),
        } => Ok(CampaignInput {
            name,
            budget_usd,
            start_date,
            end_date,
            age_min,
            age_max,
            gender,
            country,
            state: state.flatten(),
            city: city.flatten(),
            zip: zip.flatten(),
            inventory,
            screens,
        }),
        _ => {
            errors.add(ROOT_PATH, "Incomplete campaign");
            Err(errors)
        }
    }
}

#[tracing::instrument(skip(payload))]
pub fn validate_update(payload: &Value) -> Result<CampaignPatch, ValidationErrors> {
    let object = expect_object(payload)?;
    let (patch, mut errors) = parse_fields(object);

    check_cross_fields(&patch, &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(patch)
}

fn expect_object(payload: &Value) -> Result<&Map<String, Value>, ValidationErrors> {
    payload.as_object().ok_or_else(|| {
        let mut errors = ValidationErrors::default();
        errors.add(ROOT_PATH, "Expected object");
        errors
    })
}

fn parse_fields(object: &Map<String, Value>) -> (CampaignPatch, ValidationErrors) {
    let mut errors = ValidationErrors::default();
    let errors_ref = &mut errors;

    let patch = CampaignPatch {
        name: field(object, "name", errors_ref, |v| parse_text(v, MIN_NAME_LENGTH)),
        budget_usd: field(object, "budget_usd", errors_ref, parse_budget),
        start_date: field(object, "start_date", errors_ref, parse_date),
        end_date: field(object, "end_date", errors_ref, parse_date),
        age_min: field(object, "age_min", errors_ref, |v| {
            parse_age(v, Some(MIN_AGE), None)
        }),
        age_max: field(object, "age_max", errors_ref, |v| {
            parse_age(v, None, Some(MAX_AGE))
        }),
        gender: field(object, "gender", errors_ref, parse_choice::<Gender>),
        country: field(object, "country", errors_ref, |v| {
            parse_text(v, MIN_COUNTRY_LENGTH)
        }),
        state: field(object, "state", errors_ref, parse_nullable_text),
        city: field(object, "city", errors_ref, parse_nullable_text),
        zip: field(object, "zip", errors_ref, parse_nullable_text),
        inventory: list_field::<Publisher>(object, "inventory", errors_ref),
        screens: list_field::<Screen>(object, "screens", errors_ref),
    };

    (patch, errors)
}

fn check_cross_fields(patch: &CampaignPatch, errors: &mut ValidationErrors) {
    if let (Some(start_date), Some(end_date)) = (patch.start_date, patch.end_date) {
        if start_date > end_date {
            errors.add("start_date", "Start must be ≤ End");
        }
    }

    if let (Some(age_min), Some(age_max)) = (patch.age_min, patch.age_max) {
        if age_min > age_max {
            errors.add("age_min", "Age min must be ≤ max");
        }
    }
}

fn field<T>(
    object: &Map<String, Value>,
    key: &str,
    errors: &mut ValidationErrors,
    parse: impl FnOnce(&Value) -> Result<T, String>,
) -> Option<T> {
    let value = object.get(key)?;
    match parse(value) {
        Ok(parsed) => Some(parsed),
        Err(message) => {
            errors.add(key, message);
            None
        }
    }
}

fn parse_text(value: &Value, min_length: usize) -> Result<String, String> {
    let text = value.as_str().ok_or("Expected string")?;
    if text.chars().count() < min_length {
        return Err(format!(
            "String must contain at least {} character(s)",
            min_length
        ));
    }

    Ok(text.to_owned())
}

fn parse_nullable_text(value: &Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text.clone())),
        _ => Err("Expected string".to_owned()),
    }
}

/// Accepts json numbers and numeric strings.
fn coerce_number(value: &Value) -> Result<f64, String> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    number
        .filter(|number| number.is_finite())
        .ok_or_else(|| "Expected number".to_owned())
}

fn parse_budget(value: &Value) -> Result<f64, String> {
    let budget = coerce_number(value)?;
    if budget < 0.0 {
        return Err("Number must be greater than or equal to 0".to_owned());
    }

    Ok(budget)
}

fn parse_age(value: &Value, min: Option<i64>, max: Option<i64>) -> Result<i32, String> {
    let number = coerce_number(value)?;
    if number.fract() != 0.0 {
        return Err("Expected integer".to_owned());
    }

    let age = number as i64;
    if let Some(min) = min {
        if age < min {
            return Err(format!("Number must be greater than or equal to {}", min));
        }
    }
    if let Some(max) = max {
        if age > max {
            return Err(format!("Number must be less than or equal to {}", max));
        }
    }

    i32::try_from(age).map_err(|_| "Expected integer".to_owned())
}

/// Accepts `YYYY-MM-DD`, an RFC 3339 date-time (its UTC date is kept), a
/// date-time without offset, or epoch milliseconds.
pub(crate) fn parse_date(value: &Value) -> Result<NaiveDate, String> {
    let date = match value {
        Value::String(text) => {
            let text = text.trim();
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .or_else(|| {
                    DateTime::parse_from_rfc3339(text)
                        .ok()
                        .map(|datetime| datetime.with_timezone(&Utc).date_naive())
                })
                .or_else(|| {
                    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                        .ok()
                        .map(|datetime| datetime.date())
                })
        }
        Value::Number(number) => number
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|datetime| datetime.date_naive()),
        _ => None,
    };

    date.ok_or_else(|| "Invalid date".to_owned())
}

fn parse_choice<T>(value: &Value) -> Result<T, String>
where
    T: FromStr + IntoEnumIterator + AsRef<str>,
{
    let text = value.as_str().ok_or("Expected string")?;
    T::from_str(text).map_err(|_| {
        let expected: Vec<String> = T::iter()
            .map(|choice| format!("'{}'", choice.as_ref()))
            .collect();
        format!(
            "Invalid enum value. Expected {}, received '{}'",
            expected.join(" | "),
            text
        )
    })
}

/// Parses a non-empty list of enum values, reporting bad elements under
/// `key.index`. Repeated values are kept.
fn list_field<T>(
    object: &Map<String, Value>,
    key: &str,
    errors: &mut ValidationErrors,
) -> Option<Vec<T>>
where
    T: FromStr + IntoEnumIterator + AsRef<str>,
{
    let value = object.get(key)?;
    let elements = match value.as_array() {
        Some(elements) => elements,
        None => {
            errors.add(key, "Expected array");
            return None;
        }
    };

    if elements.is_empty() {
        errors.add(key, "Array must contain at least 1 element(s)");
        return None;
    }

    let mut parsed = Vec::with_capacity(elements.len());
    let mut valid = true;
    for (index, element) in elements.iter().enumerate() {
        match parse_choice::<T>(element) {
            Ok(choice) => parsed.push(choice),
            Err(message) => {
                errors.add(format!("{}.{}", key, index), message);
                valid = false;
            }
        }
    }

    valid.then(|| parsed)
}
