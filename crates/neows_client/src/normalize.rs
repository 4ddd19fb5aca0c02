//! Flattening NeoWs responses into canonical `AsteroidRecord`s.
//!
//! The feed endpoint groups objects by close-approach date, browse returns a
//! flat page, and lookup returns a single object. Shape is decided once by
//! [`ResponseShape::detect`]; every record then goes through the same mapping.

use common::{AsteroidRecord, ProviderError};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Diameter assumed when the provider gives no estimate.
pub const DEFAULT_DIAMETER_METERS: f64 = 100.0;

/// The two collection shapes NeoWs produces.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// `near_earth_objects: { "YYYY-MM-DD": [..], .. }`
    DateKeyed(BTreeMap<String, Vec<Value>>),
    /// `near_earth_objects: [..]`, a bare array, or a single lookup object.
    Flat(Vec<Value>),
}

impl ResponseShape {
    pub fn detect(body: Value) -> Result<Self, ProviderError> {
        match body {
            Value::Array(items) => Ok(ResponseShape::Flat(items)),
            Value::Object(mut obj) => match obj.remove("near_earth_objects") {
                Some(Value::Object(buckets)) => {
                    let mut grouped = BTreeMap::new();
                    for (date, entries) in buckets {
                        let Value::Array(list) = entries else {
                            return Err(ProviderError::MalformedResponse(format!(
                                "feed bucket '{date}' is not an array"
                            )));
                        };
                        grouped.insert(date, list);
                    }
                    Ok(ResponseShape::DateKeyed(grouped))
                }
                Some(Value::Array(items)) => Ok(ResponseShape::Flat(items)),
                Some(other) => Err(ProviderError::MalformedResponse(format!(
                    "near_earth_objects is neither a map nor a list: {}",
                    type_name(&other)
                ))),
                None if obj.contains_key("id") => Ok(ResponseShape::Flat(vec![Value::Object(obj)])),
                None => Err(ProviderError::MalformedResponse(
                    "response has neither near_earth_objects nor an id".into(),
                )),
            },
            other => Err(ProviderError::MalformedResponse(format!(
                "expected a JSON object or array, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Raw objects in output order: date buckets ascending, then position.
    pub fn into_items(self) -> Vec<Value> {
        match self {
            ResponseShape::DateKeyed(grouped) => grouped.into_values().flatten().collect(),
            ResponseShape::Flat(items) => items,
        }
    }
}

/// Detect the shape of `body` and map every object to an `AsteroidRecord`.
pub fn normalize(body: Value) -> Result<Vec<AsteroidRecord>, ProviderError> {
    ResponseShape::detect(body)?
        .into_items()
        .iter()
        .map(map_record)
        .collect()
}

/// Map one provider object. Also accepts an already-normalized record.
pub fn map_record(raw: &Value) -> Result<AsteroidRecord, ProviderError> {
    let obj = raw.as_object().ok_or_else(|| {
        ProviderError::MalformedResponse(format!("asteroid entry is {}", type_name(raw)))
    })?;

    let id = identity(obj, "id")?;
    let name = identity(obj, "name")?;

    let meters = obj.get("estimated_diameter").and_then(|d| d.get("meters"));
    let min = meters
        .and_then(|m| m.get("estimated_diameter_min"))
        .or_else(|| obj.get("estimated_diameter_min_meters"))
        .and_then(Value::as_f64);
    let max = meters
        .and_then(|m| m.get("estimated_diameter_max"))
        .or_else(|| obj.get("estimated_diameter_max_meters"))
        .and_then(Value::as_f64);
    let diameter = max
        .or_else(|| obj.get("estimated_diameter_meters").and_then(Value::as_f64))
        .unwrap_or(DEFAULT_DIAMETER_METERS);

    let hazardous = obj
        .get("is_potentially_hazardous_asteroid")
        .or_else(|| obj.get("is_potentially_hazardous"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Ok(AsteroidRecord {
        id,
        name,
        estimated_diameter_meters: diameter,
        estimated_diameter_min_meters: min,
        estimated_diameter_max_meters: max,
        is_potentially_hazardous: hazardous,
        absolute_magnitude_h: obj.get("absolute_magnitude_h").and_then(Value::as_f64),
        nasa_jpl_url: obj
            .get("nasa_jpl_url")
            .and_then(Value::as_str)
            .map(str::to_string),
        is_sentry_object: obj.get("is_sentry_object").and_then(Value::as_bool),
        close_approach_data: pass_through(obj, "close_approach_data"),
        orbital_data: pass_through(obj, "orbital_data"),
    })
}

fn identity(obj: &Map<String, Value>, field: &str) -> Result<String, ProviderError> {
    match obj.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(ProviderError::MalformedResponse(format!(
            "asteroid record missing '{field}'"
        ))),
    }
}

fn pass_through(obj: &Map<String, Value>, field: &str) -> Option<Value> {
    obj.get(field).filter(|v| !v.is_null()).cloned()
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
