//! Validation and coercion of untyped request payloads into [`FeatureRecord`]s.

use serde_json::{Map, Value};

use crate::common::error::{PremiumError, PremiumResult};

use super::domain::{FeatureRecord, FieldKind, FieldSpec, FieldValue, FEATURE_COUNT, FEATURE_ORDER};

/// Decode a request body into a JSON object.
///
/// A body that is not JSON, or is JSON but not an object, decodes to an empty
/// object so the presence check reports the first required key as missing.
pub fn object_from_slice(body: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Decode a batch request body into a list of JSON objects.
///
/// The body itself must be a JSON array. Elements that are not objects become
/// empty records, matching [`object_from_slice`].
pub fn objects_from_slice(body: &[u8]) -> PremiumResult<Vec<Map<String, Value>>> {
    let items = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Array(items)) => items,
        Ok(other) => {
            return Err(PremiumError::InvalidBody(format!(
                "expected a JSON array, got {}",
                type_name(&other)
            )))
        }
        Err(err) => return Err(PremiumError::InvalidBody(err.to_string())),
    };

    Ok(items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => map,
            _ => Map::new(),
        })
        .collect())
}

/// Check that every required key is present, in field order.
pub fn ensure_present(input: &Map<String, Value>) -> PremiumResult<()> {
    match FEATURE_ORDER.iter().find(|f| !input.contains_key(f.name)) {
        Some(missing) => Err(PremiumError::MissingKey(missing.name)),
        None => Ok(()),
    }
}

/// Validate and coerce an untyped record.
///
/// Missing keys are reported first (the earliest in field order wins); only
/// then are values coerced, each according to its [`FieldSpec`]. Unknown keys
/// are ignored.
pub fn extract(input: &Map<String, Value>) -> PremiumResult<FeatureRecord> {
    ensure_present(input)?;

    let mut values = [FieldValue::Integer(0); FEATURE_COUNT];
    for (slot, spec) in values.iter_mut().zip(FEATURE_ORDER.iter()) {
        let raw = input.get(spec.name).ok_or(PremiumError::MissingKey(spec.name))?;
        *slot = coerce(spec, raw)?;
    }
    FeatureRecord::from_values(&values)
}

/// Coerce one value to the kind its field declares.
pub fn coerce(spec: &FieldSpec, value: &Value) -> PremiumResult<FieldValue> {
    match spec.kind {
        FieldKind::Float => coerce_float(spec.name, value).map(FieldValue::Float),
        FieldKind::Integer => coerce_integer(spec.name, value).map(FieldValue::Integer),
    }
}

/// Coerce a JSON value to a finite float.
pub fn coerce_float(field: &'static str, value: &Value) -> PremiumResult<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(conversion_error(field, FieldKind::Float, value)),
    }
}

/// Coerce a JSON value to an integer.
///
/// Integers, whole floats (`1.0`), booleans and integer strings are accepted.
/// Fractional values such as `1.5` or `"1.5"` are rejected rather than
/// truncated, so a count or flag is never silently rounded.
pub fn coerce_integer(field: &'static str, value: &Value) -> PremiumResult<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_number)),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| conversion_error(field, FieldKind::Integer, value))
}

fn conversion_error(field: &'static str, kind: FieldKind, value: &Value) -> PremiumError {
    PremiumError::invalid_field(
        field,
        format!("could not convert {} to {}", describe(value), kind.as_str()),
    )
}

fn whole_number(v: f64) -> Option<i64> {
    // i64::MAX is not representable as f64; the bound is exclusive.
    if v.is_finite() && v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("string {s:?}"),
        Value::Number(n) => format!("number {n}"),
        other => type_name(other).to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
