//! Owner id resolution over historically used record field names.
//!
//! # Invariants
//! - Nested creator objects are checked before flat aliases.
//! - Ids compare as normalized strings: `5`, `5.0` and `"5"` are equal, as
//!   are `5.5` and `"5.50"`.
//! - Empty strings, booleans, nulls, arrays and objects never count as an id.

use crate::model::resource::OwnerId;
use serde_json::{Map, Value};

type OwnerAccessor = fn(&Map<String, Value>) -> Option<String>;

/// Accessors tried in order; the first present value wins.
const OWNER_ACCESSORS: &[OwnerAccessor] = &[
    created_by_object_id,
    created_by_object_user_id,
    creator_object_id,
    user_object_id,
    created_by_flat,
    created_by_id_flat,
    creator_id_flat,
    user_id_flat,
    owner_id_flat,
];

/// Resolves the owner id of one backend record.
///
/// Returns `None` when no alias yields a usable id.
pub fn resolve_owner_id(record: &Map<String, Value>) -> Option<OwnerId> {
    OWNER_ACCESSORS
        .iter()
        .find_map(|accessor| accessor(record))
        .map(OwnerId::new_unchecked)
}

/// Normalizes a session actor id with the same rules as record ids.
pub fn normalize_actor_id(raw: &str) -> Option<OwnerId> {
    normalize_id_value(&Value::String(raw.to_string())).map(OwnerId::new_unchecked)
}

/// Returns whether `actor` owns a record owned by `owner`.
///
/// A missing id on either side never matches.
pub fn is_owner(actor: Option<&OwnerId>, owner: Option<&OwnerId>) -> bool {
    matches!((actor, owner), (Some(actor), Some(owner)) if actor == owner)
}

fn created_by_object_id(record: &Map<String, Value>) -> Option<String> {
    nested(record, "createdBy", "id")
}

fn created_by_object_user_id(record: &Map<String, Value>) -> Option<String> {
    nested(record, "createdBy", "userId")
}

fn creator_object_id(record: &Map<String, Value>) -> Option<String> {
    nested(record, "creator", "id")
}

fn user_object_id(record: &Map<String, Value>) -> Option<String> {
    nested(record, "user", "id")
}

fn created_by_flat(record: &Map<String, Value>) -> Option<String> {
    flat(record, "createdBy")
}

fn created_by_id_flat(record: &Map<String, Value>) -> Option<String> {
    flat(record, "createdById")
}

fn creator_id_flat(record: &Map<String, Value>) -> Option<String> {
    flat(record, "creatorId")
}

fn user_id_flat(record: &Map<String, Value>) -> Option<String> {
    flat(record, "userId")
}

fn owner_id_flat(record: &Map<String, Value>) -> Option<String> {
    flat(record, "ownerId")
}

fn nested(record: &Map<String, Value>, object_key: &str, id_key: &str) -> Option<String> {
    record
        .get(object_key)
        .and_then(Value::as_object)
        .and_then(|object| object.get(id_key))
        .and_then(normalize_id_value)
}

fn flat(record: &Map<String, Value>, key: &str) -> Option<String> {
    record.get(key).and_then(normalize_id_value)
}

fn normalize_id_value(value: &Value) -> Option<String> {
    match value {
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return None;
            }
            // "7.0" from a float-typed form field is the same id as 7.
            match trimmed.parse::<f64>() {
                Ok(parsed) if parsed.is_finite() && trimmed.contains('.') => {
                    Some(float_id(parsed))
                }
                _ => Some(trimmed.to_string()),
            }
        }
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Some(int.to_string())
            } else if let Some(uint) = number.as_u64() {
                Some(uint.to_string())
            } else {
                number
                    .as_f64()
                    .filter(|float| float.is_finite())
                    .map(float_id)
            }
        }
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

fn float_id(value: f64) -> String {
    if is_integral(value) {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64
}
