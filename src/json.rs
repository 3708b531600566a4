//! Querying `serde_json` documents.
//!
//! JSON carries no type declarations, so [`infer_schema`] derives a record
//! type from sample documents:
//!
//! - object keys are unioned across samples
//! - numbers are integers unless some sample is not an `i64`, then floats
//! - strings are date times when every sample parses as one
//! - arrays become sequences of the type inferred from all their elements
//! - when samples disagree the first non-null sample decides; values of any
//!   other shape read as null
//!
//! ```
//! use serde_json::json;
//! use sift_lang::{compile, json::infer_schema};
//!
//! let users = vec![
//!     json!({"name": "ada", "attempts": 1}),
//!     json!({"name": "bob", "attempts": 4}),
//! ];
//! let schema = infer_schema(&users);
//! let predicate = compile("attempts > 3", &schema).unwrap();
//!
//! assert_eq!(predicate.filter(&users), vec![&users[1]]);
//! ```

use std::any::Any;
use std::borrow::Cow;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use crate::{
    functions::{parse_date_time, parse_time_span},
    schema::{Member, RecordType, Schema, ValueType, reader},
    value::Value,
};

/// Name given to the record type of the top-level documents.
pub const ROOT_RECORD: &str = "Document";

/// Infer a schema covering every sample.
pub fn infer_schema(samples: &[JsonValue]) -> Schema<JsonValue> {
    let samples: Vec<&JsonValue> = samples.iter().collect();
    let value_type = infer_type(ROOT_RECORD, &samples);
    log::debug!("Inferred {} from {} sample(s)", value_type, samples.len());
    schema_for(value_type)
}

/// Schema reading JSON documents as `value_type`.
pub fn schema_for(value_type: ValueType) -> Schema<JsonValue> {
    let lifted = value_type.clone();
    Schema::from_parts(value_type, move |json| to_value(json, &lifted))
}

/// Convert a JSON value to a runtime value of the given type; null when the
/// shapes disagree.
pub fn to_value<'a>(json: &'a JsonValue, value_type: &ValueType) -> Value<'a> {
    match (value_type, json) {
        (ValueType::Boolean, JsonValue::Bool(b)) => Value::Boolean(*b),
        (ValueType::Integer, JsonValue::Number(n)) => n.as_i64().map_or(Value::Null, Value::Integer),
        (ValueType::Float, JsonValue::Number(n)) => n.as_f64().map_or(Value::Null, Value::Float),
        (ValueType::String, JsonValue::String(s)) => Value::String(Cow::Borrowed(s)),
        (ValueType::DateTime, JsonValue::String(s)) => {
            parse_date_time(s).map_or(Value::Null, Value::DateTime)
        }
        (ValueType::TimeSpan, JsonValue::String(s)) => {
            parse_time_span(s).map_or(Value::Null, Value::TimeSpan)
        }
        (ValueType::Record(_), JsonValue::Object(_)) => Value::Record(json as &dyn Any),
        (ValueType::Sequence(element), JsonValue::Array(items)) => {
            Value::Sequence(items.iter().map(|item| to_value(item, element)).collect())
        }
        _ => Value::Null,
    }
}

fn infer_type(name: &str, values: &[&JsonValue]) -> ValueType {
    let present: Vec<&JsonValue> = values.iter().copied().filter(|v| !v.is_null()).collect();

    match present.first() {
        None | Some(JsonValue::Null) => ValueType::String,
        Some(JsonValue::Bool(_)) => ValueType::Boolean,
        Some(JsonValue::Number(_)) => {
            let integral = present
                .iter()
                .filter(|v| v.is_number())
                .all(|v| v.as_i64().is_some());
            if integral {
                ValueType::Integer
            } else {
                ValueType::Float
            }
        }
        Some(JsonValue::String(_)) => {
            let dates = present
                .iter()
                .filter_map(|v| v.as_str())
                .all(|s| parse_date_time(s).is_ok());
            if dates {
                ValueType::DateTime
            } else {
                ValueType::String
            }
        }
        Some(JsonValue::Array(_)) => {
            let elements: Vec<&JsonValue> = present
                .iter()
                .filter_map(|v| v.as_array())
                .flatten()
                .collect();
            ValueType::Sequence(Box::new(infer_type(name, &elements)))
        }
        Some(JsonValue::Object(_)) => {
            let objects: Vec<&Map<String, JsonValue>> =
                present.iter().filter_map(|v| v.as_object()).collect();
            ValueType::Record(Arc::new(infer_record(name, &objects)))
        }
    }
}

fn infer_record(name: &str, objects: &[&Map<String, JsonValue>]) -> RecordType {
    let mut keys: Vec<&String> = Vec::new();
    for key in objects.iter().flat_map(|object| object.keys()) {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    let members = keys
        .into_iter()
        .map(|key| {
            let values: Vec<&JsonValue> = objects.iter().filter_map(|object| object.get(key)).collect();
            let value_type = infer_type(key, &values);
            json_member(key, value_type)
        })
        .collect();

    RecordType {
        name: name.to_string(),
        members,
    }
}

fn json_member(key: &str, value_type: ValueType) -> Member {
    let field = key.to_string();
    let member_type = value_type.clone();
    let read = reader(move |record| {
        record
            .downcast_ref::<JsonValue>()
            .and_then(|json| json.get(field.as_str()))
            .map_or(Value::Null, |json| to_value(json, &member_type))
    });
    Member::new(key, value_type, read)
}

#[test]
fn test_conflicting_samples_keep_first_type() {
    use serde_json::json;

    let samples = [json!({"id": 1}), json!({"id": "two"})];
    let schema = infer_schema(&samples);
    let members = schema.value_type().members();

    assert_eq!(members.len(), 1);
    assert_eq!(members[0].value_type(), &ValueType::Integer);
    assert!(members[0].read(&schema.lift(&samples[1])).is_null());
}
