//! Upstream record mapping

use crate::aliases::aliases;
use crate::{ApplicantRecord, CerfaError, Result, Slot};
use serde_json::{Map, Value};

/// A record as posted by the upstream automation: French labels to values
pub type RawInboundRecord = Map<String, Value>;

/// Map a raw record onto the applicant record
///
/// For each slot the first alias present in `raw` wins. Strings are kept
/// verbatim, numbers and booleans are written out as text, and `null`,
/// arrays and objects leave the slot absent. Unknown keys are ignored.
pub fn map_record(raw: &RawInboundRecord) -> ApplicantRecord {
    let mut record = ApplicantRecord::default();
    for slot in Slot::ALL {
        let value = aliases(slot)
            .iter()
            .find_map(|key| raw.get(*key))
            .and_then(value_to_text);
        record.set(slot, value);
    }
    record
}

/// Text form of a scalar JSON value
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Records carried by a request body: an array of objects or one object
pub fn raw_records(value: Value) -> Result<Vec<RawInboundRecord>> {
    match value {
        Value::Object(record) => Ok(vec![record]),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(record) => Ok(record),
                other => Err(CerfaError::InputError(format!(
                    "record {i} is not an object: {}",
                    json_kind(&other)
                ))),
            })
            .collect(),
        other => Err(CerfaError::InputError(format!(
            "expected an object or an array of objects, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
