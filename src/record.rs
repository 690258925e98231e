//! Mapped record type and the row coalesce hook.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

/// A mapped row: field name to a string, or to an array of strings when
/// several source columns fold into one field.
pub type Record = Map<String, Value>;

/// Column key to the original header label, for recognized columns that
/// have no mapper configured.
pub type Aliases = BTreeMap<String, String>;

/// Column index to the original header label (if any), for columns that
/// were never recognized.
pub type Unknowns = BTreeMap<usize, Option<String>>;

/// Post-processing hook invoked once per mapped row.
pub type CoalesceHook = Arc<dyn Fn(Record, &Aliases, &Unknowns) -> Record + Send + Sync>;

/// Key of the nested object the default hook moves unknown values into.
pub const UNKNOWNS_KEY: &str = "unknowns";

/// The default coalesce hook.
///
/// Moves every unknown value out of the top level of the record and into a
/// nested `"unknowns"` object, keyed by the original header label when there
/// is one, otherwise by the column index.
pub fn default_coalesce(mut record: Record, _aliases: &Aliases, unknowns: &Unknowns) -> Record {
    if unknowns.is_empty() {
        return record;
    }

    let mut bucket = Map::new();
    for (index, original) in unknowns {
        let index_key = index.to_string();
        let value = record.remove(&index_key).unwrap_or(Value::Null);
        let key = match original.as_deref() {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => index_key,
        };
        bucket.insert(key, value);
    }
    record.insert(UNKNOWNS_KEY.to_string(), Value::Object(bucket));

    record
}

/// Insert `value` under `key`, turning an existing value into an array and
/// appending to it.
pub(crate) fn insert_or_append(record: &mut Record, key: &str, value: String) {
    match record.get_mut(key) {
        Some(Value::Array(values)) => values.push(Value::String(value)),
        Some(existing) if existing.is_null() => *existing = Value::String(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, Value::String(value)]);
        }
        None => {
            record.insert(key.to_string(), Value::String(value));
        }
    }
}
