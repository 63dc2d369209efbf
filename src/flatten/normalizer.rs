//! Object normalization: merging nested object fields into one flat record.
//!
//! Arrays are left untouched here; exploding them is the flattener's job.

use crate::flatten::types::{FlattenConfig, Table};
use serde_json::{Map, Value};

/// Column name used for records that are not JSON objects
pub const VALUE_COLUMN: &str = "value";

/// Flatten nested objects into `prefix<sep>key` fields. Later keys overwrite
/// earlier ones that flatten to the same name. Empty objects vanish.
pub fn flatten_object(obj: Map<String, Value>, prefix: Option<&str>, separator: &str) -> Map<String, Value> {
    let mut out = Map::new();
    flatten_into(obj, prefix, separator, &mut out);
    out
}

fn flatten_into(obj: Map<String, Value>, prefix: Option<&str>, separator: &str, out: &mut Map<String, Value>) {
    for (key, value) in obj {
        let name = match prefix {
            Some(p) => format!("{}{}{}", p, separator, key),
            None => key,
        };

        match value {
            Value::Object(inner) => flatten_into(inner, Some(name.as_str()), separator, out),
            other => {
                out.insert(name, other);
            }
        }
    }
}

/// Initial normalization: one row per top-level record.
///
/// An object is a single record and an array is a sequence of records.
/// Scalars (top-level or inside the array) land in a `value` column, and a
/// top-level `null` produces an empty table.
pub fn normalize_records(value: Value, config: &FlattenConfig) -> Table {
    let records = match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    };

    let mut table = Table::new();
    for record in records {
        let flat = match record {
            Value::Object(obj) => flatten_object(obj, None, &config.separator),
            other => {
                let mut single = Map::new();
                single.insert(VALUE_COLUMN.to_string(), other);
                single
            }
        };
        table.push_record(flat);
    }
    table
}
