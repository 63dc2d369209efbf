use crate::flatten::normalizer::{flatten_object, normalize_records};
use crate::flatten::types::{render_value, FlattenConfig, Table};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Turns nested JSON into a flat table by repeatedly exploding list
/// columns and expanding the resulting objects into new columns.
pub struct TableFlattener {
    config: FlattenConfig,
}

impl TableFlattener {
    pub fn new(config: FlattenConfig) -> Self {
        TableFlattener { config }
    }

    /// Initial normalization only: nested objects merged, lists left in place.
    pub fn normalize(&self, value: Value) -> Table {
        normalize_records(value, &self.config)
    }

    /// Flatten a JSON value completely
    pub fn flatten(&self, value: Value) -> Table {
        self.flatten_table(self.normalize(value))
    }

    /// Explode and re-normalize until no column holds a list.
    pub fn flatten_table(&self, mut table: Table) -> Table {
        let mut iteration = 0;

        loop {
            let list_columns = table.list_bearing_columns();
            if list_columns.is_empty() {
                break;
            }

            if iteration == self.config.max_iterations {
                warn!(
                    iterations = iteration,
                    columns = ?list_columns,
                    "iteration limit reached, coercing remaining list columns to strings"
                );
                for column in &list_columns {
                    if let Some(idx) = table.column_index(column) {
                        coerce_to_strings(&mut table, idx);
                    }
                }
                break;
            }

            iteration += 1;
            debug!(iteration, columns = ?list_columns, "expanding list-bearing columns");

            for column in &list_columns {
                let Some(idx) = table.column_index(column) else {
                    continue;
                };
                table.explode_column(idx);
                self.renormalize_column(&mut table, column);
            }
        }

        debug!(
            rows = table.num_rows(),
            columns = table.num_columns(),
            iterations = iteration,
            "flattening complete"
        );
        table
    }

    /// Expand a column of objects into prefixed columns, or coerce it to
    /// strings when its values are not uniformly objects.
    fn renormalize_column(&self, table: &mut Table, column: &str) {
        let Some(idx) = table.column_index(column) else {
            return;
        };

        if !is_object_column(table, idx) {
            debug!(column, "column is not object-shaped, coercing to strings");
            coerce_to_strings(table, idx);
            return;
        }

        let values = table.remove_column(idx);
        // Expanded key -> destination column index, fixed on first sight
        let mut destinations: HashMap<String, usize> = HashMap::new();

        for (row, value) in values.into_iter().enumerate() {
            let Value::Object(obj) = value else {
                continue;
            };

            for (key, field) in flatten_object(obj, Some(column), &self.config.separator) {
                let dest = match destinations.get(&key) {
                    Some(&dest) => dest,
                    None => {
                        let name = self.unique_name(table, &key);
                        if name != key {
                            debug!(column = %key, renamed = %name, "expanded column collides with existing column");
                        }
                        let dest = table.push_column(name);
                        destinations.insert(key, dest);
                        dest
                    }
                };
                table.set(row, dest, field);
            }
        }
    }

    fn unique_name(&self, table: &Table, candidate: &str) -> String {
        let mut name = candidate.to_string();
        while table.column_index(&name).is_some() {
            name.push_str(&self.config.collision_suffix);
        }
        name
    }
}

impl Default for TableFlattener {
    fn default() -> Self {
        TableFlattener::new(FlattenConfig::default())
    }
}

/// Flatten with the default configuration
pub fn flatten(value: Value) -> Table {
    TableFlattener::default().flatten(value)
}

/// True when every non-null cell is an object and at least one is.
fn is_object_column(table: &Table, idx: usize) -> bool {
    let mut saw_object = false;
    for row in table.rows() {
        match &row[idx] {
            Value::Object(_) => saw_object = true,
            Value::Null => {}
            _ => return false,
        }
    }
    saw_object
}

/// Render every non-null cell of the column as a string. Nulls stay null:
/// they are missing values (absent field or empty list), not data.
fn coerce_to_strings(table: &mut Table, idx: usize) {
    for cell in table.cells_mut(idx) {
        if !matches!(cell, Value::Null | Value::String(_)) {
            *cell = Value::String(render_value(cell));
        }
    }
}
