use serde_json::{Map, Value};
use std::fmt;

/// Configuration for the flattening process
#[derive(Debug, Clone)]
pub struct FlattenConfig {
    /// Separator joining parent and child keys into a column name
    pub separator: String,

    /// Suffix appended to an expanded column whose name is already taken
    pub collision_suffix: String,

    /// Upper bound on explode/re-normalize passes. Columns still holding
    /// lists after this many passes are coerced to strings.
    pub max_iterations: usize,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        FlattenConfig {
            separator: String::from("_"),
            collision_suffix: String::from("_expanded"),
            max_iterations: 64,
        }
    }
}

/// A flat table: an ordered column list plus row-major cell data.
///
/// Every row holds exactly one cell per column. Missing fields are
/// `Value::Null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new() -> Self {
        Table::default()
    }

    /// Build a table from explicit parts. Short rows are padded with nulls;
    /// rows must not be wider than the column list.
    pub fn from_parts(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                debug_assert!(
                    row.len() <= width,
                    "row has {} cells but the table has {} columns",
                    row.len(),
                    width
                );
                row.resize(width, Value::Null);
                row
            })
            .collect();
        Table { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `row` in the named column
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// All cells of the named column, top to bottom
    pub fn column_values(&self, column: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Append a column filled with nulls and return its index.
    pub(crate) fn push_column(&mut self, name: String) -> usize {
        self.columns.push(name);
        for row in &mut self.rows {
            row.push(Value::Null);
        }
        self.columns.len() - 1
    }

    /// Remove a column, returning its cells in row order.
    pub(crate) fn remove_column(&mut self, idx: usize) -> Vec<Value> {
        self.columns.remove(idx);
        self.rows.iter_mut().map(|row| row.remove(idx)).collect()
    }

    pub(crate) fn set(&mut self, row: usize, idx: usize, value: Value) {
        self.rows[row][idx] = value;
    }

    pub(crate) fn cells_mut(&mut self, idx: usize) -> impl Iterator<Item = &mut Value> {
        self.rows.iter_mut().map(move |row| &mut row[idx])
    }

    /// Append one row from flattened `(column, value)` pairs, creating
    /// columns on first appearance.
    pub(crate) fn push_record(&mut self, record: Map<String, Value>) {
        let mut row = vec![Value::Null; self.columns.len()];
        for (key, value) in record {
            match self.column_index(&key) {
                Some(idx) => row[idx] = value,
                None => {
                    self.push_column(key);
                    row.push(value);
                }
            }
        }
        self.rows.push(row);
    }

    /// Names of columns where at least one row holds a list.
    pub fn list_bearing_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.rows.iter().any(|row| row[*idx].is_array()))
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Replace every row holding a list in column `idx` with one row per
    /// element. An empty list leaves a single row with a null cell.
    pub(crate) fn explode_column(&mut self, idx: usize) {
        let rows = std::mem::take(&mut self.rows);
        let mut exploded = Vec::with_capacity(rows.len());

        for mut row in rows {
            match std::mem::take(&mut row[idx]) {
                Value::Array(items) if items.is_empty() => exploded.push(row),
                Value::Array(items) => {
                    for item in items {
                        let mut copy = row.clone();
                        copy[idx] = item;
                        exploded.push(copy);
                    }
                }
                other => {
                    row[idx] = other;
                    exploded.push(row);
                }
            }
        }

        self.rows = exploded;
    }

    /// Rows as JSON objects keyed by column name, in column order
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let record: Map<String, Value> = self
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect();
                Value::Object(record)
            })
            .collect()
    }
}

/// Plain text rendering of a cell: strings verbatim, null as empty,
/// everything else as compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            return write!(f, "Empty table\n[{} rows x 0 columns]", self.rows.len());
        }

        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|v| match v {
                        Value::Null => "null".to_string(),
                        other => render_value(other),
                    })
                    .collect()
            })
            .collect();

        let gutter = self.rows.len().saturating_sub(1).to_string().len();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                cells
                    .iter()
                    .map(|row| row[idx].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:gutter$}", "")?;
        for (name, &width) in self.columns.iter().zip(&widths) {
            write!(f, "  {:>width$}", name)?;
        }
        writeln!(f)?;

        for (i, row) in cells.iter().enumerate() {
            write!(f, "{:<gutter$}", i)?;
            for (cell, &width) in row.iter().zip(&widths) {
                write!(f, "  {:>width$}", cell)?;
            }
            writeln!(f)?;
        }

        write!(
            f,
            "[{} rows x {} columns]",
            self.rows.len(),
            self.columns.len()
        )
    }
}
