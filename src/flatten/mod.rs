//! JSON flattening - turn nested JSON into a single flat table
//!
//! The pipeline has three steps:
//!
//! 1. [`normalize_shape`] unwraps an outer array of batches.
//! 2. [`TableFlattener::normalize`] builds one row per record, merging nested
//!    objects into `parent_child` columns while leaving lists in place.
//! 3. [`TableFlattener::flatten_table`] explodes list columns into rows and
//!    expands object elements into new columns until no lists remain.
//!
//! [`write_csv`] then serializes the result.

pub mod types;
pub mod shape;
pub mod normalizer;
pub mod flattener;
pub mod writer;

pub use types::{render_value, FlattenConfig, Table};
pub use shape::normalize_shape;
pub use normalizer::{flatten_object, normalize_records, VALUE_COLUMN};
pub use flattener::{flatten, TableFlattener};
pub use writer::{read_csv, write_csv, write_table};
