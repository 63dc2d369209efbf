//! # Kiln - JSON to CSV flattening
//!
//! Fetches a JSON payload from an HTTP endpoint, flattens arbitrarily nested
//! objects and arrays into a single table, and writes it as CSV.
//!
//! ## Modules
//!
//! - **fetch**: HTTP GET with a static `x-api-key` header
//! - **flatten**: shape normalization, iterative flattening, CSV output
//!
//! ## Quick Start
//!
//! ```rust
//! use kiln::flatten::{normalize_shape, TableFlattener, FlattenConfig};
//! use serde_json::json;
//!
//! let data = json!([
//!     [{"id": 1, "tags": ["a", "b"]}],
//!     [{"id": 2, "tags": []}]
//! ]);
//!
//! let flattener = TableFlattener::new(FlattenConfig::default());
//! let table = flattener.flatten(normalize_shape(data));
//!
//! // rows: (1, a), (1, b), (2, null)
//! assert_eq!(table.num_rows(), 3);
//! assert_eq!(table.columns(), ["id", "tags"]);
//! ```

use serde_json::Value;

pub mod error;
pub mod fetch;
pub mod flatten;

// Re-export commonly used types for convenience
pub use error::{Error, Result};
pub use fetch::{fetch, parse_json, Fetcher};
pub use flatten::{flatten, normalize_shape, write_csv, FlattenConfig, Table, TableFlattener};

/// Shape-normalize and fully flatten a fetched payload
pub fn flatten_payload(value: Value, config: FlattenConfig) -> Table {
    TableFlattener::new(config).flatten(normalize_shape(value))
}
