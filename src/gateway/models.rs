//! Wire models for backend responses.

use serde::Deserialize;
use serde_json::{Map, Value};

/// A single row record. Key order is preserved as received from the backend.
pub type Row = Map<String, Value>;

/// A freshly fetched table of rows plus the column set derived from them.
///
/// Constructed per gateway response, never mutated, discarded after render.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub rows: Vec<Row>,
    pub columns: Vec<String>,
}

impl ResultSet {
    /// Build a result set, deriving columns from the first row's keys in
    /// order. Schema is not known statically, so the first row is
    /// authoritative; an empty row set yields an empty column set.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let columns = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        Self { rows, columns }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Display text for one cell. Missing or null fields fall back to an
    /// empty cell, never an error.
    pub fn cell_text(row: &Row, column: &str) -> String {
        match row.get(column) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// One page of the preview dataset, as reported by the backend.
///
/// `total` and `page` are authoritative from the backend response; callers
/// must not substitute locally computed values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageSlice {
    pub rows: Vec<Row>,
    pub total: u64,
    pub page: u32,
}
