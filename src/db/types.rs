//! Query result types for pg-notebook.
//!
//! Every cell is already text by the time it lands here: values are rendered
//! through the driver's own string form, never re-typed.

use serde::{Deserialize, Serialize};

/// A row of cell text, in column order.
pub type Row = Vec<String>;

/// Column names plus the rows read under them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResult {
    /// Column names, in result order.
    pub columns: Vec<String>,

    /// Rows of cell text.
    pub rows: Vec<Row>,
}

impl RawResult {
    /// Creates a result with the given columns and no rows.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Creates a result with the given columns and rows.
    pub fn with_data(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Returns the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// What a submitted statement produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionOutcome {
    /// The statement returned a result set (possibly without rows).
    ResultSet(RawResult),

    /// The statement produced no result set (DDL, DML without RETURNING).
    NoResultSet { rows_affected: u64 },
}

impl ExecutionOutcome {
    /// Returns the result set, if there is one.
    pub fn result_set(&self) -> Option<&RawResult> {
        match self {
            Self::ResultSet(raw) => Some(raw),
            Self::NoResultSet { .. } => None,
        }
    }
}
