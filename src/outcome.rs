use serde::Serialize;

use crate::record::Record;

/// The result of one import.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ImportOutcome {
    /// Every column was resolved (or the import was forced); each data row
    /// was mapped into a record, in input order.
    Complete { row_objects: Vec<Record> },
    /// Some columns carrying data could not be recognized. The rows are
    /// returned for the caller to resolve and re-import.
    Incomplete {
        columns: ColumnsDescriptor,
        /// Surviving rows, pruned to the columns that carry data and padded
        /// to `columns.present.len()`. Empty cells are `None`.
        rows: Vec<Vec<Option<String>>>,
    },
}

impl ImportOutcome {
    /// Returns true for [`ImportOutcome::Complete`].
    pub fn is_complete(&self) -> bool {
        matches!(self, ImportOutcome::Complete { .. })
    }

    /// The mapped records of a complete import.
    pub fn row_objects(&self) -> Option<&[Record]> {
        match self {
            ImportOutcome::Complete { row_objects } => Some(row_objects),
            ImportOutcome::Incomplete { .. } => None,
        }
    }

    /// The column diagnostics of an incomplete import.
    pub fn columns(&self) -> Option<&ColumnsDescriptor> {
        match self {
            ImportOutcome::Complete { .. } => None,
            ImportOutcome::Incomplete { columns, .. } => Some(columns),
        }
    }

    /// The raw rows of an incomplete import.
    pub fn rows(&self) -> Option<&[Vec<Option<String>>]> {
        match self {
            ImportOutcome::Complete { .. } => None,
            ImportOutcome::Incomplete { rows, .. } => Some(rows),
        }
    }
}

/// Column diagnostics for an incomplete import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnsDescriptor {
    /// The dialect the header was matched against.
    pub dialect_name: String,
    /// Canonical key per surviving column, `None` where unrecognized.
    pub present: Vec<Option<String>>,
    /// Recognized columns that carried no data and were pruned.
    pub missing: Vec<String>,
    /// Original header text of each unrecognized column that carries data,
    /// in column order. `None` for columns without a header.
    pub unmatched: Vec<Option<String>>,
}
