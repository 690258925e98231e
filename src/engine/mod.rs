//! Dialect resolution and row reconciliation.
//!
//! A header row is scored against every registered dialect, the data rows are
//! checked for which columns actually carry values, and the import is either
//! mapped into records or returned as a partial result describing the
//! columns that still need a decision.

pub mod header;
pub mod mapper;
pub mod presence;
pub mod reconciler;
pub mod registry;
