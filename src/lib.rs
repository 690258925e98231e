//! csv-reconcile: match messy CSV exports against known column layouts
//!
//! A CSV file exported from some application rarely uses the exact column
//! names you expect. This crate takes a set of *dialects* (expected columns,
//! how each one maps into a record, and the alternate header spellings it may
//! appear under), picks the dialect that best matches a file's header row,
//! and either maps every data row into a record or reports which columns
//! could not be recognized.
//!
//! # Quick Start
//!
//! ```no_run
//! use csv_reconcile::{Dialects, Importer, ImportOutcome};
//!
//! let dialects = Dialects::from_path("dialects.json").unwrap();
//! let importer = Importer::new(&dialects).unwrap();
//!
//! match importer.import_from_path("contacts.csv", false).unwrap() {
//!     ImportOutcome::Complete { row_objects } => {
//!         println!("Imported {} records", row_objects.len());
//!     }
//!     ImportOutcome::Incomplete { columns, .. } => {
//!         println!("Unrecognized columns: {:?}", columns.unmatched);
//!     }
//! }
//! ```
//!
//! # Dialects in code
//!
//! ```
//! use csv_reconcile::{header_row, DialectConfig, Dialects, Importer};
//!
//! let dialects = Dialects::new().with(
//!     "phone_book",
//!     DialectConfig::new()
//!         .rename("Anything", "anything")
//!         .aliases("Anything", ["A", "B"]),
//! );
//! let importer = Importer::new(&dialects).unwrap();
//!
//! let outcome = importer
//!     .import_from_rows(
//!         &header_row(["A", "B"]),
//!         vec![vec!["john".into(), "smith".into()]],
//!         false,
//!     )
//!     .unwrap();
//! assert_eq!(
//!     outcome.row_objects().unwrap()[0]["anything"],
//!     serde_json::json!(["john", "smith"])
//! );
//! ```
//!
//! # How a header is matched
//!
//! Each dialect looks up every header cell in a table built from its column
//! names and aliases. The dialect that leaves the fewest cells unrecognized
//! wins, the earlier-registered one on a tie. Unrecognized columns that carry
//! no data are ignored; any other unrecognized column makes the import
//! incomplete unless the import is forced, in which case those values are
//! collected under `"unknowns"` by the coalesce hook.

mod dialect;
mod encoding;
pub mod engine;
mod error;
#[cfg(feature = "http")]
pub mod http;
mod importer;
mod outcome;
mod record;
mod tokenize;

pub use dialect::{ColumnMapper, DialectConfig, Dialects, TransformFn};
pub use engine::header::header_row;
pub use error::{ReconcileError, Result};
pub use importer::{Importer, InputData};
pub use outcome::{ColumnsDescriptor, ImportOutcome};
pub use record::{default_coalesce, Aliases, CoalesceHook, Record, Unknowns, UNKNOWNS_KEY};
pub use tokenize::{Quote, RowReader, TokenizerOptions};

// Re-export for advanced usage
pub use encoding::{decode_to_utf8, is_utf8, EncodingInfo, EncodingPolicy};
