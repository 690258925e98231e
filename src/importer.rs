//! The `Importer` facade.
//!
//! An importer is built once from a [`Dialects`] collection and can then be
//! shared across threads; every import call is independent.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use log::debug;
use serde::Deserialize;

use crate::dialect::Dialects;
use crate::encoding::{decode_to_utf8, EncodingPolicy};
use crate::engine::header::{match_dialect, match_header, ResolvedHeader};
use crate::engine::registry::DialectRegistry;
use crate::engine::reconciler;
use crate::error::{ReconcileError, Result};
use crate::outcome::ImportOutcome;
use crate::record::{default_coalesce, Aliases, CoalesceHook, Record, Unknowns};
use crate::tokenize::{is_blank_row, tokenize_str, Quote, TokenizerOptions};

/// Header plus data rows supplied directly, e.g. from a JSON payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InputData {
    pub header: Option<Vec<Option<String>>>,
    pub rows: Vec<Vec<String>>,
}

/// Reconciles CSV sources against a set of dialects.
///
/// # Example
///
/// ```
/// use csv_reconcile::{DialectConfig, Dialects, Importer};
///
/// let dialects = Dialects::new().with(
///     "contacts",
///     DialectConfig::new()
///         .verbatim("First Name")
///         .rename("Other Name", "Middle Name"),
/// );
/// let importer = Importer::new(&dialects).unwrap();
///
/// let outcome = importer
///     .import_from_bytes(b"First Name,Other Name\nJohn,M\n", false)
///     .unwrap();
/// assert_eq!(outcome.row_objects().unwrap()[0]["Middle Name"], "M");
/// ```
#[derive(Clone)]
pub struct Importer {
    registry: DialectRegistry,
    coalesce: CoalesceHook,
    tokenizer: TokenizerOptions,
    encoding_policy: EncodingPolicy,
    /// Optional forced dialect name.
    forced_dialect: Option<String>,
}

impl fmt::Debug for Importer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Importer")
            .field("registry", &self.registry)
            .field("tokenizer", &self.tokenizer)
            .field("encoding_policy", &self.encoding_policy)
            .field("forced_dialect", &self.forced_dialect)
            .finish_non_exhaustive()
    }
}

impl Importer {
    /// Create an importer for the given dialects.
    ///
    /// Fails with [`ReconcileError::Configuration`] when `dialects` is empty.
    pub fn new(dialects: &Dialects) -> Result<Self> {
        Ok(Self {
            registry: DialectRegistry::compile(dialects)?,
            coalesce: Arc::new(default_coalesce),
            tokenizer: TokenizerOptions::default(),
            encoding_policy: EncodingPolicy::default(),
            forced_dialect: None,
        })
    }

    /// Replace the hook every mapped row is passed through.
    pub fn coalesce<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(Record, &Aliases, &Unknowns) -> Record + Send + Sync + 'static,
    {
        self.coalesce = Arc::new(hook);
        self
    }

    /// Set the field delimiter used when tokenizing raw input.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.tokenizer.delimiter = delimiter;
        self
    }

    /// Set the quote character used when tokenizing raw input.
    pub fn quote(&mut self, quote: Quote) -> &mut Self {
        self.tokenizer.quote = quote;
        self
    }

    /// Set how non-UTF-8 input is decoded.
    pub fn encoding_policy(&mut self, policy: EncodingPolicy) -> &mut Self {
        self.encoding_policy = policy;
        self
    }

    /// Force a specific dialect (skip dialect selection) for every import
    /// that starts from a header row.
    pub fn dialect(&mut self, name: impl Into<String>) -> &mut Self {
        self.forced_dialect = Some(name.into());
        self
    }

    pub fn registry(&self) -> &DialectRegistry {
        &self.registry
    }

    /// Match a header row against every dialect and keep the best one.
    pub fn resolve_header(&self, header: &[Option<String>]) -> Result<ResolvedHeader> {
        match_header(header, &self.registry)
    }

    /// Reconcile data rows against an already resolved header.
    pub fn reconcile(
        &self,
        resolved: ResolvedHeader,
        rows: Vec<Vec<String>>,
        force_import: bool,
    ) -> Result<ImportOutcome> {
        let dialect = self.registry.get(&resolved.dialect_name)?;
        Ok(reconciler::reconcile(
            dialect,
            resolved,
            rows,
            force_import,
            &self.coalesce,
        ))
    }

    /// Import a header row and its data rows.
    pub fn import_from_rows(
        &self,
        header: &[Option<String>],
        rows: Vec<Vec<String>>,
        force_import: bool,
    ) -> Result<ImportOutcome> {
        if let Some(name) = &self.forced_dialect {
            return self.import_with_dialect(name, header, rows, force_import);
        }

        let resolved = self.resolve_header(header)?;
        self.reconcile(resolved, rows, force_import)
    }

    /// Import directly supplied data. The header is required.
    pub fn import_from_data(&self, data: InputData, force_import: bool) -> Result<ImportOutcome> {
        let header = data
            .header
            .ok_or_else(|| ReconcileError::InvalidInput("Invalid header.".to_string()))?;
        self.import_from_rows(&header, data.rows, force_import)
    }

    /// Import against a named dialect, skipping dialect selection.
    pub fn import_with_dialect(
        &self,
        name: &str,
        header: &[Option<String>],
        rows: Vec<Vec<String>>,
        force_import: bool,
    ) -> Result<ImportOutcome> {
        let dialect = self.registry.get(name)?;
        let resolved = ResolvedHeader {
            dialect_name: dialect.name().to_string(),
            matches: match_dialect(header, dialect),
            original_columns: header.to_vec(),
        };
        Ok(reconciler::reconcile(
            dialect,
            resolved,
            rows,
            force_import,
            &self.coalesce,
        ))
    }

    /// Import from a stream of tokenized rows.
    ///
    /// Blank rows (a single empty field) are dropped, the first remaining row
    /// is the header and the rest are data. The first error from the stream
    /// aborts the import and is returned as is. An empty stream is a complete
    /// import with no records.
    pub fn import_from_row_stream<I, E>(&self, rows: I, force_import: bool) -> Result<ImportOutcome>
    where
        I: IntoIterator<Item = std::result::Result<Vec<String>, E>>,
        ReconcileError: From<E>,
    {
        let mut header: Option<Vec<Option<String>>> = None;
        let mut data = Vec::new();

        for row in rows {
            let row = row?;
            if is_blank_row(&row) {
                continue;
            }
            if header.is_none() {
                header = Some(row.into_iter().map(Some).collect());
            } else {
                data.push(row);
            }
        }

        let Some(header) = header else {
            debug!("Row stream was empty");
            return Ok(ImportOutcome::Complete {
                row_objects: Vec::new(),
            });
        };

        self.import_from_rows(&header, data, force_import)
    }

    /// Import raw CSV bytes: decode, tokenize, then import the row stream.
    pub fn import_from_bytes(&self, data: &[u8], force_import: bool) -> Result<ImportOutcome> {
        let (text, info) = decode_to_utf8(data, self.encoding_policy);
        debug!(
            "Input encoding {} (bom: {}, transcoded: {})",
            info.encoding, info.has_bom, info.transcoded
        );
        self.import_from_row_stream(tokenize_str(&text, &self.tokenizer), force_import)
    }

    /// Import raw CSV from a reader.
    pub fn import_from_reader<R: Read>(&self, mut reader: R, force_import: bool) -> Result<ImportOutcome> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.import_from_bytes(&data, force_import)
    }

    /// Import a CSV file.
    pub fn import_from_path<P: AsRef<Path>>(&self, path: P, force_import: bool) -> Result<ImportOutcome> {
        let file = File::open(path.as_ref())?;
        self.import_from_reader(BufReader::new(file), force_import)
    }

    /// Import a CSV file served over HTTP(S).
    #[cfg(feature = "http")]
    pub fn import_from_url(&self, url: &str, force_import: bool) -> Result<ImportOutcome> {
        let data = crate::http::fetch_url(url)?;
        self.import_from_bytes(&data, force_import)
    }
}
