//! Header row matching and dialect selection.

use std::collections::BTreeMap;

use foldhash::{HashMap, HashMapExt, HashSet, HashSetExt};
use log::debug;

use super::registry::{CompiledDialect, DialectRegistry};
use crate::error::{ReconcileError, Result};

/// The outcome of matching one header row against one dialect.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderMatchResult {
    /// Canonical key per header column, `None` where unrecognized.
    pub matched_names: Vec<Option<String>>,
    /// Header text of every unrecognized column, by column index. Empty
    /// header cells are recorded as `None`.
    pub unmatched_by_index: BTreeMap<usize, Option<String>>,
}

impl HeaderMatchResult {
    /// Number of unrecognized columns.
    pub fn unmatched_count(&self) -> usize {
        self.matched_names.iter().filter(|name| name.is_none()).count()
    }

    /// Canonical key of the column at `index`, if it was recognized.
    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.matched_names.get(index)?.as_deref()
    }

    /// Recognized columns by index.
    pub fn matched_by_index(&self) -> BTreeMap<usize, &str> {
        self.matched_names
            .iter()
            .enumerate()
            .filter_map(|(index, name)| Some((index, name.as_deref()?)))
            .collect()
    }
}

/// A header row resolved against the best-matching dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHeader {
    /// Name of the winning dialect.
    pub dialect_name: String,
    /// Match details for the winning dialect.
    pub matches: HeaderMatchResult,
    /// The header row exactly as supplied.
    pub original_columns: Vec<Option<String>>,
}

impl ResolvedHeader {
    /// Original header text of the column at `index`.
    pub fn original_label(&self, index: usize) -> Option<&str> {
        self.original_columns.get(index)?.as_deref()
    }
}

/// Build a header row from plain strings.
pub fn header_row<I, S>(cells: I) -> Vec<Option<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    cells.into_iter().map(|cell| Some(cell.into())).collect()
}

/// Match a header row against a single dialect.
///
/// An ambiguous spelling binds to the first of its candidates that no
/// earlier column in this row is bound to. Once every candidate is taken, the
/// n-th occurrence of the spelling takes the n-th candidate, wrapping around.
/// Exact canonical names always bind to their own key, even when repeated.
pub fn match_dialect(header: &[Option<String>], dialect: &CompiledDialect) -> HeaderMatchResult {
    let mut matched_names = Vec::with_capacity(header.len());
    let mut unmatched_by_index = BTreeMap::new();
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut bound: HashSet<&str> = HashSet::new();

    for (index, cell) in header.iter().enumerate() {
        let name = cell.as_deref().filter(|name| !name.is_empty());

        let Some((name, entry)) = name.and_then(|name| Some((name, dialect.lookup(name)?))) else {
            matched_names.push(None);
            unmatched_by_index.insert(index, name.map(str::to_string));
            continue;
        };

        let candidates = entry.candidates();
        let occurrence = seen.entry(name).or_insert(0);
        let key = candidates
            .iter()
            .find(|key| !bound.contains(key.as_str()))
            .unwrap_or(&candidates[*occurrence % candidates.len()]);
        *occurrence += 1;

        bound.insert(key.as_str());
        matched_names.push(Some(key.clone()));
    }

    HeaderMatchResult {
        matched_names,
        unmatched_by_index,
    }
}

/// Resolve a header row against every registered dialect.
///
/// The dialect leaving the fewest columns unrecognized wins; on a tie the
/// earlier-registered dialect is kept.
pub fn match_header(header: &[Option<String>], registry: &DialectRegistry) -> Result<ResolvedHeader> {
    let mut best: Option<(&CompiledDialect, HeaderMatchResult)> = None;

    for dialect in registry.iter() {
        let candidate = match_dialect(header, dialect);
        debug!(
            "Dialect '{}' left {} of {} header column(s) unmatched",
            dialect.name(),
            candidate.unmatched_count(),
            header.len()
        );

        let is_better = match &best {
            Some((_, current)) => candidate.unmatched_count() < current.unmatched_count(),
            None => true,
        };
        if is_better {
            best = Some((dialect, candidate));
        }
    }

    let (dialect, matches) =
        best.ok_or_else(|| ReconcileError::Configuration("no dialects specified".to_string()))?;

    Ok(ResolvedHeader {
        dialect_name: dialect.name().to_string(),
        matches,
        original_columns: header.to_vec(),
    })
}
