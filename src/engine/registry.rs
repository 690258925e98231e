//! Compiled dialects and their header lookup tables.

use foldhash::{HashMap, HashMapExt};
use log::{debug, warn};

use crate::dialect::{ColumnMapper, DialectConfig, Dialects};
use crate::error::{ReconcileError, Result};

/// What a header spelling resolves to within one dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderEntry {
    /// The spelling belongs to exactly one canonical column.
    Single(String),
    /// The spelling was declared for several canonical columns. Within a
    /// header row it binds to the first candidate not yet taken, in this
    /// order.
    Ambiguous(Vec<String>),
}

impl HeaderEntry {
    /// Candidate canonical keys in declaration order.
    pub fn candidates(&self) -> &[String] {
        match self {
            HeaderEntry::Single(key) => std::slice::from_ref(key),
            HeaderEntry::Ambiguous(keys) => keys,
        }
    }

    /// Add `key` as a candidate. Never replaces an existing binding.
    fn bind(&mut self, key: &str) {
        match self {
            HeaderEntry::Single(existing) if existing == key => {}
            HeaderEntry::Single(existing) => {
                let first = std::mem::take(existing);
                *self = HeaderEntry::Ambiguous(vec![first, key.to_string()]);
            }
            HeaderEntry::Ambiguous(keys) => {
                if !keys.iter().any(|k| k == key) {
                    keys.push(key.to_string());
                }
            }
        }
    }
}

/// Header spelling to canonical key(s).
pub type HeaderMatchTable = HashMap<String, HeaderEntry>;

/// Build the lookup table for one dialect.
///
/// Every canonical column is reachable by its own name plus, when a language
/// map is present, each of its aliases.
pub fn build_match_table(config: &DialectConfig) -> HeaderMatchTable {
    let mut table = HeaderMatchTable::with_capacity(config.column_map().len());

    for (key, _) in config.column_map() {
        let aliases = config
            .language_map()
            .and_then(|map| map.iter().find(|(name, _)| name == key))
            .map(|(_, aliases)| aliases.as_slice())
            .unwrap_or_default();

        for spelling in std::iter::once(key).chain(aliases) {
            match table.get_mut(spelling) {
                Some(entry) => entry.bind(key),
                None => {
                    table.insert(spelling.clone(), HeaderEntry::Single(key.clone()));
                }
            }
        }
    }

    table
}

/// A dialect ready for matching: its mappers plus the header lookup table.
#[derive(Debug, Clone)]
pub struct CompiledDialect {
    name: String,
    mappers: HashMap<String, ColumnMapper>,
    match_table: HeaderMatchTable,
    fixed_columns: bool,
}

impl CompiledDialect {
    /// Compile one dialect definition.
    pub fn compile(name: &str, config: &DialectConfig) -> Self {
        if let Some(language_map) = config.language_map() {
            for (key, _) in language_map {
                if !config.column_map().iter().any(|(column, _)| column == key) {
                    warn!("Dialect '{name}': ignoring aliases for undeclared column '{key}'");
                }
            }
        }

        let mut mappers = HashMap::with_capacity(config.column_map().len());
        for (key, mapper) in config.column_map() {
            mappers.insert(key.clone(), mapper.clone());
        }

        Self {
            name: name.to_string(),
            mappers,
            match_table: build_match_table(config),
            fixed_columns: config.has_fixed_columns(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The mapper declared for a canonical column.
    pub fn mapper(&self, key: &str) -> Option<&ColumnMapper> {
        self.mappers.get(key)
    }

    /// Resolve a raw header spelling.
    pub fn lookup(&self, spelling: &str) -> Option<&HeaderEntry> {
        self.match_table.get(spelling)
    }

    pub fn match_table(&self) -> &HeaderMatchTable {
        &self.match_table
    }

    /// Returns true if the dialect has no aliases.
    pub fn has_fixed_columns(&self) -> bool {
        self.fixed_columns
    }
}

/// All configured dialects, compiled, in registration order.
#[derive(Debug, Clone)]
pub struct DialectRegistry {
    dialects: Vec<CompiledDialect>,
}

impl DialectRegistry {
    /// Compile every dialect in the collection.
    pub fn compile(dialects: &Dialects) -> Result<Self> {
        if dialects.is_empty() {
            return Err(ReconcileError::Configuration(
                "no dialects specified".to_string(),
            ));
        }

        let dialects: Vec<CompiledDialect> = dialects
            .iter()
            .map(|(name, config)| CompiledDialect::compile(name, config))
            .collect();

        for dialect in &dialects {
            debug!(
                "Compiled dialect '{}' with {} header spelling(s){}",
                dialect.name(),
                dialect.match_table().len(),
                if dialect.has_fixed_columns() { " (fixed columns)" } else { "" }
            );
        }

        Ok(Self { dialects })
    }

    /// Look up a compiled dialect by name.
    pub fn get(&self, name: &str) -> Result<&CompiledDialect> {
        self.dialects
            .iter()
            .find(|dialect| dialect.name() == name)
            .ok_or_else(|| ReconcileError::UnknownDialect(name.to_string()))
    }

    /// Compiled dialects in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &CompiledDialect> {
        self.dialects.iter()
    }

    pub fn len(&self) -> usize {
        self.dialects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialects.is_empty()
    }
}
