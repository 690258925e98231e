//! Dialect configuration: expected columns, how each maps into a record, and
//! the alternate header names each column may appear under.
//!
//! Declaration order is significant everywhere in this module. Dialects are
//! scored in registration order (earlier wins ties) and alias collisions keep
//! the first-declared column first, so all maps here are ordered `Vec`s
//! rather than hash maps.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::error::{ReconcileError, Result};
use crate::record::Record;

/// Function mapper: receives the record under construction and the raw
/// (line-ending normalized) value, and decides how to store it.
pub type TransformFn = Arc<dyn Fn(&mut Record, &str) + Send + Sync>;

/// How a recognized column is written into a record.
#[derive(Clone, Deserialize)]
#[serde(from = "Option<String>")]
pub enum ColumnMapper {
    /// Store the value under the canonical column key.
    Verbatim,
    /// Store the value under another key. Several columns may rename to the
    /// same key; their values are collected into an array.
    Rename(String),
    /// Hand the value to a function.
    Transform(TransformFn),
}

impl fmt::Debug for ColumnMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnMapper::Verbatim => write!(f, "Verbatim"),
            ColumnMapper::Rename(target) => f.debug_tuple("Rename").field(target).finish(),
            ColumnMapper::Transform(_) => write!(f, "Transform(<fn>)"),
        }
    }
}

impl From<Option<String>> for ColumnMapper {
    fn from(target: Option<String>) -> Self {
        match target {
            Some(target) if !target.is_empty() => ColumnMapper::Rename(target),
            _ => ColumnMapper::Verbatim,
        }
    }
}

/// Insert or replace `key` in an ordered entry list, keeping its position.
fn upsert<V>(entries: &mut Vec<(String, V)>, key: String, value: V) -> Option<V> {
    match entries.iter_mut().find(|(existing, _)| *existing == key) {
        Some((_, slot)) => Some(std::mem::replace(slot, value)),
        None => {
            entries.push((key, value));
            None
        }
    }
}

/// One dialect: the canonical columns and, optionally, their aliases.
///
/// Without a language map the dialect has *fixed columns*: only the exact
/// canonical names are recognized.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawDialect")]
pub struct DialectConfig {
    column_map: Vec<(String, ColumnMapper)>,
    language_map: Option<Vec<(String, Vec<String>)>>,
}

impl DialectConfig {
    /// Create an empty dialect.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a canonical column with the given mapper.
    pub fn column(mut self, name: impl Into<String>, mapper: ColumnMapper) -> Self {
        upsert(&mut self.column_map, name.into(), mapper);
        self
    }

    /// Declare a column whose value is stored under its own name.
    pub fn verbatim(self, name: impl Into<String>) -> Self {
        self.column(name, ColumnMapper::Verbatim)
    }

    /// Declare a column whose value is stored under `target`.
    pub fn rename(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.column(name, ColumnMapper::Rename(target.into()))
    }

    /// Declare a column whose value is handed to `transform`.
    pub fn transform<F>(self, name: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&mut Record, &str) + Send + Sync + 'static,
    {
        self.column(name, ColumnMapper::Transform(Arc::new(transform)))
    }

    /// Declare alternate header names for a canonical column.
    ///
    /// Calling this at least once switches the dialect out of fixed-columns
    /// mode.
    pub fn aliases<I, S>(mut self, name: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let aliases = aliases.into_iter().map(Into::into).collect();
        upsert(
            self.language_map.get_or_insert_with(Vec::new),
            name.into(),
            aliases,
        );
        self
    }

    /// Canonical columns in declaration order.
    pub fn column_map(&self) -> &[(String, ColumnMapper)] {
        &self.column_map
    }

    /// Aliases per canonical column, if the dialect declares any.
    pub fn language_map(&self) -> Option<&[(String, Vec<String>)]> {
        self.language_map.as_deref()
    }

    /// Returns true if only exact canonical names are recognized.
    pub fn has_fixed_columns(&self) -> bool {
        self.language_map.is_none()
    }
}

/// Ordered, named collection of dialects.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "OrderedEntries<DialectConfig>")]
pub struct Dialects {
    entries: Vec<(String, DialectConfig)>,
}

impl Dialects {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dialect, builder style.
    pub fn with(mut self, name: impl Into<String>, config: DialectConfig) -> Self {
        self.insert(name, config);
        self
    }

    /// Add a dialect. Re-using a name replaces the earlier definition but
    /// keeps its registration position.
    pub fn insert(&mut self, name: impl Into<String>, config: DialectConfig) -> Option<DialectConfig> {
        upsert(&mut self.entries, name.into(), config)
    }

    /// Look up a dialect by name.
    pub fn get(&self, name: &str) -> Option<&DialectConfig> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, config)| config)
    }

    /// Dialects in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DialectConfig)> {
        self.entries
            .iter()
            .map(|(name, config)| (name.as_str(), config))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a JSON configuration document of the form
    /// `{ "dialects": { "<name>": { "columnMap": {..}, "languageMap": {..} } } }`.
    ///
    /// A `null` or empty mapper is verbatim and a string is a rename target.
    /// Function mappers can only be declared in code.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_config(serde_json::from_str(json)?)
    }

    /// Parse a JSON configuration document from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_config(serde_json::from_reader(reader)?)
    }

    /// Parse a JSON configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    fn from_config(config: ConfigFile) -> Result<Self> {
        config
            .dialects
            .ok_or_else(|| ReconcileError::Configuration("no dialects specified".to_string()))
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    dialects: Option<Dialects>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDialect {
    column_map: OrderedEntries<ColumnMapper>,
    #[serde(default)]
    language_map: Option<OrderedEntries<AliasList>>,
}

impl From<RawDialect> for DialectConfig {
    fn from(raw: RawDialect) -> Self {
        Self {
            column_map: raw.column_map.0,
            language_map: raw.language_map.map(|entries| {
                entries
                    .0
                    .into_iter()
                    .map(|(key, aliases)| (key, aliases.into_vec()))
                    .collect()
            }),
        }
    }
}

/// Aliases may be written as a single string or a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum AliasList {
    One(String),
    Many(Vec<String>),
}

impl AliasList {
    fn into_vec(self) -> Vec<String> {
        match self {
            AliasList::One(alias) => vec![alias],
            AliasList::Many(aliases) => aliases,
        }
    }
}

/// A JSON object deserialized with its key order intact.
struct OrderedEntries<V>(Vec<(String, V)>);

impl From<OrderedEntries<DialectConfig>> for Dialects {
    fn from(entries: OrderedEntries<DialectConfig>) -> Self {
        Self { entries: entries.0 }
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedEntries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = OrderedEntries<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    upsert(&mut entries, key, value);
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}
