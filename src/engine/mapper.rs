//! Mapping one data row into a record.

use serde_json::Value;

use super::header::ResolvedHeader;
use super::registry::CompiledDialect;
use crate::dialect::ColumnMapper;
use crate::record::{insert_or_append, Aliases, CoalesceHook, Record, Unknowns};

/// Map a data row into a record, then run it through the coalesce hook.
///
/// Empty values are skipped and never create a key. Values of unrecognized
/// columns are stored under their column index (as a string key) and listed
/// in the `unknowns` passed to the hook. Index keys share the record's key
/// space, so a column whose canonical key is a bare number can collide with them.
pub fn map_row(
    dialect: &CompiledDialect,
    header: &ResolvedHeader,
    row: &[String],
    hook: &CoalesceHook,
) -> Record {
    let mut record = Record::new();
    let mut aliases = Aliases::new();
    let mut unknowns = Unknowns::new();

    for (index, value) in row.iter().enumerate() {
        if value.is_empty() {
            continue;
        }

        let value = value.replace("\r\n", "\n");

        let Some(key) = header.matches.key_at(index) else {
            record.insert(index.to_string(), Value::String(value));
            unknowns.insert(index, header.original_label(index).map(str::to_string));
            continue;
        };

        match dialect.mapper(key) {
            Some(ColumnMapper::Transform(transform)) => transform(&mut record, &value),
            Some(ColumnMapper::Rename(target)) => insert_or_append(&mut record, target, value),
            Some(ColumnMapper::Verbatim) | None => {
                insert_or_append(&mut record, key, value);
                aliases.insert(
                    key.to_string(),
                    header.original_label(index).unwrap_or_default().to_string(),
                );
            }
        }
    }

    hook(record, &aliases, &unknowns)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::dialect::DialectConfig;
    use crate::engine::header::{header_row, match_dialect};
    use crate::record::default_coalesce;
    use serde_json::json;

    fn resolve(dialect: &CompiledDialect, header: &[&str]) -> ResolvedHeader {
        let header = header_row(header.iter().copied());
        ResolvedHeader {
            dialect_name: dialect.name().to_string(),
            matches: match_dialect(&header, dialect),
            original_columns: header,
        }
    }

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn default_hook() -> CoalesceHook {
        Arc::new(default_coalesce)
    }

    #[test]
    fn test_verbatim_and_rename() {
        let dialect = CompiledDialect::compile(
            "test",
            &DialectConfig::new()
                .verbatim("First Name")
                .rename("Other Name", "Middle Name")
                .verbatim("Last Name"),
        );
        let header = resolve(&dialect, &["First Name", "Other Name", "Last Name"]);

        let record = map_row(&dialect, &header, &row(&["John", "M", "Doe"]), &default_hook());

        assert_eq!(
            Value::Object(record),
            json!({ "First Name": "John", "Middle Name": "M", "Last Name": "Doe" })
        );
    }

    #[test]
    fn test_rename_collects_repeated_targets() {
        let dialect = CompiledDialect::compile(
            "test",
            &DialectConfig::new()
                .rename("Phone 1", "phone")
                .rename("Phone 2", "phone")
                .rename("Phone 3", "phone"),
        );
        let header = resolve(&dialect, &["Phone 1", "Phone 2", "Phone 3"]);

        let record = map_row(&dialect, &header, &row(&["111", "", "333"]), &default_hook());

        assert_eq!(Value::Object(record), json!({ "phone": ["111", "333"] }));
    }

    #[test]
    fn test_transform_owns_the_record() {
        let dialect = CompiledDialect::compile(
            "test",
            &DialectConfig::new()
                .transform("Full Name", |record, value| {
                    let mut parts = value.splitn(2, ' ');
                    if let Some(first) = parts.next() {
                        record.insert("first".into(), json!(first));
                    }
                    if let Some(last) = parts.next() {
                        record.insert("last".into(), json!(last));
                    }
                })
                .transform("Ignored", |_, _| {}),
        );
        let header = resolve(&dialect, &["Full Name", "Ignored"]);

        let record = map_row(&dialect, &header, &row(&["Jane Doe", "x"]), &default_hook());

        assert_eq!(Value::Object(record), json!({ "first": "Jane", "last": "Doe" }));
    }

    #[test]
    fn test_crlf_is_normalized() {
        let dialect = CompiledDialect::compile("test", &DialectConfig::new().verbatim("Bar"));
        let header = resolve(&dialect, &["Bar"]);

        let record = map_row(&dialect, &header, &row(&["this is\r\na note"]), &default_hook());

        assert_eq!(record["Bar"], json!("this is\na note"));
    }

    #[test]
    fn test_unknown_columns_are_bucketed() {
        let dialect = CompiledDialect::compile("test", &DialectConfig::new().verbatim("Foo"));
        let header = resolve(&dialect, &["Foo", "xxx"]);

        // The third value has no header column at all
        let record = map_row(&dialect, &header, &row(&["Mr.", "Smith", "extra"]), &default_hook());

        assert_eq!(
            Value::Object(record),
            json!({ "Foo": "Mr.", "unknowns": { "xxx": "Smith", "2": "extra" } })
        );
    }

    #[test]
    fn test_numeric_key_collides_with_index_key() {
        let dialect = CompiledDialect::compile("test", &DialectConfig::new().verbatim("1"));
        let header = resolve(&dialect, &["1", "x"]);

        let record = map_row(&dialect, &header, &row(&["a", "b"]), &default_hook());

        assert_eq!(Value::Object(record), json!({ "unknowns": { "x": "b" } }));
    }

    #[test]
    fn test_hook_receives_aliases_and_unknowns() {
        let dialect = CompiledDialect::compile(
            "test",
            &DialectConfig::new()
                .verbatim("First Name")
                .rename("Other Name", "Middle Name")
                .aliases("First Name", ["First-o Name-o"])
                .aliases("Other Name", ["Middle Name"]),
        );
        let header = resolve(&dialect, &["First-o Name-o", "Middle Name", "Nickname"]);

        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&calls);
        let hook: CoalesceHook = Arc::new(move |record: Record, aliases: &Aliases, unknowns: &Unknowns| {
            seen.lock()
                .unwrap()
                .push((record.clone(), aliases.clone(), unknowns.clone()));
            record
        });

        let record = map_row(&dialect, &header, &row(&["Johnny", "B", "JJ"]), &hook);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (seen_record, aliases, unknowns) = &calls[0];
        assert_eq!(seen_record, &record);
        assert_eq!(
            Value::Object(record),
            json!({ "First Name": "Johnny", "Middle Name": "B", "2": "JJ" })
        );
        assert_eq!(
            aliases,
            &Aliases::from([("First Name".to_string(), "First-o Name-o".to_string())])
        );
        assert_eq!(unknowns, &Unknowns::from([(2, Some("Nickname".to_string()))]));
    }
}
