//! The completeness decision for one import.

use log::info;
use rayon::prelude::*;

use super::header::ResolvedHeader;
use super::mapper::map_row;
use super::presence::{self, Presence};
use super::registry::CompiledDialect;
use crate::outcome::{ColumnsDescriptor, ImportOutcome};
use crate::record::{CoalesceHook, Record};

/// Row count from which records are mapped on the rayon thread pool.
const PARALLEL_ROW_THRESHOLD: usize = 1024;

/// Returns true for a row with no fields, or with only empty fields.
pub fn is_empty_row<S: AsRef<str>>(row: &[S]) -> bool {
    row.iter().all(|value| value.as_ref().is_empty())
}

/// Decide whether an import is complete and build its outcome.
///
/// Unrecognized columns that never carry data are dropped silently; rows
/// wider than the header add anonymous unrecognized columns. The import is
/// complete when no unrecognized column with data remains, or when
/// `force_import` is set, in which case such values end up as unknowns.
pub fn reconcile(
    dialect: &CompiledDialect,
    mut header: ResolvedHeader,
    mut rows: Vec<Vec<String>>,
    force_import: bool,
    hook: &CoalesceHook,
) -> ImportOutcome {
    rows.retain(|row| !is_empty_row(row));

    let presence = presence::analyze(&rows);
    let matches = &mut header.matches;

    for index in matches.matched_names.len()..presence.column_count {
        matches.matched_names.push(None);
        matches.unmatched_by_index.insert(index, None);
    }

    matches
        .unmatched_by_index
        .retain(|index, _| presence.is_present(*index));

    if force_import || matches.unmatched_by_index.is_empty() {
        let row_objects = if presence.has_data() {
            map_rows(dialect, &header, &rows, hook)
        } else {
            Vec::new()
        };
        info!(
            "Imported {} row(s) with dialect '{}'",
            row_objects.len(),
            header.dialect_name
        );
        return ImportOutcome::Complete { row_objects };
    }

    let outcome = incomplete(header, rows, &presence);
    if let ImportOutcome::Incomplete { columns, rows } = &outcome {
        info!(
            "Import with dialect '{}' needs {} column(s) resolved ({} row(s) held back)",
            columns.dialect_name,
            columns.unmatched.len(),
            rows.len()
        );
    }
    outcome
}

fn map_rows(
    dialect: &CompiledDialect,
    header: &ResolvedHeader,
    rows: &[Vec<String>],
    hook: &CoalesceHook,
) -> Vec<Record> {
    // collect() keeps input order on both paths
    if rows.len() >= PARALLEL_ROW_THRESHOLD {
        rows.par_iter()
            .map(|row| map_row(dialect, header, row, hook))
            .collect()
    } else {
        rows.iter()
            .map(|row| map_row(dialect, header, row, hook))
            .collect()
    }
}

fn incomplete(header: ResolvedHeader, rows: Vec<Vec<String>>, presence: &Presence) -> ImportOutcome {
    let matches = header.matches;

    let present: Vec<Option<String>> = matches
        .matched_names
        .iter()
        .enumerate()
        .filter(|(index, _)| presence.is_present(*index))
        .map(|(_, name)| name.clone())
        .collect();

    let missing: Vec<String> = matches
        .matched_names
        .iter()
        .flatten()
        .filter(|name| !present.iter().flatten().any(|kept| kept == *name))
        .cloned()
        .collect();

    let width = present.len();
    let rows = rows
        .into_iter()
        .map(|row| {
            let mut kept: Vec<Option<String>> = row
                .into_iter()
                .enumerate()
                .filter(|(index, _)| presence.is_present(*index))
                .map(|(_, value)| (!value.is_empty()).then_some(value))
                .collect();
            kept.resize(width, None);
            kept
        })
        .collect();

    ImportOutcome::Incomplete {
        columns: ColumnsDescriptor {
            dialect_name: header.dialect_name,
            present,
            missing,
            unmatched: matches.unmatched_by_index.into_values().collect(),
        },
        rows,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::dialect::DialectConfig;
    use crate::engine::header::{header_row, match_dialect};
    use crate::record::default_coalesce;
    use serde_json::{json, Value};

    fn standard() -> CompiledDialect {
        CompiledDialect::compile(
            "test_standard",
            &DialectConfig::new()
                .verbatim("First Name")
                .rename("Other Name", "Middle Name")
                .verbatim("Last Name"),
        )
    }

    fn run(dialect: &CompiledDialect, header: &[&str], rows: &[&[&str]], force: bool) -> ImportOutcome {
        let header = header_row(header.iter().copied());
        let resolved = ResolvedHeader {
            dialect_name: dialect.name().to_string(),
            matches: match_dialect(&header, dialect),
            original_columns: header,
        };
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect();
        let hook: CoalesceHook = Arc::new(default_coalesce);
        reconcile(dialect, resolved, rows, force, &hook)
    }

    fn records(outcome: &ImportOutcome) -> Value {
        Value::Array(
            outcome
                .row_objects()
                .unwrap()
                .iter()
                .cloned()
                .map(Value::Object)
                .collect(),
        )
    }

    fn cells(rows: &[&[Option<&str>]]) -> Vec<Vec<Option<String>>> {
        rows.iter()
            .map(|row| row.iter().map(|v| v.map(str::to_string)).collect())
            .collect()
    }

    #[test]
    fn test_is_empty_row() {
        assert!(is_empty_row::<&str>(&[]));
        assert!(is_empty_row(&["", "", ""]));
        assert!(!is_empty_row(&["", "x"]));
    }

    #[test]
    fn test_all_empty_rows_complete() {
        let outcome = run(&standard(), &["unknown"], &[&["", ""], &[""], &[]], false);
        assert_eq!(outcome, ImportOutcome::Complete { row_objects: vec![] });
    }

    #[test]
    fn test_no_rows_complete_regardless_of_header() {
        let outcome = run(&standard(), &["unknown", "other"], &[], false);
        assert_eq!(outcome, ImportOutcome::Complete { row_objects: vec![] });
    }

    #[test]
    fn test_wider_rows_without_data_are_ignored() {
        let outcome = run(&standard(), &["First Name"], &[&["john", ""]], false);
        assert_eq!(records(&outcome), json!([{ "First Name": "john" }]));
    }

    #[test]
    fn test_wider_rows_with_data_are_anonymous_columns() {
        let outcome = run(&standard(), &["First Name"], &[&["john", ""], &["", "doe"]], false);

        let columns = outcome.columns().unwrap();
        assert_eq!(columns.dialect_name, "test_standard");
        assert_eq!(columns.present, vec![Some("First Name".to_string()), None]);
        assert_eq!(columns.unmatched, vec![None]);
        assert!(columns.missing.is_empty());
        assert_eq!(
            outcome.rows().unwrap(),
            cells(&[&[Some("john"), None], &[None, Some("doe")]])
        );
    }

    #[test]
    fn test_unmatched_column_with_data_is_incomplete() {
        let outcome = run(
            &standard(),
            &["First Name", "unidentified"],
            &[&["john", "doe"], &["foo", ""]],
            false,
        );

        let columns = outcome.columns().unwrap();
        assert_eq!(columns.present, vec![Some("First Name".to_string()), None]);
        assert_eq!(columns.unmatched, vec![Some("unidentified".to_string())]);
        assert_eq!(
            outcome.rows().unwrap(),
            cells(&[&[Some("john"), Some("doe")], &[Some("foo"), None]])
        );
    }

    #[test]
    fn test_incomplete_prunes_empty_columns_and_pads() {
        let outcome = run(
            &standard(),
            &["First Name", "Last Name", "Notes", "Empty"],
            &[&["", "", "n1", ""], &["jo", "", "", ""], &["", "", "n3"]],
            false,
        );

        let columns = outcome.columns().unwrap();
        assert_eq!(columns.present, vec![Some("First Name".to_string()), None]);
        assert_eq!(columns.missing, vec!["Last Name".to_string()]);
        assert_eq!(columns.unmatched, vec![Some("Notes".to_string())]);
        assert_eq!(
            outcome.rows().unwrap(),
            cells(&[
                &[None, Some("n1")],
                &[Some("jo"), None],
                &[None, Some("n3")],
            ])
        );
    }

    #[test]
    fn test_short_rows_are_padded() {
        let outcome = run(&standard(), &["Notes", "First Name"], &[&["n1", "jo"], &["n2"]], false);

        assert_eq!(
            outcome.rows().unwrap(),
            cells(&[&[Some("n1"), Some("jo")], &[Some("n2"), None]])
        );
    }

    #[test]
    fn test_forced_import_buckets_unknowns() {
        let outcome = run(&standard(), &["Last Name", "Age"], &[&["Smith", "42"], &["", ""]], true);

        assert_eq!(
            records(&outcome),
            json!([{ "Last Name": "Smith", "unknowns": { "Age": "42" } }])
        );
    }

    #[test]
    fn test_forced_import_with_anonymous_column() {
        let outcome = run(&standard(), &["First Name"], &[&["Doe", "something"]], true);

        assert_eq!(
            records(&outcome),
            json!([{ "First Name": "Doe", "unknowns": { "1": "something" } }])
        );
    }

    #[test]
    fn test_ragged_rows_import() {
        let outcome = run(
            &standard(),
            &["First Name", "Last Name", ""],
            &[&["john", ""], &["", "doe"], &["", "smith", ""]],
            false,
        );

        assert_eq!(
            records(&outcome),
            json!([
                { "First Name": "john" },
                { "Last Name": "doe" },
                { "Last Name": "smith" }
            ])
        );
    }

    #[test]
    fn test_parallel_mapping_keeps_order() {
        let dialect = standard();
        let header = header_row(["First Name"]);
        let resolved = ResolvedHeader {
            dialect_name: dialect.name().to_string(),
            matches: match_dialect(&header, &dialect),
            original_columns: header,
        };
        let rows: Vec<Vec<String>> = (0..PARALLEL_ROW_THRESHOLD * 3)
            .map(|i| vec![i.to_string()])
            .collect();
        let hook: CoalesceHook = Arc::new(default_coalesce);

        let outcome = reconcile(&dialect, resolved, rows, false, &hook);

        let row_objects = outcome.row_objects().unwrap();
        assert_eq!(row_objects.len(), PARALLEL_ROW_THRESHOLD * 3);
        for (i, record) in row_objects.iter().enumerate() {
            assert_eq!(record["First Name"], json!(i.to_string()));
        }
    }
}
