//! Per-column data presence over a block of rows.

use std::collections::BTreeSet;

/// Which columns carry data, and how wide the widest row is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Presence {
    /// Length of the widest row.
    pub column_count: usize,
    /// Indices where at least one row has a non-empty value.
    pub present_indices: BTreeSet<usize>,
}

impl Presence {
    #[inline]
    pub fn is_present(&self, index: usize) -> bool {
        self.present_indices.contains(&index)
    }

    /// Returns true if any column carries data.
    #[inline]
    pub fn has_data(&self) -> bool {
        !self.present_indices.is_empty()
    }
}

/// Scan rows for column width and data presence.
///
/// Rows may be ragged; a column counts as present as soon as a single row
/// has a non-empty value in it.
pub fn analyze<S: AsRef<str>>(rows: &[Vec<S>]) -> Presence {
    let mut presence = Presence::default();

    for row in rows {
        presence.column_count = presence.column_count.max(row.len());
        presence.present_indices.extend(
            row.iter()
                .enumerate()
                .filter(|(_, value)| !value.as_ref().is_empty())
                .map(|(index, _)| index),
        );
    }

    presence
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_ragged_rows() {
        let rows = vec![vec!["john", ""], vec!["", "doe", ""], vec!["x"]];

        let presence = analyze(&rows);

        assert_eq!(presence.column_count, 3);
        assert_eq!(presence.present_indices, BTreeSet::from([0, 1]));
        assert!(presence.is_present(1));
        assert!(!presence.is_present(2));
    }

    #[test]
    fn test_analyze_empty() {
        let presence = analyze::<String>(&[]);

        assert_eq!(presence.column_count, 0);
        assert!(!presence.has_data());
    }

    #[test]
    fn test_analyze_all_blank() {
        let rows = vec![vec!["", ""], vec![""]];

        let presence = analyze(&rows);

        assert_eq!(presence.column_count, 2);
        assert!(!presence.has_data());
    }
}
