//! Top-level schema comparison.
//!
//! Walks the tables of both snapshots, classifies each as added, deleted or
//! changed, and collects the non-empty table diffs into a [`SchemaDiff`].
//! The comparison is a pure function of the two snapshots.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::assist;
use crate::diff::{SchemaDiff, TableDiff};
use crate::schema::{SchemaModel, TableModel};
use crate::table_diff::TableDiffer;

/// Options for the schema differ.
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Whether to pair a deleted and an added table as a rename (heuristic).
    pub detect_renames: bool,
    /// Column name similarity threshold for rename detection (0.0 to 1.0).
    pub rename_threshold: f64,
    /// Whether a change in column definition order counts as a difference.
    pub check_column_order: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self {
            detect_renames: false,
            rename_threshold: 0.7,
            check_column_order: true,
        }
    }

    /// Enables rename detection.
    #[must_use]
    pub fn with_rename_detection(mut self) -> Self {
        self.detect_renames = true;
        self
    }

    /// Sets the rename similarity threshold.
    #[must_use]
    pub fn rename_threshold(mut self, threshold: f64) -> Self {
        self.rename_threshold = threshold;
        self
    }

    /// Ignores column definition order changes.
    #[must_use]
    pub fn without_column_order(mut self) -> Self {
        self.check_column_order = false;
        self
    }
}

/// Compares two schema snapshots.
#[derive(Debug, Default)]
pub struct SchemaDiffer {
    options: DiffOptions,
}

impl SchemaDiffer {
    /// Creates a new differ with default options.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: DiffOptions::default(),
        }
    }

    /// Creates a new differ with custom options.
    #[must_use]
    pub fn with_options(options: DiffOptions) -> Self {
        Self { options }
    }

    /// Returns the options in use.
    #[must_use]
    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    /// Compares `next` (current) against `previous` (baseline).
    ///
    /// Added and changed tables come first in next declaration order,
    /// deleted tables follow in previous declaration order. Auto-generated
    /// constraint names are recognized using the database of `next`.
    #[must_use]
    pub fn compare(&self, next: &SchemaModel, previous: &SchemaModel) -> SchemaDiff {
        let table_differ =
            TableDiffer::new(next.database()).with_column_order(self.options.check_column_order);

        let new_tables: Vec<&TableModel> = next
            .tables()
            .iter()
            .filter(|t| !previous.contains_table(&t.name))
            .collect();
        let dropped_tables: Vec<&TableModel> = previous
            .tables()
            .iter()
            .filter(|t| !next.contains_table(&t.name))
            .collect();

        // next table name -> previous table it was renamed from
        let renamed = if self.options.detect_renames {
            self.detect_renames(&dropped_tables, &new_tables)
        } else {
            HashMap::new()
        };
        let renamed_from: HashSet<&str> = renamed.values().map(|t| t.name.as_str()).collect();

        let mut table_diffs = Vec::new();

        for table in next.tables() {
            if let Some(previous_table) = previous.get_table(&table.name) {
                let diff = table_differ.diff_table(table, previous_table);
                if diff.has_diff() {
                    debug!(table = %table.name, "Table changed");
                    table_diffs.push(diff);
                }
            } else if let Some(previous_table) = renamed.get(table.name.as_str()) {
                debug!(table = %table.name, from = %previous_table.name, "Table renamed");
                table_diffs.push(table_differ.diff_table(table, previous_table));
            } else {
                debug!(table = %table.name, "Table added");
                table_diffs.push(TableDiff::added(&table.name));
            }
        }

        for table in dropped_tables {
            if renamed_from.contains(table.name.as_str()) {
                continue;
            }
            debug!(table = %table.name, "Table deleted");
            table_diffs.push(TableDiff::deleted(&table.name));
        }

        let table_count_diff = assist::diff_value(Some(&next.len()), Some(&previous.len()));
        let diff = SchemaDiff::new(table_diffs, table_count_diff);
        debug!(
            tables = diff.table_diffs().len(),
            has_diff = diff.has_diff(),
            "Schema comparison finished"
        );
        diff
    }

    /// Pairs dropped and new tables whose column sets are similar enough.
    /// Each table takes part in at most one pair; earlier tables win.
    fn detect_renames<'a>(
        &self,
        dropped_tables: &[&'a TableModel],
        new_tables: &[&'a TableModel],
    ) -> HashMap<&'a str, &'a TableModel> {
        let mut renamed: HashMap<&'a str, &'a TableModel> = HashMap::new();
        for &dropped in dropped_tables {
            for &new in new_tables {
                if renamed.contains_key(new.name.as_str()) {
                    continue; // Already matched
                }
                if self.tables_similar(dropped, new) {
                    renamed.insert(new.name.as_str(), dropped);
                    break;
                }
            }
        }
        renamed
    }

    /// Checks if two tables are similar (Jaccard index of column names).
    fn tables_similar(&self, a: &TableModel, b: &TableModel) -> bool {
        let a_cols: HashSet<&str> = a.column_names().collect();
        let b_cols: HashSet<&str> = b.column_names().collect();

        let common = a_cols.intersection(&b_cols).count();
        let total = a_cols.union(&b_cols).count();

        if total == 0 {
            return false;
        }

        let similarity = common as f64 / total as f64;
        similarity >= self.options.rename_threshold
    }
}

/// Compares two snapshots with default options.
#[must_use]
pub fn compare(next: &SchemaModel, previous: &SchemaModel) -> SchemaDiff {
    SchemaDiffer::new().compare(next, previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseKind;
    use crate::diff::DiffKind;
    use crate::schema::ColumnModel;

    fn table(name: &str, columns: &[&str]) -> TableModel {
        columns.iter().fold(TableModel::new(name), |t, c| {
            t.column(ColumnModel::new(*c, "VARCHAR"))
        })
    }

    fn schema(tables: Vec<TableModel>) -> SchemaModel {
        tables
            .into_iter()
            .fold(SchemaModel::new(DatabaseKind::PostgreSql), SchemaModel::table)
    }

    #[test]
    fn test_no_changes() {
        let s = schema(vec![table("MEMBER", &["ID", "NAME"])]);
        let diff = compare(&s, &s);
        assert!(!diff.has_diff());
        assert!(diff.table_diffs().is_empty());
        assert!(diff.table_count_diff().is_none());
    }

    #[test]
    fn test_detect_new_table() {
        let previous = schema(vec![]);
        let next = schema(vec![table("MEMBER", &["ID"])]);

        let diff = compare(&next, &previous);
        assert_eq!(diff.table_diffs().len(), 1);
        assert_eq!(diff.table_diffs()[0].kind, DiffKind::Added);
        assert!(diff.table_diffs()[0].column_diffs.is_empty());
    }

    #[test]
    fn test_detect_dropped_table() {
        let previous = schema(vec![table("MEMBER", &["ID"])]);
        let next = schema(vec![]);

        let diff = compare(&next, &previous);
        assert_eq!(diff.table_diffs().len(), 1);
        assert_eq!(diff.table_diffs()[0].kind, DiffKind::Deleted);
    }

    #[test]
    fn test_output_order() {
        let previous = schema(vec![
            table("GONE_B", &["ID"]),
            table("KEPT", &["ID"]),
            table("GONE_A", &["ID"]),
        ]);
        let next = schema(vec![
            table("NEW_Z", &["ID"]),
            table("KEPT", &["ID", "NAME"]),
            table("NEW_A", &["ID"]),
        ]);

        let diff = compare(&next, &previous);
        let order: Vec<(&str, DiffKind)> = diff
            .table_diffs()
            .iter()
            .map(|t| (t.table_name.as_str(), t.kind))
            .collect();
        assert_eq!(
            order,
            vec![
                ("NEW_Z", DiffKind::Added),
                ("KEPT", DiffKind::Changed),
                ("NEW_A", DiffKind::Added),
                ("GONE_B", DiffKind::Deleted),
                ("GONE_A", DiffKind::Deleted),
            ]
        );
    }

    #[test]
    fn test_detect_table_rename() {
        let previous = schema(vec![table("USERS", &["ID", "NAME", "EMAIL"])]);
        let next = schema(vec![table("ACCOUNTS", &["ID", "NAME", "EMAIL"])]);

        let differ = SchemaDiffer::with_options(DiffOptions::new().with_rename_detection());
        let diff = differ.compare(&next, &previous);

        assert_eq!(diff.table_diffs().len(), 1);
        let renamed = &diff.table_diffs()[0];
        assert_eq!(renamed.kind, DiffKind::Changed);
        assert_eq!(renamed.table_name, "ACCOUNTS");
        let rename = renamed.rename_diff.as_ref().unwrap();
        assert_eq!(rename.next.as_deref(), Some("ACCOUNTS"));
        assert_eq!(rename.previous.as_deref(), Some("USERS"));
    }

    #[test]
    fn test_rename_below_threshold_is_drop_and_add() {
        let previous = schema(vec![table("USERS", &["ID", "NAME", "EMAIL"])]);
        let next = schema(vec![table("ORDERS", &["ID", "TOTAL", "PLACED_AT"])]);

        let differ = SchemaDiffer::with_options(DiffOptions::new().with_rename_detection());
        let diff = differ.compare(&next, &previous);

        assert_eq!(diff.tables_of(DiffKind::Added).count(), 1);
        assert_eq!(diff.tables_of(DiffKind::Deleted).count(), 1);
    }

    #[test]
    fn test_rename_detection_disabled_by_default() {
        let previous = schema(vec![table("USERS", &["ID", "NAME"])]);
        let next = schema(vec![table("ACCOUNTS", &["ID", "NAME"])]);

        let diff = compare(&next, &previous);
        assert_eq!(diff.table_diffs().len(), 2);
    }

    #[test]
    fn test_table_count_diff() {
        let previous = schema(vec![table("A", &["ID"])]);
        let next = schema(vec![table("A", &["ID"]), table("B", &["ID"])]);

        let diff = compare(&next, &previous);
        let count = diff.table_count_diff().unwrap();
        assert_eq!((count.next, count.previous), (Some(2), Some(1)));
    }
}
