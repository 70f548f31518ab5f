//! Per-table comparison.

use crate::assist;
use crate::database::DatabaseKind;
use crate::diff::{ColumnDiff, DiffKind, NextPreviousDiff, TableDiff};
use crate::differ::{ForeignKeyDiffer, IndexDiffer, UniqueKeyDiffer, diff_constraints};
use crate::schema::{ColumnModel, TableModel};

/// Compares two versions of a table.
#[derive(Debug, Clone, Copy)]
pub struct TableDiffer {
    foreign_keys: ForeignKeyDiffer,
    unique_keys: UniqueKeyDiffer,
    indexes: IndexDiffer,
    check_column_order: bool,
}

impl TableDiffer {
    /// Creates a table differ for snapshots of the given database.
    #[must_use]
    pub fn new(database: DatabaseKind) -> Self {
        Self {
            foreign_keys: ForeignKeyDiffer::new(database),
            unique_keys: UniqueKeyDiffer::new(database),
            indexes: IndexDiffer::new(database),
            check_column_order: true,
        }
    }

    /// Enables or disables the column definition order check.
    #[must_use]
    pub fn with_column_order(mut self, check: bool) -> Self {
        self.check_column_order = check;
        self
    }

    /// Compares `next` against `previous`.
    ///
    /// The result may be empty (`has_diff() == false`); callers drop empty
    /// table diffs. When the names differ (a detected rename), the diff is
    /// keyed by the next name and carries a rename diff.
    #[must_use]
    pub fn diff_table(&self, next: &TableModel, previous: &TableModel) -> TableDiff {
        let mut table_diff = TableDiff::new(&next.name, DiffKind::Changed);

        table_diff.rename_diff =
            assist::diff_text(Some(next.name.as_str()), Some(previous.name.as_str()));
        table_diff.unified_schema_diff =
            assist::diff_text(next.schema.as_deref(), previous.schema.as_deref());
        table_diff.object_type_diff = assist::diff_text(
            Some(next.object_type.as_str()),
            Some(previous.object_type.as_str()),
        );
        table_diff.comment_diff =
            assist::diff_text(next.comment.as_deref(), previous.comment.as_deref());

        table_diff.column_diffs = diff_columns(next, previous);
        if self.check_column_order {
            table_diff.column_order_diff = column_order_diff(next, previous);
        }

        table_diff.foreign_key_diffs = diff_constraints(&self.foreign_keys, next, previous);
        table_diff.unique_key_diffs = diff_constraints(&self.unique_keys, next, previous);
        table_diff.index_diffs = diff_constraints(&self.indexes, next, previous);

        table_diff
    }
}

/// Compares columns by name: changed and added columns in next order, then
/// deleted columns in previous order.
fn diff_columns(next: &TableModel, previous: &TableModel) -> Vec<ColumnDiff> {
    let mut diffs = Vec::new();

    for next_column in &next.columns {
        match previous.get_column(&next_column.name) {
            Some(previous_column) => {
                let diff = diff_column(next_column, previous_column);
                if diff.has_diff() {
                    diffs.push(diff);
                }
            }
            None => {
                let mut diff = ColumnDiff::new(&next_column.name, DiffKind::Added);
                diff.db_type_diff = assist::diff_text(Some(next_column.db_type.as_str()), None);
                diffs.push(diff);
            }
        }
    }

    for previous_column in &previous.columns {
        if next.get_column(&previous_column.name).is_none() {
            let mut diff = ColumnDiff::new(&previous_column.name, DiffKind::Deleted);
            diff.db_type_diff = assist::diff_text(None, Some(previous_column.db_type.as_str()));
            diffs.push(diff);
        }
    }

    diffs
}

/// Compares two versions of one column attribute by attribute.
fn diff_column(next: &ColumnModel, previous: &ColumnModel) -> ColumnDiff {
    let mut diff = ColumnDiff::new(&next.name, DiffKind::Changed);
    diff.db_type_diff =
        assist::diff_text(Some(next.db_type.as_str()), Some(previous.db_type.as_str()));
    diff.column_size_diff = assist::diff_value(
        next.size_expression().as_ref(),
        previous.size_expression().as_ref(),
    );
    diff.default_value_diff =
        assist::diff_text(next.default_value.as_deref(), previous.default_value.as_deref());
    diff.not_null_diff = assist::diff_value(Some(&next.not_null), Some(&previous.not_null));
    diff.auto_increment_diff =
        assist::diff_value(Some(&next.auto_increment), Some(&previous.auto_increment));
    diff.comment_diff = assist::diff_text(next.comment.as_deref(), previous.comment.as_deref());
    diff
}

/// Compares the relative order of the columns present on both sides.
/// Added or deleted columns alone do not count as an order change.
fn column_order_diff(next: &TableModel, previous: &TableModel) -> Option<NextPreviousDiff<String>> {
    let next_order: Vec<&str> = next
        .column_names()
        .filter(|name| previous.get_column(name).is_some())
        .collect();
    let previous_order: Vec<&str> = previous
        .column_names()
        .filter(|name| next.get_column(name).is_some())
        .collect();
    let next_order = next_order.join(",");
    let previous_order = previous_order.join(",");
    assist::diff_text(Some(next_order.as_str()), Some(previous_order.as_str()))
}
