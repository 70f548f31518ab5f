//! Index differ.

use crate::assist;
use crate::database::DatabaseKind;
use crate::diff::{DiffKind, IndexDiff};
use crate::schema::{IndexModel, TableModel};

use super::{ConstraintKeyDiffer, ConstraintKind, fingerprint, rename_diff};

/// Compares indexes.
#[derive(Debug, Clone, Copy)]
pub struct IndexDiffer {
    database: DatabaseKind,
}

impl IndexDiffer {
    /// Creates an index differ for the given database.
    #[must_use]
    pub fn new(database: DatabaseKind) -> Self {
        Self { database }
    }
}

impl ConstraintKeyDiffer for IndexDiffer {
    type Key = IndexModel;
    type Diff = IndexDiff;

    fn constraint_kind(&self) -> ConstraintKind {
        ConstraintKind::Index
    }

    fn database(&self) -> DatabaseKind {
        self.database
    }

    fn key_list<'t>(&self, table: &'t TableModel) -> &'t [IndexModel] {
        &table.indexes
    }

    fn constraint_name<'k>(&self, key: &'k IndexModel) -> Option<&'k str> {
        key.name.as_deref()
    }

    fn column(&self, key: &IndexModel) -> String {
        fingerprint(&key.columns)
    }

    fn diff(&self, diff: &mut IndexDiff, next: Option<&IndexModel>, previous: Option<&IndexModel>) {
        if let (Some(next), Some(previous)) = (next, previous) {
            diff.name_diff = rename_diff(self, next.name.as_deref(), previous.name.as_deref());
            diff.unique_diff = assist::diff_value(Some(&next.unique), Some(&previous.unique));
        }
        let next_column = next.map(|k| self.column(k));
        let previous_column = previous.map(|k| self.column(k));
        diff.column_diff = assist::diff_text(next_column.as_deref(), previous_column.as_deref());
    }

    fn create_added_diff(&self, name: Option<&str>) -> IndexDiff {
        IndexDiff::new(name, DiffKind::Added)
    }

    fn create_changed_diff(&self, name: Option<&str>) -> IndexDiff {
        IndexDiff::new(name, DiffKind::Changed)
    }

    fn create_deleted_diff(&self, name: Option<&str>) -> IndexDiff {
        IndexDiff::new(name, DiffKind::Deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::NextPreviousDiff;
    use crate::differ::diff_constraints;

    #[test]
    fn test_index_becomes_unique() {
        let differ = IndexDiffer::new(DatabaseKind::PostgreSql);
        let previous =
            TableModel::new("MEMBER").index(IndexModel::new("IX_MEMBER_NAME", ["MEMBER_NAME"]));
        let next = TableModel::new("MEMBER")
            .index(IndexModel::new("IX_MEMBER_NAME", ["MEMBER_NAME"]).unique());

        let diffs = diff_constraints(&differ, &next, &previous);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, DiffKind::Changed);
        assert_eq!(
            diffs[0].unique_diff,
            Some(NextPreviousDiff::new(Some(true), Some(false)))
        );
    }

    #[test]
    fn test_derby_generated_index_names() {
        let differ = IndexDiffer::new(DatabaseKind::Derby);
        let previous = TableModel::new("MEMBER").index(IndexModel::new("SQL090101", ["A", "B"]));
        let next = TableModel::new("MEMBER").index(IndexModel::new("SQL090202", ["A", "B"]));

        assert!(diff_constraints(&differ, &next, &previous).is_empty());
    }

    #[test]
    fn test_dropped_index() {
        let differ = IndexDiffer::new(DatabaseKind::PostgreSql);
        let previous = TableModel::new("MEMBER").index(IndexModel::new("IX_OLD", ["A"]));
        let next = TableModel::new("MEMBER");

        let diffs = diff_constraints(&differ, &next, &previous);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, DiffKind::Deleted);
        assert_eq!(
            diffs[0].column_diff,
            Some(NextPreviousDiff::new(None, Some("A".to_string())))
        );
    }
}
