//! Foreign key differ.

use crate::assist;
use crate::database::DatabaseKind;
use crate::diff::{DiffKind, ForeignKeyDiff};
use crate::schema::{ForeignKeyModel, TableModel};

use super::{ConstraintKeyDiffer, ConstraintKind, fingerprint, rename_diff};

/// Compares foreign keys. Structure includes the referenced table.
#[derive(Debug, Clone, Copy)]
pub struct ForeignKeyDiffer {
    database: DatabaseKind,
}

impl ForeignKeyDiffer {
    /// Creates a foreign key differ for the given database.
    #[must_use]
    pub fn new(database: DatabaseKind) -> Self {
        Self { database }
    }
}

impl ConstraintKeyDiffer for ForeignKeyDiffer {
    type Key = ForeignKeyModel;
    type Diff = ForeignKeyDiff;

    fn constraint_kind(&self) -> ConstraintKind {
        ConstraintKind::ForeignKey
    }

    fn database(&self) -> DatabaseKind {
        self.database
    }

    fn key_list<'t>(&self, table: &'t TableModel) -> &'t [ForeignKeyModel] {
        &table.foreign_keys
    }

    fn constraint_name<'k>(&self, key: &'k ForeignKeyModel) -> Option<&'k str> {
        key.name.as_deref()
    }

    fn column(&self, key: &ForeignKeyModel) -> String {
        fingerprint(&key.columns)
    }

    fn is_same_structure(&self, next: &ForeignKeyModel, previous: &ForeignKeyModel) -> bool {
        assist::is_same(Some(&self.column(next)), Some(&self.column(previous)))
            && assist::is_same(
                Some(next.foreign_table.as_str()),
                Some(previous.foreign_table.as_str()),
            )
    }

    fn diff(
        &self,
        diff: &mut ForeignKeyDiff,
        next: Option<&ForeignKeyModel>,
        previous: Option<&ForeignKeyModel>,
    ) {
        if let (Some(next), Some(previous)) = (next, previous) {
            diff.name_diff = rename_diff(self, next.name.as_deref(), previous.name.as_deref());
        }
        let next_column = next.map(|k| self.column(k));
        let previous_column = previous.map(|k| self.column(k));
        diff.column_diff = assist::diff_text(next_column.as_deref(), previous_column.as_deref());
        diff.foreign_table_diff = assist::diff_text(
            next.map(|k| k.foreign_table.as_str()),
            previous.map(|k| k.foreign_table.as_str()),
        );
        let next_foreign = next.map(|k| fingerprint(&k.foreign_columns));
        let previous_foreign = previous.map(|k| fingerprint(&k.foreign_columns));
        diff.foreign_column_diff =
            assist::diff_text(next_foreign.as_deref(), previous_foreign.as_deref());
    }

    fn create_added_diff(&self, name: Option<&str>) -> ForeignKeyDiff {
        ForeignKeyDiff::new(name, DiffKind::Added)
    }

    fn create_changed_diff(&self, name: Option<&str>) -> ForeignKeyDiff {
        ForeignKeyDiff::new(name, DiffKind::Changed)
    }

    fn create_deleted_diff(&self, name: Option<&str>) -> ForeignKeyDiff {
        ForeignKeyDiff::new(name, DiffKind::Deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{ConstraintDiff, NextPreviousDiff};
    use crate::differ::diff_constraints;

    fn member(fk: ForeignKeyModel) -> TableModel {
        TableModel::new("MEMBER").foreign_key(fk)
    }

    #[test]
    fn test_referenced_table_change_under_same_name() {
        let differ = ForeignKeyDiffer::new(DatabaseKind::PostgreSql);
        let previous = member(ForeignKeyModel::new(
            "FK_MEMBER_STATUS",
            ["STATUS"],
            "MEMBER_STATUS",
        ));
        let next = member(ForeignKeyModel::new(
            "FK_MEMBER_STATUS",
            ["STATUS"],
            "STATUS_MASTER",
        ));

        let diffs = diff_constraints(&differ, &next, &previous);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind(), DiffKind::Changed);
        assert_eq!(
            diffs[0].foreign_table_diff,
            Some(NextPreviousDiff::new(
                Some("STATUS_MASTER".to_string()),
                Some("MEMBER_STATUS".to_string())
            ))
        );
        assert!(diffs[0].column_diff.is_none());
    }

    #[test]
    fn test_oracle_renumbered_name_is_not_a_diff() {
        let differ = ForeignKeyDiffer::new(DatabaseKind::Oracle);
        let previous = member(
            ForeignKeyModel::new("SYS_C00123", ["STATUS"], "MEMBER_STATUS").references(["STATUS"]),
        );
        let next = member(
            ForeignKeyModel::new("SYS_C00456", ["STATUS"], "MEMBER_STATUS").references(["STATUS"]),
        );

        assert!(!differ.is_same_constraint_name(Some("SYS_C00456"), Some("SYS_C00123")));
        assert!(diff_constraints(&differ, &next, &previous).is_empty());
    }

    #[test]
    fn test_auto_named_key_with_new_referenced_table_is_replaced() {
        let differ = ForeignKeyDiffer::new(DatabaseKind::Oracle);
        let previous = member(ForeignKeyModel::new("SYS_C00123", ["STATUS"], "MEMBER_STATUS"));
        let next = member(ForeignKeyModel::new("SYS_C00456", ["STATUS"], "STATUS_MASTER"));

        let diffs = diff_constraints(&differ, &next, &previous);
        let kinds: Vec<DiffKind> = diffs.iter().map(ConstraintDiff::kind).collect();
        assert_eq!(kinds, vec![DiffKind::Added, DiffKind::Deleted]);
    }

    #[test]
    fn test_mysql_ibfk_names_are_auto_generated() {
        let differ = ForeignKeyDiffer::new(DatabaseKind::MySql);
        let previous = member(ForeignKeyModel::new("member_ibfk_1", ["STATUS"], "MEMBER_STATUS"));
        let next = member(ForeignKeyModel::new("member_ibfk_2", ["STATUS"], "MEMBER_STATUS"));

        assert!(differ.is_auto_generated_name("member_ibfk_2"));
        assert!(diff_constraints(&differ, &next, &previous).is_empty());
    }

    #[test]
    fn test_user_rename_is_reported() {
        let differ = ForeignKeyDiffer::new(DatabaseKind::Oracle);
        let previous = member(ForeignKeyModel::new("SYS_C00123", ["STATUS"], "MEMBER_STATUS"));
        let next = member(ForeignKeyModel::new("FK_MEMBER_STATUS", ["STATUS"], "MEMBER_STATUS"));

        let diffs = diff_constraints(&differ, &next, &previous);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, DiffKind::Changed);
        assert_eq!(
            diffs[0].name_diff,
            Some(NextPreviousDiff::new(
                Some("FK_MEMBER_STATUS".to_string()),
                Some("SYS_C00123".to_string())
            ))
        );
    }

    #[test]
    fn test_added_key_records_structure() {
        let differ = ForeignKeyDiffer::new(DatabaseKind::PostgreSql);
        let previous = TableModel::new("MEMBER");
        let next = member(
            ForeignKeyModel::new("FK_MEMBER_STATUS", ["STATUS"], "MEMBER_STATUS")
                .references(["CODE"]),
        );

        let diffs = diff_constraints(&differ, &next, &previous);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, DiffKind::Added);
        assert_eq!(
            diffs[0].foreign_table_diff.as_ref().and_then(|d| d.next.as_deref()),
            Some("MEMBER_STATUS")
        );
        assert!(diffs[0].name_diff.is_none());
    }
}
