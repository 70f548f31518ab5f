//! Unique key differ. The primary key is compared as a unique key.

use crate::assist;
use crate::database::DatabaseKind;
use crate::diff::{DiffKind, UniqueKeyDiff};
use crate::schema::{TableModel, UniqueKeyModel};

use super::{ConstraintKeyDiffer, ConstraintKind, fingerprint, rename_diff};

/// Compares unique keys, primary key included.
#[derive(Debug, Clone, Copy)]
pub struct UniqueKeyDiffer {
    database: DatabaseKind,
}

impl UniqueKeyDiffer {
    /// Creates a unique key differ for the given database.
    #[must_use]
    pub fn new(database: DatabaseKind) -> Self {
        Self { database }
    }
}

impl ConstraintKeyDiffer for UniqueKeyDiffer {
    type Key = UniqueKeyModel;
    type Diff = UniqueKeyDiff;

    fn constraint_kind(&self) -> ConstraintKind {
        ConstraintKind::UniqueKey
    }

    fn database(&self) -> DatabaseKind {
        self.database
    }

    fn key_list<'t>(&self, table: &'t TableModel) -> &'t [UniqueKeyModel] {
        &table.unique_keys
    }

    fn constraint_name<'k>(&self, key: &'k UniqueKeyModel) -> Option<&'k str> {
        key.name.as_deref()
    }

    fn column(&self, key: &UniqueKeyModel) -> String {
        fingerprint(&key.columns)
    }

    fn diff(
        &self,
        diff: &mut UniqueKeyDiff,
        next: Option<&UniqueKeyModel>,
        previous: Option<&UniqueKeyModel>,
    ) {
        if let (Some(next), Some(previous)) = (next, previous) {
            diff.name_diff = rename_diff(self, next.name.as_deref(), previous.name.as_deref());
            diff.primary_diff = assist::diff_value(Some(&next.primary), Some(&previous.primary));
        }
        let next_column = next.map(|k| self.column(k));
        let previous_column = previous.map(|k| self.column(k));
        diff.column_diff = assist::diff_text(next_column.as_deref(), previous_column.as_deref());
    }

    fn create_added_diff(&self, name: Option<&str>) -> UniqueKeyDiff {
        UniqueKeyDiff::new(name, DiffKind::Added)
    }

    fn create_changed_diff(&self, name: Option<&str>) -> UniqueKeyDiff {
        UniqueKeyDiff::new(name, DiffKind::Changed)
    }

    fn create_deleted_diff(&self, name: Option<&str>) -> UniqueKeyDiff {
        UniqueKeyDiff::new(name, DiffKind::Deleted)
    }
}
