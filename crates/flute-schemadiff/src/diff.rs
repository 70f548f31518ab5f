//! Diff records produced by the engine.
//!
//! Every scalar difference is a [`NextPreviousDiff`]. Records are filled in
//! builder style by the differs; `has_diff()` is always computed from what
//! was populated and never stored.

use serde::{Deserialize, Serialize};

use crate::assist;

/// A pair of next/previous values for one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextPreviousDiff<T> {
    /// Value in the next (current) snapshot.
    #[serde(default)]
    pub next: Option<T>,
    /// Value in the previous (baseline) snapshot.
    #[serde(default)]
    pub previous: Option<T>,
}

impl<T> NextPreviousDiff<T> {
    /// Creates a new next/previous pair.
    #[must_use]
    pub fn new(next: Option<T>, previous: Option<T>) -> Self {
        Self { next, previous }
    }
}

impl<T: PartialEq> NextPreviousDiff<T> {
    /// Returns true if next and previous are not the same value.
    #[must_use]
    pub fn has_diff(&self) -> bool {
        !assist::is_same(self.next.as_ref(), self.previous.as_ref())
    }
}

fn populated<T: PartialEq>(diff: Option<&NextPreviousDiff<T>>) -> bool {
    diff.is_some_and(NextPreviousDiff::has_diff)
}

/// What happened to a table, column or constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    /// Present only in the next snapshot.
    Added,
    /// Present in both, with differences.
    Changed,
    /// Present only in the previous snapshot.
    Deleted,
}

impl DiffKind {
    /// Returns the lowercase label of this kind.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Changed => "changed",
            Self::Deleted => "deleted",
        }
    }

    /// Added and deleted objects are a difference by themselves.
    #[must_use]
    pub fn is_existence_change(&self) -> bool {
        !matches!(self, Self::Changed)
    }
}

impl std::fmt::Display for DiffKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Differences of a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDiff {
    /// Column name.
    pub column_name: String,
    /// Diff kind.
    pub kind: DiffKind,
    /// Declared SQL type change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_type_diff: Option<NextPreviousDiff<String>>,
    /// Size/precision change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_size_diff: Option<NextPreviousDiff<String>>,
    /// Default value change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value_diff: Option<NextPreviousDiff<String>>,
    /// NOT NULL change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_null_diff: Option<NextPreviousDiff<bool>>,
    /// Auto-increment change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_increment_diff: Option<NextPreviousDiff<bool>>,
    /// Comment change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_diff: Option<NextPreviousDiff<String>>,
}

impl ColumnDiff {
    /// Creates an empty column diff of the given kind.
    #[must_use]
    pub fn new(column_name: impl Into<String>, kind: DiffKind) -> Self {
        Self {
            column_name: column_name.into(),
            kind,
            db_type_diff: None,
            column_size_diff: None,
            default_value_diff: None,
            not_null_diff: None,
            auto_increment_diff: None,
            comment_diff: None,
        }
    }

    /// Returns true if the column was added or deleted, or any attribute
    /// differs.
    #[must_use]
    pub fn has_diff(&self) -> bool {
        self.kind.is_existence_change()
            || populated(self.db_type_diff.as_ref())
            || populated(self.column_size_diff.as_ref())
            || populated(self.default_value_diff.as_ref())
            || populated(self.not_null_diff.as_ref())
            || populated(self.auto_increment_diff.as_ref())
            || populated(self.comment_diff.as_ref())
    }
}

/// Common view over the three constraint diff records.
pub trait ConstraintDiff {
    /// Constraint name (next name for changed constraints).
    fn constraint_name(&self) -> Option<&str>;

    /// Diff kind.
    fn kind(&self) -> DiffKind;

    /// Returns true if this record carries an actual difference.
    fn has_diff(&self) -> bool;
}

/// Differences of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyDiff {
    /// Constraint name.
    #[serde(default)]
    pub constraint_name: Option<String>,
    /// Diff kind.
    pub kind: DiffKind,
    /// Constraint rename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_diff: Option<NextPreviousDiff<String>>,
    /// Column fingerprint change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_diff: Option<NextPreviousDiff<String>>,
    /// Referenced table change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_table_diff: Option<NextPreviousDiff<String>>,
    /// Referenced column fingerprint change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_column_diff: Option<NextPreviousDiff<String>>,
}

impl ForeignKeyDiff {
    /// Creates an empty foreign key diff.
    #[must_use]
    pub fn new(constraint_name: Option<&str>, kind: DiffKind) -> Self {
        Self {
            constraint_name: constraint_name.map(str::to_string),
            kind,
            name_diff: None,
            column_diff: None,
            foreign_table_diff: None,
            foreign_column_diff: None,
        }
    }
}

impl ConstraintDiff for ForeignKeyDiff {
    fn constraint_name(&self) -> Option<&str> {
        self.constraint_name.as_deref()
    }

    fn kind(&self) -> DiffKind {
        self.kind
    }

    fn has_diff(&self) -> bool {
        self.kind.is_existence_change()
            || populated(self.name_diff.as_ref())
            || populated(self.column_diff.as_ref())
            || populated(self.foreign_table_diff.as_ref())
            || populated(self.foreign_column_diff.as_ref())
    }
}

/// Differences of a unique key (or the primary key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueKeyDiff {
    /// Constraint name.
    #[serde(default)]
    pub constraint_name: Option<String>,
    /// Diff kind.
    pub kind: DiffKind,
    /// Constraint rename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_diff: Option<NextPreviousDiff<String>>,
    /// Column fingerprint change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_diff: Option<NextPreviousDiff<String>>,
    /// Primary key flag change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_diff: Option<NextPreviousDiff<bool>>,
}

impl UniqueKeyDiff {
    /// Creates an empty unique key diff.
    #[must_use]
    pub fn new(constraint_name: Option<&str>, kind: DiffKind) -> Self {
        Self {
            constraint_name: constraint_name.map(str::to_string),
            kind,
            name_diff: None,
            column_diff: None,
            primary_diff: None,
        }
    }
}

impl ConstraintDiff for UniqueKeyDiff {
    fn constraint_name(&self) -> Option<&str> {
        self.constraint_name.as_deref()
    }

    fn kind(&self) -> DiffKind {
        self.kind
    }

    fn has_diff(&self) -> bool {
        self.kind.is_existence_change()
            || populated(self.name_diff.as_ref())
            || populated(self.column_diff.as_ref())
            || populated(self.primary_diff.as_ref())
    }
}

/// Differences of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDiff {
    /// Index name.
    #[serde(default)]
    pub constraint_name: Option<String>,
    /// Diff kind.
    pub kind: DiffKind,
    /// Index rename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_diff: Option<NextPreviousDiff<String>>,
    /// Column fingerprint change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_diff: Option<NextPreviousDiff<String>>,
    /// Unique flag change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_diff: Option<NextPreviousDiff<bool>>,
}

impl IndexDiff {
    /// Creates an empty index diff.
    #[must_use]
    pub fn new(constraint_name: Option<&str>, kind: DiffKind) -> Self {
        Self {
            constraint_name: constraint_name.map(str::to_string),
            kind,
            name_diff: None,
            column_diff: None,
            unique_diff: None,
        }
    }
}

impl ConstraintDiff for IndexDiff {
    fn constraint_name(&self) -> Option<&str> {
        self.constraint_name.as_deref()
    }

    fn kind(&self) -> DiffKind {
        self.kind
    }

    fn has_diff(&self) -> bool {
        self.kind.is_existence_change()
            || populated(self.name_diff.as_ref())
            || populated(self.column_diff.as_ref())
            || populated(self.unique_diff.as_ref())
    }
}

/// Differences of a single table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDiff {
    /// Table name (next name for renamed tables).
    pub table_name: String,
    /// Diff kind.
    pub kind: DiffKind,
    /// Table rename (only with rename detection).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_diff: Option<NextPreviousDiff<String>>,
    /// Schema (owner) change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unified_schema_diff: Option<NextPreviousDiff<String>>,
    /// Object type change (e.g. TABLE to VIEW).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type_diff: Option<NextPreviousDiff<String>>,
    /// Table comment change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_diff: Option<NextPreviousDiff<String>>,
    /// Order change of the columns present on both sides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_order_diff: Option<NextPreviousDiff<String>>,
    /// Column differences.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column_diffs: Vec<ColumnDiff>,
    /// Foreign key differences.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_key_diffs: Vec<ForeignKeyDiff>,
    /// Unique key differences.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique_key_diffs: Vec<UniqueKeyDiff>,
    /// Index differences.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub index_diffs: Vec<IndexDiff>,
}

impl TableDiff {
    /// Creates an empty table diff of the given kind.
    #[must_use]
    pub fn new(table_name: impl Into<String>, kind: DiffKind) -> Self {
        Self {
            table_name: table_name.into(),
            kind,
            rename_diff: None,
            unified_schema_diff: None,
            object_type_diff: None,
            comment_diff: None,
            column_order_diff: None,
            column_diffs: Vec::new(),
            foreign_key_diffs: Vec::new(),
            unique_key_diffs: Vec::new(),
            index_diffs: Vec::new(),
        }
    }

    /// Creates the diff of a table present only in the next snapshot.
    #[must_use]
    pub fn added(table_name: impl Into<String>) -> Self {
        Self::new(table_name, DiffKind::Added)
    }

    /// Creates the diff of a table present only in the previous snapshot.
    #[must_use]
    pub fn deleted(table_name: impl Into<String>) -> Self {
        Self::new(table_name, DiffKind::Deleted)
    }

    /// Returns true if the table was added, deleted or renamed, or has any
    /// table-level or child difference.
    #[must_use]
    pub fn has_diff(&self) -> bool {
        self.kind.is_existence_change()
            || populated(self.rename_diff.as_ref())
            || populated(self.unified_schema_diff.as_ref())
            || populated(self.object_type_diff.as_ref())
            || populated(self.comment_diff.as_ref())
            || populated(self.column_order_diff.as_ref())
            || self.column_diffs.iter().any(ColumnDiff::has_diff)
            || self.foreign_key_diffs.iter().any(ConstraintDiff::has_diff)
            || self.unique_key_diffs.iter().any(ConstraintDiff::has_diff)
            || self.index_diffs.iter().any(ConstraintDiff::has_diff)
    }

    /// Drops child records without differences.
    fn retain_differences(&mut self) {
        self.column_diffs.retain(ColumnDiff::has_diff);
        self.foreign_key_diffs.retain(ConstraintDiff::has_diff);
        self.unique_key_diffs.retain(ConstraintDiff::has_diff);
        self.index_diffs.retain(ConstraintDiff::has_diff);
    }

    /// Gets a column diff by column name.
    #[must_use]
    pub fn column_diff(&self, column_name: &str) -> Option<&ColumnDiff> {
        self.column_diffs
            .iter()
            .find(|c| c.column_name == column_name)
    }
}

/// Result of comparing two schema snapshots.
///
/// Only tables with actual differences are listed, also after restoring a
/// persisted diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PersistedSchemaDiff")]
pub struct SchemaDiff {
    #[serde(default)]
    table_diffs: Vec<TableDiff>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    table_count_diff: Option<NextPreviousDiff<usize>>,
}

/// Deserialized form of [`SchemaDiff`], pruned on conversion.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSchemaDiff {
    #[serde(default)]
    table_diffs: Vec<TableDiff>,
    #[serde(default)]
    table_count_diff: Option<NextPreviousDiff<usize>>,
}

impl From<PersistedSchemaDiff> for SchemaDiff {
    fn from(persisted: PersistedSchemaDiff) -> Self {
        Self::new(persisted.table_diffs, persisted.table_count_diff)
    }
}

impl SchemaDiff {
    /// Creates a schema diff, pruning table and child diffs without
    /// differences.
    #[must_use]
    pub fn new(
        table_diffs: Vec<TableDiff>,
        table_count_diff: Option<NextPreviousDiff<usize>>,
    ) -> Self {
        let table_diffs = table_diffs
            .into_iter()
            .map(|mut table| {
                table.retain_differences();
                table
            })
            .filter(TableDiff::has_diff)
            .collect();
        Self {
            table_diffs,
            table_count_diff: table_count_diff.filter(NextPreviousDiff::has_diff),
        }
    }

    /// Returns true if any table differs.
    #[must_use]
    pub fn has_diff(&self) -> bool {
        !self.table_diffs.is_empty()
    }

    /// Returns all table diffs.
    #[must_use]
    pub fn table_diffs(&self) -> &[TableDiff] {
        &self.table_diffs
    }

    /// Returns the table count change, when the counts differ.
    #[must_use]
    pub fn table_count_diff(&self) -> Option<&NextPreviousDiff<usize>> {
        self.table_count_diff.as_ref()
    }

    /// Gets a table diff by table name.
    #[must_use]
    pub fn table_diff(&self, table_name: &str) -> Option<&TableDiff> {
        self.table_diffs
            .iter()
            .find(|t| t.table_name == table_name)
    }

    /// Returns the table diffs of the given kind.
    pub fn tables_of(&self, kind: DiffKind) -> impl Iterator<Item = &TableDiff> {
        self.table_diffs.iter().filter(move |t| t.kind == kind)
    }
}
