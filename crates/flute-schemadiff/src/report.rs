//! Human-readable rendering of a [`SchemaDiff`].

use std::fmt::{self, Display};

use crate::diff::{
    ColumnDiff, ConstraintDiff, DiffKind, ForeignKeyDiff, IndexDiff, NextPreviousDiff, SchemaDiff,
    TableDiff, UniqueKeyDiff,
};
use crate::differ::ConstraintKind;

const ABSENT: &str = "(none)";

/// Display adapter for a schema diff.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    diff: &'a SchemaDiff,
}

impl<'a> Report<'a> {
    /// Creates a report over a diff.
    #[must_use]
    pub fn new(diff: &'a SchemaDiff) -> Self {
        Self { diff }
    }
}

/// Renders a diff as text.
#[must_use]
pub fn render_report(diff: &SchemaDiff) -> String {
    Report::new(diff).to_string()
}

fn marker(kind: DiffKind) -> char {
    match kind {
        DiffKind::Added => '+',
        DiffKind::Changed => '~',
        DiffKind::Deleted => '-',
    }
}

/// Formats populated pairs as `label: previous -> next`, comma separated.
#[derive(Default)]
struct Changes(Vec<String>);

impl Changes {
    fn pair<T: Display + PartialEq>(&mut self, label: &str, diff: Option<&NextPreviousDiff<T>>) {
        let Some(diff) = diff.filter(|d| d.has_diff()) else {
            return;
        };
        let show = |value: &Option<T>| {
            value
                .as_ref()
                .map_or_else(|| ABSENT.to_string(), ToString::to_string)
        };
        self.0.push(format!(
            "{}: {} -> {}",
            label,
            show(&diff.previous),
            show(&diff.next)
        ));
    }

    fn suffix(&self) -> String {
        if self.0.is_empty() {
            String::new()
        } else {
            format!(": {}", self.0.join(", "))
        }
    }
}

impl Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.diff.has_diff() {
            return writeln!(f, "No schema differences.");
        }

        writeln!(
            f,
            "Schema differences: {} added, {} changed, {} deleted table(s)",
            self.diff.tables_of(DiffKind::Added).count(),
            self.diff.tables_of(DiffKind::Changed).count(),
            self.diff.tables_of(DiffKind::Deleted).count(),
        )?;
        if let Some(count) = self.diff.table_count_diff() {
            let mut changes = Changes::default();
            changes.pair("table count", Some(count));
            for change in &changes.0 {
                writeln!(f, "{}", change)?;
            }
        }

        for table in self.diff.table_diffs() {
            write_table(f, table)?;
        }
        Ok(())
    }
}

fn write_table(f: &mut fmt::Formatter<'_>, table: &TableDiff) -> fmt::Result {
    writeln!(f, "{} {} ({})", marker(table.kind), table.table_name, table.kind)?;

    let mut changes = Changes::default();
    changes.pair("name", table.rename_diff.as_ref());
    changes.pair("schema", table.unified_schema_diff.as_ref());
    changes.pair("object type", table.object_type_diff.as_ref());
    changes.pair("comment", table.comment_diff.as_ref());
    changes.pair("column order", table.column_order_diff.as_ref());
    for change in &changes.0 {
        writeln!(f, "    {}", change)?;
    }

    for column in &table.column_diffs {
        writeln!(f, "    {}", column_line(column))?;
    }
    for fk in &table.foreign_key_diffs {
        writeln!(f, "    {}", foreign_key_line(fk))?;
    }
    for uk in &table.unique_key_diffs {
        writeln!(f, "    {}", unique_key_line(uk))?;
    }
    for index in &table.index_diffs {
        writeln!(f, "    {}", index_line(index))?;
    }
    Ok(())
}

fn column_line(column: &ColumnDiff) -> String {
    let mut changes = Changes::default();
    changes.pair("type", column.db_type_diff.as_ref());
    changes.pair("size", column.column_size_diff.as_ref());
    changes.pair("default", column.default_value_diff.as_ref());
    changes.pair("not null", column.not_null_diff.as_ref());
    changes.pair("auto increment", column.auto_increment_diff.as_ref());
    changes.pair("comment", column.comment_diff.as_ref());
    format!(
        "{} column {} ({}){}",
        marker(column.kind),
        column.column_name,
        column.kind,
        changes.suffix()
    )
}

fn constraint_head(kind: ConstraintKind, diff: &impl ConstraintDiff) -> String {
    format!(
        "{} {} {} ({})",
        marker(diff.kind()),
        kind.label(),
        diff.constraint_name().unwrap_or(ABSENT),
        diff.kind()
    )
}

fn foreign_key_line(fk: &ForeignKeyDiff) -> String {
    let mut changes = Changes::default();
    changes.pair("name", fk.name_diff.as_ref());
    changes.pair("columns", fk.column_diff.as_ref());
    changes.pair("foreign table", fk.foreign_table_diff.as_ref());
    changes.pair("foreign columns", fk.foreign_column_diff.as_ref());
    constraint_head(ConstraintKind::ForeignKey, fk) + &changes.suffix()
}

fn unique_key_line(uk: &UniqueKeyDiff) -> String {
    let mut changes = Changes::default();
    changes.pair("name", uk.name_diff.as_ref());
    changes.pair("columns", uk.column_diff.as_ref());
    changes.pair("primary", uk.primary_diff.as_ref());
    constraint_head(ConstraintKind::UniqueKey, uk) + &changes.suffix()
}

fn index_line(index: &IndexDiff) -> String {
    let mut changes = Changes::default();
    changes.pair("name", index.name_diff.as_ref());
    changes.pair("columns", index.column_diff.as_ref());
    changes.pair("unique", index.unique_diff.as_ref());
    constraint_head(ConstraintKind::Index, index) + &changes.suffix()
}
