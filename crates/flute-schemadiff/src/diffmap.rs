//! Diff history ("diff map").
//!
//! The history is a line-oriented file: every line is one JSON
//! [`DiffMapRecord`], newest last, so a new record is a plain append.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diff::{ConstraintDiff, DiffKind, SchemaDiff, TableDiff};
use crate::differ::ConstraintKind;
use crate::error::{DiffError, Result};

/// Field suffix of the per-kind constraint diff lists in a table diff.
const CONSTRAINT_DIFFS_SUFFIX: &str = "Diffs";

/// Table diff fields ending in the suffix that are not constraint lists.
const NON_CONSTRAINT_DIFFS: &[&str] = &["columnDiffs"];

/// One persisted comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffMapRecord {
    /// When the comparison ran.
    pub diff_date: DateTime<Utc>,
    /// The comparison result.
    pub diff: SchemaDiff,
}

/// Summary of one table diff: name, kind and the constraint kinds touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    /// Table name.
    pub table_name: String,
    /// Diff kind.
    pub kind: DiffKind,
    /// Constraint kinds with at least one difference, in fixed order.
    pub constraint_kinds: Vec<ConstraintKind>,
}

impl TableSummary {
    /// Summarizes a table diff.
    #[must_use]
    pub fn of(table_diff: &TableDiff) -> Self {
        let mut constraint_kinds = Vec::new();
        if table_diff.foreign_key_diffs.iter().any(ConstraintDiff::has_diff) {
            constraint_kinds.push(ConstraintKind::ForeignKey);
        }
        if table_diff.unique_key_diffs.iter().any(ConstraintDiff::has_diff) {
            constraint_kinds.push(ConstraintKind::UniqueKey);
        }
        if table_diff.index_diffs.iter().any(ConstraintDiff::has_diff) {
            constraint_kinds.push(ConstraintKind::Index);
        }
        Self {
            table_name: table_diff.table_name.clone(),
            kind: table_diff.kind,
            constraint_kinds,
        }
    }
}

impl DiffMapRecord {
    /// Creates a record dated now.
    #[must_use]
    pub fn new(diff: SchemaDiff) -> Self {
        Self::at(Utc::now(), diff)
    }

    /// Creates a record with an explicit date.
    #[must_use]
    pub fn at(diff_date: DateTime<Utc>, diff: SchemaDiff) -> Self {
        Self { diff_date, diff }
    }

    /// Summarizes every table diff of the record.
    #[must_use]
    pub fn summary(&self) -> Vec<TableSummary> {
        self.diff.table_diffs().iter().map(TableSummary::of).collect()
    }

    /// Serializes the record as one JSON line (without the newline).
    pub fn to_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restores a record from one JSON line.
    ///
    /// Constraint diff lists are keyed by constraint kind; a kind without a
    /// differ fails instead of being dropped silently.
    pub fn from_line(line: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(line)?;
        check_constraint_kinds(&value)?;
        Ok(serde_json::from_value(value)?)
    }
}

fn check_constraint_kinds(record: &Value) -> Result<()> {
    let table_diffs = record
        .get("diff")
        .and_then(|diff| diff.get("tableDiffs"))
        .and_then(Value::as_array);
    let Some(table_diffs) = table_diffs else {
        return Ok(());
    };

    for table_diff in table_diffs.iter().filter_map(Value::as_object) {
        for field in table_diff.keys() {
            if NON_CONSTRAINT_DIFFS.contains(&field.as_str()) {
                continue;
            }
            if let Some(kind) = field.strip_suffix(CONSTRAINT_DIFFS_SUFFIX) {
                kind.parse::<ConstraintKind>()?;
            }
        }
    }
    Ok(())
}

/// The full diff history, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffMap {
    records: Vec<DiffMapRecord>,
}

impl DiffMap {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a history file. Blank lines are skipped.
    pub fn parse(content: &str) -> Result<Self> {
        let mut records = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record = DiffMapRecord::from_line(line).map_err(|e| match e {
                DiffError::Serialization(source) => DiffError::MalformedDiffMap {
                    line: idx + 1,
                    message: source.to_string(),
                },
                other => other,
            })?;
            records.push(record);
        }
        Ok(Self { records })
    }

    /// Renders the history, one record per line with a trailing newline.
    pub fn render(&self) -> Result<String> {
        let mut content = String::new();
        for record in &self.records {
            content.push_str(&record.to_line()?);
            content.push('\n');
        }
        Ok(content)
    }

    /// Appends a record.
    pub fn push(&mut self, record: DiffMapRecord) {
        self.records.push(record);
    }

    /// Returns the newest record.
    #[must_use]
    pub fn latest(&self) -> Option<&DiffMapRecord> {
        self.records.last()
    }

    /// Returns all records, oldest first.
    #[must_use]
    pub fn records(&self) -> &[DiffMapRecord] {
        &self.records
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there is no record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{IndexDiff, NextPreviousDiff};

    fn sample_diff() -> SchemaDiff {
        let mut member = TableDiff::new("MEMBER", DiffKind::Changed);
        let mut index = IndexDiff::new(Some("IX_MEMBER_NAME"), DiffKind::Changed);
        index.unique_diff = Some(NextPreviousDiff::new(Some(true), Some(false)));
        member.index_diffs.push(index);
        SchemaDiff::new(
            vec![member, TableDiff::added("MEMBER_ADDRESS")],
            Some(NextPreviousDiff::new(Some(2), Some(1))),
        )
    }

    #[test]
    fn test_summary() {
        let record = DiffMapRecord::new(sample_diff());
        let summary = record.summary();

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].table_name, "MEMBER");
        assert_eq!(summary[0].constraint_kinds, vec![ConstraintKind::Index]);
        assert_eq!(summary[1].kind, DiffKind::Added);
        assert!(summary[1].constraint_kinds.is_empty());
    }

    #[test]
    fn test_render_and_parse() {
        let mut map = DiffMap::new();
        map.push(DiffMapRecord::new(sample_diff()));
        map.push(DiffMapRecord::new(SchemaDiff::default()));

        let content = map.render().unwrap();
        assert_eq!(content.lines().count(), 2);

        let parsed = DiffMap::parse(&content).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.records()[0].summary(), map.records()[0].summary());
        assert!(!parsed.latest().unwrap().diff.has_diff());
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let line = DiffMapRecord::new(sample_diff()).to_line().unwrap();
        let parsed = DiffMap::parse(&format!("\n{}\n\n", line)).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_restored_record_drops_empty_diffs() {
        let line = r#"{"diffDate":"2024-01-01T00:00:00Z","diff":{"tableDiffs":[
            {"tableName":"MEMBER","kind":"changed",
             "columnDiffs":[{"columnName":"NAME","kind":"changed"}]},
            {"tableName":"PURCHASE","kind":"changed",
             "columnDiffs":[{"columnName":"PRICE","kind":"changed"},
                            {"columnName":"TAX","kind":"added","dbTypeDiff":{"next":"INTEGER"}}]}],
            "tableCountDiff":{"next":2,"previous":2}}}"#
            .replace('\n', "");
        let map = DiffMap::parse(&line).unwrap();
        let diff = &map.latest().unwrap().diff;

        assert!(diff.table_diff("MEMBER").is_none());
        let purchase = diff.table_diff("PURCHASE").unwrap();
        assert_eq!(purchase.column_diffs.len(), 1);
        assert_eq!(purchase.column_diffs[0].column_name, "TAX");
        assert!(diff.table_count_diff().is_none());
    }

    #[test]
    fn test_restored_record_without_differences() {
        let line = r#"{"diffDate":"2024-01-01T00:00:00Z","diff":{"tableDiffs":[
            {"tableName":"MEMBER","kind":"changed",
             "columnDiffs":[{"columnName":"NAME","kind":"changed"}]}]}}"#
            .replace('\n', "");
        let record = DiffMapRecord::from_line(&line).unwrap();

        assert!(!record.diff.has_diff());
        assert!(record.summary().is_empty());
    }

    #[test]
    fn test_unknown_constraint_kind_fails() {
        let line = r#"{"diffDate":"2024-01-01T00:00:00Z","diff":{"tableDiffs":[
            {"tableName":"MEMBER","kind":"changed","checkDiffs":[{"kind":"added"}]}]}}"#
            .replace('\n', "");
        let result = DiffMap::parse(&line);
        assert!(matches!(result, Err(DiffError::UnknownConstraintKind(kind)) if kind == "check"));
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let good = DiffMapRecord::new(SchemaDiff::default()).to_line().unwrap();
        let content = format!("{}\n{{not json\n", good);
        let result = DiffMap::parse(&content);
        assert!(matches!(result, Err(DiffError::MalformedDiffMap { line: 2, .. })));
    }
}
