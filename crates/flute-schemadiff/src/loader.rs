//! Snapshot documents and the schema loader.
//!
//! Snapshots reach the engine as JSON documents. The loader validates the
//! structural preconditions the differs rely on (non-empty names, unique
//! table and column names, keys with at least one column) and turns a
//! document into a [`SchemaModel`]. The reverse direction,
//! [`SnapshotDocument::from_schema`], persists a model as the next baseline.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::database::DatabaseKind;
use crate::differ::ConstraintKind;
use crate::error::{DiffError, Result};
use crate::schema::{
    ColumnModel, ForeignKeyModel, IndexModel, SchemaModel, TABLE_OBJECT_TYPE, TableModel,
    UniqueKeyModel,
};

/// Constraint kind key of a primary key in snapshot documents.
pub const PRIMARY_KEY_KIND: &str = "primaryKey";

fn default_object_type() -> String {
    TABLE_OBJECT_TYPE.to_string()
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A schema snapshot as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    /// Database product name (`oracle`, `mysql`, `postgresql`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Tables in declaration order.
    #[serde(default)]
    pub tables: Vec<TableDocument>,
}

/// A table inside a [`SnapshotDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDocument {
    /// Table name.
    pub name: String,
    /// Schema (owner).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Object type.
    #[serde(default = "default_object_type")]
    pub object_type: String,
    /// Table comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Columns in declaration order.
    #[serde(default)]
    pub columns: Vec<ColumnModel>,
    /// Keys and indexes of every kind.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ConstraintDocument>,
}

/// A primary key, unique key, foreign key or index inside a table document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintDocument {
    /// Kind key: `primaryKey`, `uniqueKey`, `foreignKey` or `index`.
    pub kind: String,
    /// Constraint name, if the metadata carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Key columns, in key order.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Referenced table (foreign keys only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_table: Option<String>,
    /// Referenced columns (foreign keys only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_columns: Vec<String>,
    /// Unique flag (indexes only).
    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,
}

impl SnapshotDocument {
    /// Parses a snapshot document from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds the document of an in-memory schema.
    #[must_use]
    pub fn from_schema(schema: &SchemaModel) -> Self {
        Self {
            database: Some(schema.database().key().to_string()),
            tables: schema.tables().iter().map(TableDocument::from_table).collect(),
        }
    }

    /// Serializes the document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the document to a file, creating parent directories.
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, json)
        };
        write().map_err(|source| DiffError::SnapshotFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl TableDocument {
    fn from_table(table: &TableModel) -> Self {
        let unique_keys = table.unique_keys.iter().map(|uk| ConstraintDocument {
            kind: if uk.primary {
                PRIMARY_KEY_KIND.to_string()
            } else {
                ConstraintKind::UniqueKey.key().to_string()
            },
            name: uk.name.clone(),
            columns: uk.columns.clone(),
            foreign_table: None,
            foreign_columns: Vec::new(),
            unique: false,
        });
        let foreign_keys = table.foreign_keys.iter().map(|fk| ConstraintDocument {
            kind: ConstraintKind::ForeignKey.key().to_string(),
            name: fk.name.clone(),
            columns: fk.columns.clone(),
            foreign_table: Some(fk.foreign_table.clone()),
            foreign_columns: fk.foreign_columns.clone(),
            unique: false,
        });
        let indexes = table.indexes.iter().map(|ix| ConstraintDocument {
            kind: ConstraintKind::Index.key().to_string(),
            name: ix.name.clone(),
            columns: ix.columns.clone(),
            foreign_table: None,
            foreign_columns: Vec::new(),
            unique: ix.unique,
        });

        Self {
            name: table.name.clone(),
            schema: table.schema.clone(),
            object_type: table.object_type.clone(),
            comment: table.comment.clone(),
            columns: table.columns.clone(),
            constraints: unique_keys.chain(foreign_keys).chain(indexes).collect(),
        }
    }
}

/// Explicit loader configuration.
#[derive(Debug, Clone, Default)]
pub struct LoaderConfig {
    /// Overrides the database named by the document.
    pub database: Option<DatabaseKind>,
    /// Table names excluded from the snapshot (case-insensitive).
    pub ignored_tables: Vec<String>,
}

impl LoaderConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces the database kind.
    #[must_use]
    pub fn database(mut self, database: DatabaseKind) -> Self {
        self.database = Some(database);
        self
    }

    /// Excludes a table from loading.
    #[must_use]
    pub fn ignore_table(mut self, name: impl Into<String>) -> Self {
        self.ignored_tables.push(name.into());
        self
    }

    fn is_ignored(&self, table_name: &str) -> bool {
        self.ignored_tables
            .iter()
            .any(|ignored| ignored.eq_ignore_ascii_case(table_name))
    }
}

/// Turns snapshot documents into validated schema models.
#[derive(Debug, Clone, Default)]
pub struct SchemaLoader {
    config: LoaderConfig,
}

impl SchemaLoader {
    /// Creates a loader with the given configuration.
    #[must_use]
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Validates a document and builds its schema model.
    pub fn load_schema(&self, document: &SnapshotDocument) -> Result<SchemaModel> {
        let database = match (self.config.database, document.database.as_deref()) {
            (Some(database), _) => database,
            (None, Some(name)) => name.parse()?,
            (None, None) => DatabaseKind::Unknown,
        };

        let mut schema = SchemaModel::new(database);
        for table in &document.tables {
            if self.config.is_ignored(&table.name) {
                debug!(table = %table.name, "Ignoring table");
                continue;
            }
            if schema.contains_table(&table.name) {
                return Err(DiffError::DuplicateTable(table.name.clone()));
            }
            schema = schema.table(build_table(table)?);
        }

        debug!(
            database = %database,
            tables = schema.len(),
            "Loaded schema snapshot"
        );
        Ok(schema)
    }

    /// Parses and loads a JSON snapshot.
    pub fn load_from_str(&self, json: &str) -> Result<SchemaModel> {
        self.load_schema(&SnapshotDocument::from_json(json)?)
    }

    /// Reads and loads a JSON snapshot file.
    pub fn load_from_path(&self, path: impl AsRef<Path>) -> Result<SchemaModel> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| DiffError::SnapshotFile {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Reading schema snapshot");
        self.load_from_str(&json)
    }
}

/// Loads a document with the given configuration.
pub fn load_schema(document: &SnapshotDocument, config: &LoaderConfig) -> Result<SchemaModel> {
    SchemaLoader::new(config.clone()).load_schema(document)
}

fn build_table(document: &TableDocument) -> Result<TableModel> {
    let table_name = document.name.as_str();
    if table_name.trim().is_empty() {
        return Err(DiffError::MalformedSnapshot("table with empty name".into()));
    }

    let mut table = TableModel::new(table_name).object_type(&document.object_type);
    table.schema = document.schema.clone();
    table.comment = document.comment.clone();

    let mut seen = HashSet::new();
    for column in &document.columns {
        if column.name.trim().is_empty() {
            return Err(DiffError::MalformedSnapshot(format!(
                "table '{}' has a column with empty name",
                table_name
            )));
        }
        if !seen.insert(column.name.as_str()) {
            return Err(DiffError::MalformedSnapshot(format!(
                "table '{}' declares column '{}' more than once",
                table_name, column.name
            )));
        }
        table.columns.push(column.clone());
    }

    for constraint in &document.constraints {
        add_constraint(&mut table, constraint)?;
    }
    Ok(table)
}

fn add_constraint(table: &mut TableModel, constraint: &ConstraintDocument) -> Result<()> {
    let describe = || {
        format!(
            "{} '{}' of table '{}'",
            constraint.kind,
            constraint.name.as_deref().unwrap_or("(unnamed)"),
            table.name
        )
    };
    if constraint.columns.is_empty() {
        return Err(DiffError::MalformedSnapshot(format!(
            "{} has no columns",
            describe()
        )));
    }
    if constraint.columns.iter().any(|c| c.trim().is_empty()) {
        return Err(DiffError::MalformedSnapshot(format!(
            "{} has a column with empty name",
            describe()
        )));
    }

    // an empty name carries no identity, same as an absent one
    let name = constraint.name.clone().filter(|n| !n.trim().is_empty());
    let columns = constraint.columns.clone();

    if constraint.kind == PRIMARY_KEY_KIND {
        table.unique_keys.push(UniqueKeyModel {
            name,
            columns,
            primary: true,
        });
        return Ok(());
    }

    match constraint.kind.parse::<ConstraintKind>()? {
        ConstraintKind::UniqueKey => table.unique_keys.push(UniqueKeyModel {
            name,
            columns,
            primary: false,
        }),
        ConstraintKind::ForeignKey => {
            let foreign_table = constraint
                .foreign_table
                .clone()
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| {
                    DiffError::MalformedSnapshot(format!("{} has no foreign table", describe()))
                })?;
            table.foreign_keys.push(ForeignKeyModel {
                name,
                columns,
                foreign_table,
                foreign_columns: constraint.foreign_columns.clone(),
            });
        }
        ConstraintKind::Index => table.indexes.push(IndexModel {
            name,
            columns,
            unique: constraint.unique,
        }),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMBER_SNAPSHOT: &str = r#"{
        "database": "oracle",
        "tables": [
            {
                "name": "MEMBER",
                "comment": "members",
                "columns": [
                    {"name": "MEMBER_ID", "dbType": "NUMBER", "columnSize": 16, "notNull": true},
                    {"name": "MEMBER_NAME", "dbType": "VARCHAR2", "columnSize": 200,
                     "notNull": true},
                    {"name": "MEMBER_STATUS_CODE", "dbType": "CHAR", "columnSize": 3}
                ],
                "constraints": [
                    {"kind": "primaryKey", "name": "PK_MEMBER", "columns": ["MEMBER_ID"]},
                    {"kind": "uniqueKey", "name": "SYS_C0012345", "columns": ["MEMBER_NAME"]},
                    {"kind": "foreignKey", "name": "FK_MEMBER_STATUS",
                     "columns": ["MEMBER_STATUS_CODE"],
                     "foreignTable": "MEMBER_STATUS", "foreignColumns": ["MEMBER_STATUS_CODE"]},
                    {"kind": "index", "name": "IX_MEMBER_NAME", "columns": ["MEMBER_NAME"],
                     "unique": true}
                ]
            },
            {"name": "MEMBER_STATUS", "columns": [{"name": "MEMBER_STATUS_CODE", "dbType": "CHAR"}]}
        ]
    }"#;

    #[test]
    fn test_load_snapshot() {
        let schema = SchemaLoader::default().load_from_str(MEMBER_SNAPSHOT).unwrap();

        assert_eq!(schema.database(), DatabaseKind::Oracle);
        assert_eq!(schema.table_names().collect::<Vec<_>>(), vec!["MEMBER", "MEMBER_STATUS"]);

        let member = schema.get_table("MEMBER").unwrap();
        assert_eq!(member.object_type, TABLE_OBJECT_TYPE);
        assert_eq!(member.columns.len(), 3);
        assert_eq!(member.get_column("MEMBER_NAME").unwrap().column_size, Some(200));
        assert_eq!(member.primary_key().unwrap().name.as_deref(), Some("PK_MEMBER"));
        assert_eq!(member.unique_keys.len(), 2);
        assert_eq!(member.foreign_keys[0].foreign_table, "MEMBER_STATUS");
        assert!(member.indexes[0].unique);
    }

    #[test]
    fn test_database_override() {
        let config = LoaderConfig::new().database(DatabaseKind::MySql);
        let schema = SchemaLoader::new(config).load_from_str(MEMBER_SNAPSHOT).unwrap();
        assert_eq!(schema.database(), DatabaseKind::MySql);
    }

    #[test]
    fn test_ignored_tables_are_case_insensitive() {
        let config = LoaderConfig::new().ignore_table("member_status");
        let schema = SchemaLoader::new(config).load_from_str(MEMBER_SNAPSHOT).unwrap();
        assert_eq!(schema.len(), 1);
        assert!(!schema.contains_table("MEMBER_STATUS"));
    }

    #[test]
    fn test_reject_duplicate_table() {
        let json = r#"{"tables": [{"name": "A"}, {"name": "A"}]}"#;
        let result = SchemaLoader::default().load_from_str(json);
        assert!(matches!(result, Err(DiffError::DuplicateTable(name)) if name == "A"));
    }

    #[test]
    fn test_reject_empty_names() {
        let empty_table = r#"{"tables": [{"name": " "}]}"#;
        assert!(matches!(
            SchemaLoader::default().load_from_str(empty_table),
            Err(DiffError::MalformedSnapshot(_))
        ));

        let empty_key_column = r#"{"tables": [{"name": "A",
            "constraints": [{"kind": "uniqueKey", "name": "UQ_A", "columns": [""]}]}]}"#;
        assert!(matches!(
            SchemaLoader::default().load_from_str(empty_key_column),
            Err(DiffError::MalformedSnapshot(_))
        ));
    }

    #[test]
    fn test_reject_duplicate_column() {
        let json = r#"{"tables": [{"name": "A", "columns": [
            {"name": "ID", "dbType": "INTEGER"}, {"name": "ID", "dbType": "INTEGER"}]}]}"#;
        assert!(matches!(
            SchemaLoader::default().load_from_str(json),
            Err(DiffError::MalformedSnapshot(_))
        ));
    }

    #[test]
    fn test_reject_unknown_constraint_kind() {
        let json = r#"{"tables": [{"name": "A",
            "constraints": [{"kind": "check", "name": "CK_A", "columns": ["ID"]}]}]}"#;
        let result = SchemaLoader::default().load_from_str(json);
        assert!(matches!(result, Err(DiffError::UnknownConstraintKind(kind)) if kind == "check"));
    }

    #[test]
    fn test_reject_unknown_database() {
        let json = r#"{"database": "informix", "tables": []}"#;
        assert!(matches!(
            SchemaLoader::default().load_from_str(json),
            Err(DiffError::UnknownDatabase(_))
        ));
    }

    #[test]
    fn test_empty_constraint_name_is_absent() {
        let json = r#"{"tables": [{"name": "A",
            "constraints": [{"kind": "index", "name": "", "columns": ["ID"]}]}]}"#;
        let schema = SchemaLoader::default().load_from_str(json).unwrap();
        assert_eq!(schema.get_table("A").unwrap().indexes[0].name, None);
    }

    #[test]
    fn test_document_from_schema_reloads() {
        let schema = SchemaLoader::default().load_from_str(MEMBER_SNAPSHOT).unwrap();
        let json = SnapshotDocument::from_schema(&schema).to_json().unwrap();
        let reloaded = SchemaLoader::default().load_from_str(&json).unwrap();
        assert_eq!(reloaded, schema);
    }

    #[test]
    fn test_missing_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = SchemaLoader::default().load_from_path(dir.path().join("missing.json"));
        assert!(matches!(result, Err(DiffError::SnapshotFile { .. })));
    }
}
