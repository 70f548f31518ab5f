//! Schema snapshot types.
//!
//! A [`SchemaModel`] is an immutable structural picture of a database at one
//! point in time: either the "next" schema (what the database looks like
//! now) or the "previous" schema (the persisted baseline of the last run).
//! Snapshots are built once, by the loader or by hand through the builder
//! methods below, and only read afterwards.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::database::DatabaseKind;

/// Default object type of a table.
pub const TABLE_OBJECT_TYPE: &str = "TABLE";

/// Schema definition for a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnModel {
    /// Column name.
    pub name: String,
    /// Declared SQL type, as reported by the database (e.g. `VARCHAR`).
    pub db_type: String,
    /// Column size (length or numeric precision).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_size: Option<u32>,
    /// Decimal digits (numeric scale).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_digits: Option<u32>,
    /// Whether the column rejects NULL values.
    #[serde(default)]
    pub not_null: bool,
    /// Default value expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Whether the column is auto-incremented (identity/serial).
    #[serde(default)]
    pub auto_increment: bool,
    /// Column comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ColumnModel {
    /// Creates a new nullable column without size or default.
    #[must_use]
    pub fn new(name: impl Into<String>, db_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            db_type: db_type.into(),
            column_size: None,
            decimal_digits: None,
            not_null: false,
            default_value: None,
            auto_increment: false,
            comment: None,
        }
    }

    /// Sets the column size.
    #[must_use]
    pub fn size(mut self, size: u32) -> Self {
        self.column_size = Some(size);
        self
    }

    /// Sets the numeric precision and scale.
    #[must_use]
    pub fn precision(mut self, size: u32, digits: u32) -> Self {
        self.column_size = Some(size);
        self.decimal_digits = Some(digits);
        self
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Sets the column as nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.not_null = false;
        self
    }

    /// Sets the default value expression.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Sets the column to auto-increment.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Sets the column comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Returns the size as displayed in diffs: `"10"` or `"10, 2"`.
    #[must_use]
    pub fn size_expression(&self) -> Option<String> {
        match (self.column_size, self.decimal_digits) {
            (Some(size), Some(digits)) => Some(format!("{}, {}", size, digits)),
            (Some(size), None) => Some(size.to_string()),
            (None, Some(digits)) => Some(format!("*, {}", digits)),
            (None, None) => None,
        }
    }
}

fn owned_columns<I, S>(columns: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    columns.into_iter().map(Into::into).collect()
}

/// Schema definition for a foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForeignKeyModel {
    /// Constraint name; `None` when the source metadata carries none.
    pub name: Option<String>,
    /// Column(s) in the referencing table, in key order.
    pub columns: Vec<String>,
    /// Referenced table name.
    pub foreign_table: String,
    /// Referenced column(s), in key order.
    pub foreign_columns: Vec<String>,
}

impl ForeignKeyModel {
    /// Creates a named foreign key.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, columns: I, foreign_table: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: Some(name.into()),
            columns: owned_columns(columns),
            foreign_table: foreign_table.into(),
            foreign_columns: Vec::new(),
        }
    }

    /// Creates a foreign key without a name.
    #[must_use]
    pub fn unnamed<I, S>(columns: I, foreign_table: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            columns: owned_columns(columns),
            foreign_table: foreign_table.into(),
            foreign_columns: Vec::new(),
        }
    }

    /// Sets the referenced columns.
    #[must_use]
    pub fn references<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.foreign_columns = owned_columns(columns);
        self
    }
}

/// Schema definition for a unique key. The primary key is a unique key
/// flagged `primary`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueKeyModel {
    /// Constraint name; `None` when the source metadata carries none.
    pub name: Option<String>,
    /// Columns that form the key, in key order.
    pub columns: Vec<String>,
    /// Whether this is the primary key.
    pub primary: bool,
}

impl UniqueKeyModel {
    /// Creates a named unique key.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: Some(name.into()),
            columns: owned_columns(columns),
            primary: false,
        }
    }

    /// Creates a named primary key.
    #[must_use]
    pub fn primary<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            primary: true,
            ..Self::new(name, columns)
        }
    }

    /// Creates a unique key without a name.
    #[must_use]
    pub fn unnamed<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            columns: owned_columns(columns),
            primary: false,
        }
    }
}

/// Schema definition for an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexModel {
    /// Index name; `None` when the source metadata carries none.
    pub name: Option<String>,
    /// Indexed columns, in index order.
    pub columns: Vec<String>,
    /// Whether this is a unique index.
    pub unique: bool,
}

impl IndexModel {
    /// Creates a named non-unique index.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: Some(name.into()),
            columns: owned_columns(columns),
            unique: false,
        }
    }

    /// Creates an index without a name.
    #[must_use]
    pub fn unnamed<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            columns: owned_columns(columns),
            unique: false,
        }
    }

    /// Marks the index as unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Complete structural definition of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableModel {
    /// Table name.
    pub name: String,
    /// Schema (owner) the table belongs to, if known.
    pub schema: Option<String>,
    /// Object type (`TABLE`, `VIEW`, ...).
    pub object_type: String,
    /// Table comment.
    pub comment: Option<String>,
    /// Column definitions, in declaration order.
    pub columns: Vec<ColumnModel>,
    /// Foreign key definitions.
    pub foreign_keys: Vec<ForeignKeyModel>,
    /// Unique key definitions, including the primary key.
    pub unique_keys: Vec<UniqueKeyModel>,
    /// Index definitions.
    pub indexes: Vec<IndexModel>,
}

impl TableModel {
    /// Creates a new empty table of object type `TABLE`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            object_type: TABLE_OBJECT_TYPE.to_string(),
            comment: None,
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            unique_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Sets the schema (owner).
    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Sets the object type.
    #[must_use]
    pub fn object_type(mut self, object_type: impl Into<String>) -> Self {
        self.object_type = object_type.into();
        self
    }

    /// Sets the table comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Adds a column to the table.
    #[must_use]
    pub fn column(mut self, column: ColumnModel) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds a foreign key.
    #[must_use]
    pub fn foreign_key(mut self, fk: ForeignKeyModel) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Adds a unique key (or primary key).
    #[must_use]
    pub fn unique_key(mut self, key: UniqueKeyModel) -> Self {
        self.unique_keys.push(key);
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, index: IndexModel) -> Self {
        self.indexes.push(index);
        self
    }

    /// Gets a column by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&ColumnModel> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the primary key, if any.
    #[must_use]
    pub fn primary_key(&self) -> Option<&UniqueKeyModel> {
        self.unique_keys.iter().find(|uk| uk.primary)
    }

    /// Returns column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// An immutable snapshot of a whole database schema.
///
/// Tables keep their declaration order; lookups by name go through an
/// index built once at construction time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaModel {
    database: DatabaseKind,
    tables: Vec<TableModel>,
    positions: HashMap<String, usize>,
}

impl SchemaModel {
    /// Creates a new empty schema snapshot.
    #[must_use]
    pub fn new(database: DatabaseKind) -> Self {
        Self {
            database,
            tables: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Adds a table. A table whose name is already present is ignored:
    /// the first declaration wins.
    #[must_use]
    pub fn table(mut self, table: TableModel) -> Self {
        if !self.positions.contains_key(&table.name) {
            self.positions.insert(table.name.clone(), self.tables.len());
            self.tables.push(table);
        }
        self
    }

    /// Returns the database kind the snapshot was taken from.
    #[must_use]
    pub fn database(&self) -> DatabaseKind {
        self.database
    }

    /// Returns all tables in declaration order.
    #[must_use]
    pub fn tables(&self) -> &[TableModel] {
        &self.tables
    }

    /// Gets a table by name.
    #[must_use]
    pub fn get_table(&self, name: &str) -> Option<&TableModel> {
        self.positions.get(name).map(|&idx| &self.tables[idx])
    }

    /// Returns true if a table with this name exists.
    #[must_use]
    pub fn contains_table(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Returns table names in declaration order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    /// Returns the number of tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if the snapshot has no tables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
