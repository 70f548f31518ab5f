//! Structural diff engine for database schema snapshots.
//!
//! `flute-schemadiff` compares two snapshots of the same database, the
//! "next" one (what the schema looks like now) and the "previous" one (the
//! baseline of the last run), and reports which tables, columns, foreign
//! keys, unique keys and indexes were added, changed or deleted.
//!
//! # Architecture
//!
//! - **Schema** - Immutable snapshot model (`SchemaModel`, `TableModel`, ...)
//! - **Loader** - Validates JSON snapshot documents into models
//! - **Differs** - Table differ plus one key differ per constraint kind
//! - **Diff** - `SchemaDiff` and its child records, each with a derived `has_diff()`
//! - **Diff map** - Line-oriented history of past diffs
//! - **Report** - Human-readable rendering of a diff
//!
//! Constraints are matched by name first and by column structure second.
//! Names the database assigned by itself (Oracle `SYS_C...`, DB2/Derby
//! `SQL...`, MySQL `..._ibfk_N`) never count as identities, so a constraint
//! that only got a new generated name is not reported.
//!
//! # Example
//!
//! ```rust
//! use flute_schemadiff::prelude::*;
//!
//! let previous = SchemaModel::new(DatabaseKind::PostgreSql).table(
//!     TableModel::new("MEMBER")
//!         .column(ColumnModel::new("MEMBER_ID", "INTEGER").not_null())
//!         .column(ColumnModel::new("BIRTHDATE", "DATE").not_null()),
//! );
//! let next = SchemaModel::new(DatabaseKind::PostgreSql).table(
//!     TableModel::new("MEMBER")
//!         .column(ColumnModel::new("MEMBER_ID", "INTEGER").not_null())
//!         .column(ColumnModel::new("BIRTHDATE", "DATE")),
//! );
//!
//! let diff = compare(&next, &previous);
//! assert!(diff.has_diff());
//! let birthdate = diff.table_diff("MEMBER").unwrap().column_diff("BIRTHDATE").unwrap();
//! assert_eq!(birthdate.not_null_diff, Some(NextPreviousDiff::new(Some(false), Some(true))));
//! ```

pub mod assist;
pub mod database;
pub mod diff;
pub mod differ;
pub mod diffmap;
pub mod error;
pub mod loader;
pub mod report;
pub mod schema;
pub mod schema_diff;
pub mod table_diff;

pub use error::{DiffError, Result};
pub use schema_diff::compare;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::database::DatabaseKind;
    pub use crate::diff::{
        ColumnDiff, ConstraintDiff, DiffKind, ForeignKeyDiff, IndexDiff, NextPreviousDiff,
        SchemaDiff, TableDiff, UniqueKeyDiff,
    };
    pub use crate::differ::{ConstraintKeyDiffer, ConstraintKind};
    pub use crate::diffmap::{DiffMap, DiffMapRecord, TableSummary};
    pub use crate::error::{DiffError, Result};
    pub use crate::loader::{LoaderConfig, SchemaLoader, SnapshotDocument};
    pub use crate::report::{Report, render_report};
    pub use crate::schema::{
        ColumnModel, ForeignKeyModel, IndexModel, SchemaModel, TableModel, UniqueKeyModel,
    };
    pub use crate::schema_diff::{DiffOptions, SchemaDiffer, compare};
    pub use crate::table_diff::TableDiffer;
}
