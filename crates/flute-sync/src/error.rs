//! Error types for the schema sync check.

use std::path::PathBuf;

use flute_schemadiff::DiffError;

/// Errors that can occur while running a schema sync check.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Loading a snapshot or the diff history failed.
    #[error(transparent)]
    Diff(#[from] DiffError),

    /// IO error (writing the diff history or the result file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The output directory cannot be created or is not a directory.
    #[error("Output directory is not usable: {0}")]
    OutputDir(PathBuf),

    /// The next schema differs from the previous one.
    #[error("Schema is not synchronized; differing tables: {}", .tables.join(", "))]
    SchemaNotSynchronized {
        /// Names of the differing tables.
        tables: Vec<String>,
    },
}

/// Result type for sync check operations.
pub type Result<T> = std::result::Result<T, SyncError>;
