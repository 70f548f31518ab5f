//! Error types for snapshot loading and diff-map handling.
//!
//! Comparing two loaded snapshots never fails; everything here belongs to
//! the edges of the engine (reading snapshot documents, restoring history).

use std::path::PathBuf;

/// Errors that can occur while loading snapshots or diff history.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The snapshot document violates a structural precondition of the
    /// engine (empty names, duplicate columns, keys without columns).
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// The same table name appears twice in one snapshot.
    #[error("Table '{0}' is declared more than once in the snapshot")]
    DuplicateTable(String),

    /// A constraint kind has no key differ, so it cannot be compared.
    #[error("No constraint key differ for constraint kind '{0}'")]
    UnknownConstraintKind(String),

    /// The database kind name is not recognized.
    #[error("Unknown database kind: {0}")]
    UnknownDatabase(String),

    /// Failed to read or write a snapshot file.
    #[error("Snapshot file '{path}': {source}")]
    SnapshotFile {
        /// Path of the snapshot file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A diff-map line could not be restored.
    #[error("Malformed diff-map line {line}: {message}")]
    MalformedDiffMap {
        /// One-based line number.
        line: usize,
        /// Parser message.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for loader and diff-map operations.
pub type Result<T> = std::result::Result<T, DiffError>;
