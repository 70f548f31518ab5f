//! Sync check configuration.

use std::path::{Path, PathBuf};

use flute_schemadiff::database::DatabaseKind;
use flute_schemadiff::loader::LoaderConfig;

/// Name of the diff history file inside the output directory.
pub const DIFF_MAP_FILE_NAME: &str = "schema-sync-check-diffmap.jsonl";

/// Name of the result file inside the output directory.
pub const RESULT_FILE_NAME: &str = "schema-sync-check-result.txt";

/// Configuration of one sync check run.
#[derive(Debug, Clone)]
pub struct SyncCheckConfig {
    /// Snapshot of the current schema.
    pub next_snapshot: PathBuf,
    /// Snapshot of the baseline schema.
    pub previous_snapshot: PathBuf,
    /// Directory receiving the diff history and the result file.
    pub output_dir: PathBuf,
    /// Overrides the database named by the snapshots.
    pub database: Option<DatabaseKind>,
    /// Tables excluded from the comparison (case-insensitive).
    pub ignored_tables: Vec<String>,
    /// Whether to replace the baseline with the next snapshot after the check.
    pub save_previous: bool,
}

impl SyncCheckConfig {
    /// Creates a configuration writing into `./output`.
    #[must_use]
    pub fn new(next_snapshot: impl Into<PathBuf>, previous_snapshot: impl Into<PathBuf>) -> Self {
        Self {
            next_snapshot: next_snapshot.into(),
            previous_snapshot: previous_snapshot.into(),
            output_dir: PathBuf::from("output"),
            database: None,
            ignored_tables: Vec::new(),
            save_previous: false,
        }
    }

    /// Sets the output directory.
    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Forces the database kind.
    #[must_use]
    pub fn database(mut self, database: DatabaseKind) -> Self {
        self.database = Some(database);
        self
    }

    /// Excludes a table from the comparison.
    #[must_use]
    pub fn ignore_table(mut self, name: impl Into<String>) -> Self {
        self.ignored_tables.push(name.into());
        self
    }

    /// Replaces the baseline with the next snapshot after the check.
    #[must_use]
    pub fn save_previous(mut self) -> Self {
        self.save_previous = true;
        self
    }

    /// Path of the diff history file.
    #[must_use]
    pub fn diff_map_path(&self) -> PathBuf {
        diff_map_path(&self.output_dir)
    }

    /// Path of the result file.
    #[must_use]
    pub fn result_path(&self) -> PathBuf {
        self.output_dir.join(RESULT_FILE_NAME)
    }

    /// Builds the loader configuration shared by both snapshots.
    #[must_use]
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            database: self.database,
            ignored_tables: self.ignored_tables.clone(),
        }
    }
}

/// Path of the diff history file inside an output directory.
#[must_use]
pub fn diff_map_path(output_dir: &Path) -> PathBuf {
    output_dir.join(DIFF_MAP_FILE_NAME)
}
