//! The schema sync check workflow.
//!
//! One run loads the next and previous snapshots, compares them and leaves
//! its traces in the output directory: differences are appended to the
//! diff history and described in the result file, a clean run removes a
//! stale result file.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::{debug, info, warn};

use flute_schemadiff::diffmap::{DiffMap, DiffMapRecord};
use flute_schemadiff::loader::SchemaLoader;
use flute_schemadiff::prelude::{SchemaDiff, SchemaDiffer, render_report};

use crate::config::{SyncCheckConfig, diff_map_path};
use crate::error::{Result, SyncError};

/// Outcome of a sync check run.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncCheckOutcome {
    /// Both snapshots are structurally identical.
    Synchronized,
    /// The snapshots differ.
    Different(SchemaDiff),
    /// There is no previous snapshot to compare against yet.
    NoBaseline,
}

impl SyncCheckOutcome {
    /// Returns true unless the snapshots differ.
    #[must_use]
    pub fn is_synchronized(&self) -> bool {
        !matches!(self, Self::Different(_))
    }

    /// Turns a difference into [`SyncError::SchemaNotSynchronized`].
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Different(diff) => Err(SyncError::SchemaNotSynchronized {
                tables: diff
                    .table_diffs()
                    .iter()
                    .map(|t| t.table_name.clone())
                    .collect(),
            }),
            Self::Synchronized | Self::NoBaseline => Ok(()),
        }
    }
}

/// Runs schema sync checks.
#[derive(Debug)]
pub struct SchemaSyncCheck {
    config: SyncCheckConfig,
    differ: SchemaDiffer,
}

impl SchemaSyncCheck {
    /// Creates a check with default diff options.
    #[must_use]
    pub fn new(config: SyncCheckConfig) -> Self {
        Self {
            config,
            differ: SchemaDiffer::new(),
        }
    }

    /// Replaces the schema differ.
    #[must_use]
    pub fn with_differ(mut self, differ: SchemaDiffer) -> Self {
        self.differ = differ;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SyncCheckConfig {
        &self.config
    }

    /// Runs the check.
    pub fn run(&self) -> Result<SyncCheckOutcome> {
        let loader = SchemaLoader::new(self.config.loader_config());
        let next = loader.load_from_path(&self.config.next_snapshot)?;

        if !self.config.previous_snapshot.exists() {
            warn!(
                path = %self.config.previous_snapshot.display(),
                "No previous snapshot; nothing to compare"
            );
            self.save_previous()?;
            return Ok(SyncCheckOutcome::NoBaseline);
        }
        let previous = loader.load_from_path(&self.config.previous_snapshot)?;

        info!(
            next = next.len(),
            previous = previous.len(),
            "Comparing schema snapshots"
        );
        let diff = self.differ.compare(&next, &previous);

        let outcome = if diff.has_diff() {
            self.ensure_output_dir()?;
            append_diff_map(&self.config.diff_map_path(), DiffMapRecord::new(diff.clone()))?;
            let result_path = self.config.result_path();
            fs::write(&result_path, render_report(&diff))?;
            warn!(
                tables = diff.table_diffs().len(),
                result = %result_path.display(),
                "Schema is not synchronized"
            );
            SyncCheckOutcome::Different(diff)
        } else {
            self.remove_stale_result()?;
            info!("Schema is synchronized");
            SyncCheckOutcome::Synchronized
        };

        self.save_previous()?;
        Ok(outcome)
    }

    fn ensure_output_dir(&self) -> Result<()> {
        let dir = &self.config.output_dir;
        if dir.exists() && !dir.is_dir() {
            return Err(SyncError::OutputDir(dir.clone()));
        }
        fs::create_dir_all(dir)?;
        Ok(())
    }

    fn remove_stale_result(&self) -> Result<()> {
        let result_path = self.config.result_path();
        if result_path.exists() {
            debug!(path = %result_path.display(), "Removing stale result file");
            fs::remove_file(&result_path)?;
        }
        Ok(())
    }

    /// Copies the next snapshot over the baseline when configured.
    fn save_previous(&self) -> Result<()> {
        if !self.config.save_previous {
            return Ok(());
        }
        let target = &self.config.previous_snapshot;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&self.config.next_snapshot, target)?;
        info!(path = %target.display(), "Saved next snapshot as previous");
        Ok(())
    }
}

/// Appends one record to the diff history file.
pub fn append_diff_map(path: &Path, record: DiffMapRecord) -> Result<()> {
    let line = record.to_line()?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)?;
    debug!(path = %path.display(), "Appended diff map record");
    Ok(())
}

/// Reads the diff history of an output directory. A missing file is an
/// empty history.
pub fn read_history(output_dir: &Path) -> Result<DiffMap> {
    let path = diff_map_path(output_dir);
    if !path.exists() {
        return Ok(DiffMap::new());
    }
    let content = fs::read_to_string(&path)?;
    Ok(DiffMap::parse(&content)?)
}
