//! Schema sync check.
//!
//! `flute-sync` compares a snapshot of the live schema ("next") against a
//! stored baseline ("previous") and fails when they differ. Each failing run
//! appends its diff to a line-oriented history and writes a readable result
//! file, so CI can both gate on and explain schema drift.
//!
//! # CLI Usage
//!
//! ```bash
//! # Compare the live snapshot against the baseline
//! flute-sync check --next schema/next.json --previous schema/previous.json
//!
//! # Ignore work tables and refresh the baseline afterwards
//! flute-sync check --next next.json --previous previous.json \
//!     --ignore-table TMP_WORK --save-previous
//!
//! # Show the recorded diff history
//! flute-sync history --output-dir output
//! ```

pub mod check;
pub mod config;
pub mod error;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::check::{SchemaSyncCheck, SyncCheckOutcome, append_diff_map, read_history};
    pub use crate::config::{DIFF_MAP_FILE_NAME, RESULT_FILE_NAME, SyncCheckConfig};
    pub use crate::error::{Result, SyncError};
}
