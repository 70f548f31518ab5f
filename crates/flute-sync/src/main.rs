//! flute-sync CLI
//!
//! Command-line tool for checking that a schema matches its baseline.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use flute_schemadiff::prelude::{DatabaseKind, DiffOptions, SchemaDiffer};
use flute_sync::prelude::*;

/// Structural schema sync check.
#[derive(Parser)]
#[command(name = "flute-sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory receiving the diff history and the result file.
    #[arg(short, long, global = true, env = "FLUTE_SYNC_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare the next snapshot against the previous one.
    Check {
        /// Snapshot of the current schema (JSON).
        #[arg(short, long, env = "FLUTE_SYNC_NEXT")]
        next: PathBuf,

        /// Snapshot of the baseline schema (JSON).
        #[arg(short, long, env = "FLUTE_SYNC_PREVIOUS")]
        previous: PathBuf,

        /// Database kind, overriding the snapshots (oracle, mysql, db2, ...).
        #[arg(short, long, env = "FLUTE_SYNC_DATABASE")]
        database: Option<DatabaseKind>,

        /// Table to leave out of the comparison (repeatable).
        #[arg(long = "ignore-table")]
        ignore_tables: Vec<String>,

        /// Report a dropped and an added table with similar columns as a rename.
        #[arg(long)]
        detect_renames: bool,

        /// Ignore changes of column definition order.
        #[arg(long)]
        ignore_column_order: bool,

        /// Replace the previous snapshot with the next one after the check.
        #[arg(long)]
        save_previous: bool,
    },

    /// Show the recorded diff history.
    History,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Check {
            next,
            previous,
            database,
            ignore_tables,
            detect_renames,
            ignore_column_order,
            save_previous,
        } => {
            let mut config = SyncCheckConfig::new(next, previous).output_dir(&cli.output_dir);
            config.database = database;
            config.ignored_tables = ignore_tables;
            config.save_previous = save_previous;

            let mut options = DiffOptions::new();
            if detect_renames {
                options = options.with_rename_detection();
            }
            if ignore_column_order {
                options = options.without_column_order();
            }

            let check =
                SchemaSyncCheck::new(config).with_differ(SchemaDiffer::with_options(options));
            match check.run()?.into_result() {
                Ok(()) => Ok(ExitCode::SUCCESS),
                Err(e @ SyncError::SchemaNotSynchronized { .. }) => {
                    error!("{}", e);
                    info!("See {}", check.config().result_path().display());
                    Ok(ExitCode::FAILURE)
                }
                Err(e) => Err(e.into()),
            }
        }

        Commands::History => {
            let history = read_history(&cli.output_dir)?;

            if history.is_empty() {
                info!("No schema differences have been recorded yet.");
                return Ok(ExitCode::SUCCESS);
            }

            println!("\nRecorded schema differences:");
            println!("{:-<60}", "");
            for record in history.records() {
                println!("{}", record.diff_date.format("%Y-%m-%d %H:%M:%S"));
                for table in record.summary() {
                    let constraints: Vec<&str> =
                        table.constraint_kinds.iter().map(|k| k.label()).collect();
                    if constraints.is_empty() {
                        println!("  [{}] {}", table.kind, table.table_name);
                    } else {
                        println!(
                            "  [{}] {} ({})",
                            table.kind,
                            table.table_name,
                            constraints.join(", ")
                        );
                    }
                }
            }
            println!();
            Ok(ExitCode::SUCCESS)
        }
    }
}
