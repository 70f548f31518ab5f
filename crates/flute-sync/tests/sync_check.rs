//! Integration tests for the sync check workflow.
//!
//! Every test works in its own temporary directory holding the snapshot
//! files and the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use flute_schemadiff::prelude::DiffKind;
use flute_sync::prelude::*;

const MEMBER_V1: &str = r#"{
    "database": "oracle",
    "tables": [
        {
            "name": "MEMBER",
            "columns": [
                {"name": "MEMBER_ID", "dbType": "NUMBER", "columnSize": 16, "notNull": true},
                {"name": "BIRTHDATE", "dbType": "DATE", "notNull": true}
            ],
            "constraints": [
                {"kind": "primaryKey", "name": "SYS_C0010001", "columns": ["MEMBER_ID"]}
            ]
        },
        {"name": "TMP_WORK", "columns": [{"name": "ID", "dbType": "NUMBER"}]}
    ]
}"#;

/// Same schema, primary key renamed by the database.
const MEMBER_V1_REGENERATED: &str = r#"{
    "database": "oracle",
    "tables": [
        {
            "name": "MEMBER",
            "columns": [
                {"name": "MEMBER_ID", "dbType": "NUMBER", "columnSize": 16, "notNull": true},
                {"name": "BIRTHDATE", "dbType": "DATE", "notNull": true}
            ],
            "constraints": [
                {"kind": "primaryKey", "name": "SYS_C0020002", "columns": ["MEMBER_ID"]}
            ]
        },
        {"name": "TMP_WORK", "columns": [{"name": "ID", "dbType": "NUMBER"}]}
    ]
}"#;

/// BIRTHDATE became nullable, TMP_WORK is gone.
const MEMBER_V2: &str = r#"{
    "database": "oracle",
    "tables": [
        {
            "name": "MEMBER",
            "columns": [
                {"name": "MEMBER_ID", "dbType": "NUMBER", "columnSize": 16, "notNull": true},
                {"name": "BIRTHDATE", "dbType": "DATE"}
            ],
            "constraints": [
                {"kind": "primaryKey", "name": "SYS_C0010001", "columns": ["MEMBER_ID"]}
            ]
        }
    ]
}"#;

fn write_snapshot(dir: &Path, name: &str, json: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, json).unwrap();
    path
}

fn config(dir: &Path, next: &str, previous: &str) -> SyncCheckConfig {
    let next = write_snapshot(dir, "next.json", next);
    let previous = write_snapshot(dir, "previous.json", previous);
    SyncCheckConfig::new(next, previous).output_dir(dir.join("output"))
}

#[test]
fn identical_snapshots_are_synchronized() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), MEMBER_V1_REGENERATED, MEMBER_V1);

    let outcome = SchemaSyncCheck::new(config.clone()).run().unwrap();

    assert_eq!(outcome, SyncCheckOutcome::Synchronized);
    assert!(!config.diff_map_path().exists());
    assert!(!config.result_path().exists());
}

#[test]
fn difference_writes_history_and_result() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), MEMBER_V2, MEMBER_V1);

    let outcome = SchemaSyncCheck::new(config.clone()).run().unwrap();

    let SyncCheckOutcome::Different(diff) = &outcome else {
        panic!("expected a difference, got {:?}", outcome);
    };
    assert_eq!(diff.table_diffs().len(), 2);

    let result = fs::read_to_string(config.result_path()).unwrap();
    assert!(result.contains("~ MEMBER (changed)"));
    assert!(result.contains("not null: true -> false"));
    assert!(result.contains("- TMP_WORK (deleted)"));

    let history = read_history(&config.output_dir).unwrap();
    assert_eq!(history.len(), 1);
    let summary = history.latest().unwrap().summary();
    assert_eq!(summary[0].table_name, "MEMBER");
    assert_eq!(summary[1].kind, DiffKind::Deleted);

    match outcome.into_result() {
        Err(SyncError::SchemaNotSynchronized { tables }) => {
            assert_eq!(tables, vec!["MEMBER".to_string(), "TMP_WORK".to_string()]);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn ignored_table_is_not_compared() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), MEMBER_V2, MEMBER_V1).ignore_table("tmp_work");

    let outcome = SchemaSyncCheck::new(config).run().unwrap();

    let SyncCheckOutcome::Different(diff) = outcome else {
        panic!("expected a difference");
    };
    assert_eq!(diff.table_diffs().len(), 1);
    assert_eq!(diff.table_diffs()[0].table_name, "MEMBER");
}

#[test]
fn history_grows_and_stale_result_is_removed() {
    let dir = tempfile::tempdir().unwrap();
    let drifted = config(dir.path(), MEMBER_V2, MEMBER_V1);

    SchemaSyncCheck::new(drifted.clone()).run().unwrap();
    SchemaSyncCheck::new(drifted.clone()).run().unwrap();
    assert_eq!(read_history(&drifted.output_dir).unwrap().len(), 2);
    assert!(drifted.result_path().exists());

    let fixed = config(dir.path(), MEMBER_V1, MEMBER_V1);
    let outcome = SchemaSyncCheck::new(fixed.clone()).run().unwrap();

    assert!(outcome.is_synchronized());
    assert!(!fixed.result_path().exists());
    // history is kept
    assert_eq!(read_history(&fixed.output_dir).unwrap().len(), 2);
}

#[test]
fn save_previous_replaces_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), MEMBER_V2, MEMBER_V1).save_previous();

    let first = SchemaSyncCheck::new(config.clone()).run().unwrap();
    assert!(!first.is_synchronized());

    let second = SchemaSyncCheck::new(config).run().unwrap();
    assert_eq!(second, SyncCheckOutcome::Synchronized);
}

#[test]
fn missing_baseline_is_created_when_saving() {
    let dir = tempfile::tempdir().unwrap();
    let next = write_snapshot(dir.path(), "next.json", MEMBER_V1);
    let previous = dir.path().join("baseline").join("previous.json");
    let config = SyncCheckConfig::new(next, &previous)
        .output_dir(dir.path().join("output"))
        .save_previous();

    let outcome = SchemaSyncCheck::new(config).run().unwrap();

    assert_eq!(outcome, SyncCheckOutcome::NoBaseline);
    assert_eq!(fs::read_to_string(previous).unwrap(), MEMBER_V1);
}

#[test]
fn malformed_snapshot_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), r#"{"tables": [{"name": ""}]}"#, MEMBER_V1);

    let result = SchemaSyncCheck::new(config).run();

    assert!(matches!(result, Err(SyncError::Diff(_))));
}
