//! CLI error handling tests for ned.
//!
//! These tests verify that invalid arguments, configuration and trace
//! stores produce the documented exit codes and error output.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the ned binary.
fn ned() -> Command {
    let mut cmd = Command::cargo_bin("ned").expect("ned binary should exist");
    cmd.env_remove("NED_STUDY_CONFIG")
        .env_remove("NED_CONFIG_DIR")
        .env("NED_LOG", "error");
    cmd
}

fn write_config(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("study.json");
    fs::write(&path, body).unwrap();
    path
}

const VALID: &str = r#"{
    "sample_count": 10,
    "seed": 7,
    "lambdas": [{"lambda": -1.0, "label": "none"}],
    "systems": [{"id": "1", "outage_threshold": 1000}]
}"#;

// ============================================================================
// Argument errors
// ============================================================================

mod invalid_arguments {
    use super::*;

    #[test]
    fn unknown_command_fails() {
        ned()
            .arg("nonexistent-command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn unknown_config_subcommand_fails() {
        ned()
            .args(["config", "nonexistent"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn run_requires_db() {
        ned()
            .arg("run")
            .assert()
            .failure()
            .stderr(predicate::str::contains("--db"));
    }

    #[test]
    fn invalid_format_fails() {
        ned()
            .args(["--format", "yaml", "version"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn non_numeric_seed_fails() {
        ned()
            .args(["run", "--db", "x.sqlite", "--seed", "abc"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }
}

// ============================================================================
// Configuration errors
// ============================================================================

mod config_errors {
    use super::*;

    #[test]
    fn missing_config_file_is_args_error() {
        let dir = tempfile::tempdir().unwrap();
        ned()
            .args(["--format", "summary", "run", "--db"])
            .arg(dir.path().join("traces.sqlite"))
            .arg("--config")
            .arg(dir.path().join("missing.json"))
            .assert()
            .code(10)
            .stderr(predicate::str::contains("Configuration Error"));
    }

    #[test]
    fn malformed_config_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(&dir, "{ not json");
        ned()
            .args(["config", "validate"])
            .arg(&config)
            .assert()
            .code(11)
            .stderr(predicate::str::contains("\"status\": \"error\""));
    }

    #[test]
    fn semantic_violation_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(&dir, r#"{"sample_count": 0}"#);
        ned()
            .args(["-f", "summary", "config", "validate"])
            .arg(&config)
            .assert()
            .code(11)
            .stderr(predicate::str::contains("sample_count"));
    }

    #[test]
    fn unknown_system_override_is_args_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(&dir, VALID);
        ned()
            .arg("--config")
            .arg(&config)
            .args(["run", "--db", "x.sqlite", "--system", "42"])
            .assert()
            .code(10)
            .stderr(predicate::str::contains("42"));
    }

    #[test]
    fn valid_config_validates() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(&dir, VALID);
        ned()
            .args(["config", "validate"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("\"status\": \"valid\""));
    }
}

// ============================================================================
// Source errors
// ============================================================================

mod source_errors {
    use super::*;

    #[test]
    fn missing_database_is_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(&dir, VALID);
        ned()
            .arg("--config")
            .arg(&config)
            .arg("run")
            .arg("--db")
            .arg(dir.path().join("absent.sqlite"))
            .assert()
            .code(12)
            .stderr(predicate::str::contains("\"code\": 20"));
    }

    #[test]
    fn missing_database_human_output() {
        let dir = tempfile::tempdir().unwrap();
        ned()
            .args(["--no-color", "-f", "summary", "systems", "--db"])
            .arg(dir.path().join("absent.sqlite"))
            .assert()
            .code(12)
            .stderr(predicate::str::contains("absent.sqlite"));
    }
}

// ============================================================================
// Informational commands
// ============================================================================

mod info_commands {
    use super::*;

    #[test]
    fn version_json() {
        ned()
            .arg("version")
            .assert()
            .success()
            .stdout(predicate::str::contains("\"schema_version\""));
    }

    #[test]
    fn version_summary() {
        ned()
            .args(["-f", "summary", "version"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("ned "));
    }

    #[test]
    fn config_schema_describes_study() {
        ned()
            .args(["config", "schema"])
            .assert()
            .success()
            .stdout(predicate::str::contains("sample_duration_secs"))
            .stdout(predicate::str::contains("quota"));
    }

    #[test]
    fn config_show_reports_source() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(&dir, VALID);
        ned()
            .arg("--config")
            .arg(&config)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"kind\": \"CLI argument\""))
            .stdout(predicate::str::contains("\"sample_count\": 10"));
    }
}
