//! CLI integration tests for pg-migrate-transforms.
//!
//! These tests verify argument parsing, transform application, config
//! checking and exit codes for various error conditions.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

/// Get a command for the pg-migrate-transforms binary.
fn cmd() -> Command {
    Command::cargo_bin("pg-migrate-transforms").unwrap()
}

fn config_file(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

const RULES: &str = r#"
transforms:
  trim-and-null:
    chain: [right-trim, empty-string-to-null]
rules:
  - type: decimal
    when: "precision <= 18 and scale = 0"
    transform: integer-to-string
  - type: decimal
    transform: float-to-string
  - type: char
    transform: trim-and-null
"#;

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("select"));
}

#[test]
fn test_apply_subcommand_help() {
    cmd()
        .args(["apply", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--as"))
        .stdout(predicate::str::contains("--null"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pg-migrate-transforms"));
}

#[test]
fn test_log_format_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("[default: text]"));
}

#[test]
fn test_verbosity_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--verbosity"))
        .stdout(predicate::str::contains("[default: info]"));
}

// =============================================================================
// List and Apply
// =============================================================================

#[test]
fn test_list_builtins() {
    cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("zero-dates-to-null"))
        .stdout(predicate::str::contains("convert-mysql-point"))
        .stdout(predicate::str::contains("nil").not());
}

#[test]
fn test_list_json() {
    cmd()
        .args(["--output-json", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"ip-range\""))
        .stdout(predicate::str::contains("\"arity\": 2"));
}

#[test]
fn test_apply_tinyint_to_boolean() {
    cmd()
        .args(["apply", "tinyint-to-boolean", "0"])
        .assert()
        .success()
        .stdout("f\n");
}

#[test]
fn test_apply_zero_date_prints_null_marker() {
    cmd()
        .args(["apply", "zero-dates-to-null", "0000-00-00"])
        .assert()
        .success()
        .stdout("\\N\n");
}

#[test]
fn test_apply_two_arguments() {
    cmd()
        .args(["apply", "ip-range", "3232235777", "3232236031"])
        .assert()
        .success()
        .stdout("192.168.1.1-192.168.1.255\n");
}

#[test]
fn test_apply_hex_input() {
    cmd()
        .args(["apply", "byte-vector-to-bytea", "--as", "hex", "DEADBEEF"])
        .assert()
        .success()
        .stdout("\\xdeadbeef\n");
}

#[test]
fn test_apply_null_flag() {
    cmd()
        .args(["apply", "right-trim", "--null", "\\N"])
        .assert()
        .success()
        .stdout("\\N\n");
}

#[test]
fn test_apply_indeterminate() {
    cmd()
        .args(["apply", "sql-server-bit-to-boolean", "maybe"])
        .assert()
        .success()
        .stdout("?\n");
}

#[test]
fn test_apply_user_transform_from_config() {
    let file = config_file(RULES);
    cmd()
        .args(["apply", "trim-and-null", "   ", "--config"])
        .arg(file.path())
        .assert()
        .success()
        .stdout("\\N\n");
}

// =============================================================================
// Exit Code Tests
// =============================================================================

#[test]
fn test_value_error_exits_with_code_2() {
    cmd()
        .args(["apply", "byte-vector-to-bytea", "abc"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("byte-vector-to-bytea"));
}

#[test]
fn test_unbound_transform_exits_with_code_2() {
    cmd()
        .args(["apply", "no-such-transform", "x"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not bound"));
}

#[test]
fn test_wrong_arity_exits_with_code_2() {
    cmd()
        .args(["apply", "ip-range", "1"])
        .assert()
        .code(2);
}

#[test]
fn test_missing_config_exits_with_code_7() {
    // Missing file is an IO error (code 7), not config error (code 1)
    cmd()
        .args(["check", "nonexistent_transforms.yaml"])
        .assert()
        .code(7);
}

#[test]
fn test_invalid_yaml_exits_with_code_1() {
    let file = config_file("invalid: yaml: content: [\n");
    cmd().arg("check").arg(file.path()).assert().code(1);
}

#[test]
fn test_bad_predicate_exits_with_code_1() {
    let file = config_file("rules:\n  - type: int\n    when: \"length > 3\"\n    transform: right-trim\n");
    cmd()
        .arg("check")
        .arg(file.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("length"));
}

#[test]
fn test_unknown_verbosity_exits_with_code_1() {
    cmd().args(["--verbosity", "loud", "list"]).assert().code(1);
}

// =============================================================================
// Check and Select
// =============================================================================

#[test]
fn test_check_valid_config() {
    let file = config_file(RULES);
    cmd()
        .arg("check")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("3 rules, 1 user transforms"));
}

#[test]
fn test_empty_config_is_valid() {
    let file = NamedTempFile::new().unwrap();
    cmd()
        .arg("check")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("0 rules"));
}

#[test]
fn test_select_rule() {
    let file = config_file(RULES);
    cmd()
        .arg("select")
        .arg(file.path())
        .args(["decimal", "decimal(10,0)"])
        .assert()
        .success()
        .stdout("integer-to-string\n");

    cmd()
        .arg("select")
        .arg(file.path())
        .args(["decimal", "decimal(10,2)"])
        .assert()
        .success()
        .stdout("float-to-string\n");
}

#[test]
fn test_select_no_rule() {
    let file = config_file(RULES);
    cmd()
        .arg("select")
        .arg(file.path())
        .args(["varchar", "varchar(20)"])
        .assert()
        .success()
        .stdout("none\n");
}

#[test]
fn test_select_json() {
    let file = config_file(RULES);
    cmd()
        .arg("--output-json")
        .arg("select")
        .arg(file.path())
        .args(["decimal", "decimal(12,0)"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"precision\": 12"))
        .stdout(predicate::str::contains("\"transform\": \"integer-to-string\""));
}
