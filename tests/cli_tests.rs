//! End-to-end tests for the `cs` binary
//!
//! Only offline paths run here: fingerprinting, argument validation, and
//! configuration errors. Anything past client creation needs a live API.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn cs() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("cs"))
}

fn write_fixture(temp: &TempDir) {
    fs::write(temp.path().join("main.py"), "print('hi')\n").expect("fixture file");
    fs::write(temp.path().join("lib.rs"), "pub fn id() {}\n").expect("fixture file");
    fs::write(temp.path().join("Cargo.toml"), "[package]\n").expect("fixture file");
}

#[test]
fn scan_prints_text_fingerprint() {
    let temp = TempDir::new().expect("workspace");
    write_fixture(&temp);

    cs().args(["scan", "-p"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Files: 3"))
        .stdout(predicate::str::contains("rust: 1"))
        .stdout(predicate::str::contains("python: 1"))
        .stdout(predicate::str::contains("Build tools: Cargo"));
}

#[test]
fn scan_emits_parseable_json() {
    let temp = TempDir::new().expect("workspace");
    write_fixture(&temp);

    let output = cs()
        .args(["scan", "--format", "json", "-p"])
        .arg(temp.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let fingerprint: Value = serde_json::from_slice(&output).expect("json output");
    assert_eq!(fingerprint["total_files"], 3);
    assert_eq!(fingerprint["languages"]["rust"], 1);
    assert!(
        fingerprint["build_tools"]
            .as_array()
            .is_some_and(|tools| tools.iter().any(|t| t == "Cargo"))
    );
}

#[test]
fn scan_rejects_unknown_format() {
    cs().args(["scan", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown format"));
}

#[test]
fn help_names_the_subcommands() {
    cs().arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("LLM-driven codebase exploration agent"))
        .stdout(predicate::str::contains("explore"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("scan"));
}

#[test]
fn no_subcommand_prints_help() {
    cs().assert().success().stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
    cs().arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("codescout"));
}

#[test]
fn explore_requires_an_api_key() {
    let temp = TempDir::new().expect("workspace");
    write_fixture(&temp);

    cs().env_remove("ANTHROPIC_API_KEY")
        .args(["explore", "where is the entry point?", "-p"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("ANTHROPIC_API_KEY"));
}

#[test]
fn explore_rejects_unknown_provider() {
    let temp = TempDir::new().expect("workspace");
    write_fixture(&temp);
    let config_path = temp.path().join("codescout.yml");
    fs::write(
        &config_path,
        "llm:\n  provider: bogus\n  api-key-env: CS_TEST_KEY\n",
    )
    .expect("config file");

    cs().env("CS_TEST_KEY", "test-key")
        .arg("-c")
        .arg(&config_path)
        .args(["explore", "anything", "-p"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown LLM provider"));
}

#[test]
fn explore_rejects_missing_path() {
    cs().env("ANTHROPIC_API_KEY", "test-key")
        .args(["explore", "anything", "-p", "/nonexistent/path/for/codescout"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to resolve path"));
}

#[test]
fn plan_requires_an_api_key() {
    let temp = TempDir::new().expect("workspace");
    write_fixture(&temp);

    cs().env_remove("ANTHROPIC_API_KEY")
        .args(["plan", "map the module layout", "-p"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("ANTHROPIC_API_KEY"));
}
