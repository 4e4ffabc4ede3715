//! CLI regression tests for the `openapic` binary.
//!
//! These tests invoke the binary as a subprocess to catch regressions in flag
//! names, exit codes and where output goes.
//!
//! Run with: `cargo test -p openapic`

use assert_cmd::Command;
use openapic_compiler::Encoding;
use openapic_test::{fixture, TestWorkspace};
use predicates::prelude::*;
use predicates::str::contains;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns an assert_cmd Command wrapping the `openapic` binary.
fn openapic() -> Command {
    // cargo_bin is deprecated for custom build-dir setups; fine for standard workspace use.
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("openapic").expect("openapic binary not found");
    cmd.env_remove("RUST_LOG")
        .env_remove("OPENAPIC_LOG_LEVEL")
        .env_remove("OPENAPIC_LOG_FORMAT");
    cmd
}

// ---------------------------------------------------------------------------
// Usage
// ---------------------------------------------------------------------------

#[test]
fn no_input_prints_usage_and_exits_zero() {
    openapic()
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(contains("Usage"));
}

#[test]
fn no_output_directives_exits_zero() {
    openapic()
        .arg(fixture("petstore.yaml"))
        .assert()
        .success()
        .stderr(contains("Missing output directives."));
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

#[test]
fn writes_every_requested_encoding() {
    let workspace = TestWorkspace::new().unwrap();

    openapic()
        .arg("--text_out")
        .arg(workspace.output(Encoding::Text))
        .arg("--json_out")
        .arg(workspace.output(Encoding::Json))
        .arg("--pb_out")
        .arg(workspace.output(Encoding::Binary))
        .arg(fixture("petstore.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(contains("wrote json output"));

    let binary = workspace.read_output(Encoding::Binary).unwrap();
    assert!(binary.unresolved_references().is_empty());
    assert_eq!(workspace.read_output(Encoding::Text).unwrap(), binary);
    assert_eq!(workspace.read_output(Encoding::Json).unwrap(), binary);
}

#[test]
fn only_requested_outputs_are_written() {
    let workspace = TestWorkspace::new().unwrap();

    openapic()
        .arg("--json_out")
        .arg(workspace.output(Encoding::Json))
        .arg(fixture("petstore.yaml"))
        .assert()
        .success();

    assert_eq!(workspace.files(), vec!["out.json".to_string()]);
}

#[test]
fn keep_refs_leaves_references_unresolved() {
    let workspace = TestWorkspace::new().unwrap();

    openapic()
        .arg("--keep_refs")
        .arg("--pb_out")
        .arg(workspace.output(Encoding::Binary))
        .arg(fixture("petstore.yaml"))
        .assert()
        .success();

    let document = workspace.read_output(Encoding::Binary).unwrap();
    let pointers = document.unresolved_references();
    assert!(pointers.contains(&"#/definitions/Pet"));
    assert!(pointers.contains(&"#/responses/Error"));
}

#[test]
fn external_references_are_resolved_relative_to_their_file() {
    let workspace = TestWorkspace::new().unwrap();

    openapic()
        .arg("--json_out")
        .arg(workspace.output(Encoding::Json))
        .arg(fixture("refs/api.yaml"))
        .assert()
        .success();

    let document = workspace.read_output(Encoding::Json).unwrap();
    assert!(document.unresolved_references().is_empty());
    assert_eq!(document.sources.len(), 2);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn missing_input_exits_minus_one_and_writes_errors() {
    let workspace = TestWorkspace::new().unwrap();

    openapic()
        .arg("--json_out")
        .arg(workspace.output(Encoding::Json))
        .arg("--errors_out")
        .arg(workspace.errors())
        .arg(workspace.path().join("this-file-does-not-exist.yaml"))
        .assert()
        .failure()
        .code(255)
        .stderr(contains("this-file-does-not-exist.yaml"));

    assert_eq!(workspace.files(), vec!["errors.txt".to_string()]);
    let errors = std::fs::read_to_string(workspace.errors()).unwrap();
    assert!(!errors.is_empty());
}

#[test]
fn invalid_document_reports_diagnostics() {
    let workspace = TestWorkspace::new().unwrap();

    openapic()
        .arg("--errors_out")
        .arg(workspace.errors())
        .arg(fixture("invalid.yaml"))
        .assert()
        .failure()
        .code(255);

    let errors = std::fs::read_to_string(workspace.errors()).unwrap();
    assert!(errors.contains("$root"));
}

#[test]
fn unresolvable_reference_is_fatal() {
    let workspace = TestWorkspace::new().unwrap();

    openapic()
        .arg("--json_out")
        .arg(workspace.output(Encoding::Json))
        .arg(fixture("unresolvable.yaml"))
        .assert()
        .failure()
        .code(255)
        .stderr(contains("#/components/schemas/Missing"));

    assert!(workspace.files().is_empty());
}

#[test]
fn unknown_plugin_is_reported_and_exits_zero() {
    let workspace = TestWorkspace::new().unwrap();

    openapic()
        .arg("--plugin")
        .arg("definitely_not_installed")
        .arg("--json_out")
        .arg(workspace.output(Encoding::Json))
        .arg(fixture("petstore.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(contains("not found"));

    assert!(workspace.read_output(Encoding::Json).is_some());
}
