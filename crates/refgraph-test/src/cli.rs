//! CLI regression tests for the `refgraph` binary.
//!
//! These tests invoke the binary as a subprocess to catch regressions in flag
//! names, exit codes and output formats.
//!
//! Run with: `cargo test -p refgraph-test`
//! Requires the `refgraph` binary to be built first (`cargo build -p refgraph-cli`).

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::str::contains;

use crate::server::{schemas_referencing, FixtureServer};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns an assert_cmd Command wrapping the `refgraph` binary.
fn refgraph() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("refgraph")
        .expect("refgraph binary not found, run `cargo build -p refgraph-cli` first");
    cmd.env_remove("RUST_LOG")
        .env_remove("REFGRAPH_LOG_LEVEL")
        .env_remove("REFGRAPH_LOG_FORMAT")
        .env_remove("REFGRAPH_TIMEOUT_SECS");
    cmd
}

/// Absolute path to the shared test fixtures directory.
fn fixtures() -> PathBuf {
    // CARGO_MANIFEST_DIR = .../crates/refgraph-test
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("crates/")
        .parent()
        .expect("workspace root")
        .join("tests/fixtures")
}

fn json_stdout(cmd: &mut Command, success: bool) -> serde_json::Value {
    let assert = cmd.assert();
    let assert = if success {
        assert.success()
    } else {
        assert.failure().code(1)
    };
    let stdout = assert.get_output().stdout.clone();
    let s = String::from_utf8(stdout).expect("stdout should be valid UTF-8");
    serde_json::from_str(&s).expect("--format json output should be valid JSON")
}

fn strings(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .expect("array")
        .iter()
        .map(|v| v.as_str().expect("string").to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// refgraph resolve
// ---------------------------------------------------------------------------

#[test]
fn resolve_spec_without_refs_exits_zero() {
    refgraph()
        .args(["resolve", "--spec"])
        .arg(fixtures().join("minimal.yaml"))
        .assert()
        .success()
        .stderr(contains("0 reference(s) resolved"));
}

#[test]
fn resolve_missing_file_exits_one() {
    refgraph()
        .args(["resolve", "--spec", "this-file-does-not-exist.yaml"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("cannot read file"));
}

#[test]
fn resolve_empty_spec_exits_one() {
    refgraph()
        .args(["resolve", "--spec"])
        .arg(fixtures().join("empty.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2001"));
}

#[test]
fn resolve_malformed_spec_exits_one() {
    refgraph()
        .args(["resolve", "--spec"])
        .arg(fixtures().join("invalid-parse-error.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2002"));
}

#[test]
fn resolve_missing_spec_flag_exits_two() {
    refgraph().args(["resolve"]).assert().failure().code(2);
}

#[test]
fn resolve_ignores_file_refs_unless_asked() {
    let v = json_stdout(
        refgraph()
            .args(["resolve", "--format", "json", "--spec"])
            .arg(fixtures().join("petstore/root.yaml")),
        true,
    );
    assert_eq!(v["summary"]["resolved"], 0);
    assert!(strings(&v["results"][0]["remoteRefs"]).is_empty());
}

#[test]
fn resolve_follow_external_walks_the_file_graph() {
    let v = json_stdout(
        refgraph()
            .args(["resolve", "--follow-external", "--format", "json", "--spec"])
            .arg(fixtures().join("petstore/root.yaml")),
        true,
    );

    let resolved = strings(&v["results"][0]["remoteRefs"]);
    assert_eq!(resolved.len(), 4, "got: {:?}", resolved);
    for file in [
        "schemas/pet.yaml",
        "schemas/owner.yaml",
        "schemas/error.yaml",
        "responses.yaml",
    ] {
        assert!(
            resolved.iter().any(|r| r.ends_with(file)),
            "{file} missing from {:?}",
            resolved
        );
    }
    assert!(strings(&v["results"][0]["missingRemoteRefs"]).is_empty());
}

#[test]
fn resolve_reports_missing_refs_and_strict_fails() {
    let spec = fixtures().join("missing-ref.yaml");

    refgraph()
        .args(["resolve", "--follow-external", "--spec"])
        .arg(&spec)
        .assert()
        .success()
        .stderr(contains("missing:"))
        .stderr(contains("does-not-exist.yaml"));

    refgraph()
        .args(["resolve", "--follow-external", "--strict", "--spec"])
        .arg(&spec)
        .assert()
        .failure()
        .code(1);
}

#[test]
fn resolve_many_skips_empty_roots() {
    let v = json_stdout(
        refgraph()
            .args(["resolve", "--format", "json", "--spec"])
            .arg(fixtures().join("minimal.yaml"))
            .arg(fixtures().join("empty.yaml")),
        true,
    );

    let results = v["results"].as_array().expect("results should be an array");
    assert_eq!(results.len(), 1);
    let skipped = strings(&v["skipped"]);
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].ends_with("empty.yaml"));
}

#[test]
fn resolve_json_failure_still_outputs_json() {
    let v = json_stdout(
        refgraph()
            .args(["resolve", "--format", "json", "--spec"])
            .arg(fixtures().join("invalid-parse-error.yaml")),
        false,
    );
    assert_eq!(v["summary"]["failed"], 1);
    let message = v["failures"][0]["message"].as_str().expect("message");
    assert!(message.contains("E2002"), "got: {message}");
}

#[tokio::test(flavor = "multi_thread")]
async fn resolve_fetches_remote_refs_with_origin() {
    let server = FixtureServer::start().await.expect("server");
    server
        .serve("/pet.yaml", schemas_referencing(&[server.url("/owner.yaml")]))
        .await;
    server.serve("/owner.yaml", schemas_referencing(&[])).await;
    server.serve_status("/gone.yaml", 404).await;
    let root = server
        .write_root(
            "root.yaml",
            &schemas_referencing(&[server.url("/pet.yaml"), server.url("/gone.yaml")]),
        )
        .expect("write root");

    let v = json_stdout(
        refgraph()
            .args(["resolve", "--allow-plaintext", "--origin", "ci", "--format", "json", "--spec"])
            .arg(&root),
        true,
    );

    assert_eq!(strings(&v["results"][0]["remoteRefs"]).len(), 2);
    assert_eq!(
        strings(&v["results"][0]["missingRemoteRefs"]),
        vec![server.url("/gone.yaml")]
    );
    assert_eq!(server.hits("/pet.yaml").await.expect("hits"), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn resolve_refuses_plaintext_by_default() {
    let server = FixtureServer::start().await.expect("server");
    server.serve("/pet.yaml", schemas_referencing(&[])).await;
    let root = server
        .write_root("root.yaml", &schemas_referencing(&[server.url("/pet.yaml")]))
        .expect("write root");

    refgraph()
        .args(["resolve", "--strict", "--spec"])
        .arg(&root)
        .assert()
        .failure()
        .code(1);
    assert_eq!(server.hits("/pet.yaml").await.expect("hits"), 0);
}

#[test]
fn resolve_rejects_unknown_log_format() {
    refgraph()
        .args(["--log-format", "xml", "resolve", "--spec"])
        .arg(fixtures().join("minimal.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("unknown log format"));
}

// ---------------------------------------------------------------------------
// refgraph plan
// ---------------------------------------------------------------------------

#[test]
fn plan_lists_component_slots() {
    refgraph()
        .args(["plan", "--spec"])
        .arg(fixtures().join("petstore/root.yaml"))
        .assert()
        .success()
        .stderr(contains("2 external reference(s)"))
        .stderr(contains("./schemas/pet.yaml#/Pet"));
}

#[test]
fn plan_json_format_outputs_slots() {
    let v = json_stdout(
        refgraph()
            .args(["plan", "--format", "json", "--spec"])
            .arg(fixtures().join("petstore/root.yaml")),
        true,
    );

    let slots = v["slots"].as_array().expect("slots should be an array");
    assert_eq!(slots.len(), 2);
    let pet = slots
        .iter()
        .find(|s| s["reference"] == "./schemas/pet.yaml#/Pet")
        .expect("pet slot");
    assert_eq!(pet["kind"], "external");
    assert_eq!(pet["entity"], "Pet");
    assert_eq!(pet["placement"]["kind"], "component");
}

#[test]
fn plan_invalid_spec_exits_one() {
    refgraph()
        .args(["plan", "--spec"])
        .arg(fixtures().join("invalid-parse-error.yaml"))
        .assert()
        .failure()
        .code(1);
}
