//! Integration tests for the `jtupdate` CLI.
//!
//! These drive the compiled binary end-to-end against JSON fixtures,
//! verifying invocation, output format, and exit codes rather than the
//! engine's internals (covered by the unit tests in `src/threading/*.rs`).

use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

struct TestContext {
    bin: PathBuf,
    _temp_dir: TempDir,
    dir: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_path_buf();

        let bin = std::env::var("CARGO_BIN_EXE_jtupdate")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                let debug_path = PathBuf::from("./target/debug/jtupdate");
                if debug_path.exists() {
                    debug_path
                } else {
                    PathBuf::from("./target/release/jtupdate")
                }
            });

        Self { bin, _temp_dir: temp_dir, dir }
    }

    fn write_fixture(&self, name: &str, json: &str) -> PathBuf {
        let path = self.dir.join(name);
        std::fs::write(&path, json).unwrap();
        path
    }

    fn run(&self, args: &[&str]) -> TestOutput {
        let output = Command::new(&self.bin).args(args).output().expect("failed to run jtupdate");
        TestOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

struct TestOutput {
    stdout: String,
    stderr: String,
    status: std::process::ExitStatus,
}

const DIAMOND: &str = r#"{
    "function_name": "diamond",
    "blocks": [
        {"id": 0, "kind": "Entry", "terminator": {"Goto": {"target": 1}}},
        {"id": 1, "kind": "Normal", "terminator": {"SwitchInt": {"targets": [2], "otherwise": 3}}},
        {"id": 2, "kind": "Exit", "terminator": "Return"},
        {"id": 3, "kind": "Exit", "terminator": "Return"}
    ],
    "edges": [
        {"from": 0, "to": 1, "kind": "Fallthrough"},
        {"from": 1, "to": 2, "kind": "TrueBranch"},
        {"from": 1, "to": 3, "kind": "FalseBranch"}
    ],
    "paths": [
        {"steps": [
            {"from": 0, "to": 1, "kind": "StartJumpThread"},
            {"from": 1, "to": 2, "kind": "CopySrcBlock"}
        ]}
    ]
}"#;

// `J` (block 1) reaches `S2` (block 3) two ways: directly via its
// `FalseBranch`, and through `S1` (block 2). The phi at `S2` disagrees
// between those two routes, so the joiner path threading through `S1`
// must be cancelled rather than silently picking one value.
const JOINER_MISMATCH: &str = r#"{
    "function_name": "joiner",
    "blocks": [
        {"id": 0, "kind": "Entry", "terminator": {"Goto": {"target": 1}}},
        {"id": 1, "kind": "Normal", "terminator": {"SwitchInt": {"targets": [2], "otherwise": 3}}},
        {"id": 2, "kind": "Normal", "terminator": {"Goto": {"target": 3}}},
        {"id": 3, "kind": "Exit", "terminator": "Return", "phis": [
            {"name": "x", "args": [
                {"from": 1, "value": "x.direct"},
                {"from": 2, "value": "x.via_s1"}
            ]}
        ]}
    ],
    "edges": [
        {"from": 0, "to": 1, "kind": "Fallthrough"},
        {"from": 1, "to": 2, "kind": "TrueBranch"},
        {"from": 1, "to": 3, "kind": "FalseBranch"},
        {"from": 2, "to": 3, "kind": "Fallthrough"}
    ],
    "paths": [
        {"steps": [
            {"from": 0, "to": 1, "kind": "StartJumpThread"},
            {"from": 1, "to": 2, "kind": "CopySrcJoinerBlock"},
            {"from": 2, "to": 3, "kind": "CopySrcBlock"}
        ]}
    ]
}"#;

#[test]
fn thread_command_runs_and_reports_threaded() {
    let ctx = TestContext::new();
    let input = ctx.write_fixture("diamond.json", DIAMOND);
    let out = ctx.run(&["thread", input.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", out.stderr);
    assert!(out.stdout.contains("threaded: true"));
}

#[test]
fn thread_command_json_output_is_well_formed() {
    let ctx = TestContext::new();
    let input = ctx.write_fixture("diamond.json", DIAMOND);
    let out = ctx.run(&["--output", "json", "thread", input.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", out.stderr);
    let parsed: serde_json::Value = serde_json::from_str(&out.stdout).expect("valid json");
    assert_eq!(parsed["threaded"], serde_json::Value::Bool(true));
}

#[test]
fn thread_command_dot_output_contains_graph() {
    let ctx = TestContext::new();
    let input = ctx.write_fixture("diamond.json", DIAMOND);
    let out = ctx.run(&["thread", "--dot", input.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", out.stderr);
    assert!(out.stdout.contains("digraph CFG"));
}

#[test]
fn dump_command_prints_registration_line() {
    let ctx = TestContext::new();
    let input = ctx.write_fixture("diamond.json", DIAMOND);
    let out = ctx.run(&["dump", input.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", out.stderr);
    assert!(out.stdout.contains("registered"));
}

#[test]
fn validate_command_reports_no_violations() {
    let ctx = TestContext::new();
    let input = ctx.write_fixture("diamond.json", DIAMOND);
    let out = ctx.run(&["validate", input.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", out.stderr);
    assert!(out.stdout.contains("no phi-arity violations"));
}

#[test]
fn missing_fixture_file_exits_nonzero() {
    let ctx = TestContext::new();
    let out = ctx.run(&["thread", "/nonexistent/path/does-not-exist.json"]);
    assert!(!out.status.success());
}

#[test]
fn joiner_phi_mismatch_is_cancelled_not_threaded() {
    let ctx = TestContext::new();
    let input = ctx.write_fixture("joiner.json", JOINER_MISMATCH);
    let out = ctx.run(&["--output", "json", "thread", input.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", out.stderr);
    let parsed: serde_json::Value = serde_json::from_str(&out.stdout).expect("valid json");
    assert_eq!(parsed["threaded"], serde_json::Value::Bool(false));
    assert_eq!(parsed["stats"]["paths_cancelled_joiner_phi"], 1);
}
