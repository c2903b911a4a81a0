use assert_cmd::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn fixture(name: &str) -> PathBuf {
    let path = repo_root().join("fixtures").join(name);
    assert!(path.exists(), "fixture missing: {}", path.display());
    path
}

fn run_json(args: &[&str]) -> Value {
    let exe = assert_cmd::cargo_bin!("kelp-cli");
    let output = Command::new(exe).args(args).output().expect("run kelp-cli");
    assert!(
        output.status.success(),
        "kelp-cli failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn layout_prints_visible_nodes() {
    let path = fixture("basic.json");
    let out = run_json(&["layout", path.to_string_lossy().as_ref()]);

    let nodes = out["nodes"].as_array().expect("nodes");
    let ids: Vec<u64> = nodes.iter().filter_map(|n| n["id"].as_u64()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(out["width"], 800.0);
    assert!(out["columnWidth"].as_f64().unwrap() >= 1.0);
    assert_eq!(nodes[0]["labelAnchor"], "start");
}

#[test]
fn layout_applies_commands_and_overrides() {
    let path = fixture("basic.json");
    let out = run_json(&[
        "layout",
        "--width",
        "400",
        "--height",
        "300",
        "--collapse",
        "0",
        path.to_string_lossy().as_ref(),
    ]);
    assert_eq!(out["nodes"].as_array().unwrap().len(), 1);
    assert_eq!(out["width"], 400.0);
    assert_eq!(out["height"], 300.0);
}

#[test]
fn render_prints_one_commit_per_command() {
    let path = fixture("connections.json");
    let out = run_json(&[
        "render",
        "--collapse",
        "1",
        "--toggle",
        "eng",
        path.to_string_lossy().as_ref(),
    ]);
    let commits = out.as_array().expect("commits");
    assert_eq!(commits.len(), 3);

    for commit in commits {
        assert!(commit["instructions"].is_array());
        for p in commit["paths"].as_array().unwrap() {
            assert!(p["d"].as_str().unwrap().starts_with('M'), "{p}");
        }
    }
    let exits = commits[1]["instructions"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|i| i["phase"] == "exit")
        .count();
    assert!(exits > 0);
}

#[test]
fn snapshot_reports_open_state() {
    let path = fixture("connections.json");
    let out = run_json(&["snapshot", "--toggle", "eng", path.to_string_lossy().as_ref()]);
    let open = |id: &str| {
        out.as_array()
            .expect("entries")
            .iter()
            .find(|e| e["id"] == id)
            .map(|e| e["open"].clone())
    };
    assert_eq!(open("eng"), Some(Value::Bool(false)));
    assert_eq!(open("ops"), Some(Value::Bool(true)));
    assert_eq!(open("legal"), Some(Value::Bool(false)));
}

#[test]
fn snapshot_keeps_integer_ids_numeric() {
    let path = fixture("basic.json");
    let out = run_json(&["snapshot", "--collapse", "1", path.to_string_lossy().as_ref()]);
    let entries = out.as_array().expect("entries");
    let ids: Vec<u64> = entries.iter().filter_map(|e| e["id"].as_u64()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(entries[0]["open"], true);
    assert_eq!(entries[2]["open"], false);
}

#[test]
fn bare_tree_from_temp_file() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = tmp.path().join("tree.json");
    fs::write(&input, r#"{"name":"r","children":[{"name":"a"},{"name":"b"}]}"#).expect("write");

    let out = run_json(&["layout", "--pixels-per-node", "50", input.to_string_lossy().as_ref()]);
    assert_eq!(out["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(out["height"], 2.0 * 50.0 + 32.0);
}

#[test]
fn unknown_flag_is_a_usage_error() {
    let exe = assert_cmd::cargo_bin!("kelp-cli");
    Command::new(exe).args(["layout", "--bogus"]).assert().code(2);
}

#[test]
fn invalid_input_fails() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = tmp.path().join("broken.json");
    fs::write(&input, "{ not json").expect("write");

    let exe = assert_cmd::cargo_bin!("kelp-cli");
    Command::new(exe)
        .arg(input.to_string_lossy().as_ref())
        .assert()
        .code(1);

    fs::write(&input, r#"{"id":1,"children":[{"id":1}]}"#).expect("write");
    let exe = assert_cmd::cargo_bin!("kelp-cli");
    Command::new(exe)
        .arg(input.to_string_lossy().as_ref())
        .assert()
        .code(1);
}
