//! End-to-end tests for the `gumdiff` command line interface.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

const TREE_A: &str = r#"{"filename": "a.cpp",
 "root": {"type": "Unit", "begin": 0, "end": 9,
          "children": [{"type": "Var", "value": "x", "begin": 0, "end": 9}]}}"#;

const TREE_B: &str = r#"{"filename": "b.cpp",
 "root": {"type": "Unit", "begin": 0, "end": 9,
          "children": [{"type": "Var", "value": "y", "begin": 0, "end": 9}]}}"#;

fn write_tree(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("failed to write the test input");
    path
}

fn gumdiff() -> Command {
    Command::cargo_bin("gumdiff").expect("binary under test should be built")
}

#[test]
fn diffing_a_tree_with_itself_only_prints_matches() {
    let dir = TempDir::new().unwrap();
    let a = write_tree(&dir, "a.json", TREE_A);

    gumdiff()
        .args(["diff"])
        .arg(&a)
        .arg(&a)
        .assert()
        .success()
        .stdout("Match Unit(0) to Unit(0)\nMatch Var: x(1) to Var: x(1)\n");
}

#[test]
fn changed_value_produces_an_update() {
    let dir = TempDir::new().unwrap();
    let a = write_tree(&dir, "a.json", TREE_A);
    let b = write_tree(&dir, "b.json", TREE_B);

    gumdiff()
        .args(["diff"])
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(
            "Match Unit(0) to Unit(0)\n\
             Match Var: x(1) to Var: y(1)\n\
             Update Var: x(1) to y\n",
        );
}

#[test]
fn jsondiff_emits_the_dual_tree_document() {
    let dir = TempDir::new().unwrap();
    let a = write_tree(&dir, "a.json", TREE_A);
    let b = write_tree(&dir, "b.json", TREE_B);

    let expected = concat!(
        r#"{"src":{"filename":"a.cpp","root":{"id":0,"type":"Unit","begin":0,"end":9,"tid":0,"children":["#,
        r#"{"id":1,"type":"Var","begin":0,"end":9,"change":"u","value":"x","tid":1,"children":[]}]}},"#,
        r#""dst":{"filename":"b.cpp","root":{"id":0,"type":"Unit","begin":0,"end":9,"tid":0,"children":["#,
        r#"{"id":1,"type":"Var","begin":0,"end":9,"change":"u","value":"y","tid":1,"children":[]}]}}}"#,
    );
    gumdiff()
        .args(["jsondiff"])
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn profile_reports_the_phases() {
    let dir = TempDir::new().unwrap();
    let a = write_tree(&dir, "a.json", TREE_A);
    let b = write_tree(&dir, "b.json", TREE_B);

    let assert = gumdiff()
        .args(["profile"])
        .arg(&a)
        .arg(&b)
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("matching: 2 pairs"), "got: {stdout}");
}

#[test]
fn malformed_input_fails_with_a_diagnostic() {
    let dir = TempDir::new().unwrap();
    let bad = write_tree(&dir, "bad.json", r#"{"filename": "a.cpp"}"#);
    let a = write_tree(&dir, "a.json", TREE_A);

    let assert = gumdiff()
        .args(["diff"])
        .arg(&bad)
        .arg(&a)
        .assert()
        .failure();
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("root"), "got: {stderr}");
    assert!(stderr.contains("bad.json"), "got: {stderr}");
}

#[test]
fn missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let a = write_tree(&dir, "a.json", TREE_A);

    gumdiff()
        .args(["diff"])
        .arg(dir.path().join("nonexistent.json"))
        .arg(&a)
        .assert()
        .failure();
}
