//! Integration tests for the `tff` binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn tff() -> Command {
    Command::cargo_bin("tff").unwrap()
}

fn write_tff(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_resolves_a_single_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tff(&dir, "simple.tff", "a = x\nb = {a}y\n");
    tff()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"b\" = \"xy\""));
}

#[test]
fn test_reads_stdin_with_dash() {
    tff()
        .arg("-")
        .write_stdin("a = 1\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"a\" = \"1\""));
}

#[test]
fn test_iterated_sets_print_indexed_mappings() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tff(&dir, "iterated.tff", "a = 1, 2\nb = {a}x\n");
    tff()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[0]: {\"a\": \"1\", \"b\": \"1x\"}"))
        .stdout(predicate::str::contains("[1]: {\"a\": \"2\", \"b\": \"2x\"}"));
}

#[test]
fn test_print_all_uses_long_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tff(&dir, "iterated.tff", "a = 1, 2\n");
    tff()
        .args(["--print-all", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"a\" = \"1\""))
        .stdout(predicate::str::contains("\"a\" = \"2\""));
}

#[test]
fn test_print_input_skips_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tff(&dir, "incomplete.tff", "a = {missing}\n");
    // The set cannot resolve, but -i only prints the parsed input.
    tff()
        .args(["-i", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"a\" = \"{missing}\""));
}

#[test]
fn test_print_graph_emits_dot() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tff(&dir, "graph.tff", "a = {b}\nb = x\n");
    tff()
        .args(["-g", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("digraph \"G\" {"))
        .stdout(predicate::str::contains("\"a\" -> \"b\";"));
}

#[test]
fn test_missing_tokens_fail_with_exact_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tff(&dir, "missing.tff", "a = {B}{C}\n");
    tff()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing tokens: \"B\", \"C\""));
}

#[test]
fn test_cyclic_dependencies_fail_with_exact_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tff(&dir, "cycle.tff", "A = {B}\nB = {A}\n");
    tff()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cyclic dependencies: \"A\", \"B\""));
}

#[test]
fn test_quiet_suppresses_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tff(&dir, "simple.tff", "a = x\n");
    tff()
        .args(["-q", &path])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_inline_string_merges_with_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tff(&dir, "base.tff", "a = x\n");
    tff()
        .args(["-s", "b = {a}y", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"b\" = \"xy\""));
}

#[test]
fn test_json_output_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tff(&dir, "simple.tff", "a = x\n");
    tff()
        .args(["-o", "JSON", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"a\": [\"x\"]"));
}

#[test]
fn test_dict_output_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tff(&dir, "simple.tff", "a = x\n");
    tff()
        .args(["-o", "dict", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("{\"a\": \"x\"}"));
}

#[test]
fn test_unreadable_file_fails() {
    tff().arg("/no/such/input.tff").assert().failure();
}

#[test]
fn test_exclusive_output_modes_rejected() {
    tff().args(["-q", "-g", "x.tff"]).assert().failure();
}
