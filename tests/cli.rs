//! Exit-code and JSON contract of the command wrapper.

use assert_cmd::Command;
use predicates::prelude::*;

const Z3_UA: &str = r#"<?xml version="1.0"?>
<algebra>
  <basicAlgebra>
    <algName>Z3</algName>
    <cardinality>3</cardinality>
    <operations>
      <op>
        <opSymbol>
          <opName>+</opName>
          <arity>2</arity>
        </opSymbol>
        <opTable>
          <intArray>
            <row>0,1,2</row>
            <row>1,2,0</row>
            <row>2,0,1</row>
          </intArray>
        </opTable>
      </op>
    </operations>
  </basicAlgebra>
</algebra>
"#;

fn write_fixture(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("z3.ua");
    std::fs::write(&path, Z3_UA).unwrap();
    path
}

#[test]
fn read_succeeds_with_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir);
    Command::cargo_bin("uak")
        .unwrap()
        .args(["read", "--file", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"command\":\"read\""))
        .stdout(predicate::str::contains("\"cardinality\":3"))
        .stdout(predicate::str::contains("\"status\":\"ok\""));
}

#[test]
fn cg_prints_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir);
    Command::cargo_bin("uak")
        .unwrap()
        .args(["cg", "--file", path.to_str().unwrap(), "--a", "0", "--b", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"blocks\":[[0,1,2]]"));
}

#[test]
fn unknown_command_exits_2() {
    Command::cargo_bin("uak")
        .unwrap()
        .arg("no-such-command")
        .assert()
        .code(2);
}

#[test]
fn missing_flag_exits_2() {
    Command::cargo_bin("uak")
        .unwrap()
        .args(["cg", "--a", "0"])
        .assert()
        .code(2);
}

#[test]
fn domain_failure_exits_1_with_error_kind() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir);
    Command::cargo_bin("uak")
        .unwrap()
        .args(["cg", "--file", path.to_str().unwrap(), "--a", "0", "--b", "9"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"error\":\"OutOfRange\""));
}

#[test]
fn truncation_surfaces_as_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir);
    Command::cargo_bin("uak")
        .unwrap()
        .args([
            "con-size",
            "--file",
            path.to_str().unwrap(),
            "--max-steps",
            "0",
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"error\":\"Truncated\""));
}

#[test]
fn equation_check_reports_no_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir);
    Command::cargo_bin("uak")
        .unwrap()
        .args([
            "equation-check",
            "--file",
            path.to_str().unwrap(),
            "--left",
            "+(x,y)",
            "--right",
            "+(y,x)",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"failure\":null"));
}

#[test]
fn type_set_of_z3() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir);
    Command::cargo_bin("uak")
        .unwrap()
        .args(["type-set", "--file", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"types\":[2]"));
}
