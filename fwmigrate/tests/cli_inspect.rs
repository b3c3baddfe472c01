use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

#[test]
fn inspect_prints_asa_tree() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fwmigrate"));
    cmd.arg("inspect")
        .arg(fixture("fixtures/asa-basic.cfg"))
        .arg("--depth")
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains("dialect=asa"))
        .stdout(predicate::str::contains("hostname edge-fw"))
        .stdout(predicate::str::contains("nameif outside"));
}

#[test]
fn inspect_kind_lists_matching_commands() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fwmigrate"));
    cmd.arg("inspect")
        .arg(fixture("fixtures/asa-basic.cfg"))
        .arg("--kind")
        .arg("access-list")
        .assert()
        .success()
        .stdout(predicate::str::contains("kind=access-list"))
        .stdout(predicate::str::contains(
            "access-list outside_in extended permit tcp any object obj-web eq www",
        ))
        .stdout(predicate::str::contains("access-group").not());
}

#[test]
fn inspect_kind_shows_command_incidents() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fwmigrate"));
    cmd.arg("inspect")
        .arg(fixture("fixtures/asa-basic.cfg"))
        .arg("--kind")
        .arg("host")
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid host IP address (10.1.1.300)"));
}

#[test]
fn inspect_kind_json_is_machine_readable() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fwmigrate"));
    let output = cmd
        .arg("inspect")
        .arg(fixture("fixtures/asa-basic.cfg"))
        .arg("--kind")
        .arg("access-group")
        .arg("--format")
        .arg("json")
        .output()
        .expect("run fwmigrate");
    assert!(output.status.success());

    let commands: Value = serde_json::from_slice(&output.stdout).expect("json commands");
    let commands = commands.as_array().expect("array");
    assert_eq!(commands.len(), 3);
    assert_eq!(commands[0]["kind"], "access-group");
    assert_eq!(commands[0]["text"], "access-group outside_in in interface outside");
}

#[test]
fn inspect_unknown_kind_fails() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fwmigrate"));
    cmd.arg("inspect")
        .arg(fixture("fixtures/asa-basic.cfg"))
        .arg("--kind")
        .arg("crypto-map")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown command kind 'crypto-map'"));
}

#[test]
fn inspect_kind_rejects_fortigate() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fwmigrate"));
    cmd.arg("inspect")
        .arg(fixture("fixtures/fortigate-basic.conf"))
        .arg("--kind")
        .arg("access-list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("only supported for asa"));
}

#[test]
fn inspect_fortigate_reports_version_and_vdoms() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fwmigrate"));
    cmd.arg("inspect")
        .arg(fixture("fixtures/fortigate-vdom.conf"))
        .arg("--depth")
        .arg("0")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "dialect=fortigate version=FGT100F-6.4.5-FW-build1828-210217",
        ))
        .stdout(predicate::str::contains("vdoms=root,dmz"));
}

#[test]
fn inspect_dialect_flag_overrides_detection() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fwmigrate"));
    cmd.arg("inspect")
        .arg(fixture("fixtures/fortigate-basic.conf"))
        .arg("--dialect")
        .arg("asa")
        .arg("--depth")
        .arg("0")
        .assert()
        .success()
        .stdout(predicate::str::contains("dialect=asa"));
}
