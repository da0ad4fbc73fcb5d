//! CLI tests for the `queiju` binary.
//!
//! Spawns the binary against fake QE installs and checks exit codes and the
//! files it writes.

#![cfg(unix)]

use std::fs;
use std::process::Command;

use queiju::exit_codes;
use queiju::io::config::{QueijuConfig, load_config, write_config};
use queiju::report::RunReport;
use queiju::test_support::FakeQeInstall;
use queiju::{ExitPolicy, QeCommand};

fn queiju() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_queiju"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn run_saves_output_and_report() {
    let install = FakeQeInstall::new().expect("install");
    let work = tempfile::tempdir().expect("workdir");
    fs::write(work.path().join("scf.in"), "&CONTROL\n/\n").expect("write input");

    let status = queiju()
        .current_dir(work.path())
        .args(["run", "pw.x", "--input", "scf.in", "--output", "scf.out"])
        .args(["--report", "report.json", "--path"])
        .arg(install.bin_dir())
        .status()
        .expect("queiju run");
    assert_eq!(status.code(), Some(exit_codes::OK));

    let saved = fs::read_to_string(work.path().join("scf.out")).expect("read output");
    assert!(saved.contains("&CONTROL\n/\n"));
    assert!(saved.ends_with("JOB DONE.\n\n"));

    let report: RunReport = serde_json::from_str(
        &fs::read_to_string(work.path().join("report.json")).expect("read report"),
    )
    .expect("parse report");
    assert_eq!(report.command, QeCommand::Pw);
    assert_eq!(report.exit_code, Some(0));
    assert!(report.modified_files.contains(&"./.lastwatch".to_string()));
}

#[test]
fn run_without_path_resolves_binary_through_env_path() {
    let install = FakeQeInstall::new().expect("install");
    let work = tempfile::tempdir().expect("workdir");
    fs::write(work.path().join("scf.in"), "&CONTROL\n/\n").expect("write input");
    let search = format!(
        "{}:{}",
        install.bin_dir().display(),
        std::env::var("PATH").unwrap_or_default()
    );

    let output = queiju()
        .current_dir(work.path())
        .env("PATH", search)
        .args(["run", "pw.x", "--input", "scf.in", "--output", "scf.out"])
        .args(["--report", "report.json"])
        .output()
        .expect("queiju run");
    assert_eq!(
        output.status.code(),
        Some(exit_codes::OK),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let saved = fs::read_to_string(work.path().join("scf.out")).expect("read output");
    assert!(saved.contains("Program PWSCF"));
    assert!(saved.contains("&CONTROL\n/\n"));
    let report: RunReport = serde_json::from_str(
        &fs::read_to_string(work.path().join("report.json")).expect("read report"),
    )
    .expect("parse report");
    assert_eq!(report.target, "pw.x");
    assert!(
        report
            .modified_files
            .contains(&"./out/pwscf.save/data-file-schema.xml".to_string())
    );
}

#[test]
fn output_path_is_relative_to_workdir() {
    let install = FakeQeInstall::new().expect("install");
    let caller = tempfile::tempdir().expect("caller dir");
    fs::create_dir(caller.path().join("w")).expect("mkdir workdir");
    fs::write(caller.path().join("bands.in"), "").expect("write input");

    let status = queiju()
        .current_dir(caller.path())
        .args(["run", "bands.x", "--input", "bands.in", "--workdir", "w"])
        .args(["--output", "bands.out", "--path"])
        .arg(install.bin_dir())
        .status()
        .expect("queiju run");
    assert_eq!(status.code(), Some(exit_codes::OK));
    assert!(caller.path().join("w/bands.out").is_file());
    assert!(!caller.path().join("bands.out").exists());
}

#[test]
fn run_rejects_unlisted_command() {
    let install = FakeQeInstall::new().expect("install");
    let work = tempfile::tempdir().expect("workdir");
    fs::write(work.path().join("in"), "").expect("write input");

    let output = queiju()
        .current_dir(work.path())
        .args(["run", "rm", "--input", "in", "--path"])
        .arg(install.bin_dir())
        .output()
        .expect("queiju run");
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid command rm on run"));
    assert!(!work.path().join(".lastwatch").exists());
}

#[test]
fn strict_run_keeps_output_and_reports_child_failure() {
    let install = FakeQeInstall::new().expect("install");
    install
        .write_script(QeCommand::Pw, "echo 'convergence NOT achieved'\nexit 1\n")
        .expect("script");
    let work = tempfile::tempdir().expect("workdir");
    fs::write(work.path().join("scf.in"), "").expect("write input");

    let status = queiju()
        .current_dir(work.path())
        .args(["run", "pw.x", "--input", "scf.in", "--output", "scf.out", "--strict"])
        .arg("--path")
        .arg(install.bin_dir())
        .status()
        .expect("queiju run");
    assert_eq!(status.code(), Some(exit_codes::CHILD_FAILED));
    let saved = fs::read_to_string(work.path().join("scf.out")).expect("read output");
    assert_eq!(saved, "convergence NOT achieved\n\n");
}

#[test]
fn config_file_supplies_binary_directory() {
    let install = FakeQeInstall::new().expect("install");
    let work = tempfile::tempdir().expect("workdir");

    let status = queiju()
        .current_dir(work.path())
        .arg("init")
        .status()
        .expect("queiju init");
    assert_eq!(status.code(), Some(exit_codes::OK));
    let config_path = work.path().join("queiju.toml");
    let mut cfg = load_config(&config_path).expect("load config");
    assert_eq!(cfg, QueijuConfig::default());

    cfg.bin_dir = install.bin_dir_str();
    cfg.exit_policy = ExitPolicy::Strict;
    write_config(&config_path, &cfg).expect("write config");

    let output = queiju()
        .current_dir(work.path())
        .arg("check")
        .output()
        .expect("queiju check");
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(String::from_utf8_lossy(&output.stdout).contains(&install.bin_dir_str()));
}

#[test]
fn check_rejects_missing_directory() {
    let work = tempfile::tempdir().expect("workdir");
    let output = queiju()
        .current_dir(work.path())
        .args(["check", "--path", "no/such/dir"])
        .output()
        .expect("queiju check");
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid path: no/such/dir"));
}
