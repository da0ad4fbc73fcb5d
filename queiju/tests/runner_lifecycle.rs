//! Lifecycle tests driving a runner through several runs against fake QE binaries.
//!
//! Each test installs shell-script stand-ins for `pw.x` and `bands.x` and runs
//! them in a private working directory.

#![cfg(unix)]

use std::fs;

use queiju::test_support::{FakeQeInstall, StaticLookup};
use queiju::{ErrorKind, QeCommand, Runner};

/// scf → bands sequence with a rejected command in between.
///
/// Verifies that each run overwrites output, file listing and elapsed time, and that a
/// rejected command leaves the previous run's results in place.
#[test]
fn scf_then_bands_overwrites_run_state() {
    let install = FakeQeInstall::new().expect("install");
    let work = tempfile::tempdir().expect("workdir");
    let mut runner = Runner::builder("&CONTROL\n  calculation = 'scf'\n/\n")
        .path(install.bin_dir_str())
        .workdir(work.path())
        .lookup(StaticLookup::none())
        .build()
        .expect("build");

    runner.run("pw.x").expect("pw.x");
    let scf_output = runner.output_text().to_string();
    assert!(scf_output.contains("calculation = 'scf'"));
    assert!(
        runner
            .modified_files()
            .contains("./out/pwscf.save/data-file-schema.xml")
    );
    runner.save_output(work.path().join("scf.out")).expect("save scf");

    let err = runner.run("ph.x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidCommand);
    assert_eq!(runner.output_text(), scf_output);

    runner.run_command(QeCommand::Bands).expect("bands.x");
    assert!(runner.output_text().contains("Program BANDS"));
    let files: Vec<&str> = runner.modified_files().lines().collect();
    assert!(files.contains(&"./bands.dat"));
    assert!(
        !files.contains(&"./out/pwscf.save/data-file-schema.xml"),
        "files from the scf run predate the new marker"
    );
    assert!(
        !files.contains(&"./scf.out"),
        "saved output predates the new marker"
    );

    let saved = fs::read_to_string(work.path().join("scf.out")).expect("read scf.out");
    assert_eq!(saved, format!("{scf_output}\n"));
}

/// Reconfiguring the binary directory between runs switches which binaries run.
#[test]
fn set_path_switches_installs_between_runs() {
    let first = FakeQeInstall::new().expect("first install");
    let second = FakeQeInstall::new().expect("second install");
    second
        .write_script(QeCommand::Pw, "cat > /dev/null\necho 'second install'\n")
        .expect("script");
    let work = tempfile::tempdir().expect("workdir");

    let mut runner = Runner::builder("")
        .path(first.bin_dir_str())
        .workdir(work.path())
        .lookup(StaticLookup::none())
        .build()
        .expect("build");
    runner.run("pw.x").expect("first run");
    assert!(runner.output_text().contains("Program PWSCF"));

    runner.set_path(&second.bin_dir_str()).expect("switch");
    runner.run("pw.x").expect("second run");
    assert_eq!(runner.output_text(), "second install\n");
}

/// Construction with an empty path and no `pw.x` on `PATH` fails up front.
#[test]
fn missing_qe_on_path_fails_construction() {
    let work = tempfile::tempdir().expect("workdir");
    let err = Runner::builder("&CONTROL\n/\n")
        .workdir(work.path())
        .lookup(StaticLookup::none())
        .build()
        .unwrap_err();
    assert_eq!(err.to_string(), "queiju: QE not found in PATH");
}
