use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use testdeck::report::{format_row, format_totals_row, GroupStats, BANNER};

/// A stand-in worker: a shell script that prints a canned report.
fn write_worker(dir: &Path, report: &str) -> PathBuf {
    let report_path = dir.join("report.txt");
    fs::write(&report_path, report).expect("write report");
    let script = dir.join("worker.sh");
    fs::write(&script, format!("#!/bin/sh\ncat {}\n", report_path.display())).expect("write script");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod");
    script
}

fn report_with_totals(totals: GroupStats) -> String {
    format!(
        "{BANNER}\n{}\n{}\n",
        format_row("deck.cards.SuitTest", &totals),
        format_totals_row(&totals)
    )
}

#[test]
fn missing_group_argument_is_a_usage_error() {
    let mut cmd = cargo_bin_cmd!("testdeck");
    let out = cmd.assert().code(2);
    let stderr = String::from_utf8(out.get_output().stderr.clone()).expect("utf8");
    assert!(stderr.contains("Usage"));
}

#[test]
fn help_lists_the_scripted_flags() {
    let mut cmd = cargo_bin_cmd!("testdeck");
    cmd.arg("--help");
    let out = cmd.assert().success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).expect("utf8");

    assert!(stdout.contains("--scripted"));
    assert!(stdout.contains("--worker"));
    assert!(stdout.contains("--stopwords"));
}

#[test]
fn scripted_run_echoes_the_report_and_exits_clean_on_success() {
    let temp = tempfile::tempdir().expect("tempdir");
    let report = report_with_totals(GroupStats::Ran {
        pass_percent: 100,
        fail: 0,
        err: 0,
        all: 4,
    });
    let worker = write_worker(temp.path(), &report);

    let mut cmd = cargo_bin_cmd!("testdeck");
    cmd.arg("deck")
        .arg("--scripted")
        .arg("--worker")
        .arg(&worker)
        .current_dir(temp.path());
    let out = cmd.assert().code(0);
    let stdout = String::from_utf8(out.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.contains("TOTALS"));
    assert!(stdout.contains("deck.cards.SuitTest"));
}

#[test]
fn scripted_run_exits_two_when_anything_failed() {
    let temp = tempfile::tempdir().expect("tempdir");
    let report = report_with_totals(GroupStats::Ran {
        pass_percent: 75,
        fail: 1,
        err: 0,
        all: 4,
    });
    let worker = write_worker(temp.path(), &report);

    let mut cmd = cargo_bin_cmd!("testdeck");
    cmd.arg("deck")
        .arg("--scripted")
        .arg("--worker")
        .arg(&worker)
        .current_dir(temp.path());
    cmd.assert().code(2);
}

#[test]
fn a_worker_that_prints_garbage_is_an_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let worker = write_worker(temp.path(), "no banner here\n");

    let mut cmd = cargo_bin_cmd!("testdeck");
    cmd.arg("deck")
        .arg("--scripted")
        .arg("--worker")
        .arg(&worker)
        .current_dir(temp.path());
    let out = cmd.assert().code(1);
    let stderr = String::from_utf8(out.get_output().stderr.clone()).expect("utf8");
    assert!(stderr.contains("screen=scripted event=fault"));
}

#[test]
fn missing_explicit_config_path_exits_nonzero() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut cmd = cargo_bin_cmd!("testdeck");
    cmd.arg("deck")
        .arg("--scripted")
        .arg("--config")
        .arg(temp.path().join("missing.toml"))
        .current_dir(temp.path());
    cmd.assert().failure();
}
