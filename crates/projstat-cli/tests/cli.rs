//! End-to-end tests for the `projstat` binary
//!
//! ## Exit Code Contract
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Rankings printed (and exported, or export failure reported) |
//! | 1 | Fatal configuration or environment error |

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use calamine::{open_workbook_auto, Reader};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use tempfile::{tempdir, TempDir};

fn projstat_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_projstat"))
}

fn run(args: &[&str]) -> Output {
    Command::new(projstat_binary())
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("PROJSTAT_DAY_LIMIT")
        .env_remove("PROJSTAT_MONTH_LIMIT")
        .env_remove("PROJSTAT_EMPLOYEE_LIMIT")
        .output()
        .expect("failed to execute projstat")
}

fn write_timesheet(path: &Path, project: &str, rows: &[((u16, u8, u8), &str, f64)]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let date_format = Format::new().set_num_format("dd.mm.yyyy");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(project).unwrap();
    sheet.write_string(0, 0, "Data").unwrap();
    sheet.write_string(0, 1, "Zadanie").unwrap();
    sheet.write_string(0, 2, "Czas [h]").unwrap();

    for (idx, ((y, m, d), task, hours)) in rows.iter().enumerate() {
        let line = idx as u32 + 1;
        let date = ExcelDateTime::from_ymd(*y, *m, *d).unwrap();
        sheet.write_datetime_with_format(line, 0, &date, &date_format).unwrap();
        sheet.write_string(line, 1, *task).unwrap();
        sheet.write_number(line, 2, *hours).unwrap();
    }

    workbook.save(path).unwrap();
}

/// alice (two files, overlapping rows) and bob
fn sample_tree() -> TempDir {
    let dir = tempdir().unwrap();
    write_timesheet(
        &dir.path().join("2024/alice.xlsx"),
        "Apollo",
        &[((2024, 1, 8), "Design", 6.0), ((2024, 1, 9), "Build", 8.0)],
    );
    write_timesheet(
        &dir.path().join("2024/archive/alice.xlsx"),
        "Apollo",
        &[((2024, 1, 9), "Build", 8.0), ((2024, 2, 1), "Review", 2.0)],
    );
    write_timesheet(
        &dir.path().join("2024/bob.xlsx"),
        "Gemini",
        &[((2024, 1, 8), "Support", 3.0), ((2024, 2, 1), "Support", 5.5)],
    );
    dir
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// =============================================================================
// Fatal conditions
// =============================================================================

#[test]
fn missing_input_exits_1_with_usage() {
    let output = run(&["-d"]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("Missing required input"));
    assert!(err.contains("Usage"));
}

#[test]
fn missing_ranking_type_exits_1() {
    let dir = sample_tree();
    let output = run(&["-i", dir.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Missing ranking type"));
}

#[test]
fn nonexistent_input_exits_1() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nowhere");
    let output = run(&["-i", missing.to_str().unwrap(), "-e"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("no timesheet workbooks"));
}

#[test]
fn folder_without_workbooks_exits_1() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    let output = run(&["-i", dir.path().to_str().unwrap(), "-m"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn folder_with_only_empty_workbooks_exits_1() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("alice.xls"), b"").unwrap();
    fs::write(dir.path().join("bob.xlsx"), b"").unwrap();

    let output = run(&["-i", dir.path().to_str().unwrap(), "-e"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("No employee timesheets"));
    assert!(!stdout(&output).contains("Ranking of employees"));
}

#[test]
fn diagnostics_are_plain_text_when_piped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("alice.xls"), b"not a workbook").unwrap();

    let output = run(&["-i", dir.path().to_str().unwrap(), "-e"]);
    assert_eq!(output.status.code(), Some(0));
    let err = stderr(&output);
    assert!(err.contains("skipping unreadable workbook"));
    assert!(!err.contains('\u{1b}'), "stderr carries ANSI escapes: {err:?}");
}

#[test]
fn unknown_flag_exits_1() {
    let output = run(&["--bogus"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn help_exits_0() {
    let output = run(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains("--input"));
    assert!(out.contains("--employee"));
}

// =============================================================================
// Rankings
// =============================================================================

#[test]
fn prints_selected_rankings_in_order() {
    let dir = sample_tree();
    let output = run(&["-i", dir.path().to_str().unwrap(), "-e", "-m", "-d"]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    let days = out.find("Ranking of the busiest days").unwrap();
    let months = out.find("Ranking of the busiest months").unwrap();
    let people = out.find("Ranking of employees by working hours").unwrap();
    assert!(days < months && months < people);

    // alice: 6 + 8 + 2 (duplicate Build row counted once), bob: 3 + 5.5
    assert!(out.contains("1. alice     16.00"));
    assert!(out.contains("2. bob        8.50"));
    assert!(out.contains("1. 2024-01-08      9.00"));
    assert!(out.contains("1. 2024-01     17.00"));
}

#[test]
fn output_is_deterministic() {
    let dir = sample_tree();
    let args = ["-i", dir.path().to_str().unwrap(), "-d", "-m", "-e"];
    let first = run(&args);
    let second = run(&args);
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn day_limit_truncates() {
    let dir = sample_tree();
    let output = run(&["-i", dir.path().to_str().unwrap(), "-d", "--day-limit", "1"]);
    let out = stdout(&output);
    assert!(out.contains("1. 2024-01-08"));
    assert!(!out.contains("2. "));
}

#[test]
fn json_output() {
    let dir = sample_tree();
    let output = run(&["-i", dir.path().to_str().unwrap(), "-e", "--format", "json"]);
    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains(r#""kind": "employee""#));
    assert!(out.contains(r#""key": "alice""#));
}

// =============================================================================
// Export
// =============================================================================

#[test]
fn export_writes_workbook() {
    let dir = sample_tree();
    let target = dir.path().join("rankings.xlsx");
    let output = run(&[
        "-i",
        dir.path().join("2024").to_str().unwrap(),
        "-d",
        "-e",
        "-x",
        target.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Excel file written successfully"));

    let workbook = open_workbook_auto(&target).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["Busiest days", "Most active employees"]);
}

#[test]
fn export_to_missing_directory_exits_1_after_printing() {
    let dir = sample_tree();
    let target = dir.path().join("missing/rankings.xlsx");
    let output = run(&["-i", dir.path().to_str().unwrap(), "-m", "-x", target.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Ranking of the busiest months"));
    assert!(stderr(&output).contains("not writable"));
    assert!(!target.exists());
}

#[test]
fn export_to_directory_path_exits_1() {
    let dir = sample_tree();
    let output = run(&[
        "-i",
        dir.path().to_str().unwrap(),
        "-m",
        "-x",
        dir.path().to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Invalid export path"));
}
