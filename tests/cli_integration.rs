//! CLI integration tests for calgrid
//!
//! These tests run the binary against real task files and verify the
//! commands, formats, and exit codes work together correctly.

use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Get a command instance for the calgrid binary
fn calgrid_cmd() -> assert_cmd::Command {
    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("calgrid"))
}

/// Writes a task file with two overlapping tasks and one clean one
fn write_sample_tasks(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("tasks.json");
    fs::write(
        &path,
        r#"[
  {"id": "report", "name": "Write report", "priority": 4,
   "start_date": "2026-01-05T00:00:00Z", "end_date": "2026-01-10T00:00:00Z"},
  {"id": "review", "name": "Review cycle", "assignee": "sam",
   "start_date": "2026-01-08T00:00:00Z", "end_date": "2026-01-15T00:00:00Z"},
  {"id": "launch", "name": "Launch", "is_milestone": true, "priority": 5,
   "start_date": "2026-01-20T00:00:00Z", "end_date": "2026-01-20T00:00:00Z"}
]"#,
    )
    .unwrap();
    path
}

// =============================================================================
// Layout Tests
// =============================================================================

#[test]
fn test_layout_text_summary() {
    let dir = TempDir::new().unwrap();
    let tasks = write_sample_tasks(&dir);

    calgrid_cmd()
        .arg("layout")
        .arg(&tasks)
        .assert()
        .success()
        .stdout(predicate::str::contains("Layout computed for 3 task(s)"));
}

#[test]
fn test_layout_json_contains_all_stages() {
    let dir = TempDir::new().unwrap();
    let tasks = write_sample_tasks(&dir);

    let output = calgrid_cmd()
        .args(["layout", "--format", "json"])
        .arg(&tasks)
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(json["task_count"], 3);
    assert_eq!(json["overlaps"]["overlaps"].as_array().unwrap().len(), 1);
    assert_eq!(json["ranking"]["priorities"].as_array().unwrap().len(), 3);
    assert!(!json["resolution"]["recommendations"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[test]
fn test_layout_honors_config_file() {
    let dir = TempDir::new().unwrap();
    let tasks = write_sample_tasks(&dir);
    let config = dir.path().join("calgrid.toml");
    fs::write(
        &config,
        r#"
calendar_start = "2026-01-01T00:00:00Z"

[grid]
day_width = 10.0
"#,
    )
    .unwrap();

    let output = calgrid_cmd()
        .args(["layout", "--format", "json", "--config"])
        .arg(&config)
        .arg(&tasks)
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    // "report" starts Jan 5, four days past the window start at 10/day,
    // plus the high-priority 3-unit margin
    let bars = json["positioned"]["bars"].as_array().unwrap();
    let report_bar = bars
        .iter()
        .find(|b| b["task_id"] == "report")
        .expect("bar for report");
    assert_eq!(report_bar["start_x"].as_f64().unwrap(), 43.0);
}

#[test]
fn test_layout_rejects_missing_file() {
    calgrid_cmd()
        .args(["layout", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read task file"));
}

// =============================================================================
// Overlaps Tests
// =============================================================================

#[test]
fn test_overlaps_reports_partial_overlap() {
    let dir = TempDir::new().unwrap();
    let tasks = write_sample_tasks(&dir);

    calgrid_cmd()
        .arg("overlaps")
        .arg(&tasks)
        .assert()
        .success()
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("review"))
        .stdout(predicate::str::contains("partial"))
        .stdout(predicate::str::contains("group_0"));
}

#[test]
fn test_overlaps_clean_schedule() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");
    fs::write(
        &path,
        r#"[
  {"id": "a", "name": "A", "start_date": "2026-01-05T00:00:00Z", "end_date": "2026-01-06T00:00:00Z"},
  {"id": "b", "name": "B", "start_date": "2026-01-10T00:00:00Z", "end_date": "2026-01-11T00:00:00Z"}
]"#,
    )
    .unwrap();

    calgrid_cmd()
        .arg("overlaps")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("No overlaps"));
}

// =============================================================================
// Rank Tests
// =============================================================================

#[test]
fn test_rank_orders_tasks() {
    let dir = TempDir::new().unwrap();
    let tasks = write_sample_tasks(&dir);

    calgrid_cmd()
        .arg("rank")
        .arg(&tasks)
        .assert()
        .success()
        .stdout(predicate::str::contains("RANK"))
        .stdout(predicate::str::contains("launch"));
}

#[test]
fn test_rank_top_limits_output() {
    let dir = TempDir::new().unwrap();
    let tasks = write_sample_tasks(&dir);

    let output = calgrid_cmd()
        .args(["rank", "--format", "json", "--top", "1"])
        .arg(&tasks)
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 1);
}

// =============================================================================
// Check Tests
// =============================================================================

#[test]
fn test_check_passes_valid_file() {
    let dir = TempDir::new().unwrap();
    let tasks = write_sample_tasks(&dir);

    calgrid_cmd()
        .arg("check")
        .arg(&tasks)
        .assert()
        .success()
        .stdout(predicate::str::contains("conflict"));
}

#[test]
fn test_check_fails_on_inverted_dates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");
    fs::write(
        &path,
        r#"[
  {"id": "bad", "name": "Backwards", "start_date": "2026-01-10T00:00:00Z", "end_date": "2026-01-05T00:00:00Z"}
]"#,
    )
    .unwrap();

    calgrid_cmd()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("validation error"));
}

#[test]
fn test_yaml_tasks_are_accepted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.yaml");
    fs::write(
        &path,
        r#"
- id: t1
  name: Planning
  start_date: 2026-01-05T00:00:00Z
  end_date: 2026-01-10T00:00:00Z
"#,
    )
    .unwrap();

    calgrid_cmd()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("no validation issues"));
}
