//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify the JSON it prints.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

const NOW: &str = "2024-06-01T08:00:00";

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_clinic-scheduler"))
        .env("CLINIC_SCHEDULER_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .args(["--now", NOW])
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &Path, args: &[&str]) -> Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "CLI command failed {args:?}: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

fn book(data_dir: &Path, professional: &str, date: &str, time: &str) -> (String, String, i32) {
    run_cli(
        data_dir,
        &[
            "book",
            "--patient",
            "patient-1",
            "--professional",
            professional,
            "--date",
            date,
            "--time",
            time,
        ],
    )
}

#[test]
fn test_slots_lists_default_table() {
    let dir = tempfile::tempdir().unwrap();
    let slots = run_json(dir.path(), &["slots"]);
    let slots = slots.as_array().unwrap();
    assert_eq!(slots.len(), 24);
    assert_eq!(slots[0], "08:00");
    assert_eq!(slots[23], "19:30");
}

#[test]
fn test_book_persists_between_invocations() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = book(dir.path(), "prof-a", "2024-06-10", "09:00");
    assert_eq!(code, 0);
    let session: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(session["time_slot"], "09:00");
    assert_eq!(session["session_type"], "therapy");
    assert_eq!(session["duration_minutes"], 30);

    let listed = run_json(dir.path(), &["list", "--date", "2024-06-10"]);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], session["id"]);
}

#[test]
fn test_fourth_booking_fails_with_reason_code() {
    let dir = tempfile::tempdir().unwrap();
    for pro in ["prof-a", "prof-b", "prof-c"] {
        assert_eq!(book(dir.path(), pro, "2024-06-10", "09:00").2, 0);
    }

    let (_, stderr, code) = book(dir.path(), "prof-d", "2024-06-10", "09:00");
    assert_eq!(code, 1);
    assert!(stderr.contains("error: capacity_exceeded"), "stderr: {stderr}");

    let report = run_json(
        dir.path(),
        &["check", "--date", "2024-06-10", "--time", "09:00"],
    );
    assert_eq!(report["is_bookable"], false);
    assert_eq!(report["occupancy"], 3);
}

#[test]
fn test_double_booking_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(book(dir.path(), "prof-a", "2024-06-10", "10:00").2, 0);
    let (_, stderr, code) = book(dir.path(), "prof-a", "2024-06-10", "10:00");
    assert_eq!(code, 1);
    assert!(stderr.contains("professional_double_booked"), "stderr: {stderr}");
}

#[test]
fn test_recur_reports_skipped_occurrences() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(book(dir.path(), "prof-a", "2024-06-17", "09:00").2, 0);

    let result = run_json(
        dir.path(),
        &[
            "recur",
            "--patient",
            "patient-2",
            "--professional",
            "prof-a",
            "--date",
            "2024-06-10",
            "--time",
            "09:00",
            "--frequency",
            "weekly",
            "--count",
            "4",
        ],
    );
    assert_eq!(result["committed"].as_array().unwrap().len(), 3);
    assert_eq!(result["skipped"].as_array().unwrap().len(), 1);
    assert_eq!(result["skipped"][0]["reason"], "professional_double_booked");

    let listed = run_json(dir.path(), &["list", "--professional", "prof-a"]);
    assert_eq!(listed.as_array().unwrap().len(), 4);
}

#[test]
fn test_recur_rejects_zero_interval() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(
        dir.path(),
        &[
            "recur",
            "--patient",
            "patient-2",
            "--professional",
            "prof-a",
            "--date",
            "2024-06-10",
            "--time",
            "09:00",
            "--frequency",
            "weekly",
            "--interval",
            "0",
            "--count",
            "4",
        ],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("invalid_recurrence"), "stderr: {stderr}");
}

#[test]
fn test_move_and_remove() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, _) = book(dir.path(), "prof-a", "2024-06-10", "09:00");
    let session: Value = serde_json::from_str(&stdout).unwrap();
    let id = session["id"].as_str().unwrap();

    let outcome = run_json(
        dir.path(),
        &["move", id, "--date", "2024-06-11", "--time", "15:00"],
    );
    assert_eq!(outcome["moved"], true);
    assert_eq!(outcome["session"]["date"], "2024-06-11");

    let listed = run_json(dir.path(), &["list", "--date", "2024-06-11"]);
    assert_eq!(listed[0]["time_slot"], "15:00");

    let removed = run_json(dir.path(), &["remove", id]);
    assert_eq!(removed["id"], id);
    let listed = run_json(dir.path(), &["list"]);
    assert!(listed.as_array().unwrap().is_empty());

    let (_, stderr, code) = run_cli(dir.path(), &["remove", id]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not_found"), "stderr: {stderr}");
}

#[test]
fn test_week_overview_has_seven_days() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(book(dir.path(), "prof-a", "2024-06-12", "09:00").2, 0);
    let week = run_json(dir.path(), &["week", "--date", "2024-06-12"]);
    let days = week.as_array().unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(days[0]["date"], "2024-06-10");
}

#[test]
fn test_config_get_set_reset() {
    let dir = tempfile::tempdir().unwrap();
    let value = run_json(dir.path(), &["config", "get", "booking.capacity"]);
    assert_eq!(value["value"], "3");

    let value = run_json(dir.path(), &["config", "set", "clinic.closing_time", "18:00"]);
    assert_eq!(value["value"], "18:00");
    let slots = run_json(dir.path(), &["slots"]);
    assert_eq!(slots.as_array().unwrap().len(), 20);

    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "booking.capacity", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error: Validation error"), "stderr: {stderr}");

    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "booking.capacity", "4"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("booking.capacity"), "stderr: {stderr}");
    let value = run_json(dir.path(), &["config", "get", "booking.capacity"]);
    assert_eq!(value["value"], "3");

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "nope"]);
    assert_eq!(code, 1);

    let config = run_json(dir.path(), &["config", "reset"]);
    assert_eq!(config["clinic"]["closing_time"], "20:00");
}
