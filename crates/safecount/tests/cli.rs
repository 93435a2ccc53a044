//! `safecount` binary: exit codes and JSON reports.

use pretty_assertions::assert_eq;
use serde_json::Value;
use std::io::Write;
use std::process::{Command, Output};

fn safecount(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_safecount"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("binary should start")
}

fn reports(output: &Output) -> Vec<Value> {
    serde_json::from_slice::<Value>(&output.stdout)
        .expect("stdout should be JSON")
        .as_array()
        .expect("reports should be an array")
        .clone()
}

fn counters(reports: &[Value]) -> Vec<&str> {
    reports
        .iter()
        .map(|report| report["counter"].as_str().unwrap())
        .collect()
}

#[test]
fn run_actor_exits_zero_with_exact_count() {
    let output = safecount(&["run", "-s", "actor", "-w", "2", "-k", "1000", "--json"]);
    assert_eq!(output.status.code(), Some(0));

    let reports = reports(&output);
    assert_eq!(counters(&reports), vec!["actor"]);
    assert_eq!(reports[0]["final_value"], 2_000);
    assert_eq!(reports[0]["expected"], 2_000);
}

#[test]
fn run_uses_strategy_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"strategy = \"actor\"\n[actor]\nmailbox_capacity = 16\noverflow = \"block\"\n")
        .unwrap();
    let path = file.path().to_str().unwrap();

    let output = safecount(&["run", "-c", path, "-w", "3", "-k", "500", "--json"]);
    assert_eq!(output.status.code(), Some(0));

    let reports = reports(&output);
    assert_eq!(counters(&reports), vec!["actor"]);
    assert_eq!(reports[0]["final_value"], 1_500);
}

#[test]
fn compare_runs_both_strategies() {
    let output = safecount(&["compare", "-w", "4", "-k", "500", "--json"]);
    assert_eq!(output.status.code(), Some(0));

    let reports = reports(&output);
    assert_eq!(counters(&reports), vec!["lock", "actor"]);
    for report in &reports {
        assert_eq!(report["final_value"], 2_000);
    }
}

#[test]
fn race_passes_when_safe_strategies_are_exact() {
    let output = safecount(&["race", "-w", "4", "-k", "2000", "--json"]);
    assert_eq!(output.status.code(), Some(0));

    let reports = reports(&output);
    assert_eq!(counters(&reports), vec!["racy", "lock", "actor"]);

    // The baseline may lose updates but never invents them.
    let racy = reports[0]["final_value"].as_u64().unwrap();
    assert!(racy <= 8_000, "baseline overcounted: {racy}");
    assert_eq!(reports[1]["final_value"], 8_000);
    assert_eq!(reports[2]["final_value"], 8_000);
}

#[test]
fn text_output_names_counter() {
    let output = safecount(&["run", "-s", "lock", "-w", "1", "-k", "10"]);
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("lock: 1 workers x 10 increments"), "{stdout}");
    assert!(stdout.contains("final value: 10"), "{stdout}");
}

#[test]
fn invalid_config_exits_two() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"strategy = \"actor\"\n[actor]\nmailbox_capacity = 0\n")
        .unwrap();
    let path = file.path().to_str().unwrap();

    let output = safecount(&["run", "-c", path, "--json"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.starts_with("error:"), "{stderr}");
}

#[test]
fn missing_config_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let output = safecount(&["run", "-c", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
}
