//! End-to-end tests for the `skirmish` binary
//!
//! Each test runs the compiled binary from the workspace root and checks its
//! exit status and output.

use skirmish_search::scenario::Scenario;
use std::path::PathBuf;
use std::process::{Command, Output};

fn run_skirmish(args: &[&str]) -> Output {
    let workspace_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    Command::new(env!("CARGO_BIN_EXE_skirmish"))
        .args(args)
        .current_dir(&workspace_root)
        .output()
        .unwrap_or_else(|e| panic!("Failed to execute skirmish {args:?}: {e}"))
}

fn assert_success(output: &Output) -> String {
    if !output.status.success() {
        eprintln!("--- STDOUT ---");
        eprintln!("{}", String::from_utf8_lossy(&output.stdout));
        eprintln!("--- STDERR ---");
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        panic!(
            "skirmish failed with exit code: {}",
            output.status.code().unwrap_or(-1)
        );
    }
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_search_json_output() {
    let stdout = assert_success(&run_skirmish(&[
        "search",
        "tests/scenarios/approach.json",
        "--json",
    ]));

    let outcome: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON outcome");
    assert_eq!(outcome["best_move"]["mover"], "friendly");
    assert_eq!(outcome["best_move"]["actions"][0]["kind"], "move");
    assert!(outcome["stats"]["nodes_searched"].as_u64().unwrap() > 0);
}

#[test]
fn test_search_text_output_lists_orders() {
    let stdout = assert_success(&run_skirmish(&[
        "search",
        "tests/scenarios/in_range.json",
        "--order",
        "closest",
        "-v",
        "minimal",
    ]));

    assert!(stdout.contains("score"), "missing summary line:\n{stdout}");
    assert!(stdout.contains("depth"), "missing summary line:\n{stdout}");
}

#[test]
fn test_random_prints_loadable_scenario() {
    let stdout = assert_success(&run_skirmish(&["random", "--seed", "7", "--units", "2"]));

    let scenario = Scenario::from_json(&stdout).expect("random output parses as a scenario");
    assert_eq!(scenario.friendly.len(), 2);
    assert_eq!(scenario.hostile.len(), 2);
    assert_eq!(scenario.name.as_deref(), Some("random-7"));
}

#[test]
fn test_zero_depth_is_rejected() {
    let output = run_skirmish(&["search", "tests/scenarios/approach.json", "--depth", "0"]);
    assert!(!output.status.success(), "depth 0 should be a configuration error");
}

#[test]
fn test_missing_scenario_file_fails() {
    let output = run_skirmish(&["search", "tests/scenarios/does_not_exist.json"]);
    assert!(!output.status.success());
}

#[test]
fn test_scripted_tourney() {
    let stdout = assert_success(&run_skirmish(&[
        "tourney",
        "--games",
        "4",
        "--friendly",
        "closest",
        "--hostile",
        "hold",
    ]));

    assert!(stdout.contains("Games:"), "missing summary:\n{stdout}");
    assert!(stdout.contains("Friendly wins:"), "missing summary:\n{stdout}");
}

#[test]
fn test_playout_runs_to_completion() {
    assert_success(&run_skirmish(&[
        "playout",
        "tests/scenarios/in_range.json",
        "--friendly",
        "closest",
        "--hostile",
        "closest",
        "--max-time",
        "20",
        "-v",
        "silent",
    ]));
}
