//! Integration tests for top-level CLI behavior.

use std::path::PathBuf;
use std::process::Command;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn run_cli(args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_genai-replay");
    Command::new(bin)
        .args(args)
        .current_dir(fixtures())
        .env_remove("GOOGLE_GENAI_CLIENT_MODE")
        .env_remove("GOOGLE_GENAI_BACKEND")
        .env_remove("GOOGLE_GENAI_REPLAYS_DIRECTORY")
        .output()
        .expect("failed to run genai-replay binary")
}

#[test]
fn expand_lists_replay_ids_in_order() {
    let output = run_cli(&["expand", "tables/files_get.json"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let get = stdout.find("files_get/test_get ").expect("first case listed");
    let missing = stdout.find("files_get/test_get_missing").expect("second case listed");
    let local = stdout.find("files_get/test_get_local_only").expect("third case listed");
    assert!(get < missing && missing < local);
    assert!(stdout.contains("expect exception containing \"NOT_FOUND\""));
    assert!(stdout.contains("3 case(s) for backend mldev in replay mode."));
}

#[test]
fn expand_in_api_mode_reports_skips() {
    let output = run_cli(&["expand", "tables/files_get.json", "--mode", "api"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("skip (skipped in API mode: uses a file uploaded by another case)"));
}

#[test]
fn expand_reads_yaml_tables() {
    let output = run_cli(&["expand", "tables/generate_content.yaml", "--backend", "vertex"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("models_generate_content/test_simple_text"));
    assert!(stdout.contains("models_generate_content/test_quota_vertex"));
    assert!(stdout.contains("expect exception containing \"quota exceeded\""));
}

#[test]
fn check_passes_when_every_session_is_recorded() {
    let output = run_cli(&["check", "tables/files_get.json"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("ok       files_get/test_get (1 interaction(s))"));
    assert!(stdout.contains("All sessions present for backend mldev."));
}

#[test]
fn check_fails_listing_missing_sessions() {
    let output = run_cli(&["check", "tables/generate_content.yaml"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stdout.contains("missing  models_generate_content/test_quota_vertex"));
    assert!(stderr.contains("1 case(s) without a usable session"));
}

#[test]
fn check_is_per_backend() {
    let output = run_cli(&["check", "tables/files_get.json", "--backend", "vertex"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("3 case(s) without a usable session"));
}

#[test]
fn replays_directory_comes_from_environment() {
    let bin = env!("CARGO_BIN_EXE_genai-replay");
    let output = Command::new(bin)
        .args(["check", "tests/fixtures/tables/files_get.json"])
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env_remove("GOOGLE_GENAI_CLIENT_MODE")
        .env_remove("GOOGLE_GENAI_BACKEND")
        .env("GOOGLE_GENAI_REPLAYS_DIRECTORY", fixtures().join("replays"))
        .output()
        .expect("failed to run genai-replay binary");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
}

#[test]
fn inspect_summarizes_interactions() {
    let output = run_cli(&["inspect", "files_get/test_get_missing"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("Session: files_get/test_get_missing"));
    assert!(stdout.contains("GET /files/does-not-exist"));
    assert!(stdout.contains("404"));
}

#[test]
fn inspect_unknown_session_exits_with_error() {
    let output = run_cli(&["inspect", "files_get/nope"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("no recorded session `files_get/nope`"));
}

#[test]
fn invalid_backend_env_is_a_config_error() {
    let bin = env!("CARGO_BIN_EXE_genai-replay");
    let output = Command::new(bin)
        .args(["expand", "tables/files_get.json"])
        .current_dir(fixtures())
        .env("GOOGLE_GENAI_BACKEND", "bard")
        .output()
        .expect("failed to run genai-replay binary");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unknown backend `bard`"));
}

#[test]
fn invalid_subcommand_exits_with_error() {
    let output = run_cli(&["nonsense"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unrecognized subcommand"));
}
