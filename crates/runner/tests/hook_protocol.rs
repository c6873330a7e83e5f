#![forbid(unsafe_code)]

use std::io::Write;
use std::process::{Command, Stdio};

/// Runs the `agentmem` binary with `args`, feeding `stdin` and capturing stdout/stderr, from a
/// scratch directory with no git repository — exercising the "setup failed" path every hook
/// must degrade through rather than fail (§7).
fn run_hook(args: &[&str], stdin: &str) -> (String, i32) {
    let dir = std::env::temp_dir().join(format!(
        "agentmem-hook-test-{}-{}",
        args.join("-"),
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_agentmem"))
        .args(args)
        .current_dir(&dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn agentmem");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    let output = child.wait_with_output().expect("wait for agentmem");
    std::fs::remove_dir_all(&dir).ok();
    (
        String::from_utf8_lossy(&output.stdout).into_owned(),
        output.status.code().unwrap_or(-1),
    )
}

#[test]
fn prompt_submit_degrades_to_empty_matches_outside_a_git_repo() {
    let (stdout, code) = run_hook(
        &["prompt-submit"],
        r#"{"hook_event_name":"UserPromptSubmit","session_id":"2026-01-01/demo","prompt":"fix the auth login bug"}"#,
    );
    assert_eq!(code, 0);
    assert!(stdout.starts_with("<matches count=\"0\">"));
    assert!(stdout.contains("</matches>"));
}

#[test]
fn post_tool_is_silent_without_a_directive() {
    let (stdout, code) = run_hook(
        &["post-tool"],
        r#"{"hook_event_name":"PostToolUse","tool_name":"Bash","tool_input":{"command":"ls"},"tool_response":{"stdout":"Cargo.toml\n"}}"#,
    );
    assert_eq!(code, 0);
    assert!(stdout.is_empty());
}

#[test]
fn post_tool_emits_matches_when_directive_present() {
    let (stdout, code) = run_hook(
        &["post-tool"],
        r#"{"hook_event_name":"PostToolUse","tool_name":"Bash","tool_input":{"command":"echo hi"},"tool_response":{"stdout":"AGENTMEM-QUERY: {\"scope\":\"auth\"}\n"}}"#,
    );
    assert_eq!(code, 0);
    assert!(stdout.starts_with("<matches count=\"0\">"));
}

#[test]
fn session_stop_is_silent_without_working_memory() {
    let (stdout, code) = run_hook(
        &["session-stop"],
        r#"{"hook_event_name":"Stop","session_id":"2026-01-01/demo"}"#,
    );
    assert_eq!(code, 0);
    assert!(stdout.is_empty());
}

#[test]
fn unknown_subcommand_exits_with_usage_error() {
    let (_stdout, code) = run_hook(&["not-a-real-subcommand"], "");
    assert_eq!(code, 2);
}

#[test]
fn config_show_prints_defaults_as_json() {
    let (stdout, code) = run_hook(&["config", "show"], "");
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(stdout.trim()).expect("valid json");
    assert_eq!(parsed["enabled"], false);
    assert_eq!(parsed["endpoint"], "http://localhost:11434");
}
