#![forbid(unsafe_code)]

use std::process::Command;

use crate::error::StoreError;

const RECORD_FORMAT: &str = "---commit---%nHash: %H%nDate: %aI%nSubject: %s%n%b";
const RECORD_SEPARATOR: &str = "---commit---";

/// Runs `git log -<limit> --format=<RECORD_FORMAT>` and splits the output back into the
/// per-commit blocks `agentmem_core::parser::parse_commit_block` expects, most recent first.
pub fn log_commit_blocks(limit: u32) -> Result<Vec<String>, StoreError> {
    let output = Command::new("git")
        .args(["log", &format!("-{limit}"), &format!("--format={RECORD_FORMAT}")])
        .output()
        .map_err(|e| StoreError::GitLogFailed { stderr: e.to_string() })?;
    if !output.status.success() {
        return Err(StoreError::GitLogFailed {
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    let raw = String::from_utf8_lossy(&output.stdout);
    Ok(split_blocks(&raw))
}

fn split_blocks(raw: &str) -> Vec<String> {
    raw.split(RECORD_SEPARATOR)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(str::to_string)
        .collect()
}

/// `git rev-parse HEAD`, used both to stamp a freshly built index and to check one's freshness.
pub fn head_commit() -> Result<String, StoreError> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .map_err(|_| StoreError::HeadNotFound)?;
    if !output.status.success() {
        return Err(StoreError::HeadNotFound);
    }
    let head = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if head.is_empty() {
        return Err(StoreError::HeadNotFound);
    }
    Ok(head)
}

/// Runs `git log` with already-validated arguments (the sandbox's `gitLog` effect validates the
/// allow-list before this is ever called; this function trusts its caller and does not
/// re-validate). `args` are appended after `log` verbatim.
pub fn run_log_args(args: &[String]) -> Result<String, StoreError> {
    let output = Command::new("git")
        .arg("log")
        .args(args)
        .output()
        .map_err(|e| StoreError::GitLogFailed { stderr: e.to_string() })?;
    if !output.status.success() {
        return Err(StoreError::GitLogFailed {
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
