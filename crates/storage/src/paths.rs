#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::Command;

use crate::error::StoreError;

/// The directory every on-disk file lives under: `<git-dir>/info/`.
pub fn info_dir() -> Result<PathBuf, StoreError> {
    let git_dir = git_dir()?;
    Ok(git_dir.join("info"))
}

pub fn trailer_index_path() -> Result<PathBuf, StoreError> {
    Ok(info_dir()?.join("trailer-index.json"))
}

pub fn working_memory_path() -> Result<PathBuf, StoreError> {
    Ok(info_dir()?.join("working-memory.json"))
}

pub fn rlm_config_path() -> Result<PathBuf, StoreError> {
    Ok(info_dir()?.join("rlm-config.json"))
}

pub fn session_summary_path(session_slug: &str) -> Result<PathBuf, StoreError> {
    Ok(info_dir()?.join(format!("session-summary-{session_slug}.md")))
}

/// `git rev-parse --git-dir`, resolved relative to the current working directory.
pub fn git_dir() -> Result<PathBuf, StoreError> {
    let output = Command::new("git")
        .args(["rev-parse", "--git-dir"])
        .output()
        .map_err(|_| StoreError::GitDirNotFound)?;
    if !output.status.success() {
        return Err(StoreError::GitDirNotFound);
    }
    let raw = String::from_utf8_lossy(&output.stdout);
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StoreError::GitDirNotFound);
    }
    Ok(PathBuf::from(trimmed))
}

/// A filesystem-safe slug for a session id, used in the session-summary filename.
pub fn slugify(session_id: &str) -> String {
    session_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_replaces_non_alphanumeric() {
        assert_eq!(slugify("2024-05-01/auth"), "2024-05-01-auth");
        assert_eq!(slugify("plain-session"), "plain-session");
    }
}
