#![forbid(unsafe_code)]

use std::fmt;

/// Every fallible outcome crossing the storage crate's boundary (§7).
#[derive(Debug)]
pub enum StoreError {
    GitLogFailed { stderr: String },
    GitDirNotFound,
    HeadNotFound,
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GitLogFailed { stderr } => write!(f, "git-log-failed: {stderr}"),
            Self::GitDirNotFound => write!(f, "io-failed: could not locate git directory"),
            Self::HeadNotFound => write!(f, "io-failed: could not resolve HEAD"),
            Self::Io(err) => write!(f, "io-failed: {err}"),
            Self::Json(err) => write!(f, "io-failed: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl StoreError {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::GitLogFailed { .. } => "git-log-failed",
            Self::GitDirNotFound | Self::HeadNotFound | Self::Io(_) | Self::Json(_) => "io-failed",
        }
    }
}
