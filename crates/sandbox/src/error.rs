#![forbid(unsafe_code)]

use std::fmt;

/// Every fallible outcome crossing the sandbox's host/child boundary, including the `gitLog`
/// allow-list validation described in §4.8.
#[derive(Debug)]
pub enum SandboxError {
    DisallowedFlag { flag: String },
    InvalidN { value: String },
    DangerousCharacter { arg: String },
    ExecutionTimedOut,
    ChildSpawnFailed(std::io::Error),
    ChildIo(std::io::Error),
    ChildExited,
    Json(serde_json::Error),
}

impl fmt::Display for SandboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DisallowedFlag { flag } => write!(f, "disallowed-flag: {flag}"),
            Self::InvalidN { value } => write!(f, "invalid-n: {value}"),
            Self::DangerousCharacter { arg } => write!(f, "dangerous-character: {arg}"),
            Self::ExecutionTimedOut => write!(f, "sandbox-execution-timed-out"),
            Self::ChildSpawnFailed(err) => write!(f, "sandbox-spawn-failed: {err}"),
            Self::ChildIo(err) => write!(f, "sandbox-io-failed: {err}"),
            Self::ChildExited => write!(f, "sandbox-child-exited"),
            Self::Json(err) => write!(f, "sandbox-io-failed: {err}"),
        }
    }
}

impl std::error::Error for SandboxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ChildSpawnFailed(err) | Self::ChildIo(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SandboxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl SandboxError {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::DisallowedFlag { .. } => "disallowed-flag",
            Self::InvalidN { .. } => "invalid-n",
            Self::DangerousCharacter { .. } => "dangerous-character",
            Self::ExecutionTimedOut => "sandbox-execution-timed-out",
            Self::ChildSpawnFailed(_) => "sandbox-spawn-failed",
            Self::ChildIo(_) => "sandbox-io-failed",
            Self::ChildExited => "sandbox-child-exited",
            Self::Json(_) => "sandbox-io-failed",
        }
    }
}
