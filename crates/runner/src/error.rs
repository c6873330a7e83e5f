#![forbid(unsafe_code)]

use std::fmt;

/// Every fallible outcome crossing the runner's boundary (§7): hook-path failures are caught
/// and degraded by the caller, never propagated to a process exit code.
#[derive(Debug)]
pub enum RunnerError {
    Core(agentmem_core::CoreError),
    Store(agentmem_store::StoreError),
    Sandbox(agentmem_sandbox::SandboxError),
    LlmRequestFailed { status: Option<u16>, message: String },
    LlmBudgetExhausted,
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core(e) => write!(f, "{e}"),
            Self::Store(e) => write!(f, "{e}"),
            Self::Sandbox(e) => write!(f, "{e}"),
            Self::LlmRequestFailed { status, message } => {
                write!(f, "llm-request-failed: {message}")?;
                if let Some(status) = status {
                    write!(f, " (status {status})")?;
                }
                Ok(())
            }
            Self::LlmBudgetExhausted => write!(f, "llm-budget-exhausted"),
            Self::Io(e) => write!(f, "io-failed: {e}"),
            Self::Json(e) => write!(f, "io-failed: {e}"),
        }
    }
}

impl std::error::Error for RunnerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Core(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::Sandbox(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::LlmRequestFailed { .. } | Self::LlmBudgetExhausted => None,
        }
    }
}

impl From<agentmem_core::CoreError> for RunnerError {
    fn from(e: agentmem_core::CoreError) -> Self {
        Self::Core(e)
    }
}

impl From<agentmem_store::StoreError> for RunnerError {
    fn from(e: agentmem_store::StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<agentmem_sandbox::SandboxError> for RunnerError {
    fn from(e: agentmem_sandbox::SandboxError) -> Self {
        Self::Sandbox(e)
    }
}

impl From<std::io::Error> for RunnerError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for RunnerError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl RunnerError {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Core(e) => e.tag(),
            Self::Store(e) => e.tag(),
            Self::Sandbox(e) => e.tag(),
            Self::LlmRequestFailed { .. } => "llm-request-failed",
            Self::LlmBudgetExhausted => "llm-budget-exhausted",
            Self::Io(_) | Self::Json(_) => "io-failed",
        }
    }
}
