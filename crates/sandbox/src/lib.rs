#![forbid(unsafe_code)]

pub mod error;
pub mod gitlog_sanitizer;
pub mod host;
pub mod protocol;

pub use error::SandboxError;
pub use host::{ExecuteOutcome, SandboxProcess, DEFAULT_EXECUTE_TIMEOUT};
pub use protocol::{ChildMessage, HostMessage, SandboxEnv};
