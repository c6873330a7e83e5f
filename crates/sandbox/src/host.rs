#![forbid(unsafe_code)]

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::error::SandboxError;
use crate::gitlog_sanitizer;
use crate::protocol::{ChildMessage, HostMessage, SandboxEnv};

/// Default wall-clock budget for a single `execute` call, per §4.8.
pub const DEFAULT_EXECUTE_TIMEOUT: Duration = Duration::from_secs(2);

/// The settled outcome of one `execute` round trip.
#[derive(Clone, Debug)]
pub struct ExecuteOutcome {
    pub stdout: String,
    pub return_value: Option<Value>,
    pub error: Option<String>,
    pub done: bool,
    pub done_answer: Option<String>,
}

/// An effect the host performs on the child's behalf. Injected so the sandbox crate itself
/// never talks to a network or shells out directly.
pub trait LlmEffect {
    fn call(&mut self, messages: &Value) -> Result<String, String>;
}

impl<F: FnMut(&Value) -> Result<String, String>> LlmEffect for F {
    fn call(&mut self, messages: &Value) -> Result<String, String> {
        self(messages)
    }
}

pub trait GitLogEffect {
    fn call(&mut self, args: &[String]) -> Result<String, String>;
}

impl<F: FnMut(&[String]) -> Result<String, String>> GitLogEffect for F {
    fn call(&mut self, args: &[String]) -> Result<String, String> {
        self(args)
    }
}

/// Host-side handle to one spawned sandbox child. Owns the pipes; `execute` drives one
/// host/child round trip to completion (including any nested `llm-request`/`gitlog-request`
/// messages), bounded by a wall-clock timeout that does not terminate the child on expiry.
pub struct SandboxProcess {
    child: Child,
    stdin: ChildStdin,
    lines: Receiver<std::io::Result<String>>,
}

impl SandboxProcess {
    /// Spawns `bin_path` with no inherited environment or file descriptors beyond the three
    /// standard pipes, sends `init`, and waits for `ready`.
    pub fn spawn(bin_path: &Path, env: SandboxEnv) -> Result<Self, SandboxError> {
        let mut child = Command::new(bin_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env_clear()
            .spawn()
            .map_err(SandboxError::ChildSpawnFailed)?;

        let stdout = child.stdout.take().expect("piped stdout");
        let (tx, lines) = mpsc::channel();
        std::thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        let stdin = child.stdin.take().expect("piped stdin");
        let mut process = Self { child, stdin, lines };

        process.send(&HostMessage::Init { env })?;
        match process.recv(Duration::from_secs(5))? {
            ChildMessage::Ready => Ok(process),
            _ => Err(SandboxError::ChildIo(std::io::Error::other("expected ready"))),
        }
    }

    /// Runs `code`, servicing any `llm-request`/`gitlog-request` messages the child emits along
    /// the way, until it posts `result` or the overall timeout elapses.
    pub fn execute(
        &mut self,
        code: &str,
        timeout: Duration,
        mut llm_effect: impl LlmEffect,
        mut gitlog_effect: impl GitLogEffect,
    ) -> Result<ExecuteOutcome, SandboxError> {
        self.send(&HostMessage::Execute { code: code.to_string() })?;

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(SandboxError::ExecutionTimedOut);
            }
            let message = self.recv(remaining)?;
            match message {
                ChildMessage::Ready => continue,
                ChildMessage::LlmRequest { id, messages } => {
                    let (ok, err) = match llm_effect.call(&messages) {
                        Ok(text) => (Some(text), None),
                        Err(e) => (None, Some(e)),
                    };
                    self.send(&HostMessage::LlmResponse { id, ok, err })?;
                }
                ChildMessage::GitlogRequest { id, args } => {
                    let (ok, err) = match gitlog_sanitizer::sanitize(&args) {
                        Ok(sanitized) => match gitlog_effect.call(&sanitized) {
                            Ok(text) => (Some(text), None),
                            Err(e) => (None, Some(e)),
                        },
                        Err(sandbox_err) => (None, Some(sandbox_err.to_string())),
                    };
                    self.send(&HostMessage::GitlogResponse { id, ok, err })?;
                }
                ChildMessage::Result { stdout, return_value, error, done, done_answer } => {
                    return Ok(ExecuteOutcome { stdout, return_value, error, done, done_answer });
                }
            }
        }
    }

    /// Kills the child. Idempotent; safe to call after the child has already exited.
    pub fn terminate(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }

    fn send(&mut self, message: &HostMessage) -> Result<(), SandboxError> {
        let line = serde_json::to_string(message)?;
        writeln!(self.stdin, "{line}").map_err(SandboxError::ChildIo)?;
        self.stdin.flush().map_err(SandboxError::ChildIo)?;
        Ok(())
    }

    fn recv(&mut self, timeout: Duration) -> Result<ChildMessage, SandboxError> {
        match self.lines.recv_timeout(timeout) {
            Ok(Ok(line)) => Ok(serde_json::from_str(&line)?),
            Ok(Err(io_err)) => Err(SandboxError::ChildIo(io_err)),
            Err(RecvTimeoutError::Timeout) => Err(SandboxError::ExecutionTimedOut),
            Err(RecvTimeoutError::Disconnected) => Err(SandboxError::ChildExited),
        }
    }
}

impl Drop for SandboxProcess {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_outcome_carries_done_answer() {
        let outcome = ExecuteOutcome {
            stdout: "line\n".to_string(),
            return_value: None,
            error: None,
            done: true,
            done_answer: Some("42".to_string()),
        };
        assert!(outcome.done);
        assert_eq!(outcome.done_answer.as_deref(), Some("42"));
    }
}
