#![forbid(unsafe_code)]

use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};

use agentmem_core::TrailerIndex;
use agentmem_sandbox::protocol::{ChildMessage, HostMessage, SandboxEnv};

fn empty_env() -> SandboxEnv {
    SandboxEnv {
        index: TrailerIndex {
            version: TrailerIndex::CURRENT_VERSION,
            generated: "2024-05-01T00:00:00Z".to_string(),
            head_commit: "deadbeef".to_string(),
            commit_count: 0,
            by_intent: Default::default(),
            by_scope: Default::default(),
            by_session: Default::default(),
            with_decided_against: Default::default(),
            commits: Default::default(),
            commit_order: Vec::new(),
        },
        working_memory: None,
        scope_keys: vec!["auth/login".to_string()],
    }
}

struct ChildHandle {
    child: std::process::Child,
    stdin: std::process::ChildStdin,
    stdout: BufReader<std::process::ChildStdout>,
}

impl ChildHandle {
    fn spawn() -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_agentmem-sandbox"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn sandbox child");
        let stdin = child.stdin.take().unwrap();
        let stdout = BufReader::new(child.stdout.take().unwrap());
        Self { child, stdin, stdout }
    }

    fn send(&mut self, message: &HostMessage) {
        let line = serde_json::to_string(message).unwrap();
        writeln!(self.stdin, "{line}").unwrap();
        self.stdin.flush().unwrap();
    }

    fn recv(&mut self) -> ChildMessage {
        let mut line = String::new();
        self.stdout.read_line(&mut line).unwrap();
        serde_json::from_str(line.trim()).unwrap()
    }
}

impl Drop for ChildHandle {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[test]
fn child_replies_ready_after_init() {
    let mut handle = ChildHandle::spawn();
    handle.send(&HostMessage::Init { env: empty_env() });
    let reply = handle.recv();
    assert!(matches!(reply, ChildMessage::Ready));
}

#[test]
fn execute_with_done_reports_done_answer() {
    let mut handle = ChildHandle::spawn();
    handle.send(&HostMessage::Init { env: empty_env() });
    assert!(matches!(handle.recv(), ChildMessage::Ready));

    handle.send(&HostMessage::Execute { code: "console.log('hi'); done('finished');".to_string() });
    let reply = handle.recv();
    match reply {
        ChildMessage::Result { stdout, done, done_answer, error, .. } => {
            assert_eq!(stdout, "hi\n");
            assert!(done);
            assert_eq!(done_answer.as_deref(), Some("finished"));
            assert!(error.is_none());
        }
        other => panic!("expected result, got {other:?}"),
    }
}

#[test]
fn execute_reports_thrown_error() {
    let mut handle = ChildHandle::spawn();
    handle.send(&HostMessage::Init { env: empty_env() });
    assert!(matches!(handle.recv(), ChildMessage::Ready));

    handle.send(&HostMessage::Execute { code: "throw new Error('boom');".to_string() });
    match handle.recv() {
        ChildMessage::Result { error, done, .. } => {
            assert!(error.is_some());
            assert!(!done);
        }
        other => panic!("expected result, got {other:?}"),
    }
}
