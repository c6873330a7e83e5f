#![forbid(unsafe_code)]

use agentmem_core::{TrailerIndex, WorkingMemory};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The plain data handed to the child on `init`, per §4.8: the pre-loaded index, working
/// memory (if the session has any), and the scope-key vocabulary derived for this prompt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SandboxEnv {
    pub index: TrailerIndex,
    #[serde(default)]
    pub working_memory: Option<WorkingMemory>,
    #[serde(default)]
    pub scope_keys: Vec<String>,
}

/// One line of the line-delimited JSON channel, host to child.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HostMessage {
    Init { env: SandboxEnv },
    Execute { code: String },
    LlmResponse { id: u64, ok: Option<String>, err: Option<String> },
    GitlogResponse { id: u64, ok: Option<String>, err: Option<String> },
}

/// One line of the line-delimited JSON channel, child to host.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ChildMessage {
    Ready,
    LlmRequest { id: u64, messages: Value },
    GitlogRequest { id: u64, args: Vec<String> },
    Result {
        stdout: String,
        #[serde(default)]
        return_value: Option<Value>,
        #[serde(default)]
        error: Option<String>,
        done: bool,
        #[serde(default)]
        done_answer: Option<String>,
    },
}
