#![forbid(unsafe_code)]

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use std::time::Instant;

use agentmem_core::{Intent, ReplConfig, ReplTraceEntry, TrailerIndex, WorkingMemory};
use agentmem_sandbox::host::DEFAULT_EXECUTE_TIMEOUT;
use agentmem_sandbox::{SandboxEnv, SandboxProcess};
use serde_json::{json, Value};

use crate::error::RunnerError;
use crate::llm_client::LlmClient;

const MAX_SCOPE_KEY_SAMPLE: usize = 20;

/// The read-only data a REPL run starts from (§4.9's `ReplEnv`).
pub struct ReplEnv {
    pub index: TrailerIndex,
    pub working_memory: Option<WorkingMemory>,
    pub scope_keys: Vec<String>,
}

pub struct ReplOutcome {
    pub answer: String,
    pub trace: Vec<ReplTraceEntry>,
}

/// Drives the multi-turn loop between the LLM and the sandbox. Never fails the caller: any
/// internal error degrades to a best-effort answer, since hook paths must exit 0 regardless
/// (§7, §4.10). Returns `Err` only when the sandbox process itself cannot be spawned, which the
/// caller treats as "RLM unavailable" and falls back to the non-REPL hook path.
pub fn run(config: &ReplConfig, prompt: &str, env: ReplEnv, sandbox_bin: &Path, llm: &LlmClient) -> Result<ReplOutcome, RunnerError> {
    let system_prompt = build_system_prompt(&env, config);
    let llm_call_count = Rc::new(Cell::new(0u32));
    let started = Instant::now();

    let mut conversation = vec![
        json!({"role": "system", "content": system_prompt}),
        json!({"role": "user", "content": format!(
            "Task: {prompt}\n\nWrite JavaScript code to find relevant context, then call done(answer) with your final answer."
        )}),
    ];

    let sandbox_env = SandboxEnv {
        index: env.index,
        working_memory: env.working_memory,
        scope_keys: env.scope_keys,
    };
    let mut sandbox = SandboxProcess::spawn(sandbox_bin, sandbox_env)?;

    let mut trace = Vec::new();
    let mut last_output = String::new();

    for iteration in 1..=config.max_iterations {
        if budget_exhausted(config, &started, &llm_call_count) {
            break;
        }

        let response = match call_llm(llm, &conversation, &llm_call_count, config) {
            Ok(text) => text,
            Err(e) => return Err(e),
        };
        conversation.push(json!({"role": "assistant", "content": response.clone()}));

        let Some(code) = extract_fenced_code(&response) else {
            sandbox.terminate();
            return Ok(ReplOutcome { answer: response, trace });
        };

        let sub_calls = Rc::new(Cell::new(0u32));
        let llm_effect = {
            let llm_call_count = Rc::clone(&llm_call_count);
            let sub_calls = Rc::clone(&sub_calls);
            let max_llm_calls = config.max_llm_calls;
            move |messages: &Value| -> Result<String, String> {
                if llm_call_count.get() >= max_llm_calls {
                    return Err("llm-budget-exhausted".to_string());
                }
                llm_call_count.set(llm_call_count.get() + 1);
                sub_calls.set(sub_calls.get() + 1);
                llm.complete(messages).map_err(|e| e.to_string())
            }
        };
        let gitlog_effect = |args: &[String]| -> Result<String, String> {
            agentmem_store::git::run_log_args(args).map_err(|e| e.to_string())
        };

        let outcome = sandbox.execute(&code, DEFAULT_EXECUTE_TIMEOUT, llm_effect, gitlog_effect);

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = e.to_string();
                trace.push(ReplTraceEntry {
                    iteration,
                    code_generated: code,
                    execution_result: message.clone(),
                    sub_call_count: 0,
                });
                conversation.push(json!({"role": "user", "content": format!(
                    "Execution error: {message}\n\nFix the error or call done() with your best answer."
                )}));
                last_output = message;
                continue;
            }
        };

        let execution_result = if let Some(error) = &outcome.error {
            format!("error: {error}\nstdout:\n{}", outcome.stdout)
        } else if outcome.stdout.is_empty() {
            "(no output)".to_string()
        } else {
            outcome.stdout.clone()
        };
        trace.push(ReplTraceEntry {
            iteration,
            code_generated: code,
            execution_result: execution_result.clone(),
            sub_call_count: 0,
        });
        last_output = execution_result.clone();

        if outcome.done {
            if let Some(answer) = outcome.done_answer {
                sandbox.terminate();
                return Ok(ReplOutcome { answer, trace });
            }
        }

        if let Some(error) = outcome.error {
            conversation.push(json!({"role": "user", "content": format!(
                "Execution error: {error}\n{}\nFix the error or call done() with your best answer.",
                outcome.stdout
            )}));
        } else {
            let shown = if outcome.stdout.is_empty() { "(no output)" } else { &outcome.stdout };
            conversation.push(json!({"role": "user", "content": format!(
                "Output:\n{shown}\n\nContinue analysis or call done(answer)."
            )}));
        }
    }

    sandbox.terminate();

    if !budget_exhausted(config, &started, &llm_call_count) {
        conversation.push(json!({"role": "user", "content":
            "Iteration budget exhausted. Provide your best answer as plain text (no code block)."
        }));
        if let Ok(answer) = call_llm(llm, &conversation, &llm_call_count, config) {
            return Ok(ReplOutcome { answer, trace });
        }
    }

    Ok(ReplOutcome { answer: last_output, trace })
}

fn budget_exhausted(config: &ReplConfig, started: &Instant, llm_call_count: &Rc<Cell<u32>>) -> bool {
    started.elapsed().as_millis() as u64 > config.timeout_budget_ms || llm_call_count.get() >= config.max_llm_calls
}

fn call_llm(
    llm: &LlmClient,
    conversation: &[Value],
    llm_call_count: &Rc<Cell<u32>>,
    config: &ReplConfig,
) -> Result<String, RunnerError> {
    if llm_call_count.get() >= config.max_llm_calls {
        return Err(RunnerError::LlmBudgetExhausted);
    }
    llm_call_count.set(llm_call_count.get() + 1);
    llm.complete(&json!(conversation))
}

fn build_system_prompt(env: &ReplEnv, config: &ReplConfig) -> String {
    let intents: Vec<&str> = Intent::ALL.iter().map(|i| i.as_str()).collect();
    let scope_sample: Vec<&str> = env
        .scope_keys
        .iter()
        .take(MAX_SCOPE_KEY_SAMPLE)
        .map(String::as_str)
        .collect();

    format!(
        "You are an agent with access to a commit-history memory sandbox. You may write a single \
fenced JavaScript code block per turn; it runs in an isolated sandbox with these bindings:\n\
- query(params) -> array of matching commits (params: scope, intents, session, decidedAgainst, limit)\n\
- callLlm(messages) -> Promise<string>, a recursive call to yourself\n\
- gitLog(args) -> Promise<string>, a sanitized `git log` invocation\n\
- done(answer) -> ends the loop with your final answer\n\
- console.log(...) -> captured and returned to you as output\n\
- index, workingMemory, scopeKeys -> read-only data\n\n\
Intent vocabulary: {}\n\
Scope keys (sample, up to {}): {}\n\
Commit count: {}\n\
Working memory present: {}\n\
Budgets: max {} iterations, max {} LLM calls, {} ms total wall clock.",
        intents.join(", "),
        MAX_SCOPE_KEY_SAMPLE,
        scope_sample.join(", "),
        env.index.commit_count,
        env.working_memory.is_some(),
        config.max_iterations,
        config.max_llm_calls,
        config.timeout_budget_ms,
    )
}

/// Recognizes ```` ```js ````, ```` ```javascript ````, and bare ```` ``` ```` fences. A missing
/// closing fence treats the remainder of the text as code. Returns `None` when no fence is
/// present at all, in which case the whole response is the final answer.
fn extract_fenced_code(text: &str) -> Option<String> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    let rest = after
        .strip_prefix("javascript")
        .or_else(|| after.strip_prefix("js"))
        .unwrap_or(after);
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    let code = match rest.find("```") {
        Some(end) => &rest[..end],
        None => rest,
    };
    Some(code.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_js_fenced_block() {
        let text = "Here:\n```js\nconsole.log(1);\n```\nDone.";
        assert_eq!(extract_fenced_code(text).as_deref(), Some("console.log(1);"));
    }

    #[test]
    fn extracts_bare_fenced_block() {
        let text = "```\ndone('x');\n```";
        assert_eq!(extract_fenced_code(text).as_deref(), Some("done('x');"));
    }

    #[test]
    fn missing_closing_fence_treats_remainder_as_code() {
        let text = "```javascript\ndone('x');";
        assert_eq!(extract_fenced_code(text).as_deref(), Some("done('x');"));
    }

    #[test]
    fn no_fence_returns_none() {
        assert_eq!(extract_fenced_code("just a plain final answer"), None);
    }
}
