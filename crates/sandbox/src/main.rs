#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use agentmem_core::QueryParams;
use agentmem_sandbox::protocol::{ChildMessage, HostMessage, SandboxEnv};
use boa_engine::object::builtins::{JsPromise, PromiseState};
use boa_engine::property::Attribute;
use boa_engine::{Context, JsArgs, JsError, JsNativeError, JsResult, JsValue, NativeFunction, Source};

/// The child half of the sandbox protocol (§4.8). Reads `init`/`execute` from stdin, replies on
/// stdout. No filesystem, network, or process-spawn binding is ever registered in the
/// interpreter's global scope, so code run here has no ambient authority beyond the seven named
/// bindings.
fn main() {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    let Some(Ok(first)) = lines.next() else {
        return;
    };
    let env = match serde_json::from_str::<HostMessage>(&first) {
        Ok(HostMessage::Init { env }) => env,
        _ => return,
    };

    let shared = Rc::new(SharedState::new(env));
    send(&ChildMessage::Ready);

    for line in lines {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<HostMessage>(&line) {
            Ok(HostMessage::Execute { code }) => {
                let result = run_one(&shared, &code);
                send(&result);
            }
            Ok(HostMessage::LlmResponse { id, ok, err }) => shared.resolve_pending(id, ok, err),
            Ok(HostMessage::GitlogResponse { id, ok, err }) => shared.resolve_pending(id, ok, err),
            Ok(HostMessage::Init { .. }) | Err(_) => continue,
        }
    }
}

fn send(message: &ChildMessage) {
    if let Ok(line) = serde_json::to_string(message) {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        let _ = writeln!(handle, "{line}");
        let _ = handle.flush();
    }
}

struct SharedState {
    env: SandboxEnv,
    stdout_buffer: RefCell<String>,
    done_signal: RefCell<Option<String>>,
    next_id: AtomicU64,
    pending: RefCell<std::collections::HashMap<u64, Rc<RefCell<Option<Result<String, String>>>>>>,
}

impl SharedState {
    fn new(env: SandboxEnv) -> Self {
        Self {
            env,
            stdout_buffer: RefCell::new(String::new()),
            done_signal: RefCell::new(None),
            next_id: AtomicU64::new(1),
            pending: RefCell::new(std::collections::HashMap::new()),
        }
    }

    fn reset(&self) {
        self.stdout_buffer.borrow_mut().clear();
        *self.done_signal.borrow_mut() = None;
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn resolve_pending(&self, id: u64, ok: Option<String>, err: Option<String>) {
        if let Some(slot) = self.pending.borrow_mut().remove(&id) {
            *slot.borrow_mut() = Some(match (ok, err) {
                (Some(value), _) => Ok(value),
                (None, Some(reason)) => Err(reason),
                (None, None) => Err("effect returned neither ok nor err".to_string()),
            });
        }
    }
}

/// Blocks on exactly one pending effect response, pumping stdin in between so other traffic
/// (there should be none concurrently, since this protocol is strictly request/response) does
/// not wedge the child.
fn await_pending(shared: &Rc<SharedState>, id: u64, slot: Rc<RefCell<Option<Result<String, String>>>>) -> Result<String, String> {
    let stdin = std::io::stdin();
    loop {
        if let Some(outcome) = slot.borrow_mut().take() {
            return outcome;
        }
        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            shared.pending.borrow_mut().remove(&id);
            return Err("host closed the channel".to_string());
        }
        if let Ok(HostMessage::LlmResponse { id: rid, ok, err }) = serde_json::from_str(&line) {
            shared.resolve_pending(rid, ok, err);
        } else if let Ok(HostMessage::GitlogResponse { id: rid, ok, err }) = serde_json::from_str(&line) {
            shared.resolve_pending(rid, ok, err);
        }
    }
}

fn run_one(shared: &Rc<SharedState>, code: &str) -> ChildMessage {
    shared.reset();

    let mut context = Context::default();
    if let Err(error) = bind_globals(&mut context, shared) {
        return ChildMessage::Result {
            stdout: shared.stdout_buffer.borrow().clone(),
            return_value: None,
            error: Some(error.to_string()),
            done: false,
            done_answer: None,
        };
    }

    let wrapped = format!(
        "(async function(query, callLlm, gitLog, done, console, index, workingMemory, scopeKeys) {{\n{code}\n}})()"
    );

    let outcome = context
        .eval(Source::from_bytes(&wrapped))
        .and_then(|value| drive_to_completion(&mut context, value));

    let (return_value, error) = match outcome {
        Ok(value) => (json_value(&mut context, &value), None),
        Err(e) => (None, Some(e.to_string())),
    };

    ChildMessage::Result {
        stdout: shared.stdout_buffer.borrow().clone(),
        return_value,
        error,
        done: shared.done_signal.borrow().is_some(),
        done_answer: shared.done_signal.borrow().clone(),
    }
}

fn json_value(context: &mut Context, value: &JsValue) -> Option<serde_json::Value> {
    value.to_json(context).ok()
}

/// Pumps the job queue until the top-level promise returned by the wrapped async function
/// settles. The effect-producing native functions (`callLlm`, `gitLog`) each resolve their own
/// promise synchronously before returning it, so this never needs to block on external I/O
/// itself; only the interpreter's own continuation jobs need draining.
fn drive_to_completion(context: &mut Context, value: JsValue) -> JsResult<JsValue> {
    let Some(object) = value.as_object().cloned() else {
        return Ok(value);
    };
    let promise = JsPromise::from_object(object)?;
    loop {
        match promise.state()? {
            PromiseState::Pending => {
                context.run_jobs();
            }
            PromiseState::Fulfilled(result) => return Ok(result),
            PromiseState::Rejected(reason) => {
                return Err(JsError::from_opaque(reason));
            }
        }
    }
}

fn bind_globals(context: &mut Context, shared: &Rc<SharedState>) -> JsResult<()> {
    let index_json = serde_json::to_value(&shared.env.index).unwrap_or(serde_json::Value::Null);
    let wm_json = serde_json::to_value(&shared.env.working_memory).unwrap_or(serde_json::Value::Null);
    let scope_json = serde_json::to_value(&shared.env.scope_keys).unwrap_or(serde_json::Value::Null);

    let index_value = JsValue::from_json(&index_json, context)?;
    let wm_value = JsValue::from_json(&wm_json, context)?;
    let scope_value = JsValue::from_json(&scope_json, context)?;

    context.register_global_property("index", index_value, Attribute::READONLY)?;
    context.register_global_property("workingMemory", wm_value, Attribute::READONLY)?;
    context.register_global_property("scopeKeys", scope_value, Attribute::READONLY)?;

    {
        let index_json = index_json.clone();
        context.register_global_callable(
            "query",
            1,
            NativeFunction::from_copy_closure_with_captures(
                move |_this, args, index_json, context| {
                    let params_json = args
                        .get_or_undefined(0)
                        .to_json(context)
                        .unwrap_or(serde_json::Value::Null);
                    let params: QueryParams = serde_json::from_value(params_json).unwrap_or(QueryParams {
                        scope: None,
                        intents: None,
                        session: None,
                        decided_against: None,
                        limit: None,
                    });
                    let index: agentmem_core::TrailerIndex = serde_json::from_value(index_json.clone())
                        .map_err(|e| JsNativeError::typ().with_message(e.to_string()))?;
                    let results = agentmem_core::query_index(&index, &params);
                    let results_json = serde_json::to_value(results)
                        .map_err(|e| JsNativeError::typ().with_message(e.to_string()))?;
                    JsValue::from_json(&results_json, context)
                },
                index_json,
            ),
        )?;
    }

    {
        let shared = Rc::clone(shared);
        context.register_global_callable(
            "done",
            1,
            NativeFunction::from_copy_closure_with_captures(
                move |_this, args, shared, context| {
                    let text = args.get_or_undefined(0).to_string(context)?.to_std_string_escaped();
                    *shared.done_signal.borrow_mut() = Some(text);
                    Ok(JsValue::undefined())
                },
                shared,
            ),
        )?;
    }

    {
        let shared = Rc::clone(shared);
        context.register_global_callable(
            "callLlm",
            1,
            NativeFunction::from_copy_closure_with_captures(
                move |_this, args, shared, context| {
                    let messages_json = args
                        .get_or_undefined(0)
                        .to_json(context)
                        .unwrap_or(serde_json::Value::Null);
                    let id = shared.allocate_id();
                    let slot = Rc::new(RefCell::new(None));
                    shared.pending.borrow_mut().insert(id, Rc::clone(&slot));
                    send(&ChildMessage::LlmRequest { id, messages: messages_json });
                    let outcome = await_pending(shared, id, slot);
                    resolve_effect_outcome(context, outcome)
                },
                shared,
            ),
        )?;
    }

    {
        let shared = Rc::clone(shared);
        context.register_global_callable(
            "gitLog",
            1,
            NativeFunction::from_copy_closure_with_captures(
                move |_this, args, shared, context| {
                    let args_json = args
                        .get_or_undefined(0)
                        .to_json(context)
                        .unwrap_or(serde_json::Value::Array(Vec::new()));
                    let args_vec: Vec<String> = serde_json::from_value(args_json).unwrap_or_default();
                    let id = shared.allocate_id();
                    let slot = Rc::new(RefCell::new(None));
                    shared.pending.borrow_mut().insert(id, Rc::clone(&slot));
                    send(&ChildMessage::GitlogRequest { id, args: args_vec });
                    let outcome = await_pending(shared, id, slot);
                    resolve_effect_outcome(context, outcome)
                },
                shared,
            ),
        )?;
    }

    bind_console(context, shared)
}

fn resolve_effect_outcome(context: &mut Context, outcome: Result<String, String>) -> JsResult<JsValue> {
    match outcome {
        Ok(text) => {
            let value = JsValue::from(boa_engine::js_string!(text));
            Ok(JsPromise::resolve(value, context).into())
        }
        Err(reason) => {
            let value = JsValue::from(boa_engine::js_string!(reason));
            Ok(JsPromise::reject(value, context).into())
        }
    }
}

fn bind_console(context: &mut Context, shared: &Rc<SharedState>) -> JsResult<()> {
    let console = boa_engine::object::ObjectInitializer::new(context)
        .function(
            NativeFunction::from_copy_closure_with_captures(
                |_this, args, shared: &Rc<SharedState>, context| {
                    let mut parts = Vec::with_capacity(args.len());
                    for arg in args {
                        parts.push(arg.to_string(context)?.to_std_string_escaped());
                    }
                    shared.stdout_buffer.borrow_mut().push_str(&parts.join(" "));
                    shared.stdout_buffer.borrow_mut().push('\n');
                    Ok(JsValue::undefined())
                },
                Rc::clone(shared),
            ),
            boa_engine::js_string!("log"),
            0,
        )
        .build();
    context.register_global_property("console", console, Attribute::READONLY)?;
    Ok(())
}
