#![forbid(unsafe_code)]

use std::io::Read;

use agentmem_core::prompt::extract_prompt_signals;
use agentmem_core::{consolidate, query_index, Intent, QueryParams, TrailerIndex};
use serde::Deserialize;

use crate::config;
use crate::logging::{Level, Logger};
use crate::repl::{self, ReplEnv};
use crate::llm_client::LlmClient;

/// The JSON object every hook reads on stdin (§6.4). Every field is defaulted so a minimal or
/// partial envelope — or one carrying fields this binary doesn't know about — never fails the
/// read; an absent field degrades to empty input rather than rejecting the hook.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HookEnvelope {
    hook_event_name: String,
    session_id: String,
    prompt: String,
    tool_name: String,
    tool_input: ToolInput,
    tool_response: ToolResponse,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ToolInput {
    command: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ToolResponse {
    stdout: String,
}

fn read_envelope() -> HookEnvelope {
    let mut raw = String::new();
    if std::io::stdin().read_to_string(&mut raw).is_err() {
        return HookEnvelope::default();
    }
    serde_json::from_str(&raw).unwrap_or_default()
}

fn fallback_session_id(envelope: &HookEnvelope) -> String {
    if envelope.session_id.is_empty() {
        "default".to_string()
    } else {
        envelope.session_id.clone()
    }
}

/// Loads the persisted index if fresh, otherwise rebuilds it from `git log` so a hook never
/// serves stale-but-undetected results. Any failure (no git repo, unwritable metadata dir)
/// degrades to an empty index — a hook must never fail the host agent's turn over this.
fn load_or_rebuild_index(logger: &Logger) -> TrailerIndex {
    match agentmem_store::load_index_fresh() {
        Ok(Some(index)) => return index,
        Ok(None) => {}
        Err(e) => logger.error("load-index", &[("tag", e.tag())]),
    }
    match agentmem_store::build_index() {
        Ok(index) => index,
        Err(e) => {
            logger.error("build-index", &[("tag", e.tag())]);
            empty_index()
        }
    }
}

fn empty_index() -> TrailerIndex {
    TrailerIndex {
        version: TrailerIndex::CURRENT_VERSION,
        generated: String::new(),
        head_commit: String::new(),
        commit_count: 0,
        by_intent: Default::default(),
        by_scope: Default::default(),
        by_session: Default::default(),
        with_decided_against: Default::default(),
        commits: Default::default(),
        commit_order: Vec::new(),
    }
}

fn format_matches(results: &[agentmem_core::IndexedCommit]) -> String {
    let mut out = format!("<matches count=\"{}\">\n", results.len());
    for commit in results {
        out.push_str(&format!("- {} {}", &commit.hash[..commit.hash.len().min(12)], commit.subject));
        if let Some(intent) = commit.intent {
            out.push_str(&format!(" (intent: {})", intent.as_str()));
        }
        if !commit.scope.is_empty() {
            out.push_str(&format!(" (scope: {})", commit.scope.join(", ")));
        }
        out.push('\n');
    }
    out.push_str("</matches>\n");
    out
}

/// `prompt-submit`: loads C4 (+ C6 if present), runs C5 over the prompt text, queries C4 with
/// the derived hints, and emits matches plus the working-memory block as XML-tagged plain text.
/// When the loaded config enables the REPL, control is handed to C9 instead and its answer is
/// wrapped in `<rlm-answer>`.
pub fn prompt_submit() {
    let logger = Logger::new("hooks.prompt-submit", Level::Off);
    let envelope = read_envelope();
    let session_id = fallback_session_id(&envelope);
    let config = config::load_config();

    let index = load_or_rebuild_index(&logger);
    let working_memory = agentmem_store::load_working_memory(&session_id).unwrap_or(None);
    let scope_keys: Vec<String> = index.by_scope.keys().cloned().collect();

    if config.repl_enabled {
        let sandbox_bin = sandbox_binary_path();
        let llm = LlmClient::from_config(&config);
        let env = ReplEnv {
            index,
            working_memory,
            scope_keys,
        };
        match repl::run(&config.repl_config(), &envelope.prompt, env, &sandbox_bin, &llm) {
            Ok(outcome) => {
                print!("<rlm-answer>\n{}\n</rlm-answer>\n", outcome.answer);
                let trace_len = outcome.trace.len().to_string();
                logger.info("repl-complete", &[("trace_len", trace_len.as_str())]);
            }
            Err(e) => logger.error("repl-failed", &[("tag", e.tag())]),
        }
        return;
    }

    let signals = extract_prompt_signals(&envelope.prompt, &scope_keys);
    let params = QueryParams {
        scope: signals.scope_hints.first().cloned(),
        intents: (!signals.intent_hints.is_empty()).then(|| signals.intent_hints.clone()),
        session: None,
        decided_against: None,
        limit: None,
    };
    let results = query_index(&index, &params);
    print!("{}", format_matches(&results));
    if let Some(memory) = &working_memory {
        print!("{}", agentmem_store::format_working_memory(memory, None));
    }
}

/// Locates the sandbox child binary next to the current executable, falling back to relying
/// on `PATH`, mirroring this codebase's own sibling-binary lookup for its companion processes.
fn sandbox_binary_path() -> std::path::PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("agentmem-sandbox");
            if sibling.exists() {
                return sibling;
            }
        }
    }
    std::path::PathBuf::from("agentmem-sandbox")
}

const QUERY_DIRECTIVE_PREFIX: &str = "AGENTMEM-QUERY:";

/// The camelCase wire shape a query directive line carries, matching the sandbox's own
/// `query()` binding (§4.8). Kept separate from `QueryParams` because `intents` here is a
/// sequence of vocabulary names to resolve, not already-parsed `Intent` values.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct QueryDirective {
    scope: Option<String>,
    intents: Option<Vec<String>>,
    session: Option<String>,
    decided_against: Option<String>,
    limit: Option<usize>,
}

fn find_directive(text: &str) -> Option<QueryDirective> {
    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix(QUERY_DIRECTIVE_PREFIX) {
            if let Ok(directive) = serde_json::from_str::<QueryDirective>(rest.trim()) {
                return Some(directive);
            }
        }
    }
    None
}

/// `post-tool`: scans `tool_input.command`/`tool_response.stdout` for an `AGENTMEM-QUERY:`
/// marker line; on a match, queries C4 and emits results. Otherwise produces no output at all.
pub fn post_tool() {
    let logger = Logger::new("hooks.post-tool", Level::Off);
    let envelope = read_envelope();

    let directive = find_directive(&envelope.tool_input.command)
        .or_else(|| find_directive(&envelope.tool_response.stdout));
    let Some(directive) = directive else {
        return;
    };

    let index = load_or_rebuild_index(&logger);
    let intents: Option<Vec<Intent>> = directive.intents.map(|names| {
        names.iter().filter_map(|name| Intent::parse(name)).collect()
    });
    let params = QueryParams {
        scope: directive.scope,
        intents,
        session: directive.session,
        decided_against: directive.decided_against,
        limit: directive.limit,
    };
    let results = query_index(&index, &params);
    print!("{}", format_matches(&results));
}

/// `session-stop`: loads C6, runs C7, writes the session-summary Markdown file, emits the
/// trailer-hints block, then clears working memory.
pub fn session_stop() {
    let logger = Logger::new("hooks.session-stop", Level::Off);
    let envelope = read_envelope();
    let session_id = fallback_session_id(&envelope);

    let Some(memory) = agentmem_store::load_working_memory(&session_id).unwrap_or(None) else {
        return;
    };

    let summary = consolidate::format_session_summary(&memory);
    let slug = agentmem_store::paths::slugify(&session_id);
    if let Ok(path) = agentmem_store::paths::session_summary_path(&slug) {
        if let Err(e) = agentmem_store::atomic::write_atomic(&path, &summary) {
            logger.error("write-summary", &[("tag", e.tag())]);
        }
    }

    let suggestion = consolidate::decisions_to_trailers(&memory.entries);
    print!("{}", consolidate::format_trailer_hints(&suggestion));

    if let Err(e) = agentmem_store::clear_working_memory() {
        logger.error("clear-working-memory", &[("tag", e.tag())]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_defaults_on_empty_json() {
        let envelope: HookEnvelope = serde_json::from_str("{}").unwrap();
        assert_eq!(envelope.hook_event_name, "");
        assert_eq!(envelope.tool_input.command, "");
    }

    #[test]
    fn finds_directive_amid_other_output() {
        let text = "running tests\nAGENTMEM-QUERY: {\"scope\": \"auth\"}\nok\n";
        let directive = find_directive(text).expect("directive found");
        assert_eq!(directive.scope.as_deref(), Some("auth"));
    }

    #[test]
    fn no_directive_returns_none() {
        assert!(find_directive("plain stdout, nothing to see").is_none());
    }

    #[test]
    fn format_matches_reports_count_and_fields() {
        let commit = agentmem_core::IndexedCommit {
            hash: "abcdef1234567890".to_string(),
            date: "2026-01-01T00:00:00Z".to_string(),
            subject: "fix login bug".to_string(),
            intent: Some(Intent::FixDefect),
            scope: vec!["auth/login".to_string()],
            session: None,
            decided_against: vec![],
        };
        let rendered = format_matches(&[commit]);
        assert!(rendered.starts_with("<matches count=\"1\">"));
        assert!(rendered.contains("fix-defect"));
        assert!(rendered.contains("auth/login"));
    }
}
