#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};

use agentmem_core::{IndexedCommit, QueryParams, TrailerIndex};

use crate::error::StoreError;
use crate::{atomic, git, paths, timestamps};

/// How many commits a fresh build scans. The index itself has no cap on how many commits it can
/// describe once built; this only bounds a single `git log` invocation at build time.
const BUILD_LOG_LIMIT: u32 = 5000;

/// Rebuilds the index from `git log`, discarding any block C1 fails to parse, and persists it
/// as pretty JSON at `<git-dir>/info/trailer-index.json`.
pub fn build_index() -> Result<TrailerIndex, StoreError> {
    let blocks = git::log_commit_blocks(BUILD_LOG_LIMIT)?;
    let head_commit = git::head_commit()?;

    let mut by_intent: BTreeMap<agentmem_core::Intent, Vec<String>> = BTreeMap::new();
    let mut by_scope: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut by_session: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut with_decided_against: BTreeSet<String> = BTreeSet::new();
    let mut commits: BTreeMap<String, IndexedCommit> = BTreeMap::new();
    let mut commit_order: Vec<String> = Vec::new();

    for block in &blocks {
        let Ok(parsed) = agentmem_core::parser::parse_commit_block(block) else {
            continue;
        };

        if let Some(intent) = parsed.intent {
            by_intent.entry(intent).or_default().push(parsed.hash.clone());
        }
        for scope in &parsed.scope {
            by_scope.entry(scope.clone()).or_default().push(parsed.hash.clone());
        }
        if let Some(session) = &parsed.session {
            by_session.entry(session.clone()).or_default().push(parsed.hash.clone());
        }
        if !parsed.decided_against.is_empty() {
            with_decided_against.insert(parsed.hash.clone());
        }

        commit_order.push(parsed.hash.clone());
        commits.insert(
            parsed.hash.clone(),
            IndexedCommit {
                hash: parsed.hash.clone(),
                date: parsed.date.clone(),
                subject: parsed.subject.clone(),
                intent: parsed.intent,
                scope: parsed.scope.clone(),
                session: parsed.session.clone(),
                decided_against: parsed.decided_against.clone(),
            },
        );
    }

    let index = TrailerIndex {
        version: TrailerIndex::CURRENT_VERSION,
        generated: timestamps::now_rfc3339(),
        head_commit,
        commit_count: commits.len(),
        by_intent,
        by_scope,
        by_session,
        with_decided_against,
        commits,
        commit_order,
    };

    let path = paths::trailer_index_path()?;
    let text = serde_json::to_string_pretty(&index)?;
    atomic::write_atomic(&path, &text)?;
    Ok(index)
}

/// Loads the persisted index without any freshness check. Returns `Ok(None)` when no index has
/// been built yet; any other read/parse failure is surfaced.
pub fn load_index() -> Result<Option<TrailerIndex>, StoreError> {
    let path = paths::trailer_index_path()?;
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path)?;
    let index: TrailerIndex = serde_json::from_str(&text)?;
    Ok(Some(index))
}

/// Loads the persisted index, returning `Ok(None)` when it is missing OR stale (its
/// `head_commit` does not match current HEAD). Callers fall back to a live `git log --grep` in
/// either case, per §4.4's freshness contract.
pub fn load_index_fresh() -> Result<Option<TrailerIndex>, StoreError> {
    let Some(index) = load_index()? else {
        return Ok(None);
    };
    let current_head = git::head_commit()?;
    if index.head_commit != current_head {
        return Ok(None);
    }
    Ok(Some(index))
}

/// Convenience wrapper around `agentmem_core::query_index` so callers only need this crate.
pub fn query(index: &TrailerIndex, params: &QueryParams) -> Vec<IndexedCommit> {
    agentmem_core::query_index(index, params)
}
