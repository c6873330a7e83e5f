#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use crate::matching::{scope_matches, word_boundary_match};
use crate::model::{IndexedCommit, QueryParams, TrailerIndex};

/// Runs the intersection algorithm of §4.4 against an in-memory index. Shared, pure, and
/// side-effect free so both the host (C4) and the sandbox's `query()` binding (C8) run the exact
/// same logic over the exact same data.
pub fn query_index(index: &TrailerIndex, params: &QueryParams) -> Vec<IndexedCommit> {
    let mut candidates: Option<BTreeSet<&str>> = None;

    if let Some(intents) = &params.intents {
        let mut matched = BTreeSet::new();
        for intent in intents {
            if let Some(hashes) = index.by_intent.get(intent) {
                matched.extend(hashes.iter().map(String::as_str));
            }
        }
        candidates = Some(intersect(candidates, matched));
    }

    if let Some(session) = &params.session {
        let matched: BTreeSet<&str> = index
            .by_session
            .get(session)
            .map(|hashes| hashes.iter().map(String::as_str).collect())
            .unwrap_or_default();
        candidates = Some(intersect(candidates, matched));
    }

    if let Some(rejection) = &params.decided_against {
        let matched: BTreeSet<&str> = index
            .with_decided_against
            .iter()
            .filter(|hash| {
                index
                    .commits
                    .get(hash.as_str())
                    .is_some_and(|commit| {
                        commit
                            .decided_against
                            .iter()
                            .any(|text| word_boundary_match(text, rejection))
                    })
            })
            .map(String::as_str)
            .collect();
        candidates = Some(intersect(candidates, matched));
    }

    if let Some(scope) = &params.scope {
        let mut matched = BTreeSet::new();
        for (key, hashes) in &index.by_scope {
            if scope_matches(key, scope) {
                matched.extend(hashes.iter().map(String::as_str));
            }
        }
        candidates = Some(intersect(candidates, matched));
    }

    let Some(candidates) = candidates else {
        return Vec::new();
    };

    // Order by `commit_order` (git log's reverse-chronological order); `commits` itself is
    // keyed by hash and so cannot preserve insertion order.
    let limit = params.limit.unwrap_or(QueryParams::DEFAULT_LIMIT);
    index
        .commit_order
        .iter()
        .filter(|hash| candidates.contains(hash.as_str()))
        .filter_map(|hash| index.commits.get(hash))
        .take(limit)
        .cloned()
        .collect()
}

fn intersect<'a>(running: Option<BTreeSet<&'a str>>, next: BTreeSet<&'a str>) -> BTreeSet<&'a str> {
    match running {
        None => next,
        Some(running) => running.intersection(&next).copied().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Intent;
    use std::collections::BTreeMap;

    fn sample_index() -> TrailerIndex {
        let mut commits = BTreeMap::new();
        commits.insert(
            "aaa".to_string(),
            IndexedCommit {
                hash: "aaa".to_string(),
                date: "2026-01-01".to_string(),
                subject: "fix(auth): x".to_string(),
                intent: Some(Intent::FixDefect),
                scope: vec!["auth/login".to_string()],
                session: None,
                decided_against: vec![],
            },
        );
        commits.insert(
            "bbb".to_string(),
            IndexedCommit {
                hash: "bbb".to_string(),
                date: "2026-01-02".to_string(),
                subject: "fix(cache): y".to_string(),
                intent: Some(Intent::FixDefect),
                scope: vec!["cache".to_string()],
                session: None,
                decided_against: vec!["Redis sentinel".to_string()],
            },
        );
        commits.insert(
            "ccc".to_string(),
            IndexedCommit {
                hash: "ccc".to_string(),
                date: "2026-01-03".to_string(),
                subject: "feat(auth): z".to_string(),
                intent: Some(Intent::EnableCapability),
                scope: vec!["auth".to_string()],
                session: None,
                decided_against: vec![],
            },
        );

        let mut by_intent = BTreeMap::new();
        by_intent.insert(Intent::FixDefect, vec!["aaa".to_string(), "bbb".to_string()]);
        by_intent.insert(Intent::EnableCapability, vec!["ccc".to_string()]);

        let mut by_scope = BTreeMap::new();
        by_scope.insert("auth/login".to_string(), vec!["aaa".to_string()]);
        by_scope.insert("cache".to_string(), vec!["bbb".to_string()]);
        by_scope.insert("auth".to_string(), vec!["ccc".to_string()]);

        let mut with_decided_against = BTreeSet::new();
        with_decided_against.insert("bbb".to_string());

        TrailerIndex {
            version: 1,
            generated: "2026-01-03T00:00:00Z".to_string(),
            head_commit: "ccc".to_string(),
            commit_count: 3,
            by_intent,
            by_scope,
            by_session: BTreeMap::new(),
            with_decided_against,
            commits,
            commit_order: vec!["aaa".to_string(), "bbb".to_string(), "ccc".to_string()],
        }
    }

    #[test]
    fn scope_query_follows_hierarchy() {
        let index = sample_index();
        let hashes: Vec<_> = query_index(
            &index,
            &QueryParams {
                scope: Some("auth".to_string()),
                ..Default::default()
            },
        )
        .into_iter()
        .map(|c| c.hash)
        .collect();
        assert_eq!(hashes, vec!["aaa".to_string(), "ccc".to_string()]);
    }

    #[test]
    fn decided_against_query_word_boundary_matches() {
        let index = sample_index();
        let result = query_index(
            &index,
            &QueryParams {
                decided_against: Some("Redis".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].hash, "bbb");
    }

    #[test]
    fn combined_intent_and_scope_intersects() {
        let index = sample_index();
        let result = query_index(
            &index,
            &QueryParams {
                intents: Some(vec![Intent::FixDefect]),
                scope: Some("cache".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].hash, "bbb");
    }

    #[test]
    fn no_filters_returns_empty() {
        let index = sample_index();
        let result = query_index(&index, &QueryParams::default());
        assert!(result.is_empty());
    }
}
