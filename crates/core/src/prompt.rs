#![forbid(unsafe_code)]

use std::collections::HashSet;

use crate::matching::scope_matches;
use crate::model::PromptSignals;
use crate::vocab::{intent_for_synonym, is_stop_word};

/// Tokenizes `prompt`, classifying each token into a scope hint, an intent hint, or a residual
/// keyword. `scope_keys` is the set of scope keys currently stored in the trailer index.
pub fn extract_prompt_signals(prompt: &str, scope_keys: &[String]) -> PromptSignals {
    let mut scope_hints = Vec::new();
    let mut seen_scope: HashSet<String> = HashSet::new();
    let mut intent_hints = Vec::new();
    let mut seen_intent = HashSet::new();
    let mut keywords = Vec::new();
    let mut seen_keyword: HashSet<String> = HashSet::new();

    for token in tokenize(prompt) {
        let mut consumed = false;

        if let Some(key) = scope_keys.iter().find(|k| scope_matches(k, &token)) {
            if seen_scope.insert(key.to_ascii_lowercase()) {
                scope_hints.push(token.clone());
            }
            consumed = true;
        }

        if let Some(intent) = intent_for_synonym(&token) {
            if seen_intent.insert(intent) {
                intent_hints.push(intent);
            }
            consumed = true;
        }

        if consumed {
            continue;
        }

        if is_stop_word(&token) {
            continue;
        }

        if seen_keyword.insert(token.clone()) {
            keywords.push(token);
        }
    }

    PromptSignals {
        scope_hints,
        intent_hints,
        keywords,
    }
}

fn tokenize(prompt: &str) -> Vec<String> {
    let lowered = prompt.to_ascii_lowercase();
    lowered
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-'))
                .collect::<String>()
        })
        .filter(|token| token.chars().count() > 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Intent;

    #[test]
    fn classifies_scope_intent_and_keywords() {
        let scope_keys = vec!["auth".to_string(), "auth/login".to_string(), "cache".to_string()];
        let signals = extract_prompt_signals("fix the AUTH login bug", &scope_keys);
        assert!(signals.scope_hints.iter().any(|s| s == "auth"));
        assert_eq!(signals.intent_hints, vec![Intent::FixDefect]);
        assert!(signals.keywords.contains(&"login".to_string()));
        assert!(!signals.keywords.contains(&"bug".to_string()));
    }

    #[test]
    fn empty_prompt_yields_empty_signals() {
        let signals = extract_prompt_signals("   ", &[]);
        assert!(signals.scope_hints.is_empty());
        assert!(signals.intent_hints.is_empty());
        assert!(signals.keywords.is_empty());
    }

    #[test]
    fn duplicates_are_deduplicated_preserving_first_seen_order() {
        let signals = extract_prompt_signals("login login flow flow", &["login".to_string()]);
        assert_eq!(signals.keywords, vec!["flow".to_string()]);
    }
}
