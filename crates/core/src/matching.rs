#![forbid(unsafe_code)]

/// True when `pattern` matches `stored_key` exactly, or `stored_key` is a `/`-delimited
/// descendant of `pattern`. Case-insensitive. Pattern `auth` matches `auth`, `auth/login`,
/// `auth/login/flow`, but not `authn`.
pub fn scope_matches(stored_key: &str, pattern: &str) -> bool {
    let stored = stored_key.to_ascii_lowercase();
    let pattern = pattern.to_ascii_lowercase();
    stored == pattern || stored.starts_with(&format!("{pattern}/"))
}

/// Regex-escaped `keyword` bounded by `\b`, case-insensitive, searched in `text`.
pub fn word_boundary_match(text: &str, keyword: &str) -> bool {
    if keyword.is_empty() {
        return false;
    }
    let text_lower = text.to_ascii_lowercase();
    let keyword_lower = keyword.to_ascii_lowercase();
    let is_word_byte = |c: char| c.is_alphanumeric() || c == '_';

    let mut start = 0;
    while let Some(offset) = text_lower[start..].find(&keyword_lower) {
        let idx = start + offset;
        let end = idx + keyword_lower.len();
        let before_ok = text_lower[..idx]
            .chars()
            .next_back()
            .map(|c| !is_word_byte(c))
            .unwrap_or(true);
        let after_ok = text_lower[end..]
            .chars()
            .next()
            .map(|c| !is_word_byte(c))
            .unwrap_or(true);
        if before_ok && after_ok {
            return true;
        }
        start = idx + 1;
        if start >= text_lower.len() {
            break;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_matches_self_and_descendants() {
        assert!(scope_matches("auth", "auth"));
        assert!(scope_matches("auth/login", "auth"));
        assert!(scope_matches("auth/login/flow", "auth"));
    }

    #[test]
    fn scope_matches_rejects_prefix_collisions() {
        assert!(!scope_matches("authn", "auth"));
        assert!(!scope_matches("auth-service", "auth"));
    }

    #[test]
    fn scope_matches_is_case_insensitive() {
        assert!(scope_matches("Auth/Login", "auth"));
    }

    #[test]
    fn word_boundary_finds_whole_words_only() {
        assert!(word_boundary_match("Redis sentinel was rejected", "Redis"));
        assert!(!word_boundary_match("RedisSentinel", "Redis"));
    }

    #[test]
    fn word_boundary_is_case_insensitive() {
        assert!(word_boundary_match("the AUTH login bug", "auth"));
    }
}
