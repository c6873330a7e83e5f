#![forbid(unsafe_code)]

use crate::model::{CommitType, Diagnostic};

const MAX_HEADER_LEN: usize = 72;
const MAX_SCOPE_ENTRIES: usize = 3;

/// Pure function from a raw commit message to a list of diagnostics. Never fails; every rule
/// that cannot be satisfied is reported as a `Diagnostic`, not a parse error.
pub fn validate(message: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut lines = message.lines();
    let header = lines.next().unwrap_or("");

    if header.chars().count() > MAX_HEADER_LEN {
        diagnostics.push(Diagnostic::error(
            "header-too-long",
            format!(
                "header is {} chars, must be <= {MAX_HEADER_LEN}",
                header.chars().count()
            ),
        ));
    }

    let header_type = header_commit_type(header);
    if header_type.is_none() {
        diagnostics.push(Diagnostic::error(
            "header-format",
            "header does not match the conventional-commit type regex",
        ));
    }

    if header.trim_end().ends_with('.') {
        diagnostics.push(Diagnostic::warning(
            "subject-trailing-period",
            "subject should not end with a period",
        ));
    }

    if let Some(first_word) = first_subject_word(header) {
        let lower = first_word.to_ascii_lowercase();
        if lower.ends_with("ed") || lower.ends_with("ing") {
            diagnostics.push(Diagnostic::warning(
                "imperative-mood",
                format!("subject should use the imperative mood, not \"{first_word}\""),
            ));
        }
    }

    let rest_lines: Vec<&str> = message.lines().skip(1).collect();
    let (body_lines, trailer_lines) = split_on_last_blank_line(&rest_lines);
    let trailers = crate::parser::trailer_kv_lines(trailer_lines);

    let body_present = body_lines.iter().any(|l| !l.trim().is_empty());

    if !body_present && !matches!(header_type, Some(CommitType::Chore | CommitType::Ci | CommitType::Build)) {
        diagnostics.push(Diagnostic::warning(
            "body-required",
            "commit body is recommended for this type",
        ));
    }

    let intents: Vec<&str> = trailer_values(&trailers, "intent");
    match intents.len() {
        0 => diagnostics.push(Diagnostic::error("intent-required", "an Intent trailer is required")),
        1 => {
            if crate::model::Intent::parse(intents[0]).is_none() {
                diagnostics.push(Diagnostic::error(
                    "intent-required",
                    format!("\"{}\" is not a recognized Intent value", intents[0]),
                ));
            }
        }
        _ => diagnostics.push(Diagnostic::error(
            "intent-required",
            "exactly one Intent trailer is allowed",
        )),
    }

    let scope_values = trailer_values(&trailers, "scope");
    if scope_values.is_empty() {
        diagnostics.push(Diagnostic::error("scope-required", "at least one Scope trailer is required"));
    } else {
        let entries: Vec<&str> = scope_values
            .iter()
            .flat_map(|v| v.split(','))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if entries.len() > MAX_SCOPE_ENTRIES {
            diagnostics.push(Diagnostic::warning(
                "scope-max-entries",
                format!("{} scope entries given, at most {MAX_SCOPE_ENTRIES} recommended", entries.len()),
            ));
        }
        for entry in &entries {
            if !entry.contains('/') {
                diagnostics.push(Diagnostic::warning(
                    "scope-format",
                    format!("scope \"{entry}\" has no \"/\"; consider domain/module"),
                ));
            }
        }
    }

    if let Some(session) = trailer_values(&trailers, "session").first() {
        if !is_session_format(session) {
            diagnostics.push(Diagnostic::warning(
                "session-format",
                format!("\"{session}\" does not match YYYY-MM-DD/slug"),
            ));
        }
    }

    if let Some(context) = trailer_values(&trailers, "context").first() {
        if serde_json::from_str::<serde_json::Value>(context).is_err() {
            diagnostics.push(Diagnostic::error(
                "context-invalid-json",
                format!("Context trailer is not valid JSON: \"{context}\""),
            ));
        }
    }

    diagnostics
}

fn header_commit_type(header: &str) -> Option<CommitType> {
    for commit_type in CommitType::ALL {
        let prefix = commit_type.as_str();
        let Some(mut rest) = header.strip_prefix(prefix) else {
            continue;
        };
        if let Some(after_paren) = rest.strip_prefix('(') {
            let Some(close) = after_paren.find(')') else {
                continue;
            };
            if close == 0 {
                continue;
            }
            rest = &after_paren[close + 1..];
        }
        let rest = rest.strip_prefix('!').unwrap_or(rest);
        let Some(after_colon) = rest.strip_prefix(':') else {
            continue;
        };
        let ws = after_colon.chars().take_while(|c| c.is_whitespace()).count();
        if ws == 0 || after_colon[ws..].is_empty() {
            continue;
        }
        return Some(commit_type);
    }
    None
}

fn first_subject_word(header: &str) -> Option<&str> {
    let after_colon = header.split_once(':')?.1;
    after_colon.split_whitespace().next()
}

/// The validator uses a simpler split than C1's backward scan: everything after the *last*
/// blank line is the trailer candidate section, everything before is body. A message with no
/// blank line at all therefore has no trailer section, even if its tail lines look like
/// `Key: value` — this is the literal "trailers running directly into the body" failure mode,
/// surfaced as `intent-required`/`scope-required`.
fn split_on_last_blank_line<'a>(rest_lines: &'a [&'a str]) -> (&'a [&'a str], &'a [&'a str]) {
    match rest_lines.iter().rposition(|l| l.trim().is_empty()) {
        Some(idx) => (&rest_lines[..idx], &rest_lines[idx + 1..]),
        None => (rest_lines, &[]),
    }
}

fn trailer_values<'a>(trailers: &[(String, &'a str)], key: &str) -> Vec<&'a str> {
    trailers
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| *v)
        .collect()
}

fn is_session_format(value: &str) -> bool {
    let Some((date, slug)) = value.split_once('/') else {
        return false;
    };
    if slug.is_empty() {
        return false;
    }
    let bytes = date.as_bytes();
    if bytes.len() != 10 {
        return false;
    }
    let digits = |r: std::ops::Range<usize>| bytes[r].iter().all(u8::is_ascii_digit);
    digits(0..4) && bytes[4] == b'-' && digits(5..7) && bytes[7] == b'-' && digits(8..10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;

    #[test]
    fn reports_scope_max_entries_and_format_for_entries_without_slash() {
        let message = "feat: add a thing\n\nbody here\n\nIntent: enable-capability\nScope: auth, backend, orders/pricing, billing";
        let diags = validate(message);
        assert!(diags.iter().any(|d| d.rule == "scope-max-entries" && d.severity == Severity::Warning));
        let format_warnings: Vec<_> = diags.iter().filter(|d| d.rule == "scope-format").collect();
        assert_eq!(format_warnings.len(), 3);
    }

    #[test]
    fn trailers_running_directly_into_body_are_not_recognized() {
        let message = "feat: add a thing\nIntent: enable-capability\nScope: auth/login";
        let diags = validate(message);
        assert!(diags.iter().any(|d| d.rule == "intent-required"));
        assert!(diags.iter().any(|d| d.rule == "scope-required"));
    }

    #[test]
    fn clean_commit_has_no_errors() {
        let message = "feat(auth): add login flow\n\nImplements session cookies.\n\nIntent: enable-capability\nScope: auth/login";
        let diags = validate(message);
        assert!(diags.iter().all(|d| d.severity == Severity::Warning));
    }

    #[test]
    fn chore_type_does_not_require_a_body() {
        let message = "chore: bump deps\n\nIntent: configure-infra\nScope: build/deps";
        let diags = validate(message);
        assert!(!diags.iter().any(|d| d.rule == "body-required"));
    }
}
