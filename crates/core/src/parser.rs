#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::CoreError;
use crate::model::{CommitType, Intent, StructuredCommit};
use crate::vocab::is_known_trailer_key;

/// Parses one `---commit---`-delimited record produced by the fixed `git log` format in §6.5.
/// `block` is everything after the `---commit---` marker, up to (but not including) the next
/// marker or end of input.
pub fn parse_commit_block(block: &str) -> Result<StructuredCommit, CoreError> {
    let lines: Vec<&str> = block.lines().collect();

    let mut hash = None;
    let mut date = None;
    let mut subject = None;
    let mut idx = 0;
    while idx < lines.len() {
        let line = lines[idx];
        if let Some(v) = line.strip_prefix("Hash: ") {
            hash = Some(v.to_string());
        } else if let Some(v) = line.strip_prefix("Date: ") {
            date = Some(v.to_string());
        } else if let Some(v) = line.strip_prefix("Subject: ") {
            subject = Some(v.to_string());
        } else {
            break;
        }
        idx += 1;
    }

    let hash = hash.ok_or(CoreError::MissingRequiredFields { field: "Hash" })?;
    let date = date.ok_or(CoreError::MissingRequiredFields { field: "Date" })?;
    let subject = subject.ok_or(CoreError::MissingRequiredFields { field: "Subject" })?;

    let (commit_type, header_scope) =
        parse_header(&subject).ok_or_else(|| CoreError::NonConventionalSubject {
            subject: subject.clone(),
        })?;

    let rest = &lines[idx..];
    let trailer_start = find_trailer_start(rest);
    let body_lines = &rest[..trailer_start];
    let trailer_lines = &rest[trailer_start..];

    let body = body_lines.join("\n").trim_end().to_string();
    let trailers = collect_trailers(trailer_lines);

    Ok(StructuredCommit {
        hash,
        date,
        commit_type,
        header_scope,
        subject,
        body,
        intent: trailers.intent,
        scope: trailers.scope,
        decided_against: trailers.decided_against,
        session: trailers.session,
        refs: trailers.refs,
        context: trailers.context,
        breaking: trailers.breaking,
    })
}

/// Validates the conventional-commit header and splits it into `(type, scope)`. Mirrors
/// `(feat|fix|refactor|perf|docs|test|build|ci|chore|revert)(\([^)]+\))?!?:\s+.+`.
fn parse_header(subject: &str) -> Option<(CommitType, Option<String>)> {
    for commit_type in CommitType::ALL {
        let prefix = commit_type.as_str();
        let Some(mut rest) = subject.strip_prefix(prefix) else {
            continue;
        };

        let mut scope = None;
        if let Some(after_paren) = rest.strip_prefix('(') {
            let Some(close) = after_paren.find(')') else {
                continue;
            };
            if close == 0 {
                continue;
            }
            scope = Some(after_paren[..close].to_string());
            rest = &after_paren[close + 1..];
        }

        if let Some(after_bang) = rest.strip_prefix('!') {
            rest = after_bang;
        }

        let Some(after_colon) = rest.strip_prefix(':') else {
            continue;
        };
        let ws_len = after_colon
            .chars()
            .take_while(|c| c.is_whitespace())
            .count();
        if ws_len == 0 {
            continue;
        }
        if after_colon[ws_len..].is_empty() {
            continue;
        }

        return Some((commit_type, scope));
    }
    None
}

fn is_trailer_line(line: &str) -> bool {
    match line.split_once(':') {
        Some((key, _)) => is_known_trailer_key(key.trim()),
        None => false,
    }
}

/// Scans `lines` backwards to find the index at which the trailer block begins. A single blank
/// line between two trailer groups is tolerated only when a recognized trailer line precedes it;
/// any other non-trailer line (including the body/trailer separating blank) terminates the scan.
///
/// Shared with the validator (C2) so both components agree on where the trailer block starts.
pub(crate) fn find_trailer_start(lines: &[&str]) -> usize {
    let mut i = lines.len();
    let mut saw_blank = false;

    loop {
        if i == 0 {
            return 0;
        }
        let line = lines[i - 1];
        if line.trim().is_empty() {
            if saw_blank {
                return i;
            }
            let tolerated = i >= 2 && is_trailer_line(lines[i - 2]);
            if !tolerated {
                return i;
            }
            saw_blank = true;
            i -= 1;
            continue;
        }
        if is_trailer_line(line) {
            i -= 1;
            continue;
        }
        return i;
    }
}

#[derive(Default)]
struct ParsedTrailers {
    intent: Option<Intent>,
    scope: Vec<String>,
    decided_against: Vec<String>,
    session: Option<String>,
    refs: Vec<String>,
    context: Option<BTreeMap<String, Value>>,
    breaking: Option<String>,
}

/// Lowercased-key/value pairs for every recognized trailer line, in source order, skipping
/// blanks. Shared with the validator so "Key: value" lookups agree with C1's extraction.
pub(crate) fn trailer_kv_lines<'a>(trailer_lines: &[&'a str]) -> Vec<(String, &'a str)> {
    trailer_lines
        .iter()
        .filter_map(|line| {
            if line.trim().is_empty() {
                return None;
            }
            let (key, value) = line.split_once(':')?;
            Some((key.trim().to_ascii_lowercase(), value.trim()))
        })
        .collect()
}

fn collect_trailers(lines: &[&str]) -> ParsedTrailers {
    let mut out = ParsedTrailers::default();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        match key.as_str() {
            "intent" => {
                if out.intent.is_none() {
                    out.intent = Intent::parse(value);
                }
            }
            "scope" => out
                .scope
                .extend(value.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty())),
            "decided-against" => {
                if !value.is_empty() {
                    out.decided_against.push(value.to_string());
                }
            }
            "session" => {
                if out.session.is_none() {
                    out.session = Some(value.to_string());
                }
            }
            "refs" => out
                .refs
                .extend(value.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty())),
            "context" => {
                if out.context.is_none() {
                    out.context = serde_json::from_str(value).ok();
                }
            }
            "breaking" => {
                if out.breaking.is_none() && !value.is_empty() {
                    out.breaking = Some(value.to_string());
                }
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(body_and_trailers: &str) -> String {
        format!(
            "Hash: aaa111\nDate: 2026-01-01T00:00:00Z\nSubject: feat(api): enable webhooks\n{body_and_trailers}"
        )
    }

    #[test]
    fn webhook_url_in_body_is_not_mistaken_for_a_trailer() {
        let raw = block(
            "Configure via WEBHOOK_URL: https://example.com\n\nIntent: enable-capability\nScope: api/webhooks",
        );
        let commit = parse_commit_block(&raw).unwrap();
        assert!(commit.body.contains("WEBHOOK_URL: https://example.com"));
        assert_eq!(commit.intent, Some(Intent::EnableCapability));
        assert_eq!(commit.scope, vec!["api/webhooks".to_string()]);
    }

    #[test]
    fn structured_trailers_followed_by_co_authored_by_blank_group() {
        let raw = block("Body text.\n\nIntent: fix-defect\nScope: auth\n\nCo-Authored-By: A <a@x>");
        let commit = parse_commit_block(&raw).unwrap();
        assert_eq!(commit.body, "Body text.");
        assert_eq!(commit.intent, Some(Intent::FixDefect));
    }

    #[test]
    fn missing_required_field_fails() {
        let raw = "Date: 2026-01-01T00:00:00Z\nSubject: feat: x\n\nIntent: document";
        let err = parse_commit_block(raw).unwrap_err();
        assert_eq!(err.tag(), "missing-required-fields");
    }

    #[test]
    fn non_conventional_subject_fails() {
        let raw = "Hash: a\nDate: d\nSubject: not a conventional subject\n\nIntent: document";
        let err = parse_commit_block(raw).unwrap_err();
        assert_eq!(err.tag(), "non-conventional-subject");
    }

    #[test]
    fn scoped_breaking_header_parses_type_and_scope() {
        let raw = "Hash: a\nDate: d\nSubject: feat(auth)!: drop legacy tokens\n\nIntent: restructure\nScope: auth";
        let commit = parse_commit_block(raw).unwrap();
        assert_eq!(commit.commit_type, CommitType::Feat);
        assert_eq!(commit.header_scope.as_deref(), Some("auth"));
    }

    #[test]
    fn unknown_intent_value_is_null() {
        let raw = block("Body.\n\nIntent: not-a-real-intent\nScope: auth");
        let commit = parse_commit_block(&raw).unwrap();
        assert_eq!(commit.intent, None);
    }

    #[test]
    fn context_parses_json_or_is_null_on_failure() {
        let raw = block("Body.\n\nIntent: document\nScope: docs\nContext: {\"k\": 1}");
        let commit = parse_commit_block(&raw).unwrap();
        assert_eq!(
            commit.context.unwrap().get("k").cloned(),
            Some(Value::from(1))
        );

        let raw = block("Body.\n\nIntent: document\nScope: docs\nContext: not json");
        let commit = parse_commit_block(&raw).unwrap();
        assert_eq!(commit.context, None);
    }
}
