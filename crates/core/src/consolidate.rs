#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use crate::model::{WorkingMemory, WorkingMemoryEntry, WorkingMemoryTag};

/// Partitions `entries` by tag, preserving insertion order within each group.
pub fn group_by_tag(
    entries: &[WorkingMemoryEntry],
) -> BTreeMap<WorkingMemoryTag, Vec<&WorkingMemoryEntry>> {
    let mut groups: BTreeMap<WorkingMemoryTag, Vec<&WorkingMemoryEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.tag).or_default().push(entry);
    }
    groups
}

/// Unions every entry's scopes and returns them sorted.
pub fn collect_scopes(entries: &[WorkingMemoryEntry]) -> Vec<String> {
    let mut scopes: Vec<String> = entries
        .iter()
        .flat_map(|e| e.scope.iter().cloned())
        .collect();
    scopes.sort();
    scopes.dedup();
    scopes
}

/// Candidate `Decided-Against:`/`Scope:` trailer values derived from one session's working
/// memory. Note (open question, see DESIGN.md): every `decision`-tagged entry becomes a
/// candidate rejection even though the tag does not semantically imply one was made.
pub struct TrailerSuggestion {
    pub decided_against: Vec<String>,
    pub scopes: Vec<String>,
}

pub fn decisions_to_trailers(entries: &[WorkingMemoryEntry]) -> TrailerSuggestion {
    let decided_against = entries
        .iter()
        .filter(|e| e.tag == WorkingMemoryTag::Decision)
        .map(|e| e.text.clone())
        .collect();
    TrailerSuggestion {
        decided_against,
        scopes: collect_scopes(entries),
    }
}

const SECTION_ORDER: [(WorkingMemoryTag, &str); 5] = [
    (WorkingMemoryTag::Decision, "Decisions"),
    (WorkingMemoryTag::Finding, "Findings"),
    (WorkingMemoryTag::Hypothesis, "Hypotheses"),
    (WorkingMemoryTag::Context, "Context"),
    (WorkingMemoryTag::Todo, "TODOs"),
];

/// Renders the session summary Markdown written to `session-summary-<slug>.md` (§6.2).
pub fn format_session_summary(memory: &WorkingMemory) -> String {
    let groups = group_by_tag(&memory.entries);
    let scopes = collect_scopes(&memory.entries);

    let mut out = String::new();
    out.push_str(&format!("# Session {}\n\n", memory.session_id));
    out.push_str(&format!("- Created: {}\n", memory.created));
    out.push_str(&format!("- Updated: {}\n", memory.updated));
    out.push_str(&format!("- Entries: {}\n", memory.entries.len()));
    if !scopes.is_empty() {
        out.push_str(&format!("- Scopes: {}\n", scopes.join(", ")));
    }
    out.push('\n');

    for (tag, title) in SECTION_ORDER {
        let Some(section_entries) = groups.get(&tag) else {
            continue;
        };
        if section_entries.is_empty() {
            continue;
        }
        out.push_str(&format!("## {title}\n\n"));
        for entry in section_entries {
            out.push_str(&format!("- {}", entry.text));
            if !entry.scope.is_empty() {
                out.push_str(&format!(" [{}]", entry.scope.join(", ")));
            }
            if let Some(source) = &entry.source {
                out.push_str(&format!(" (source: {source})"));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    out
}

/// Renders the `Scope:`/`Decided-Against:` hint block emitted on the session-stop hook's stdout.
pub fn format_trailer_hints(suggestion: &TrailerSuggestion) -> String {
    let mut out = String::new();
    if !suggestion.scopes.is_empty() {
        out.push_str(&format!("Scope: {}\n", suggestion.scopes.join(", ")));
    }
    for rejection in &suggestion.decided_against {
        out.push_str(&format!("Decided-Against: {rejection}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tag: WorkingMemoryTag, text: &str, scope: &[&str]) -> WorkingMemoryEntry {
        WorkingMemoryEntry {
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            tag,
            scope: scope.iter().map(|s| s.to_string()).collect(),
            text: text.to_string(),
            source: None,
        }
    }

    #[test]
    fn decisions_become_decided_against_candidates() {
        let entries = vec![
            entry(WorkingMemoryTag::Decision, "Rejected Redis sentinel", &["cache"]),
            entry(WorkingMemoryTag::Finding, "Latency spikes under load", &["cache/eviction"]),
        ];
        let suggestion = decisions_to_trailers(&entries);
        assert_eq!(suggestion.decided_against, vec!["Rejected Redis sentinel".to_string()]);
        assert_eq!(suggestion.scopes, vec!["cache".to_string(), "cache/eviction".to_string()]);
    }

    #[test]
    fn summary_sections_follow_fixed_order() {
        let mut memory = WorkingMemory::new("sess", "2026-01-01T00:00:00Z");
        memory.entries = vec![
            entry(WorkingMemoryTag::Todo, "write tests", &[]),
            entry(WorkingMemoryTag::Decision, "use sqlite", &[]),
            entry(WorkingMemoryTag::Finding, "index was stale", &[]),
        ];
        let summary = format_session_summary(&memory);
        let decisions_pos = summary.find("## Decisions").unwrap();
        let findings_pos = summary.find("## Findings").unwrap();
        let todos_pos = summary.find("## TODOs").unwrap();
        assert!(decisions_pos < findings_pos);
        assert!(findings_pos < todos_pos);
    }

    #[test]
    fn trailer_hints_render_one_line_per_rejection() {
        let suggestion = TrailerSuggestion {
            decided_against: vec!["Redis sentinel".to_string(), "Manual sharding".to_string()],
            scopes: vec!["cache".to_string()],
        };
        let hints = format_trailer_hints(&suggestion);
        assert_eq!(
            hints,
            "Scope: cache\nDecided-Against: Redis sentinel\nDecided-Against: Manual sharding\n"
        );
    }
}
