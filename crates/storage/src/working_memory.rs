#![forbid(unsafe_code)]

use agentmem_core::{WorkingMemory, WorkingMemoryEntry, WorkingMemoryTag};

use crate::error::StoreError;
use crate::{atomic, paths, timestamps};

const DEFAULT_FORMAT_LIMIT: usize = 20;

/// Loads working memory for `session_id`. A file belonging to a different session (left behind
/// by a prior, uncleared run) is reported as absent rather than an error, so it cannot leak into
/// the current session.
pub fn load_working_memory(session_id: &str) -> Result<Option<WorkingMemory>, StoreError> {
    let path = paths::working_memory_path()?;
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path)?;
    let memory: WorkingMemory = serde_json::from_str(&text)?;
    if memory.session_id != session_id {
        return Ok(None);
    }
    Ok(Some(memory))
}

/// Appends one entry, creating the file (and session) on first write. Atomic write-replace of
/// the whole file; callers are expected to be single-writer per session.
pub fn add_entry(
    session_id: &str,
    tag: WorkingMemoryTag,
    scope: Vec<String>,
    text: String,
    source: Option<String>,
) -> Result<WorkingMemory, StoreError> {
    let now = timestamps::now_rfc3339();
    let mut memory = load_working_memory(session_id)?
        .unwrap_or_else(|| WorkingMemory::new(session_id.to_string(), now.clone()));

    memory.entries.push(WorkingMemoryEntry {
        timestamp: now.clone(),
        tag,
        scope,
        text,
        source,
    });
    memory.updated = now;

    let path = paths::working_memory_path()?;
    let json = serde_json::to_string_pretty(&memory)?;
    atomic::write_atomic(&path, &json)?;
    Ok(memory)
}

/// Removes the working-memory file. Absence is success, not an error.
pub fn clear_working_memory() -> Result<(), StoreError> {
    let path = paths::working_memory_path()?;
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Renders the last `limit` entries (default 20) as a tagged plain-text block.
pub fn format_working_memory(memory: &WorkingMemory, limit: Option<usize>) -> String {
    let limit = limit.unwrap_or(DEFAULT_FORMAT_LIMIT);
    let start = memory.entries.len().saturating_sub(limit);
    let shown = &memory.entries[start..];

    let mut out = String::new();
    out.push_str(&format!(
        "<working-memory session=\"{}\" entries=\"{}\">\n",
        memory.session_id,
        shown.len()
    ));
    for entry in shown {
        out.push_str(&format!("[{}] {}", entry.tag.as_str(), entry.text));
        if !entry.scope.is_empty() {
            out.push_str(&format!(" ({})", entry.scope.join(", ")));
        }
        if let Some(source) = &entry.source {
            out.push_str(&format!(" <- {source}"));
        }
        out.push('\n');
    }
    out.push_str("</working-memory>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_memory() -> WorkingMemory {
        let mut memory = WorkingMemory::new("2024-05-01/auth".to_string(), "2024-05-01T00:00:00Z".to_string());
        memory.entries.push(WorkingMemoryEntry {
            timestamp: "2024-05-01T00:00:01Z".to_string(),
            tag: WorkingMemoryTag::Finding,
            scope: vec!["auth/login".to_string()],
            text: "token refresh races under load".to_string(),
            source: Some("post-tool".to_string()),
        });
        memory.entries.push(WorkingMemoryEntry {
            timestamp: "2024-05-01T00:00:02Z".to_string(),
            tag: WorkingMemoryTag::Decision,
            scope: vec![],
            text: "keep the existing retry backoff".to_string(),
            source: None,
        });
        memory
    }

    #[test]
    fn format_includes_session_and_entry_count() {
        let memory = sample_memory();
        let rendered = format_working_memory(&memory, None);
        assert!(rendered.starts_with("<working-memory session=\"2024-05-01/auth\" entries=\"2\">"));
        assert!(rendered.contains("[finding] token refresh races under load (auth/login) <- post-tool"));
        assert!(rendered.contains("[decision] keep the existing retry backoff"));
        assert!(rendered.ends_with("</working-memory>\n"));
    }

    #[test]
    fn format_respects_limit_showing_most_recent() {
        let memory = sample_memory();
        let rendered = format_working_memory(&memory, Some(1));
        assert!(rendered.contains("entries=\"1\""));
        assert!(!rendered.contains("token refresh races"));
        assert!(rendered.contains("keep the existing retry backoff"));
    }
}
