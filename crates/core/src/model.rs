#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Conventional-commit type, the closed set from the header regex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    Feat,
    Fix,
    Refactor,
    Perf,
    Docs,
    Test,
    Build,
    Ci,
    Chore,
    Revert,
}

impl CommitType {
    pub const ALL: [CommitType; 10] = [
        CommitType::Feat,
        CommitType::Fix,
        CommitType::Refactor,
        CommitType::Perf,
        CommitType::Docs,
        CommitType::Test,
        CommitType::Build,
        CommitType::Ci,
        CommitType::Chore,
        CommitType::Revert,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::Refactor => "refactor",
            CommitType::Perf => "perf",
            CommitType::Docs => "docs",
            CommitType::Test => "test",
            CommitType::Build => "build",
            CommitType::Ci => "ci",
            CommitType::Chore => "chore",
            CommitType::Revert => "revert",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

/// One of the eight enumerated strategic motivations for a commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    EnableCapability,
    FixDefect,
    ImproveQuality,
    Restructure,
    ConfigureInfra,
    Document,
    Explore,
    ResolveBlocker,
}

impl Intent {
    pub const ALL: [Intent; 8] = [
        Intent::EnableCapability,
        Intent::FixDefect,
        Intent::ImproveQuality,
        Intent::Restructure,
        Intent::ConfigureInfra,
        Intent::Document,
        Intent::Explore,
        Intent::ResolveBlocker,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::EnableCapability => "enable-capability",
            Intent::FixDefect => "fix-defect",
            Intent::ImproveQuality => "improve-quality",
            Intent::Restructure => "restructure",
            Intent::ConfigureInfra => "configure-infra",
            Intent::Document => "document",
            Intent::Explore => "explore",
            Intent::ResolveBlocker => "resolve-blocker",
        }
    }

    /// Returns `None` when `value` is outside the controlled vocabulary; callers then
    /// treat the trailer as absent rather than failing the parse.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.as_str() == value)
    }
}

/// The parsed form of one commit, produced by the trailer parser (C1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructuredCommit {
    pub hash: String,
    pub date: String,
    pub commit_type: CommitType,
    pub header_scope: Option<String>,
    pub subject: String,
    pub body: String,
    pub intent: Option<Intent>,
    pub scope: Vec<String>,
    pub decided_against: Vec<String>,
    pub session: Option<String>,
    pub refs: Vec<String>,
    pub context: Option<BTreeMap<String, Value>>,
    pub breaking: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub rule: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn error(rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            rule,
            message: message.into(),
        }
    }

    pub fn warning(rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            rule,
            message: message.into(),
        }
    }
}

/// Compact per-commit record stored in `TrailerIndex::commits`. camelCase on the wire (§3).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedCommit {
    pub hash: String,
    pub date: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(default)]
    pub scope: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default)]
    pub decided_against: Vec<String>,
}

/// The persisted inverted index, `<git-dir>/info/trailer-index.json`. camelCase on the wire (§3).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailerIndex {
    pub version: u32,
    pub generated: String,
    pub head_commit: String,
    pub commit_count: usize,
    #[serde(default)]
    pub by_intent: BTreeMap<Intent, Vec<String>>,
    #[serde(default)]
    pub by_scope: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub by_session: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub with_decided_against: BTreeSet<String>,
    #[serde(default)]
    pub commits: BTreeMap<String, IndexedCommit>,
    /// Hashes in `git log` order (reverse chronological), the authoritative order query results
    /// are returned in. `commits` itself is keyed by hash for O(log n) lookup and so cannot
    /// preserve insertion order on its own.
    #[serde(default)]
    pub commit_order: Vec<String>,
}

impl TrailerIndex {
    pub const CURRENT_VERSION: u32 = 1;
}

/// Parameters accepted by `TrailerIndex::query` / the sandbox's `query()` binding. The
/// camelCase rename matches the wire shape the sandbox's `query()` binding is documented with
/// (§4.8, §6.3): `query({scope, intents, session, decidedAgainst, limit})`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    pub scope: Option<String>,
    pub intents: Option<Vec<Intent>>,
    pub session: Option<String>,
    pub decided_against: Option<String>,
    pub limit: Option<usize>,
}

impl QueryParams {
    pub const DEFAULT_LIMIT: usize = 20;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkingMemoryTag {
    Finding,
    Hypothesis,
    Decision,
    Context,
    Todo,
}

impl WorkingMemoryTag {
    pub const ALL: [WorkingMemoryTag; 5] = [
        WorkingMemoryTag::Finding,
        WorkingMemoryTag::Hypothesis,
        WorkingMemoryTag::Decision,
        WorkingMemoryTag::Context,
        WorkingMemoryTag::Todo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WorkingMemoryTag::Finding => "finding",
            WorkingMemoryTag::Hypothesis => "hypothesis",
            WorkingMemoryTag::Decision => "decision",
            WorkingMemoryTag::Context => "context",
            WorkingMemoryTag::Todo => "todo",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingMemoryEntry {
    pub timestamp: String,
    pub tag: WorkingMemoryTag,
    #[serde(default)]
    pub scope: Vec<String>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Per-session scratch log, `<git-dir>/info/working-memory.json`. camelCase on the wire (§3).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingMemory {
    pub version: u32,
    pub session_id: String,
    pub created: String,
    pub updated: String,
    #[serde(default)]
    pub entries: Vec<WorkingMemoryEntry>,
}

impl WorkingMemory {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(session_id: impl Into<String>, now: impl Into<String>) -> Self {
        let now = now.into();
        Self {
            version: Self::CURRENT_VERSION,
            session_id: session_id.into(),
            created: now.clone(),
            updated: now,
            entries: Vec::new(),
        }
    }
}

/// `(scopeHints, intentHints, keywords)` derived from one prompt by the prompt analyzer (C5).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PromptSignals {
    pub scope_hints: Vec<String>,
    pub intent_hints: Vec<Intent>,
    pub keywords: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ReplTraceEntry {
    pub iteration: u32,
    pub code_generated: String,
    pub execution_result: String,
    pub sub_call_count: u32,
}
