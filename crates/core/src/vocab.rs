#![forbid(unsafe_code)]

use crate::model::Intent;

/// Trailer keys recognized while scanning a commit message backwards for the trailer block
/// (§4.1). Lowercased before comparison; case on the value is preserved.
pub const KNOWN_TRAILER_KEYS: &[&str] = &[
    "intent",
    "scope",
    "decided-against",
    "session",
    "refs",
    "context",
    "breaking",
    "signed-off-by",
    "co-authored-by",
];

pub fn is_known_trailer_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    KNOWN_TRAILER_KEYS.contains(&lower.as_str())
}

/// Maps an English verb/noun a user might type into a prompt to the intent it most commonly
/// accompanies in a commit. Data, not code, per DESIGN.md: additions go here and nowhere else.
pub const INTENT_SYNONYMS: &[(&str, Intent)] = &[
    ("add", Intent::EnableCapability),
    ("adds", Intent::EnableCapability),
    ("adding", Intent::EnableCapability),
    ("implement", Intent::EnableCapability),
    ("implements", Intent::EnableCapability),
    ("implementing", Intent::EnableCapability),
    ("introduce", Intent::EnableCapability),
    ("introduces", Intent::EnableCapability),
    ("support", Intent::EnableCapability),
    ("supports", Intent::EnableCapability),
    ("enable", Intent::EnableCapability),
    ("enables", Intent::EnableCapability),
    ("feature", Intent::EnableCapability),
    ("new", Intent::EnableCapability),
    ("build", Intent::EnableCapability),
    ("create", Intent::EnableCapability),
    ("creates", Intent::EnableCapability),
    ("fix", Intent::FixDefect),
    ("fixes", Intent::FixDefect),
    ("fixing", Intent::FixDefect),
    ("bug", Intent::FixDefect),
    ("bugs", Intent::FixDefect),
    ("defect", Intent::FixDefect),
    ("broken", Intent::FixDefect),
    ("break", Intent::FixDefect),
    ("breaking", Intent::FixDefect),
    ("crash", Intent::FixDefect),
    ("crashes", Intent::FixDefect),
    ("regression", Intent::FixDefect),
    ("error", Intent::FixDefect),
    ("errors", Intent::FixDefect),
    ("failing", Intent::FixDefect),
    ("fails", Intent::FixDefect),
    ("improve", Intent::ImproveQuality),
    ("improves", Intent::ImproveQuality),
    ("improving", Intent::ImproveQuality),
    ("optimize", Intent::ImproveQuality),
    ("optimizes", Intent::ImproveQuality),
    ("optimizing", Intent::ImproveQuality),
    ("perf", Intent::ImproveQuality),
    ("performance", Intent::ImproveQuality),
    ("quality", Intent::ImproveQuality),
    ("cleanup", Intent::ImproveQuality),
    ("clean", Intent::ImproveQuality),
    ("polish", Intent::ImproveQuality),
    ("harden", Intent::ImproveQuality),
    ("hardening", Intent::ImproveQuality),
    ("refactor", Intent::Restructure),
    ("refactors", Intent::Restructure),
    ("refactoring", Intent::Restructure),
    ("restructure", Intent::Restructure),
    ("restructuring", Intent::Restructure),
    ("reorganize", Intent::Restructure),
    ("reorganizing", Intent::Restructure),
    ("rewrite", Intent::Restructure),
    ("rewriting", Intent::Restructure),
    ("extract", Intent::Restructure),
    ("rename", Intent::Restructure),
    ("renamed", Intent::Restructure),
    ("move", Intent::Restructure),
    ("moved", Intent::Restructure),
    ("split", Intent::Restructure),
    ("config", Intent::ConfigureInfra),
    ("configure", Intent::ConfigureInfra),
    ("configuring", Intent::ConfigureInfra),
    ("configuration", Intent::ConfigureInfra),
    ("deploy", Intent::ConfigureInfra),
    ("deployment", Intent::ConfigureInfra),
    ("infra", Intent::ConfigureInfra),
    ("infrastructure", Intent::ConfigureInfra),
    ("ci", Intent::ConfigureInfra),
    ("pipeline", Intent::ConfigureInfra),
    ("env", Intent::ConfigureInfra),
    ("environment", Intent::ConfigureInfra),
    ("docker", Intent::ConfigureInfra),
    ("document", Intent::Document),
    ("documents", Intent::Document),
    ("documenting", Intent::Document),
    ("documentation", Intent::Document),
    ("docs", Intent::Document),
    ("readme", Intent::Document),
    ("comment", Intent::Document),
    ("comments", Intent::Document),
    ("explore", Intent::Explore),
    ("exploring", Intent::Explore),
    ("explored", Intent::Explore),
    ("spike", Intent::Explore),
    ("investigate", Intent::Explore),
    ("investigating", Intent::Explore),
    ("research", Intent::Explore),
    ("prototype", Intent::Explore),
    ("prototyping", Intent::Explore),
    ("experiment", Intent::Explore),
    ("experimenting", Intent::Explore),
    ("unblock", Intent::ResolveBlocker),
    ("unblocks", Intent::ResolveBlocker),
    ("unblocking", Intent::ResolveBlocker),
    ("unstick", Intent::ResolveBlocker),
    ("blocker", Intent::ResolveBlocker),
    ("blocked", Intent::ResolveBlocker),
    ("blocking", Intent::ResolveBlocker),
    ("workaround", Intent::ResolveBlocker),
    ("resolve", Intent::ResolveBlocker),
    ("resolves", Intent::ResolveBlocker),
    ("resolving", Intent::ResolveBlocker),
];

pub fn intent_for_synonym(token: &str) -> Option<Intent> {
    INTENT_SYNONYMS
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, intent)| *intent)
}

/// Stop words excluded from `PromptSignals::keywords`. Common function words plus a handful of
/// imperative filler words ("please", "need") that carry no scope/intent signal of their own.
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "to", "of", "in", "on",
    "for", "and", "or", "but", "with", "at", "by", "from", "into", "this", "that", "these",
    "those", "it", "its", "as", "so", "not", "no", "can", "could", "should", "would", "will",
    "shall", "may", "might", "must", "do", "does", "did", "doing", "have", "has", "had", "having",
    "i", "we", "you", "he", "she", "they", "them", "me", "my", "our", "your", "please", "need",
    "needs", "want", "wants", "about", "up", "down", "out", "if", "when", "than", "then", "just",
    "some", "any", "all", "each", "also", "more", "most", "there", "here",
];

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}
