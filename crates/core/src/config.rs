#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// `<git-dir>/info/rlm-config.json`, deserialized with every field defaulted so a missing,
/// partial, or extra-key file never fails a hook.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RlmConfig {
    pub version: u32,
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    pub timeout_ms: u64,
    pub max_tokens: u32,
    pub repl_enabled: bool,
    pub repl_max_iterations: u32,
    pub repl_max_llm_calls: u32,
    pub repl_timeout_budget_ms: u64,
    pub repl_max_output_tokens: u32,
}

impl Default for RlmConfig {
    fn default() -> Self {
        Self {
            version: 1,
            enabled: false,
            endpoint: "http://localhost:11434".to_string(),
            model: String::new(),
            timeout_ms: 5_000,
            max_tokens: 256,
            repl_enabled: false,
            repl_max_iterations: 6,
            repl_max_llm_calls: 10,
            repl_timeout_budget_ms: 15_000,
            repl_max_output_tokens: 512,
        }
    }
}

impl RlmConfig {
    pub fn from_json_str(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or_default()
    }

    /// Applies the `AGENTMEM_*` environment-variable override layer. Every variable is parsed
    /// leniently; a variable that fails to parse as its expected type is ignored, never fatal.
    pub fn apply_env_overrides(mut self, get: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = get("AGENTMEM_ENDPOINT") {
            self.endpoint = v;
        }
        if let Some(v) = get("AGENTMEM_MODEL") {
            self.model = v;
        }
        if let Some(v) = get("AGENTMEM_ENABLED").and_then(|v| parse_bool(&v)) {
            self.enabled = v;
        }
        if let Some(v) = get("AGENTMEM_REPL_ENABLED").and_then(|v| parse_bool(&v)) {
            self.repl_enabled = v;
        }
        if let Some(v) = get("AGENTMEM_REPL_MAX_ITERATIONS").and_then(|v| v.parse().ok()) {
            self.repl_max_iterations = v;
        }
        if let Some(v) = get("AGENTMEM_REPL_MAX_LLM_CALLS").and_then(|v| v.parse().ok()) {
            self.repl_max_llm_calls = v;
        }
        if let Some(v) = get("AGENTMEM_REPL_TIMEOUT_BUDGET_MS").and_then(|v| v.parse().ok()) {
            self.repl_timeout_budget_ms = v;
        }
        if let Some(v) = get("AGENTMEM_REPL_MAX_OUTPUT_TOKENS").and_then(|v| v.parse().ok()) {
            self.repl_max_output_tokens = v;
        }
        self
    }

    pub fn repl_config(&self) -> ReplConfig {
        ReplConfig {
            max_iterations: self.repl_max_iterations,
            max_llm_calls: self.repl_max_llm_calls,
            timeout_budget_ms: self.repl_timeout_budget_ms,
            max_output_tokens: self.repl_max_output_tokens,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Budgets handed to the REPL driver (C9) for one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplConfig {
    pub max_iterations: u32,
    pub max_llm_calls: u32,
    pub timeout_budget_ms: u64,
    pub max_output_tokens: u32,
}

impl Default for ReplConfig {
    fn default() -> Self {
        RlmConfig::default().repl_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = RlmConfig::default();
        assert!(!cfg.enabled);
        assert_eq!(cfg.endpoint, "http://localhost:11434");
        assert_eq!(cfg.timeout_ms, 5_000);
        assert_eq!(cfg.max_tokens, 256);
        assert_eq!(cfg.repl_max_iterations, 6);
        assert_eq!(cfg.repl_max_llm_calls, 10);
        assert_eq!(cfg.repl_timeout_budget_ms, 15_000);
        assert_eq!(cfg.repl_max_output_tokens, 512);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = RlmConfig::from_json_str("");
        assert_eq!(cfg, RlmConfig::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let cfg = RlmConfig::from_json_str(r#"{"enabled": true, "model": "qwen2.5-coder"}"#);
        assert!(cfg.enabled);
        assert_eq!(cfg.model, "qwen2.5-coder");
        assert_eq!(cfg.endpoint, "http://localhost:11434");
    }

    #[test]
    fn unknown_extra_key_is_ignored() {
        let cfg = RlmConfig::from_json_str(r#"{"totally_unknown": 42, "enabled": true}"#);
        assert!(cfg.enabled);
    }

    #[test]
    fn camel_case_keys_are_read() {
        let cfg = RlmConfig::from_json_str(
            r#"{"timeoutMs": 9000, "replMaxIterations": 3, "replTimeoutBudgetMs": 20000}"#,
        );
        assert_eq!(cfg.timeout_ms, 9000);
        assert_eq!(cfg.repl_max_iterations, 3);
        assert_eq!(cfg.repl_timeout_budget_ms, 20000);
    }

    #[test]
    fn env_override_ignores_unparsable_values() {
        let cfg = RlmConfig::default().apply_env_overrides(|key| match key {
            "AGENTMEM_ENABLED" => Some("not-a-bool".to_string()),
            "AGENTMEM_REPL_MAX_ITERATIONS" => Some("12".to_string()),
            _ => None,
        });
        assert!(!cfg.enabled);
        assert_eq!(cfg.repl_max_iterations, 12);
    }
}
