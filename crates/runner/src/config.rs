#![forbid(unsafe_code)]

use agentmem_core::RlmConfig;

/// Loads `rlm-config.json` (via C11's defaulted deserialization) and applies the
/// `AGENTMEM_*` environment override layer. A missing or unreadable file degrades to
/// defaults rather than failing the caller — every binary in this workspace must keep
/// running when the config file has never been written.
pub fn load_config() -> RlmConfig {
    let text = agentmem_store::paths::rlm_config_path()
        .ok()
        .and_then(|path| std::fs::read_to_string(path).ok())
        .unwrap_or_default();
    RlmConfig::from_json_str(&text).apply_env_overrides(|key| std::env::var(key).ok())
}
