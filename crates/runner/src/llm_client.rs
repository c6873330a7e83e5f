#![forbid(unsafe_code)]

use std::time::Duration;

use agentmem_core::RlmConfig;
use serde_json::{json, Value};

use crate::error::RunnerError;

/// A blocking HTTP client for the local LLM endpoint, treated as an injected effect per the
/// scope note: this crate owns the one concrete implementation, but C9/C8 only ever see it
/// through a closure.
pub struct LlmClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

impl LlmClient {
    pub fn from_config(config: &RlmConfig) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms.max(1) as u64))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    /// Sends `messages` (an array of `{role, content}` objects) to the configured chat
    /// endpoint and returns the assistant's text content.
    pub fn complete(&self, messages: &Value) -> Result<String, RunnerError> {
        let body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": self.max_tokens,
            "stream": false,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(|e| RunnerError::LlmRequestFailed { status: None, message: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RunnerError::LlmRequestFailed {
                status: Some(status.as_u16()),
                message: response.text().unwrap_or_default(),
            });
        }

        let payload: Value = response
            .json()
            .map_err(|e| RunnerError::LlmRequestFailed { status: Some(status.as_u16()), message: e.to_string() })?;

        extract_content(&payload).ok_or_else(|| RunnerError::LlmRequestFailed {
            status: Some(status.as_u16()),
            message: "response carried no message content".to_string(),
        })
    }
}

/// Accepts either an OpenAI-style `{choices:[{message:{content}}]}` payload or a bare
/// `{message:{content}}`/`{content}` shape, since local endpoints vary.
fn extract_content(payload: &Value) -> Option<String> {
    if let Some(choices) = payload.get("choices").and_then(Value::as_array) {
        if let Some(first) = choices.first() {
            if let Some(content) = first.get("message").and_then(|m| m.get("content")).and_then(Value::as_str) {
                return Some(content.to_string());
            }
        }
    }
    if let Some(content) = payload.get("message").and_then(|m| m.get("content")).and_then(Value::as_str) {
        return Some(content.to_string());
    }
    payload.get("content").and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_openai_style_choices_content() {
        let payload = json!({"choices": [{"message": {"content": "hello"}}]});
        assert_eq!(extract_content(&payload).as_deref(), Some("hello"));
    }

    #[test]
    fn extracts_bare_content_field() {
        let payload = json!({"content": "hello"});
        assert_eq!(extract_content(&payload).as_deref(), Some("hello"));
    }

    #[test]
    fn returns_none_when_no_known_shape_matches() {
        let payload = json!({"unexpected": true});
        assert_eq!(extract_content(&payload), None);
    }
}
