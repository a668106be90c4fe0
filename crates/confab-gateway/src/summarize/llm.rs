//! The LLM boundary. Treated as untrusted per spec.md §9: callers parse the
//! returned JSON defensively and never copy provider-supplied metadata into
//! the persisted summary (that reconstruction happens in `orchestrator`, not
//! here — this module's only job is "prompt in, `serde_json::Value` out").

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use confab_core::error::{GatewayError, Result};

use crate::config::LlmConfig;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends a system+user prompt pair and returns the parsed JSON object the
    /// provider replied with. Callers are responsible for validating its
    /// shape; this trait only guarantees "valid JSON was returned in time".
    async fn complete_json(&self, system_prompt: &str, user_prompt: &str) -> Result<serde_json::Value>;
}

/// Calls an OpenAI-chat-completions-compatible endpoint in JSON-object mode.
pub struct ReqwestLlmClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl ReqwestLlmClient {
    pub fn new(cfg: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&cfg.api_key_env)
            .map_err(|_| GatewayError::Fatal(format!("{} is not set", cfg.api_key_env)))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: cfg.base_url.clone(),
            model: cfg.model.clone(),
            api_key,
            timeout: Duration::from_millis(cfg.timeout_ms),
        })
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: ResponseFormat<'a>,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[async_trait]
impl LlmClient for ReqwestLlmClient {
    async fn complete_json(&self, system_prompt: &str, user_prompt: &str) -> Result<serde_json::Value> {
        let body = ChatCompletionRequest {
            model: &self.model,
            temperature: 0.2,
            response_format: ResponseFormat { kind: "json_object" },
            messages: vec![
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: user_prompt },
            ],
        };

        let send = self
            .http
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send();

        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| GatewayError::TransientIo("llm request timed out".into()))?
            .map_err(|e| GatewayError::TransientIo(format!("llm request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::TransientIo(format!("llm returned {status}: {text}")));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::TransientIo(format!("llm response envelope invalid: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::TransientIo("llm returned no choices".into()))?
            .message
            .content;

        serde_json::from_str(&content)
            .map_err(|e| GatewayError::Validation(format!("llm returned invalid json: {e}")))
    }
}

/// Deterministic stub used by gateway tests so the summarize path can be
/// exercised without a live provider (ambient test tooling, not scope).
pub struct StubLlmClient {
    response: serde_json::Value,
}

impl StubLlmClient {
    pub fn new(response: serde_json::Value) -> Self {
        Self { response }
    }

    /// A stub that echoes back one `questions_analysis` entry per question
    /// found in `user_prompt`'s question list is impractical without parsing
    /// the prompt, so callers construct the expected response up front and
    /// pass it here; this keeps the stub a pure fixture.
    pub fn fixed(response: serde_json::Value) -> Self {
        Self::new(response)
    }

    /// A stub that attempts to smuggle spoofed metadata fields into the
    /// response, used by the LLM-metadata-spoofing test scenario.
    pub fn spoofing(questions_analysis: serde_json::Value, key_takeaways: serde_json::Value) -> Self {
        Self::new(json!({
            "meeting_title": "HACKED",
            "date": "01 January 1970",
            "author": "Nobody",
            "questions_analysis": questions_analysis,
            "key_takeaways": key_takeaways,
        }))
    }
}

#[async_trait]
impl LlmClient for StubLlmClient {
    async fn complete_json(&self, _system_prompt: &str, _user_prompt: &str) -> Result<serde_json::Value> {
        Ok(self.response.clone())
    }
}
