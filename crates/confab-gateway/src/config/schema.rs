//! Config schema with strict parsing.
//!
//! `deny_unknown_fields` prevents silent misconfiguration: a typo'd key in
//! `confab.yaml` fails startup instead of being silently ignored.

use serde::Deserialize;

use confab_core::error::{GatewayError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,
    #[serde(default)]
    pub gateway: GatewaySection,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(GatewayError::Validation(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        if self.database.url.trim().is_empty() {
            return Err(GatewayError::Validation("database.url must not be empty".into()));
        }
        if self.gateway.session_ttl_secs == 0 {
            return Err(GatewayError::Validation("gateway.session_ttl_secs must be > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
    /// First-message handshake window for a participant JOIN (spec §5: 10s).
    #[serde(default = "default_join_handshake_ms")]
    pub join_handshake_ms: u64,
    /// SessionRegistry entry TTL when the host connection has gone away.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    /// Bounded per-subscriber outbound queue depth before force-close(1013).
    #[serde(default = "default_outbound_queue_depth")]
    pub outbound_queue_depth: usize,
    /// Path prefix the post-meeting page lives under; the host/participant
    /// `end_meeting` message carries `"{prefix}/{meeting_id}"` as its `url`.
    #[serde(default = "default_post_meeting_prefix")]
    pub post_meeting_path_prefix: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            join_handshake_ms: default_join_handshake_ms(),
            session_ttl_secs: default_session_ttl_secs(),
            outbound_queue_depth: default_outbound_queue_depth(),
            post_meeting_path_prefix: default_post_meeting_prefix(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_ping_interval_ms() -> u64 {
    20_000
}
fn default_idle_timeout_ms() -> u64 {
    60_000
}
fn default_join_handshake_ms() -> u64 {
    10_000
}
fn default_session_ttl_secs() -> u64 {
    3600
}
fn default_outbound_queue_depth() -> usize {
    256
}
fn default_post_meeting_prefix() -> String {
    "/meetings".into()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Name of the environment variable holding the provider API key.
    #[serde(default = "default_llm_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key_env: default_llm_api_key_env(),
            timeout_ms: default_llm_timeout_ms(),
        }
    }
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".into()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".into()
}
fn default_llm_api_key_env() -> String {
    "CONFAB_LLM_API_KEY".into()
}
fn default_llm_timeout_ms() -> u64 {
    60_000
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    #[serde(default = "default_export_dir")]
    pub dir: String,
    #[serde(default = "default_export_retention_hours")]
    pub retention_hours: i64,
    #[serde(default = "default_reaper_interval_secs")]
    pub reaper_interval_secs: u64,
    /// TTF font embedded in rendered PDFs; must cover the full Unicode range
    /// the renderer is required to support (spec.md §4.7).
    #[serde(default = "default_font_path")]
    pub font_path: String,
    /// URL prefix `/download/<filename>` is served under.
    #[serde(default = "default_download_prefix")]
    pub download_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
            retention_hours: default_export_retention_hours(),
            reaper_interval_secs: default_reaper_interval_secs(),
            font_path: default_font_path(),
            download_prefix: default_download_prefix(),
        }
    }
}

fn default_export_dir() -> String {
    "./exports".into()
}
fn default_export_retention_hours() -> i64 {
    24
}
fn default_reaper_interval_secs() -> u64 {
    3600
}
fn default_font_path() -> String {
    "./assets/fonts/DejaVuSans.ttf".into()
}
fn default_download_prefix() -> String {
    "/download".into()
}
