//! Shared application state for the confab gateway.
//!
//! Bundles the config, the repository, the session registry, and the LLM
//! client behind a single `Arc`-friendly, cloneable handle so Axum extractors
//! can pull it into any handler with `State(state): State<AppState>`.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::realtime::SessionRegistry;
use crate::repo::RepoStore;
use crate::summarize::LlmClient;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    repo: Arc<dyn RepoStore>,
    registry: Arc<SessionRegistry>,
    llm: Arc<dyn LlmClient>,
}

impl AppState {
    /// Takes the registry as an `Arc` the caller already holds so it can also
    /// hand the same handle to [`SessionRegistry::spawn_sweeper`] (spec.md
    /// §4.2's TTL backstop) without a second, divergent instance.
    pub fn new(
        cfg: GatewayConfig,
        repo: Arc<dyn RepoStore>,
        registry: Arc<SessionRegistry>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner { cfg, repo, registry, llm }),
        }
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn repo(&self) -> &Arc<dyn RepoStore> {
        &self.inner.repo
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.inner.registry
    }

    pub fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.inner.llm
    }

    /// The post-meeting page URL surfaced in `end_meeting` messages (spec.md §6).
    pub fn post_meeting_url(&self, meeting_id: uuid::Uuid) -> String {
        format!("{}/{}", self.inner.cfg.gateway.post_meeting_path_prefix, meeting_id)
    }

    /// The `/download/<filename>` URL surfaced by the export HTTP endpoint.
    pub fn download_url(&self, filename: &str) -> String {
        format!("{}/{}", self.inner.cfg.export.download_prefix, filename)
    }
}
