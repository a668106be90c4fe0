//! Shared test harness: boots a real `confab-gateway` router on a loopback
//! port so integration tests drive the engine the way a browser would,
//! through actual WebSocket/HTTP round trips rather than calling handlers
//! directly.

#![allow(dead_code)]

use std::sync::Arc;

use confab_gateway::app_state::AppState;
use confab_gateway::config;
use confab_gateway::realtime::SessionRegistry;
use confab_gateway::repo::{FakeRepoStore, RepoStore};
use confab_gateway::router;
use confab_gateway::summarize::{LlmClient, StubLlmClient};
use serde_json::json;
use tokio::net::TcpListener;

pub struct TestServer {
    pub addr: std::net::SocketAddr,
    pub repo: Arc<FakeRepoStore>,
}

impl TestServer {
    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{path}", self.addr)
    }
}

/// Boots the router against a [`FakeRepoStore`] and the given LLM stub on an
/// ephemeral loopback port; the server runs for the remainder of the process
/// (test binaries are short-lived, so nothing reaps it).
pub async fn spawn(llm: Arc<dyn LlmClient>) -> TestServer {
    let cfg = config::load_from_str(
        r#"
version: 1
gateway:
  listen: "127.0.0.1:0"
  join_handshake_ms: 2000
database:
  url: "postgres://unused/unused"
"#,
    )
    .expect("test config must parse");

    let repo = Arc::new(FakeRepoStore::new());
    let repo_trait: Arc<dyn RepoStore> = repo.clone();
    let state = AppState::new(cfg, repo_trait, Arc::new(SessionRegistry::new()), llm);
    let app = router::build_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server crashed");
    });

    TestServer { addr, repo }
}

pub fn stub_llm(takeaways: &[&str], analyses: &[(&str, &str, i64)]) -> Arc<dyn LlmClient> {
    let questions_analysis: Vec<_> = analyses
        .iter()
        .map(|(q, s, n)| json!({"question": q, "summary": s, "response_count": n}))
        .collect();
    Arc::new(StubLlmClient::fixed(json!({
        "questions_analysis": questions_analysis,
        "key_takeaways": takeaways,
    })))
}
