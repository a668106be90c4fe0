//! confab gateway binary.
//!
//! - WebSocket endpoints: host `/ws/meeting/<meeting_id>/host/`, participant
//!   `/ws/meeting/<access_code>/participant/` (spec.md §6)
//! - HTTP/JSON: summarize, export, download
//! - Background export reaper sweep

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use confab_gateway::export::ExportReaper;
use confab_gateway::realtime::SessionRegistry;
use confab_gateway::repo::{PgRepoStore, RepoStore};
use confab_gateway::summarize::{LlmClient, ReqwestLlmClient};
use confab_gateway::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = config::load_from_file("confab.yaml").expect("config load failed");
    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .expect("gateway.listen must be a valid SocketAddr");

    let repo: Arc<dyn RepoStore> = Arc::new(
        PgRepoStore::connect(&cfg.database.url, cfg.database.max_connections)
            .await
            .expect("database connect failed"),
    );
    let llm: Arc<dyn LlmClient> = Arc::new(ReqwestLlmClient::new(&cfg.llm).expect("llm client init failed"));

    ExportReaper::spawn(cfg.export.dir.clone(), cfg.export.retention_hours, cfg.export.reaper_interval_secs);

    let registry = Arc::new(SessionRegistry::new());
    SessionRegistry::spawn_sweeper(registry.clone(), std::time::Duration::from_secs(cfg.gateway.session_ttl_secs));

    let state = app_state::AppState::new(cfg, repo, registry, llm);
    let app = router::build_router(state);

    tracing::info!(%listen, "confab-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    axum::serve(listener, app).await.expect("server failed");
}
