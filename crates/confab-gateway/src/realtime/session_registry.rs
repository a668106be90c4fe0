//! Process-wide map from access code to a live [`SessionState`] (spec.md §4.2).

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use super::session_state::SessionState;

/// How often [`SessionRegistry::spawn_sweeper`] checks for stale entries,
/// relative to the configured TTL; a fraction of the TTL keeps the worst-case
/// staleness of an abandoned entry bounded without a dedicated interval knob.
const SWEEP_FRACTION_OF_TTL: u32 = 4;

struct Entry {
    state: Arc<SessionState>,
    registered_at: Instant,
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Entry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyExists;

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, access_code: String, state: Arc<SessionState>) -> Result<(), AlreadyExists> {
        if self.sessions.contains_key(&access_code) {
            return Err(AlreadyExists);
        }
        self.sessions.insert(
            access_code,
            Entry {
                state,
                registered_at: Instant::now(),
            },
        );
        Ok(())
    }

    pub fn lookup(&self, access_code: &str) -> Option<Arc<SessionState>> {
        self.sessions.get(access_code).map(|e| e.state.clone())
    }

    pub fn mark_locked(&self, access_code: &str, locked: bool) {
        if let Some(entry) = self.sessions.get(access_code) {
            if locked {
                entry.state.lock();
            }
        }
    }

    pub fn unregister(&self, access_code: &str) {
        self.sessions.remove(access_code);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Purges entries older than `ttl`. A session is normally unregistered
    /// directly by its host task on disconnect/end; this is the backstop for
    /// a host task that vanished (process crash, forced kill) without
    /// running its own cleanup.
    pub fn purge_stale(&self, ttl: Duration) {
        let now = Instant::now();
        self.sessions
            .retain(|_, entry| now.duration_since(entry.registered_at) < ttl);
    }
}

impl SessionRegistry {
    /// Spawns the backstop sweep that purges entries whose host task never
    /// ran its own cleanup (spec.md §4.2 "Entries carry a TTL ... purged if
    /// the host connection is absent for longer"). Same `tokio::spawn`-an-
    /// owned-handle shape as `ExportReaper::spawn`; callers pass an
    /// `Arc<SessionRegistry>` so the sweeper and the rest of the app share
    /// one instance.
    pub fn spawn_sweeper(registry: Arc<Self>, ttl: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let period = ttl / SWEEP_FRACTION_OF_TTL.max(1);
            let mut tick = tokio::time::interval(period.max(Duration::from_secs(1)));
            loop {
                tick.tick().await;
                let before = registry.len();
                registry.purge_stale(ttl);
                let removed = before - registry.len();
                if removed > 0 {
                    tracing::info!(removed, "session registry swept stale entries");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_state() -> Arc<SessionState> {
        Arc::new(
            SessionState::new(Uuid::new_v4(), "11112222".into(), Uuid::new_v4(), 5, vec![]).0,
        )
    }

    #[test]
    fn register_rejects_duplicate_access_code() {
        let registry = SessionRegistry::new();
        assert!(registry.register("11112222".into(), sample_state()).is_ok());
        assert_eq!(
            registry.register("11112222".into(), sample_state()),
            Err(AlreadyExists)
        );
    }

    #[test]
    fn lookup_reflects_locked_state() {
        let registry = SessionRegistry::new();
        let state = sample_state();
        registry.register("11112222".into(), state.clone()).expect("register");
        assert!(!registry.lookup("11112222").expect("present").is_locked());
        registry.mark_locked("11112222", true);
        assert!(registry.lookup("11112222").expect("present").is_locked());
    }

    #[test]
    fn unregister_removes_entry() {
        let registry = SessionRegistry::new();
        registry.register("11112222".into(), sample_state()).expect("register");
        registry.unregister("11112222");
        assert!(registry.lookup("11112222").is_none());
    }

    #[test]
    fn purge_stale_removes_old_entries_only() {
        let registry = SessionRegistry::new();
        registry.register("11112222".into(), sample_state()).expect("register");
        registry.purge_stale(Duration::from_secs(3600));
        assert!(registry.lookup("11112222").is_some());
        registry.purge_stale(Duration::from_secs(0));
        assert!(registry.lookup("11112222").is_none());
    }
}
