//! Resolves a session token presented on the host WebSocket upgrade into an
//! authenticated user (spec.md §4.9). Opaque to the rest of the engine: the
//! token is treated as an unstructured string backed by the session table.

use uuid::Uuid;

use confab_core::domain::User;
use confab_core::error::{GatewayError, Result};

use crate::repo::RepoStore;

pub struct AuthBridge;

impl AuthBridge {
    pub async fn resolve_session(repo: &dyn RepoStore, token: &str) -> Result<Uuid> {
        if token.trim().is_empty() {
            return Err(GatewayError::NoSession);
        }
        repo.resolve_session(token)
            .await?
            .ok_or(GatewayError::AuthFailed)
    }

    pub async fn resolve_user(repo: &dyn RepoStore, token: &str) -> Result<User> {
        let user_id = Self::resolve_session(repo, token).await?;
        repo.get_user_by_id(user_id)
            .await?
            .ok_or(GatewayError::AuthFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::FakeRepoStore;

    #[tokio::test]
    async fn empty_token_is_no_session() {
        let repo = FakeRepoStore::new();
        let err = AuthBridge::resolve_session(&repo, "").await.unwrap_err();
        assert_eq!(err.client_code().as_str(), "NO_SESSION");
    }

    #[tokio::test]
    async fn unknown_token_is_auth_failed() {
        let repo = FakeRepoStore::new();
        let err = AuthBridge::resolve_session(&repo, "bogus").await.unwrap_err();
        assert_eq!(err.client_code().as_str(), "AUTH_FAILED");
    }

    #[tokio::test]
    async fn seeded_token_resolves_to_user() {
        let repo = FakeRepoStore::new();
        let user = repo.create_user("Ada", "Lovelace", "ada@example.com").await.expect("user");
        repo.seed_session("tok-1", user.id);
        let resolved = AuthBridge::resolve_user(&repo, "tok-1").await.expect("resolved");
        assert_eq!(resolved.id, user.id);
    }
}
