//! Narrow persistence interface consumed by the session engine (spec §4.1).
//!
//! `RepoStore` is the only I/O surface the realtime and summarize/export
//! pipelines are allowed to touch; everything else is in-memory.

pub mod fake;
pub mod pg;

use async_trait::async_trait;
use uuid::Uuid;

use confab_core::domain::{Meeting, Question, Response, User};
use confab_core::error::Result;

pub use fake::FakeRepoStore;
pub use pg::PgRepoStore;

/// Raised by `create_meeting` when `access_code` collides with an active
/// meeting; the caller (AccessCodeIssuer) retries with a fresh code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessCodeConflict;

#[async_trait]
pub trait RepoStore: Send + Sync {
    async fn create_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> Result<User>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>>;

    async fn increment_user_counters(
        &self,
        user_id: Uuid,
        delta_meetings: i64,
        delta_participants: i64,
        delta_responses: i64,
    ) -> Result<()>;

    /// Returns `Ok(Err(AccessCodeConflict))` on a unique-constraint violation
    /// so `AccessCodeIssuer` can retry, without that being a `GatewayError`.
    async fn create_meeting(
        &self,
        director_id: Uuid,
        access_code: &str,
        title: &str,
        description: &str,
        duration_minutes: i32,
    ) -> Result<std::result::Result<Meeting, AccessCodeConflict>>;

    async fn get_meeting_with_questions(
        &self,
        meeting_id: Uuid,
    ) -> Result<Option<(Meeting, Vec<Question>)>>;

    async fn get_meeting_by_access_code(&self, access_code: &str) -> Result<Option<Meeting>>;

    async fn get_question_by_description(
        &self,
        meeting_id: Uuid,
        description: &str,
    ) -> Result<Option<Question>>;

    /// Transactional; assigns `position` 1..N in the given order.
    async fn create_questions(
        &self,
        meeting_id: Uuid,
        descriptions: &[String],
    ) -> Result<Vec<Question>>;

    async fn create_response(
        &self,
        meeting_id: Uuid,
        question_id: Uuid,
        text: &str,
    ) -> Result<Response>;

    async fn get_responses_for_meeting(&self, meeting_id: Uuid) -> Result<Vec<Response>>;

    async fn set_meeting_stats(
        &self,
        meeting_id: Uuid,
        duration_seconds: i32,
        participants: i32,
        questions_asked: i32,
    ) -> Result<()>;

    async fn set_meeting_summary(
        &self,
        meeting_id: Uuid,
        summary: serde_json::Value,
    ) -> Result<()>;

    /// Resolves a session token to an authenticated user id (spec §4.9).
    async fn resolve_session(&self, token: &str) -> Result<Option<Uuid>>;
}
