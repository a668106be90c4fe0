//! In-memory [`RepoStore`](super::RepoStore) used by gateway tests.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use confab_core::domain::{validate_response_text, Meeting, Question, Response, User};
use confab_core::error::{GatewayError, Result};

use super::{AccessCodeConflict, RepoStore};

#[derive(Default)]
pub struct FakeRepoStore {
    users: DashMap<Uuid, User>,
    meetings: DashMap<Uuid, Meeting>,
    questions: DashMap<Uuid, Question>,
    responses: DashMap<Uuid, Response>,
    sessions: DashMap<String, Uuid>,
}

impl FakeRepoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: seed a resolvable session token for `user_id`.
    pub fn seed_session(&self, token: &str, user_id: Uuid) {
        self.sessions.insert(token.to_string(), user_id);
    }

    /// Test helper: seed a user directly.
    pub fn seed_user(&self, user: User) {
        self.users.insert(user.id, user);
    }
}

#[async_trait]
impl RepoStore for FakeRepoStore {
    async fn create_user(&self, first_name: &str, last_name: &str, email: &str) -> Result<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            meetings_created: 0,
            total_participants: 0,
            total_responses: 0,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.iter().find(|u| u.email == email).map(|u| u.clone()))
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&user_id).map(|u| u.clone()))
    }

    async fn increment_user_counters(
        &self,
        user_id: Uuid,
        delta_meetings: i64,
        delta_participants: i64,
        delta_responses: i64,
    ) -> Result<()> {
        let mut user = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| GatewayError::NotFound(format!("user {user_id}")))?;
        user.meetings_created += delta_meetings;
        user.total_participants += delta_participants;
        user.total_responses += delta_responses;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn create_meeting(
        &self,
        director_id: Uuid,
        access_code: &str,
        title: &str,
        description: &str,
        duration_minutes: i32,
    ) -> Result<std::result::Result<Meeting, AccessCodeConflict>> {
        let collides = self
            .meetings
            .iter()
            .any(|m| m.access_code == access_code && !m.has_ended());
        if collides {
            return Ok(Err(AccessCodeConflict));
        }
        let now = Utc::now();
        let meeting = Meeting {
            id: Uuid::new_v4(),
            access_code: access_code.to_string(),
            director_id,
            title: title.to_string(),
            description: description.to_string(),
            duration_minutes,
            duration_seconds_actual: 0,
            total_questions_asked: 0,
            participants_count: 0,
            summary: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.meetings.insert(meeting.id, meeting.clone());
        Ok(Ok(meeting))
    }

    async fn get_meeting_with_questions(
        &self,
        meeting_id: Uuid,
    ) -> Result<Option<(Meeting, Vec<Question>)>> {
        let Some(meeting) = self.meetings.get(&meeting_id).map(|m| m.clone()) else {
            return Ok(None);
        };
        let mut questions: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| q.meeting_id == meeting_id)
            .map(|q| q.clone())
            .collect();
        questions.sort_by_key(|q| q.position);
        Ok(Some((meeting, questions)))
    }

    async fn get_meeting_by_access_code(&self, access_code: &str) -> Result<Option<Meeting>> {
        Ok(self
            .meetings
            .iter()
            .find(|m| m.access_code == access_code && !m.has_ended())
            .map(|m| m.clone()))
    }

    async fn get_question_by_description(
        &self,
        meeting_id: Uuid,
        description: &str,
    ) -> Result<Option<Question>> {
        Ok(self
            .questions
            .iter()
            .find(|q| q.meeting_id == meeting_id && q.description == description)
            .map(|q| q.clone()))
    }

    async fn create_questions(
        &self,
        meeting_id: Uuid,
        descriptions: &[String],
    ) -> Result<Vec<Question>> {
        let base = self
            .questions
            .iter()
            .filter(|q| q.meeting_id == meeting_id)
            .map(|q| q.position)
            .max()
            .unwrap_or(0);
        let now = Utc::now();
        let mut created = Vec::with_capacity(descriptions.len());
        for (offset, description) in descriptions.iter().enumerate() {
            let question = Question {
                id: Uuid::new_v4(),
                meeting_id,
                description: description.clone(),
                position: base + offset as i32 + 1,
                created_at: now,
                updated_at: now,
            };
            self.questions.insert(question.id, question.clone());
            created.push(question);
        }
        Ok(created)
    }

    async fn create_response(
        &self,
        meeting_id: Uuid,
        question_id: Uuid,
        text: &str,
    ) -> Result<Response> {
        let trimmed = validate_response_text(text)?;
        let response = Response {
            id: Uuid::new_v4(),
            meeting_id,
            question_id,
            response_text: trimmed,
            created_at: Utc::now(),
        };
        self.responses.insert(response.id, response.clone());
        Ok(response)
    }

    async fn get_responses_for_meeting(&self, meeting_id: Uuid) -> Result<Vec<Response>> {
        let mut responses: Vec<Response> = self
            .responses
            .iter()
            .filter(|r| r.meeting_id == meeting_id)
            .map(|r| r.clone())
            .collect();
        responses.sort_by_key(|r| r.created_at);
        Ok(responses)
    }

    async fn set_meeting_stats(
        &self,
        meeting_id: Uuid,
        duration_seconds: i32,
        participants: i32,
        questions_asked: i32,
    ) -> Result<()> {
        let mut meeting = self
            .meetings
            .get_mut(&meeting_id)
            .ok_or_else(|| GatewayError::NotFound(format!("meeting {meeting_id}")))?;
        meeting.duration_seconds_actual = duration_seconds;
        meeting.participants_count = participants;
        meeting.total_questions_asked = questions_asked;
        meeting.is_active = false;
        meeting.updated_at = Utc::now();
        Ok(())
    }

    async fn set_meeting_summary(&self, meeting_id: Uuid, summary: serde_json::Value) -> Result<()> {
        let mut meeting = self
            .meetings
            .get_mut(&meeting_id)
            .ok_or_else(|| GatewayError::NotFound(format!("meeting {meeting_id}")))?;
        meeting.summary = Some(summary);
        meeting.updated_at = Utc::now();
        Ok(())
    }

    async fn resolve_session(&self, token: &str) -> Result<Option<Uuid>> {
        Ok(self.sessions.get(token).map(|id| *id))
    }
}
