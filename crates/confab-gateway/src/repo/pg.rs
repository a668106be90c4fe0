//! Postgres-backed [`RepoStore`](super::RepoStore).

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use confab_core::domain::{validate_response_text, Meeting, Question, Response, User};
use confab_core::error::{GatewayError, Result};

use super::{AccessCodeConflict, RepoStore};

pub struct PgRepoStore {
    pool: PgPool,
}

impl PgRepoStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| GatewayError::TransientIo(format!("db connect failed: {e}")))?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn row_to_user(row: sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        meetings_created: row.get("meetings_created"),
        total_participants: row.get("total_participants"),
        total_responses: row.get("total_responses"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_meeting(row: sqlx::postgres::PgRow) -> Meeting {
    Meeting {
        id: row.get("id"),
        access_code: row.get("access_code"),
        director_id: row.get("director_id"),
        title: row.get("title"),
        description: row.get("description"),
        duration_minutes: row.get("duration_minutes"),
        duration_seconds_actual: row.get("duration_seconds_actual"),
        total_questions_asked: row.get("total_questions_asked"),
        participants_count: row.get("participants_count"),
        summary: row.get("summary"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_question(row: sqlx::postgres::PgRow) -> Question {
    Question {
        id: row.get("id"),
        meeting_id: row.get("meeting_id"),
        description: row.get("description"),
        position: row.get("position"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_response(row: sqlx::postgres::PgRow) -> Response {
    Response {
        id: row.get("id"),
        meeting_id: row.get("meeting_id"),
        question_id: row.get("question_id"),
        response_text: row.get("response_text"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl RepoStore for PgRepoStore {
    #[instrument(skip(self))]
    async fn create_user(&self, first_name: &str, last_name: &str, email: &str) -> Result<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name, email, meetings_created, total_participants, total_responses, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 0, 0, 0, $5, $5)
            RETURNING id, first_name, last_name, email, meetings_created, total_participants, total_responses, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| GatewayError::TransientIo(format!("create_user: {e}")))?;
        Ok(row_to_user(row))
    }

    #[instrument(skip(self))]
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, first_name, last_name, email, meetings_created, total_participants, total_responses, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GatewayError::TransientIo(format!("get_user_by_email: {e}")))?;
        Ok(row.map(row_to_user))
    }

    #[instrument(skip(self))]
    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, first_name, last_name, email, meetings_created, total_participants, total_responses, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GatewayError::TransientIo(format!("get_user_by_id: {e}")))?;
        Ok(row.map(row_to_user))
    }

    #[instrument(skip(self))]
    async fn increment_user_counters(
        &self,
        user_id: Uuid,
        delta_meetings: i64,
        delta_participants: i64,
        delta_responses: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET meetings_created = meetings_created + $2,
                total_participants = total_participants + $3,
                total_responses = total_responses + $4,
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(delta_meetings)
        .bind(delta_participants)
        .bind(delta_responses)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::TransientIo(format!("increment_user_counters: {e}")))?;
        Ok(())
    }

    /// A single atomic `INSERT ... ON CONFLICT DO NOTHING RETURNING` avoids a
    /// separate existence check racing against a concurrent insert of the
    /// same access code (TOCTOU).
    #[instrument(skip(self))]
    async fn create_meeting(
        &self,
        director_id: Uuid,
        access_code: &str,
        title: &str,
        description: &str,
        duration_minutes: i32,
    ) -> Result<std::result::Result<Meeting, AccessCodeConflict>> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO meetings (
                id, access_code, director_id, title, description,
                duration_minutes, duration_seconds_actual, total_questions_asked,
                participants_count, summary, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, 0, 0, 0, NULL, true, $7, $7)
            ON CONFLICT (access_code) WHERE is_active
            DO NOTHING
            RETURNING id, access_code, director_id, title, description, duration_minutes,
                duration_seconds_actual, total_questions_asked, participants_count, summary,
                is_active, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(access_code)
        .bind(director_id)
        .bind(title)
        .bind(description)
        .bind(duration_minutes)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GatewayError::TransientIo(format!("create_meeting: {e}")))?;

        match row {
            Some(row) => Ok(Ok(row_to_meeting(row))),
            None => Ok(Err(AccessCodeConflict)),
        }
    }

    #[instrument(skip(self))]
    async fn get_meeting_with_questions(
        &self,
        meeting_id: Uuid,
    ) -> Result<Option<(Meeting, Vec<Question>)>> {
        let meeting_row = sqlx::query(
            "SELECT id, access_code, director_id, title, description, duration_minutes, duration_seconds_actual, total_questions_asked, participants_count, summary, is_active, created_at, updated_at FROM meetings WHERE id = $1",
        )
        .bind(meeting_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GatewayError::TransientIo(format!("get_meeting: {e}")))?;

        let Some(meeting_row) = meeting_row else {
            return Ok(None);
        };
        let meeting = row_to_meeting(meeting_row);

        let question_rows = sqlx::query(
            "SELECT id, meeting_id, description, position, created_at, updated_at FROM questions WHERE meeting_id = $1 ORDER BY position ASC",
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GatewayError::TransientIo(format!("get_questions: {e}")))?;

        let questions = question_rows.into_iter().map(row_to_question).collect();
        Ok(Some((meeting, questions)))
    }

    #[instrument(skip(self))]
    async fn get_meeting_by_access_code(&self, access_code: &str) -> Result<Option<Meeting>> {
        let row = sqlx::query(
            "SELECT id, access_code, director_id, title, description, duration_minutes, duration_seconds_actual, total_questions_asked, participants_count, summary, is_active, created_at, updated_at FROM meetings WHERE access_code = $1 AND is_active",
        )
        .bind(access_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GatewayError::TransientIo(format!("get_meeting_by_access_code: {e}")))?;
        Ok(row.map(row_to_meeting))
    }

    #[instrument(skip(self))]
    async fn get_question_by_description(
        &self,
        meeting_id: Uuid,
        description: &str,
    ) -> Result<Option<Question>> {
        let row = sqlx::query(
            "SELECT id, meeting_id, description, position, created_at, updated_at FROM questions WHERE meeting_id = $1 AND description = $2",
        )
        .bind(meeting_id)
        .bind(description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GatewayError::TransientIo(format!("get_question_by_description: {e}")))?;
        Ok(row.map(row_to_question))
    }

    #[instrument(skip(self, descriptions))]
    async fn create_questions(
        &self,
        meeting_id: Uuid,
        descriptions: &[String],
    ) -> Result<Vec<Question>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| GatewayError::TransientIo(format!("begin tx: {e}")))?;

        let base: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position), 0) FROM questions WHERE meeting_id = $1",
        )
        .bind(meeting_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| GatewayError::TransientIo(format!("max position: {e}")))?;

        let now = Utc::now();
        let mut created = Vec::with_capacity(descriptions.len());
        for (offset, description) in descriptions.iter().enumerate() {
            let position = base + offset as i32 + 1;
            let row = sqlx::query(
                r#"
                INSERT INTO questions (id, meeting_id, description, position, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $5)
                RETURNING id, meeting_id, description, position, created_at, updated_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(meeting_id)
            .bind(description)
            .bind(position)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| GatewayError::TransientIo(format!("insert question: {e}")))?;
            created.push(row_to_question(row));
        }

        tx.commit()
            .await
            .map_err(|e| GatewayError::TransientIo(format!("commit tx: {e}")))?;
        Ok(created)
    }

    #[instrument(skip(self, text))]
    async fn create_response(
        &self,
        meeting_id: Uuid,
        question_id: Uuid,
        text: &str,
    ) -> Result<Response> {
        let trimmed = validate_response_text(text)?;
        let row = sqlx::query(
            r#"
            INSERT INTO responses (id, meeting_id, question_id, response_text, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, meeting_id, question_id, response_text, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(meeting_id)
        .bind(question_id)
        .bind(trimmed)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| GatewayError::TransientIo(format!("create_response: {e}")))?;
        Ok(row_to_response(row))
    }

    #[instrument(skip(self))]
    async fn get_responses_for_meeting(&self, meeting_id: Uuid) -> Result<Vec<Response>> {
        let rows = sqlx::query(
            "SELECT id, meeting_id, question_id, response_text, created_at FROM responses WHERE meeting_id = $1 ORDER BY created_at ASC",
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GatewayError::TransientIo(format!("get_responses_for_meeting: {e}")))?;
        Ok(rows.into_iter().map(row_to_response).collect())
    }

    #[instrument(skip(self))]
    async fn set_meeting_stats(
        &self,
        meeting_id: Uuid,
        duration_seconds: i32,
        participants: i32,
        questions_asked: i32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE meetings
            SET duration_seconds_actual = $2, participants_count = $3,
                total_questions_asked = $4, is_active = false, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(meeting_id)
        .bind(duration_seconds)
        .bind(participants)
        .bind(questions_asked)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::TransientIo(format!("set_meeting_stats: {e}")))?;
        Ok(())
    }

    #[instrument(skip(self, summary))]
    async fn set_meeting_summary(&self, meeting_id: Uuid, summary: serde_json::Value) -> Result<()> {
        sqlx::query("UPDATE meetings SET summary = $2, updated_at = $3 WHERE id = $1")
            .bind(meeting_id)
            .bind(summary)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| GatewayError::TransientIo(format!("set_meeting_summary: {e}")))?;
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn resolve_session(&self, token: &str) -> Result<Option<Uuid>> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT user_id FROM sessions WHERE token = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GatewayError::TransientIo(format!("resolve_session: {e}")))?;
        Ok(row.map(|(id,)| id))
    }
}
