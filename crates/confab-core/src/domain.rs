//! Domain model shared by the repository, the session engine, and the
//! summarization/export pipelines. Pure data + validation; no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GatewayError;

pub const TITLE_MAX_LEN: usize = 40;
pub const DESCRIPTION_MAX_LEN: usize = 300;
pub const QUESTION_DESCRIPTION_MAX_LEN: usize = 300;
pub const RESPONSE_TEXT_MIN_LEN: usize = 1;
pub const RESPONSE_TEXT_MAX_LEN: usize = 500;
pub const DURATION_MIN_MINUTES: i32 = 1;
pub const DURATION_MAX_MINUTES: i32 = 60;
pub const MAX_QUESTIONS_PER_MEETING: usize = 20;
pub const MAX_PARTICIPANTS: i32 = 1000;
pub const PARTICIPANT_NAME_MAX_LEN: usize = 30;
pub const ACCESS_CODE_LEN: usize = 8;
pub const SUMMARY_RESPONSE_COUNT_MAX: i64 = 200;

/// No responses literal substituted into the LLM prompt per spec.md §4.6 step 2.
pub const NO_RESPONSES_LITERAL: &str = "No responses received for this question";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub meetings_created: i64,
    pub total_participants: i64,
    pub total_responses: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: Uuid,
    pub access_code: String,
    pub director_id: Uuid,
    pub title: String,
    pub description: String,
    pub duration_minutes: i32,
    pub duration_seconds_actual: i32,
    pub total_questions_asked: i32,
    pub participants_count: i32,
    pub summary: Option<serde_json::Value>,
    /// False once the session has ended (`set_meeting_stats` was called).
    /// `access_code` uniqueness (spec.md §3) is scoped to active meetings only.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    /// `summary` is empty per the Open Question resolution in spec.md §9:
    /// `is_empty(summary)` rather than the self-contradictory `== {}` check.
    pub fn has_summary(&self) -> bool {
        match &self.summary {
            None => false,
            Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Object(map)) => !map.is_empty(),
            Some(_) => true,
        }
    }

    pub fn has_ended(&self) -> bool {
        !self.is_active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub meeting_id: Uuid,
    pub description: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: Uuid,
    pub meeting_id: Uuid,
    pub question_id: Uuid,
    pub response_text: String,
    pub created_at: DateTime<Utc>,
}

/// Validates and trims a meeting title.
pub fn validate_title(title: &str) -> crate::Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() || trimmed.chars().count() > TITLE_MAX_LEN {
        return Err(GatewayError::Validation(format!(
            "title must be 1..={TITLE_MAX_LEN} chars"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validates and trims a meeting description.
pub fn validate_description(description: &str) -> crate::Result<String> {
    let trimmed = description.trim();
    if trimmed.is_empty() || trimmed.chars().count() > DESCRIPTION_MAX_LEN {
        return Err(GatewayError::Validation(format!(
            "description must be 1..={DESCRIPTION_MAX_LEN} chars"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validates meeting duration in minutes (1..=60 per spec.md §3).
pub fn validate_duration_minutes(minutes: i32) -> crate::Result<i32> {
    if !(DURATION_MIN_MINUTES..=DURATION_MAX_MINUTES).contains(&minutes) {
        return Err(GatewayError::Validation(format!(
            "duration must be {DURATION_MIN_MINUTES}..={DURATION_MAX_MINUTES} minutes"
        )));
    }
    Ok(minutes)
}

/// Validates a question description (non-empty after trim, ≤300 chars).
pub fn validate_question_description(description: &str) -> crate::Result<String> {
    let trimmed = description.trim();
    if trimmed.is_empty() || trimmed.chars().count() > QUESTION_DESCRIPTION_MAX_LEN {
        return Err(GatewayError::Validation(format!(
            "question description must be 1..={QUESTION_DESCRIPTION_MAX_LEN} chars"
        )));
    }
    Ok(trimmed.to_string())
}

/// Centralizes response validation per spec.md §9 ("Response validation").
/// All paths that persist a response text MUST funnel through this.
pub fn validate_response_text(text: &str) -> crate::Result<String> {
    let trimmed = text.trim();
    let len = trimmed.chars().count();
    if len < RESPONSE_TEXT_MIN_LEN || len > RESPONSE_TEXT_MAX_LEN {
        return Err(GatewayError::Validation(format!(
            "response text must be {RESPONSE_TEXT_MIN_LEN}..={RESPONSE_TEXT_MAX_LEN} chars"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validates a participant display name (1..=30 chars, per spec.md §4.4).
pub fn validate_participant_name(name: &str) -> crate::Result<String> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len < 1 || len > PARTICIPANT_NAME_MAX_LEN {
        return Err(GatewayError::Validation(format!(
            "participant name must be 1..={PARTICIPANT_NAME_MAX_LEN} chars"
        )));
    }
    Ok(trimmed.to_string())
}

/// One analyzed question in a [`SummaryBlob`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionAnalysis {
    pub question: String,
    pub summary: String,
    pub response_count: i64,
}

/// The trusted, reconstructed meeting summary (spec.md §3, §4.6).
///
/// Only `questions_analysis` and `key_takeaways` ever originate from the LLM
/// response; every other field is copied from trusted meeting metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryBlob {
    pub meeting_title: String,
    pub meeting_description: String,
    pub date: String,
    pub time_created: String,
    pub author: String,
    pub questions_analysis: Vec<QuestionAnalysis>,
    pub key_takeaways: Vec<String>,
}

impl SummaryBlob {
    /// Validates the invariants spec.md §4.6/§8 place on a persisted summary,
    /// applied uniformly by both export renderers.
    pub fn validate(&self) -> crate::Result<()> {
        if self.meeting_title.trim().is_empty()
            || self.meeting_description.trim().is_empty()
            || self.date.trim().is_empty()
            || self.time_created.trim().is_empty()
            || self.author.trim().is_empty()
        {
            return Err(GatewayError::Validation("summary metadata fields must be non-empty".into()));
        }
        if self.questions_analysis.is_empty() {
            return Err(GatewayError::Validation("questions_analysis must be non-empty".into()));
        }
        for qa in &self.questions_analysis {
            if qa.question.trim().is_empty() || qa.summary.trim().is_empty() {
                return Err(GatewayError::Validation(
                    "each question analysis needs a non-empty question and summary".into(),
                ));
            }
            if !(0..=SUMMARY_RESPONSE_COUNT_MAX).contains(&qa.response_count) {
                return Err(GatewayError::Validation(format!(
                    "response_count must be 0..={SUMMARY_RESPONSE_COUNT_MAX}"
                )));
            }
        }
        if self.key_takeaways.is_empty() {
            return Err(GatewayError::Validation("key_takeaways must be non-empty".into()));
        }
        if self.key_takeaways.iter().any(|t| t.trim().is_empty()) {
            return Err(GatewayError::Validation("key_takeaways entries must be non-empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_text_boundaries() {
        assert!(validate_response_text(&"a".repeat(1)).is_ok());
        assert!(validate_response_text(&"a".repeat(500)).is_ok());
        assert!(validate_response_text("").is_err());
        assert!(validate_response_text(&"a".repeat(501)).is_err());
    }

    #[test]
    fn response_text_trims_before_checking_length() {
        assert!(validate_response_text("   ").is_err());
        assert_eq!(validate_response_text("  hi  ").expect("valid"), "hi");
    }

    #[test]
    fn duration_boundaries() {
        assert!(validate_duration_minutes(1).is_ok());
        assert!(validate_duration_minutes(60).is_ok());
        assert!(validate_duration_minutes(0).is_err());
        assert!(validate_duration_minutes(61).is_err());
    }

    #[test]
    fn meeting_has_summary_rejects_null_and_empty_object() {
        let mut m = sample_meeting();
        assert!(!m.has_summary());
        m.summary = Some(serde_json::json!({}));
        assert!(!m.has_summary());
        m.summary = Some(serde_json::json!({"meeting_title": "x"}));
        assert!(m.has_summary());
    }

    fn sample_meeting() -> Meeting {
        Meeting {
            id: Uuid::nil(),
            access_code: "12345678".into(),
            director_id: Uuid::nil(),
            title: "t".into(),
            description: "d".into(),
            duration_minutes: 5,
            duration_seconds_actual: 0,
            total_questions_asked: 0,
            participants_count: 0,
            summary: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn summary_blob_rejects_out_of_range_response_count() {
        let blob = SummaryBlob {
            meeting_title: "t".into(),
            meeting_description: "d".into(),
            date: "28 July 2026".into(),
            time_created: "10:00".into(),
            author: "Ada Lovelace".into(),
            questions_analysis: vec![QuestionAnalysis {
                question: "q".into(),
                summary: "s".into(),
                response_count: 201,
            }],
            key_takeaways: vec!["k".into()],
        };
        assert!(blob.validate().is_err());
    }
}
