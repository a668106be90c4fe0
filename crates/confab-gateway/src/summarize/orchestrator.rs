//! Assembles aggregated meeting data, calls the LLM with a fixed prompt, and
//! reconstructs a trusted [`SummaryBlob`] (spec.md §4.6).
//!
//! Step 6 is the trust boundary: every field *except* `summary` and
//! `response_count` inside `questions_analysis`, and the `key_takeaways`
//! array, is copied from trusted meeting metadata — never from the LLM
//! response. This also resolves the ordering invariant in spec.md §8
//! ("same order as meeting questions") by construction: the per-question
//! `question` text is always the meeting's own `Question.description`, never
//! an LLM echo, so drift is structurally impossible.

use std::sync::Arc;

use chrono_tz::America::Toronto;
use serde::Deserialize;
use uuid::Uuid;

use confab_core::domain::{QuestionAnalysis, SummaryBlob, NO_RESPONSES_LITERAL, SUMMARY_RESPONSE_COUNT_MAX};
use confab_core::error::{GatewayError, Result};

use crate::repo::RepoStore;

use super::llm::LlmClient;

const SYSTEM_PROMPT: &str = "You are summarizing responses collected during a live meeting. \
Return ONLY a JSON object with exactly two top-level keys: \"questions_analysis\" and \
\"key_takeaways\". \"questions_analysis\" must be an array with exactly one entry per question \
given, in the same order, each with \"question\" (echo the question given), \"summary\" (a \
concise prose summary of that question's responses), and \"response_count\" (the integer number \
of responses analyzed for that question). \"key_takeaways\" must be a non-empty array of short \
strings capturing overall themes. Never include any other field — in particular never invent a \
meeting title, date, time, or author; those are not your concern and will be discarded if present.";

/// One question's responses as handed to the LLM, accumulated in meeting
/// question order (spec.md §4.6 step 2).
struct QuestionBundle {
    description: String,
    responses: Vec<String>,
}

/// Accepts `response_count` as either a JSON number or a numeric string
/// (spec.md §4.6 validation: "an integer or numeric string parseable to an
/// integer").
#[derive(Deserialize)]
#[serde(untagged)]
enum FlexibleCount {
    Int(i64),
    Str(String),
}

impl FlexibleCount {
    fn parse(self) -> Result<i64> {
        match self {
            FlexibleCount::Int(n) => Ok(n),
            FlexibleCount::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| GatewayError::Validation(format!("response_count not an integer: {s:?}"))),
        }
    }
}

#[derive(Deserialize)]
struct LlmQuestionAnalysis {
    #[serde(default)]
    #[allow(dead_code)]
    question: String,
    summary: String,
    response_count: FlexibleCount,
}

#[derive(Deserialize)]
struct LlmSummaryResponse {
    questions_analysis: Vec<LlmQuestionAnalysis>,
    key_takeaways: Vec<String>,
}

pub struct SummaryOrchestrator;

impl SummaryOrchestrator {
    pub async fn summarize(repo: &Arc<dyn RepoStore>, llm: &Arc<dyn LlmClient>, meeting_id: Uuid) -> Result<SummaryBlob> {
        let (meeting, questions) = repo
            .get_meeting_with_questions(meeting_id)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("meeting {meeting_id}")))?;
        let director = repo
            .get_user_by_id(meeting.director_id)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("user {}", meeting.director_id)))?;
        let responses = repo.get_responses_for_meeting(meeting_id).await?;

        let bundles: Vec<QuestionBundle> = questions
            .iter()
            .map(|q| {
                let mut texts: Vec<String> = responses
                    .iter()
                    .filter(|r| r.question_id == q.id)
                    .map(|r| r.response_text.clone())
                    .collect();
                if texts.is_empty() {
                    texts.push(NO_RESPONSES_LITERAL.to_string());
                }
                QuestionBundle {
                    description: q.description.clone(),
                    responses: texts,
                }
            })
            .collect();

        let user_prompt = Self::build_prompt(&bundles);
        let raw = llm.complete_json(SYSTEM_PROMPT, &user_prompt).await?;
        let parsed: LlmSummaryResponse = serde_json::from_value(raw)
            .map_err(|e| GatewayError::Validation(format!("llm response failed schema: {e}")))?;

        if parsed.questions_analysis.len() != bundles.len() {
            return Err(GatewayError::Validation(format!(
                "llm returned {} question analyses, expected {}",
                parsed.questions_analysis.len(),
                bundles.len()
            )));
        }

        let mut questions_analysis = Vec::with_capacity(bundles.len());
        for (bundle, analysis) in bundles.iter().zip(parsed.questions_analysis.into_iter()) {
            let summary = analysis.summary.trim().to_string();
            if summary.is_empty() {
                return Err(GatewayError::Validation("llm returned an empty question summary".into()));
            }
            let response_count = analysis.response_count.parse()?;
            if !(0..=SUMMARY_RESPONSE_COUNT_MAX).contains(&response_count) {
                return Err(GatewayError::Validation(format!(
                    "response_count {response_count} out of range"
                )));
            }
            questions_analysis.push(QuestionAnalysis {
                question: bundle.description.clone(),
                summary,
                response_count,
            });
        }

        if parsed.key_takeaways.is_empty() {
            return Err(GatewayError::Validation("llm returned no key takeaways".into()));
        }
        let key_takeaways: Vec<String> = parsed
            .key_takeaways
            .iter()
            .map(|t| t.trim().to_string())
            .collect();
        if key_takeaways.iter().any(|t| t.is_empty()) {
            return Err(GatewayError::Validation("llm returned an empty key takeaway".into()));
        }

        let local = meeting.created_at.with_timezone(&Toronto);
        let blob = SummaryBlob {
            meeting_title: meeting.title.clone(),
            meeting_description: meeting.description.clone(),
            date: local.format("%d %B %Y").to_string(),
            time_created: local.format("%H:%M").to_string(),
            author: director.full_name(),
            questions_analysis,
            key_takeaways,
        };
        blob.validate()?;

        repo.set_meeting_summary(meeting_id, serde_json::to_value(&blob).map_err(|e| {
            GatewayError::Fatal(format!("summary blob failed to serialize: {e}"))
        })?)
        .await?;

        Ok(blob)
    }

    fn build_prompt(bundles: &[QuestionBundle]) -> String {
        let mut out = String::from("Questions and their collected responses:\n\n");
        for (i, bundle) in bundles.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, bundle.description));
            for response in &bundle.responses {
                out.push_str(&format!("   - {response}\n"));
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use confab_core::domain::validate_duration_minutes;

    use super::*;
    use crate::repo::FakeRepoStore;
    use crate::summarize::llm::StubLlmClient;

    async fn seeded_meeting(repo: &FakeRepoStore) -> Uuid {
        let director = repo.create_user("Ada", "Lovelace", "ada@example.com").await.expect("user");
        let meeting = repo
            .create_meeting(director.id, "12345678", "Standup", "Daily sync", 5)
            .await
            .expect("created")
            .expect("no conflict");
        repo.create_questions(meeting.id, &["What went well?".into(), "Blockers?".into()])
            .await
            .expect("questions");
        assert!(validate_duration_minutes(5).is_ok());
        meeting.id
    }

    #[tokio::test]
    async fn empty_response_question_gets_literal_and_zero_count() {
        let repo = Arc::new(FakeRepoStore::new());
        let meeting_id = seeded_meeting(&repo).await;
        let (_, questions) = repo.get_meeting_with_questions(meeting_id).await.unwrap().unwrap();
        repo.create_response(meeting_id, questions[0].id, "shipped it").await.unwrap();

        let llm: Arc<dyn LlmClient> = Arc::new(StubLlmClient::fixed(json!({
            "questions_analysis": [
                {"question": "What went well?", "summary": "Shipped on time.", "response_count": 1},
                {"question": "Blockers?", "summary": "None reported.", "response_count": "0"},
            ],
            "key_takeaways": ["Team is unblocked."],
        })));
        let repo_trait: Arc<dyn RepoStore> = repo.clone();

        let blob = SummaryOrchestrator::summarize(&repo_trait, &llm, meeting_id).await.expect("summarized");
        assert_eq!(blob.questions_analysis.len(), 2);
        assert_eq!(blob.questions_analysis[1].question, "Blockers?");
        assert_eq!(blob.questions_analysis[1].response_count, 0);
    }

    #[tokio::test]
    async fn llm_metadata_spoofing_is_discarded() {
        let repo = Arc::new(FakeRepoStore::new());
        let meeting_id = seeded_meeting(&repo).await;
        let repo_trait: Arc<dyn RepoStore> = repo.clone();

        let llm: Arc<dyn LlmClient> = Arc::new(StubLlmClient::spoofing(
            json!([
                {"question": "x", "summary": "a", "response_count": 0},
                {"question": "y", "summary": "b", "response_count": 0},
            ]),
            json!(["takeaway"]),
        ));

        let blob = SummaryOrchestrator::summarize(&repo_trait, &llm, meeting_id).await.expect("summarized");
        assert_eq!(blob.meeting_title, "Standup");
        assert_ne!(blob.meeting_title, "HACKED");
        assert_eq!(blob.author, "Ada Lovelace");
    }

    #[tokio::test]
    async fn mismatched_question_count_is_rejected() {
        let repo = Arc::new(FakeRepoStore::new());
        let meeting_id = seeded_meeting(&repo).await;
        let repo_trait: Arc<dyn RepoStore> = repo.clone();

        let llm: Arc<dyn LlmClient> = Arc::new(StubLlmClient::fixed(json!({
            "questions_analysis": [
                {"question": "only one", "summary": "a", "response_count": 0},
            ],
            "key_takeaways": ["x"],
        })));

        let err = SummaryOrchestrator::summarize(&repo_trait, &llm, meeting_id).await.unwrap_err();
        assert_eq!(err.client_code().as_str(), "VALIDATION");
    }
}
