//! Black-box coverage of the domain/protocol contracts consumed by the
//! gateway crate: validation boundaries and wire-envelope shapes that must
//! hold regardless of internal refactors.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use confab_core::domain::{
    validate_participant_name, validate_question_description, validate_title, Meeting,
    QuestionAnalysis, SummaryBlob, ACCESS_CODE_LEN, MAX_QUESTIONS_PER_MEETING,
};
use confab_core::protocol::ws::{HostToServer, ParticipantToServer, ServerToParticipant};

#[test]
fn title_boundary_is_inclusive_at_forty_chars() {
    assert!(validate_title(&"a".repeat(40)).is_ok());
    assert!(validate_title(&"a".repeat(41)).is_err());
    assert!(validate_title("   ").is_err());
}

#[test]
fn participant_name_rejects_empty_after_trim() {
    assert!(validate_participant_name("  ").is_err());
    assert_eq!(validate_participant_name("  Ada  ").unwrap(), "Ada");
}

#[test]
fn question_description_boundary_matches_meeting_description() {
    assert!(validate_question_description(&"q".repeat(300)).is_ok());
    assert!(validate_question_description(&"q".repeat(301)).is_err());
}

#[test]
fn access_code_len_constant_matches_eight_digit_codes() {
    assert_eq!(ACCESS_CODE_LEN, 8);
}

#[test]
fn max_questions_per_meeting_is_twenty() {
    assert_eq!(MAX_QUESTIONS_PER_MEETING, 20);
}

/// A summary with a mismatched-case field (everything present but the LLM
/// somehow emitted a takeaways list of only whitespace) must fail validation
/// rather than export a blank page.
#[test]
fn summary_blob_rejects_whitespace_only_takeaway() {
    let blob = SummaryBlob {
        meeting_title: "Standup".into(),
        meeting_description: "Daily sync".into(),
        date: "28 July 2026".into(),
        time_created: "09:00".into(),
        author: "Ada Lovelace".into(),
        questions_analysis: vec![QuestionAnalysis {
            question: "What went well?".into(),
            summary: "Shipped on time.".into(),
            response_count: 1,
        }],
        key_takeaways: vec!["   ".into()],
    };
    assert!(blob.validate().is_err());
}

#[test]
fn meeting_has_ended_mirrors_is_active_flag() {
    let meeting = Meeting {
        id: uuid::Uuid::nil(),
        access_code: "12345678".into(),
        director_id: uuid::Uuid::nil(),
        title: "t".into(),
        description: "d".into(),
        duration_minutes: 5,
        duration_seconds_actual: 0,
        total_questions_asked: 0,
        participants_count: 0,
        summary: None,
        is_active: false,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };
    assert!(meeting.has_ended());
}

#[test]
fn host_to_server_next_question_round_trips() {
    let raw = r#"{"type":"next_question","question":"Blockers?"}"#;
    let msg: HostToServer = serde_json::from_str(raw).expect("valid envelope");
    match msg {
        HostToServer::NextQuestion { question } => assert_eq!(question, "Blockers?"),
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[test]
fn host_to_server_end_meeting_has_no_payload() {
    let raw = r#"{"type":"end_meeting"}"#;
    let msg: HostToServer = serde_json::from_str(raw).expect("valid envelope");
    assert!(matches!(msg, HostToServer::EndMeeting));
}

#[test]
fn participant_to_server_rejects_unknown_variant_tag() {
    let raw = r#"{"type":"not_a_real_message"}"#;
    assert!(serde_json::from_str::<ParticipantToServer>(raw).is_err());
}

#[test]
fn server_to_participant_invalid_answer_has_stable_tag() {
    let json = serde_json::to_value(ServerToParticipant::InvalidAnswer).expect("serializable");
    assert_eq!(json, serde_json::json!({"type": "invalid_answer"}));
}
