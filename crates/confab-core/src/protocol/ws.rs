//! Message envelopes for the meeting WebSocket routes (spec.md §6).
//!
//! Each direction gets its own tagged enum rather than one shared envelope:
//! the same `type` string (e.g. `start_meeting`) carries a different payload
//! shape depending on who is sending to whom, so collapsing them into one
//! enum would make half the variants have dead fields. Unknown fields are
//! rejected on every inbound enum to keep the contract strict.

use serde::{Deserialize, Serialize};

/// Connected-participant summary sent to the host on join (`S→H participant_joined`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantStatus {
    pub name: String,
    pub status: String,
}

impl ParticipantStatus {
    pub fn connected(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: "Connected".to_string(),
        }
    }
}

/// Messages the server sends to the host endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerToHost {
    #[serde(rename = "start_meeting")]
    StartMeeting {
        questions: Vec<String>,
        access_code: String,
    },
    #[serde(rename = "end_meeting")]
    EndMeeting { url: String },
    #[serde(rename = "participant_joined")]
    ParticipantJoined { participant: ParticipantStatus },
    #[serde(rename = "participant_left")]
    ParticipantLeft { name: String },
    #[serde(rename = "answer_submitted")]
    AnswerSubmitted,
}

/// Messages the host endpoint sends to the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", deny_unknown_fields)]
pub enum HostToServer {
    #[serde(rename = "start_meeting")]
    StartMeeting { question: String },
    #[serde(rename = "next_question")]
    NextQuestion { question: String },
    #[serde(rename = "end_meeting")]
    EndMeeting,
}

/// Messages the server sends to a participant endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerToParticipant {
    #[serde(rename = "start_meeting")]
    StartMeeting { question: String },
    #[serde(rename = "next_question")]
    NextQuestion { question: String },
    #[serde(rename = "end_meeting")]
    EndMeeting { url: String },
    #[serde(rename = "update_name")]
    UpdateName { name: String },
    #[serde(rename = "submit_error")]
    SubmitError,
    #[serde(rename = "invalid_answer")]
    InvalidAnswer,
}

/// Messages a participant endpoint sends to the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", deny_unknown_fields)]
pub enum ParticipantToServer {
    #[serde(rename = "participant_joined")]
    ParticipantJoined { name: String },
    #[serde(rename = "submit_answer")]
    SubmitAnswer { question: String, answer: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_to_server_rejects_unknown_fields() {
        let raw = r#"{"type":"start_meeting","question":"Q1","extra":true}"#;
        let err = serde_json::from_str::<HostToServer>(raw).unwrap_err();
        assert!(err.to_string().contains("extra"));
    }

    #[test]
    fn participant_joined_round_trips() {
        let raw = r#"{"type":"participant_joined","name":"Ada"}"#;
        let msg: ParticipantToServer = serde_json::from_str(raw).expect("valid envelope");
        match msg {
            ParticipantToServer::ParticipantJoined { name } => assert_eq!(name, "Ada"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn submit_answer_deserializes_both_fields() {
        let raw = r#"{"type":"submit_answer","question":"Favorite color?","answer":"blue"}"#;
        let msg: ParticipantToServer = serde_json::from_str(raw).expect("valid envelope");
        match msg {
            ParticipantToServer::SubmitAnswer { question, answer } => {
                assert_eq!(question, "Favorite color?");
                assert_eq!(answer, "blue");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn server_to_host_serializes_tagged_envelope() {
        let msg = ServerToHost::ParticipantJoined {
            participant: ParticipantStatus::connected("Ada"),
        };
        let json = serde_json::to_value(&msg).expect("serializable");
        assert_eq!(json["type"], "participant_joined");
        assert_eq!(json["participant"]["status"], "Connected");
    }

    #[test]
    fn server_to_participant_end_meeting_carries_url() {
        let msg = ServerToParticipant::EndMeeting {
            url: "/download/meeting_abc.pdf".to_string(),
        };
        let json = serde_json::to_value(&msg).expect("serializable");
        assert_eq!(json["type"], "end_meeting");
        assert_eq!(json["url"], "/download/meeting_abc.pdf");
    }
}
