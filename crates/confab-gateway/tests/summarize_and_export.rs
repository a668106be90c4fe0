//! HTTP surface tests for summarize/export/download (spec.md §6, §8
//! scenario 5: LLM metadata spoofing is rejected).

use serde_json::{json, Value};

mod support;
use support::{spawn, stub_llm};

#[tokio::test]
async fn summarize_persists_trusted_metadata_and_ignores_llm_spoofing() {
    let llm = stub_llm(&["Team is unblocked"], &[("What went well?", "Shipped on time.", 2)]);
    let server = spawn(llm).await;

    let director = server.repo.create_user("Ada", "Lovelace", "ada@example.com").await.unwrap();
    let meeting = server
        .repo
        .create_meeting(director.id, "77778888", "Standup", "Daily sync", 5)
        .await
        .unwrap()
        .unwrap();
    server.repo.create_questions(meeting.id, &["What went well?".into()]).await.unwrap();

    let client = reqwest::Client::new();
    let resp = client
        .post(server.http_url(&format!("/api/{}/summarize/", meeting.id)))
        .send()
        .await
        .expect("request sent");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body, json!({}));

    let (updated, _) = server.repo.get_meeting_with_questions(meeting.id).await.unwrap().unwrap();
    let summary = updated.summary.expect("summary persisted");
    assert_eq!(summary["meeting_title"], "Standup");
    assert_ne!(summary["meeting_title"], "HACKED");
    assert_eq!(summary["author"], "Ada Lovelace");
    assert_eq!(summary["questions_analysis"][0]["response_count"], 2);
}

#[tokio::test]
async fn summarize_failure_surfaces_coarse_error_body() {
    let llm = stub_llm(&[], &[]); // zero analyses, mismatched against one question
    let server = spawn(llm).await;

    let director = server.repo.create_user("Ada", "Lovelace", "ada@example.com").await.unwrap();
    let meeting = server
        .repo
        .create_meeting(director.id, "99990000", "Standup", "Daily sync", 5)
        .await
        .unwrap()
        .unwrap();
    server.repo.create_questions(meeting.id, &["Q1".into()]).await.unwrap();

    let client = reqwest::Client::new();
    let resp = client
        .post(server.http_url(&format!("/api/{}/summarize/", meeting.id)))
        .send()
        .await
        .expect("request sent");
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body, json!({"type": "error"}));
}

#[tokio::test]
async fn export_before_summarize_is_rejected() {
    let llm = stub_llm(&[], &[]);
    let server = spawn(llm).await;

    let director = server.repo.create_user("Ada", "Lovelace", "ada@example.com").await.unwrap();
    let meeting = server
        .repo
        .create_meeting(director.id, "12121212", "Standup", "Daily sync", 5)
        .await
        .unwrap()
        .unwrap();

    let client = reqwest::Client::new();
    let resp = client
        .post(server.http_url(&format!("/api/{}/export/", meeting.id)))
        .json(&json!({"type": "pdf"}))
        .send()
        .await
        .expect("request sent");
    assert_ne!(resp.status(), reqwest::StatusCode::OK);
    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body, json!({"type": "error"}));
}

/// The download route only ever serves the exact `meeting_<uuid>.<ext>`
/// shape `export::filename` produces; a percent-encoded traversal attempt
/// must not escape the export directory.
#[tokio::test]
async fn download_rejects_path_traversal_attempts() {
    let llm = stub_llm(&[], &[]);
    let server = spawn(llm).await;

    let client = reqwest::Client::new();
    let resp = client
        .get(server.http_url("/download/..%2f..%2fCargo.toml"))
        .send()
        .await
        .expect("request sent");
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn download_missing_file_is_not_found() {
    let llm = stub_llm(&[], &[]);
    let server = spawn(llm).await;

    let client = reqwest::Client::new();
    let resp = client
        .get(server.http_url("/download/meeting_00000000-0000-0000-0000-000000000000.pdf"))
        .send()
        .await
        .expect("request sent");
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
}
