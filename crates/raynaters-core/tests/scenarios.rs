//! End-to-end scenarios against a mock Gemini endpoint.

use std::sync::Arc;

use httpmock::prelude::*;
use raynaters_core::{
    ChatSession, ChatTurn, CompanionChat, GeminiClient, ProposalDesk, ProposalError,
    ProposalGenerator, ProposalStatus, FALLBACK_REPLY,
};
use serde_json::json;

const MODEL: &str = "gemini-2.5-flash";
const PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn candidate(text: &str) -> serde_json::Value {
    json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }] })
}

fn proposal_payload() -> String {
    json!({
        "strategy": "Build a scheduled job that reads the spreadsheet and upserts leads into the CRM.",
        "sampleOutput": "{\"imported\": 37, \"skipped_duplicates\": 4}",
        "efficiencySeries": [
            { "label": "Month 1", "value": 10 },
            { "label": "Month 2", "value": 18 },
            { "label": "Month 3", "value": 26 },
            { "label": "Month 4", "value": 33 },
            { "label": "Month 5", "value": 40 }
        ]
    })
    .to_string()
}

#[tokio::test]
async fn spreadsheet_to_crm_proposal() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(PATH)
                .body_contains("My sales team manually copies leads from a spreadsheet into our CRM every morning")
                .body_contains("\"responseMimeType\":\"application/json\"");
            then.status(200).json_body(candidate(&proposal_payload()));
        })
        .await;

    let backend = Arc::new(GeminiClient::with_base_url("test-key", &server.base_url()));
    let generator = ProposalGenerator::new(backend, MODEL);

    let proposal = generator
        .generate_proposal("My sales team manually copies leads from a spreadsheet into our CRM every morning")
        .await
        .unwrap();

    mock.assert_async().await;
    let expected: raynaters_core::AutomationProposal =
        serde_json::from_str(&proposal_payload()).unwrap();
    assert_eq!(proposal, expected);
    assert_eq!(proposal.efficiency_series.len(), 5);
    assert_eq!(proposal.efficiency_series[0].label, "Month 1");
    assert_eq!(proposal.efficiency_series[0].value, 10.0);
}

#[tokio::test]
async fn repeated_proposals_share_shape() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(PATH);
            then.status(200).json_body(candidate(&proposal_payload()));
        })
        .await;

    let backend = Arc::new(GeminiClient::with_base_url("test-key", &server.base_url()));
    let generator = ProposalGenerator::new(backend, MODEL);

    let first = serde_json::to_value(generator.generate_proposal("same input").await.unwrap()).unwrap();
    let second = serde_json::to_value(generator.generate_proposal("same input").await.unwrap()).unwrap();

    // Stateless: both calls reach the backend.
    mock.assert_hits_async(2).await;
    let keys = |v: &serde_json::Value| {
        let mut keys: Vec<String> = v.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    };
    assert_eq!(keys(&first), keys(&second));
}

#[tokio::test]
async fn proposal_service_error_is_surfaced() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(PATH);
            then.status(503).body("overloaded");
        })
        .await;

    let backend = Arc::new(GeminiClient::with_base_url("test-key", &server.base_url()));
    let generator = ProposalGenerator::new(backend, MODEL);

    let mut desk = ProposalDesk::new();
    let status = desk.submit(&generator, "copy invoices by hand").await;
    assert!(matches!(status, ProposalStatus::Error(_)));

    let err = generator.generate_proposal("copy invoices by hand").await.unwrap_err();
    assert!(matches!(err, ProposalError::Backend(_)));
}

#[tokio::test]
async fn chat_transport_error_appends_fallback() {
    // Nothing listens here, so the request fails at the transport level.
    let backend = Arc::new(GeminiClient::with_base_url("test-key", "http://127.0.0.1:9"));
    let chat = CompanionChat::new(backend, MODEL);

    let prior = vec![ChatTurn::assistant("Greetings.")];
    assert_eq!(chat.continue_chat(&prior, "What services do you offer?").await, FALLBACK_REPLY);

    let mut session = ChatSession::new();
    let greeting = session.turns()[0].clone();
    let reply = session.send(&chat, "What services do you offer?").await.cloned();

    assert_eq!(reply, Some(ChatTurn::assistant(FALLBACK_REPLY)));
    assert_eq!(session.len(), 3);
    assert_eq!(session.turns()[0], greeting);
    assert_eq!(session.turns()[1], ChatTurn::user("What services do you offer?"));
    assert_eq!(session.turns()[2], ChatTurn::assistant(FALLBACK_REPLY));

    // Repeated failures keep appending the same fallback.
    session.send(&chat, "Hello?").await;
    assert_eq!(session.len(), 5);
    assert_eq!(session.turns()[4], ChatTurn::assistant(FALLBACK_REPLY));
}

#[tokio::test]
async fn chat_session_round_trip() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(PATH)
                .body_contains("\"systemInstruction\"")
                .body_contains("What services do you offer?");
            then.status(200)
                .json_body(candidate("Business Automation, Data Intelligence and more. Which one interests you?"));
        })
        .await;

    let backend = Arc::new(GeminiClient::with_base_url("test-key", &server.base_url()));
    let chat = CompanionChat::new(backend, MODEL);
    let mut session = ChatSession::new();

    let reply = session.send(&chat, "What services do you offer?").await.cloned();

    mock.assert_async().await;
    assert_eq!(
        reply.map(|t| t.content),
        Some("Business Automation, Data Intelligence and more. Which one interests you?".to_string())
    );
    assert_eq!(session.len(), 3);
}
