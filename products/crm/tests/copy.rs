use crm::copy::{
    CopyGenerator, GenerateCopyRequest, OpenAiCopyGenerator, OpenAiSettings, Recipient,
    RewriteCopyRequest,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn generator(server: &MockServer) -> OpenAiCopyGenerator {
    OpenAiCopyGenerator::new(OpenAiSettings {
        api_key: "sk-test".into(),
        base_url: server.uri(),
        ..OpenAiSettings::default()
    })
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }],
        "usage": { "total_tokens": 42 }
    }))
}

fn email_request() -> GenerateCopyRequest {
    GenerateCopyRequest {
        copy_type_id: Some("sales-email".into()),
        goal: Some("Book a demo".into()),
        length: Some("short".into()),
        recipient: Some(Recipient {
            name: Some("Ada Lovelace".into()),
            company: Some("Analytical Engines".into()),
            ..Recipient::default()
        }),
        ..GenerateCopyRequest::default()
    }
}

#[tokio::test]
async fn recipient_copy_splits_subject_from_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({ "model": "gpt-4o-mini", "max_tokens": 200 })))
        .respond_with(completion("Subject: Engines, faster\n\nHi Ada,\nWorth a chat?"))
        .expect(1)
        .mount(&server)
        .await;

    let copy = generator(&server).generate_with_recipient(&email_request()).await;
    assert_eq!(copy.subject.as_deref(), Some("Engines, faster"));
    assert_eq!(copy.body, "Hi Ada,\nWorth a chat?");
}

#[tokio::test]
async fn server_errors_fall_back_to_templates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let copy = generator(&server).generate_with_recipient(&email_request()).await;
    assert!(copy.body.starts_with("Hi Ada,"));
    assert!(copy.body.contains("[Note: Configure OpenAI API key"));
    assert_eq!(
        copy.subject.as_deref(),
        Some("Meeting request: Analytical Engines partnership")
    );
}

#[tokio::test]
async fn empty_completion_falls_back_on_rewrite() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion("   "))
        .mount(&server)
        .await;

    let request = RewriteCopyRequest {
        original_copy: Some("Let's talk next week.".into()),
        adjustment: Some("friendlier".into()),
    };
    let rewritten = generator(&server).rewrite(&request).await;
    assert!(rewritten.starts_with("Let's talk next week.\n\n[Note:"));
}

#[tokio::test]
async fn plain_generation_returns_completion_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "max_tokens": 500 })))
        .respond_with(completion("Quick note on pricing."))
        .mount(&server)
        .await;

    let request = GenerateCopyRequest {
        copy_type_id: Some("follow-up".into()),
        goal: Some("Nudge on pricing".into()),
        ..GenerateCopyRequest::default()
    };
    assert_eq!(
        generator(&server).generate(&request).await,
        "Quick note on pricing."
    );
}
