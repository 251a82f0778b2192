//! HTTP API integration tests

use std::time::Duration;

use asl_agent::api::{router, AppState};
use asl_agent::db::{ConnectionConfig, Database};
use asl_agent::services::{ComposerDefaults, SentenceComposer};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestApp {
    _dir: tempfile::TempDir,
    app: Router,
}

fn test_app(base_url: &str, api_key: Option<&str>) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(&dir.path().join("api.db"), &ConnectionConfig::default()).unwrap();
    db.initialize().unwrap();
    db.seed().unwrap();

    let composer = SentenceComposer::new(ComposerDefaults {
        api_key: api_key.map(str::to_string),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
        ..ComposerDefaults::default()
    });
    TestApp {
        _dir: dir,
        app: router(AppState::new(db, composer)),
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn completion(content: &str) -> Value {
    json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
}

const SEED_SESSION: &str = "33333333-3333-3333-3333-333333333333";

#[tokio::test]
async fn root_and_health() {
    let t = test_app("http://127.0.0.1:1", None);
    let (status, body) = send(&t.app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "ASL Agent API is running.");

    let (status, body) = send(&t.app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn rule_crud_flow() {
    let t = test_app("http://127.0.0.1:1", None);

    let (status, created) = send(
        &t.app,
        "POST",
        "/expression_rules",
        Some(json!({
            "emotion": "calm",
            "intent": "statement",
            "punctuation_adjustment": "keep period",
            "tts_tone": "even"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["confidence_threshold"], 0.7);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, listed) = send(&t.app, "GET", "/expression_rules?emotion=calm", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, all) = send(&t.app, "GET", "/expression_rules?emotion=", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (status, updated) = send(
        &t.app,
        "PUT",
        &format!("/expression_rules/{id}"),
        Some(json!({"tts_tone": "warm"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["tts_tone"], "warm");
    assert_eq!(updated["emotion"], "calm");

    let (status, body) = send(&t.app, "DELETE", &format!("/expression_rules/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "ExpressionRule deleted successfully.");

    let (status, body) = send(&t.app, "GET", &format!("/expression_rules/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "RULE_NOT_FOUND");

    let (status, _) = send(&t.app, "DELETE", &format!("/expression_rules/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rule_threshold_validation() {
    let t = test_app("http://127.0.0.1:1", None);
    let (status, body) = send(
        &t.app,
        "POST",
        "/expression_rules",
        Some(json!({
            "emotion": "calm",
            "intent": "statement",
            "punctuation_adjustment": "keep period",
            "tts_tone": "even",
            "confidence_threshold": 2.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn session_crud_and_patch_null() {
    let t = test_app("http://127.0.0.1:1", None);

    let (status, created) = send(
        &t.app,
        "POST",
        "/translation_sessions",
        Some(json!({
            "user_id": "user_456",
            "glosses": ["HELLO"],
            "letters": ["B"],
            "input_text": "Hello",
            "compose_confidence": 0.5,
            "detected_emotion": "neutral",
            "detected_intent": "greeting",
            "adjusted_text": "Hello.",
            "tts_metadata": {"voice": "en-male-1"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["letters"], json!(["B"]));
    assert_eq!(created["emphasis"], json!([]));

    let (_, by_user) = send(&t.app, "GET", "/translation_sessions?user_id=user_456", None).await;
    assert_eq!(by_user.as_array().unwrap().len(), 1);

    let (status, patched) = send(
        &t.app,
        "PUT",
        &format!("/translation_sessions/{id}"),
        Some(json!({"letters": null, "summary_text": "Said hello."})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["letters"], Value::Null);
    assert_eq!(patched["summary_text"], "Said hello.");
    assert_eq!(patched["user_id"], "user_456");

    let (status, body) = send(&t.app, "DELETE", &format!("/translation_sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "TranslationSession deleted successfully.");

    let (status, body) = send(&t.app, "GET", &format!("/translation_sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn session_compose_accumulates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(" Let's build it. ")))
        .expect(1)
        .mount(&server)
        .await;

    let t = test_app(&server.uri(), Some("sk-test"));
    let (status, session) = send(
        &t.app,
        "POST",
        &format!("/translation_sessions/{SEED_SESSION}/compose"),
        Some(json!({"glosses": ["BUILD", "IX"], "letters": ["O"]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["glosses"], json!(["IX-1", "GOOD", "IDEA", "BUILD", "IX"]));
    assert_eq!(session["letters"], json!(["A", "I", "O"]));
    assert_eq!(
        session["context"],
        "Brainstorming product ideas Let's build it."
    );
    assert_eq!(session["input_text"], "Let's build it.");
    assert_eq!(session["adjusted_text"], "Let's build it.");
    assert_eq!(session["compose_confidence"], 1.0);
    assert_eq!(session["detected_emotion"], "positive");
}

#[tokio::test]
async fn session_compose_missing_session_is_404() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let t = test_app(&server.uri(), Some("sk-test"));
    let (status, body) = send(
        &t.app,
        "POST",
        "/translation_sessions/00000000-0000-4000-8000-000000000000/compose",
        Some(json!({"glosses": ["HELLO"]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn session_compose_upstream_failure_is_502() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    let t = test_app(&server.uri(), Some("sk-test"));
    let (_, before) = send(&t.app, "GET", &format!("/translation_sessions/{SEED_SESSION}"), None).await;

    let (status, body) = send(
        &t.app,
        "POST",
        &format!("/translation_sessions/{SEED_SESSION}/compose"),
        Some(json!({"glosses": ["MORE"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "COMPOSER_UPSTREAM_ERROR");
    assert_eq!(body["details"], "busy");

    let (_, after) = send(&t.app, "GET", &format!("/translation_sessions/{SEED_SESSION}"), None).await;
    assert_eq!(before, after);
}

#[tokio::test(flavor = "multi_thread")]
async fn standalone_compose_uses_request_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(wiremock::matchers::header("authorization", "Bearer sk-request"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Good morning.")))
        .expect(1)
        .mount(&server)
        .await;

    let t = test_app(&server.uri(), None);
    let (status, body) = send(
        &t.app,
        "POST",
        "/compose/sentence",
        Some(json!({
            "glosses": ["GOOD", "MORNING"],
            "openai_api_key": "sk-request",
            "openai_model": "gpt-4o"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Good morning.");
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["confidence"], Value::Null);
}

#[tokio::test(flavor = "multi_thread")]
async fn standalone_compose_without_key_is_500() {
    let t = test_app("http://127.0.0.1:1", None);
    let (status, body) = send(
        &t.app,
        "POST",
        "/compose/sentence",
        Some(json!({"glosses": ["HELLO"]})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "COMPOSER_CONFIG_ERROR");
}
