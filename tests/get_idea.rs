use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use idea_proxy::config::AppConfig;
use idea_proxy::create_app;
use idea_proxy::services::FALLBACK_IDEA;
use idea_proxy::state::create_shared_state;

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

fn app(base_url: &str, api_key: &str) -> Router {
    let config = AppConfig {
        api_key: api_key.to_string(),
        base_url: base_url.to_string(),
        timeout_secs: 5,
        ..Default::default()
    };
    create_app(create_shared_state(config).unwrap())
}

async fn send(app: Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn post_idea(app: Router, body: &str) -> (StatusCode, Value) {
    send(app, Method::POST, "/api/get-idea", body).await
}

fn upstream_text(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    }))
}

#[tokio::test]
async fn test_non_post_methods_are_rejected_without_upstream_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(upstream_text("never"))
        .expect(0)
        .mount(&server)
        .await;

    for m in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH] {
        let (status, body) =
            send(app(&server.uri(), "test-key"), m, "/api/get-idea", "{}").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({ "message": "Method Not Allowed" }));
    }
}

#[tokio::test]
async fn test_missing_key_is_reported_before_upstream_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(upstream_text("never"))
        .expect(0)
        .mount(&server)
        .await;

    for body in [r#"{"category":"Hardware"}"#, "{not json"] {
        let (status, response) = post_idea(app(&server.uri(), ""), body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response, json!({ "message": "API key is not set on the server." }));
    }
}

#[tokio::test]
async fn test_category_is_forwarded_in_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "test-key"))
        .and(body_string_contains("within the 'Hardware' category"))
        .and(body_string_contains("\"role\":\"user\""))
        .respond_with(upstream_text("A modular robot kit"))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = post_idea(app(&server.uri(), "test-key"), r#"{"category":"Hardware"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "idea": "A modular robot kit" }));
}

#[tokio::test]
async fn test_missing_category_uses_empty_substitution() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains("within the '' category"))
        .respond_with(upstream_text("Anything goes"))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = post_idea(app(&server.uri(), "test-key"), "{}").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "idea": "Anything goes" }));
}

#[tokio::test]
async fn test_quotes_and_whitespace_are_stripped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(upstream_text("\"Build a smart irrigation controller.\""))
        .mount(&server)
        .await;

    let (status, body) = post_idea(app(&server.uri(), "test-key"), r#"{"category":"General"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "idea": "Build a smart irrigation controller." }));
}

#[tokio::test]
async fn test_missing_candidates_returns_fallback_idea() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "promptFeedback": {} })))
        .mount(&server)
        .await;

    let (status, body) = post_idea(app(&server.uri(), "test-key"), r#"{"category":"General"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "idea": FALLBACK_IDEA }));
}

#[tokio::test]
async fn test_upstream_error_status_is_not_leaked() {
    for upstream_status in [429u16, 500] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(
                ResponseTemplate::new(upstream_status)
                    .set_body_string("RESOURCE_EXHAUSTED: secret quota detail"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (status, body) =
            post_idea(app(&server.uri(), "test-key"), r#"{"category":"General"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({ "message": "The AI service returned an error. Check server logs." })
        );
        assert!(!body.to_string().contains("secret quota detail"));
    }
}

#[tokio::test]
async fn test_non_json_upstream_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let (status, body) = post_idea(app(&server.uri(), "test-key"), r#"{"category":"General"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "message": "Received an invalid response from the AI service." })
    );
}

#[tokio::test]
async fn test_unreachable_upstream_is_generic_error() {
    let (status, body) =
        post_idea(app("http://127.0.0.1:9", "test-key"), r#"{"category":"General"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "message": "An internal server error occurred while contacting the AI." })
    );
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(upstream_text("never"))
        .expect(0)
        .mount(&server)
        .await;

    for body in ["{not json", "", "[1,2]", r#"{"category":["a"]}"#] {
        let (status, response) = post_idea(app(&server.uri(), "test-key"), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body:?}");
        let message = response["message"].as_str().unwrap();
        assert!(message.starts_with("Invalid request body"), "message: {message}");
    }
}

#[tokio::test]
async fn test_oversized_category_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(upstream_text("never"))
        .expect(0)
        .mount(&server)
        .await;

    let body = json!({ "category": "x".repeat(201) }).to_string();
    let (status, response) = post_idea(app(&server.uri(), "test-key"), &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response,
        json!({ "message": "Category must be at most 200 characters." })
    );
}

#[tokio::test]
async fn test_body_over_limit_is_bad_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(upstream_text("never"))
        .expect(0)
        .mount(&server)
        .await;

    let body = json!({ "category": "x".repeat(3 * 1024 * 1024) }).to_string();
    let (status, response) = post_idea(app(&server.uri(), "test-key"), &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = response["message"].as_str().unwrap();
    assert!(message.starts_with("Invalid request body"), "message: {message}");
}

#[tokio::test]
async fn test_body_over_limit_without_key_reports_missing_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(upstream_text("never"))
        .expect(0)
        .mount(&server)
        .await;

    let body = json!({ "category": "x".repeat(3 * 1024 * 1024) }).to_string();
    let (status, response) = post_idea(app(&server.uri(), ""), &body).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response, json!({ "message": "API key is not set on the server." }));
}

#[tokio::test]
async fn test_identical_requests_are_not_memoized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(upstream_text("Same input, fresh call"))
        .expect(2)
        .mount(&server)
        .await;

    let app = app(&server.uri(), "test-key");
    for _ in 0..2 {
        let (status, _) = post_idea(app.clone(), r#"{"category":"Software"}"#).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_health_and_config_hide_key() {
    let app = app("http://127.0.0.1:9", "AIzaSyVerySecretKey");

    let (status, body) = send(app.clone(), Method::GET, "/api/health", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "configured": true }));

    let (status, body) = send(app, Method::GET, "/api/config", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api_key_set"], json!(true));
    assert_eq!(body["model"], json!("gemini-2.0-flash"));
    assert!(!body.to_string().contains("AIzaSyVerySecretKey"));
}

#[tokio::test]
async fn test_index_page_is_served() {
    let app = app("http://127.0.0.1:9", "");
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("id=\"generate-btn\""));
    assert!(html.contains("data-category=\"Hardware\""));
}
