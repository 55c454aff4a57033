//! HTTP contract tests for the Gemini gateway.

use std::time::Duration;

use feedbackloop_model::{
    GatewayConfig, GatewayError, GeminiGateway, GenerateResult, ModelGateway, ToolSchema,
};
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

fn gateway_for(server: &MockServer) -> GeminiGateway {
    let config = GatewayConfig::new(SecretString::from("test-gemini-key"))
        .with_base_url(server.uri())
        .with_timeout(Duration::from_secs(5));
    GeminiGateway::new(config).unwrap()
}

#[tokio::test]
async fn test_sends_prompt_and_api_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-gemini-key"))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "User: Hello!"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Hi there"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = gateway_for(&server).generate("User: Hello!").await.unwrap();
    assert_eq!(result, GenerateResult::Text("Hi there".into()));
}

#[tokio::test]
async fn test_tools_are_sent_as_function_declarations() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "tools": [{"functionDeclarations": [{"name": "collect_feedback"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [
                {"functionCall": {"name": "collect_feedback", "args": {"review": "Great chat", "rating": 5.0}}}
            ]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tool = ToolSchema::new(
        "collect_feedback",
        "Collect user feedback",
        json!({"type": "object", "properties": {}}),
    );
    let result = gateway_for(&server)
        .generate_with_tools("clean this", &[tool])
        .await
        .unwrap();

    let call = result.function_call().expect("function call");
    assert_eq!(call.name, "collect_feedback");
    assert_eq!(call.arg("review"), Some(&json!("Great chat")));
}

#[tokio::test]
async fn test_invalid_key_is_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}
        })))
        .mount(&server)
        .await;

    let err = gateway_for(&server).generate("hi").await.unwrap_err();
    assert!(matches!(err, GatewayError::AuthenticationFailed(_)));
}

#[tokio::test]
async fn test_rate_limit_is_quota_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}
        })))
        .mount(&server)
        .await;

    let err = gateway_for(&server).generate("hi").await.unwrap_err();
    assert!(matches!(err, GatewayError::QuotaExceeded(m) if m == "Resource has been exhausted"));
}

#[tokio::test]
async fn test_server_error_is_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let err = gateway_for(&server).generate("hi").await.unwrap_err();
    assert!(matches!(err, GatewayError::Provider { status: 503, .. }));
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = gateway_for(&server).generate("hi").await.unwrap_err();
    assert!(matches!(err, GatewayError::Deserialization(_)));
}

#[tokio::test]
async fn test_slow_server_is_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"candidates": []}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = GatewayConfig::new(SecretString::from("k"))
        .with_base_url(server.uri())
        .with_timeout(Duration::from_millis(200));
    let gateway = GeminiGateway::new(config).unwrap();

    let err = gateway.generate("hi").await.unwrap_err();
    assert!(matches!(err, GatewayError::Timeout(_)));
}
