//! Tests for the HTTP client module

use super::*;
use crate::error::Error;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(config.default_headers.is_empty());
    assert!(config.user_agent.starts_with("userflow/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .timeout(Duration::from_secs(5))
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[tokio::test]
async fn test_http_client_get_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{"gender": "female"}]
        })))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let data: serde_json::Value = client
        .get_json(&format!("{}/api/", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(data["results"][0]["gender"], "female");
}

#[tokio::test]
async fn test_http_client_default_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(header("X-Source", "userflow"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .header("X-Source", "userflow")
        .build();
    let client = HttpClient::with_config(config).unwrap();
    let response = client
        .get(&format!("{}/api/", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_http_client_server_error_is_upstream_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let err = client
        .get(&format!("{}/api/", mock_server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UpstreamUnavailable { .. }));
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_http_client_invalid_json_is_upstream_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let result: crate::Result<serde_json::Value> = client
        .get_json(&format!("{}/api/", mock_server.uri()))
        .await;

    assert!(matches!(result, Err(Error::UpstreamUnavailable { .. })));
}

#[tokio::test]
async fn test_http_client_connection_refused() {
    let client = HttpClient::with_config(
        HttpClientConfig::builder()
            .timeout(Duration::from_secs(2))
            .build(),
    )
    .unwrap();

    let err = client.get("http://127.0.0.1:1/api/").await.unwrap_err();
    assert!(err.is_retryable());
}
