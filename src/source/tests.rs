//! Tests for the source fetcher

use super::*;
use crate::error::Error;
use crate::http::HttpClient;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_first_result() {
    let body = json!({"results": [{"gender": "male"}, {"gender": "female"}], "info": {}});
    let record = first_result(body).unwrap();
    assert_eq!(record.get_path("gender"), Some(&json!("male")));
}

#[test]
fn test_first_result_empty() {
    let err = first_result(json!({"results": []})).unwrap_err();
    assert!(matches!(err, Error::MalformedUpstreamData { .. }));
}

#[test]
fn test_first_result_missing() {
    let err = first_result(json!({"error": "Uh oh"})).unwrap_err();
    assert!(matches!(err, Error::MalformedUpstreamData { .. }));
}

#[test]
fn test_first_result_wrong_shapes() {
    assert!(first_result(json!({"results": {"gender": "male"}})).is_err());
    assert!(first_result(json!({"results": ["male"]})).is_err());
    assert!(first_result(json!([{"gender": "male"}])).is_err());
}

#[tokio::test]
async fn test_fetch_from_mock_api() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"name": {"first": "Jane", "last": "Doe"}}],
            "info": {"seed": "abc", "results": 1}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let source = RandomUserSource::new(
        HttpClient::new().unwrap(),
        format!("{}/api/", mock_server.uri()),
    );
    let record = source.fetch().await.unwrap();

    assert_eq!(record.get_path("name.first"), Some(&json!("Jane")));
}

#[tokio::test]
async fn test_fetch_empty_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&mock_server)
        .await;

    let source = RandomUserSource::new(
        HttpClient::new().unwrap(),
        format!("{}/api/", mock_server.uri()),
    );

    assert!(matches!(
        source.fetch().await,
        Err(Error::MalformedUpstreamData { .. })
    ));
}

#[tokio::test]
async fn test_fetch_does_not_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let source = RandomUserSource::new(
        HttpClient::new().unwrap(),
        format!("{}/api/", mock_server.uri()),
    );

    assert!(matches!(
        source.fetch().await,
        Err(Error::UpstreamUnavailable { .. })
    ));
}
