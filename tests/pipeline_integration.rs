//! Integration tests for the whole pipeline
//!
//! Mock HTTP API → normalize → in-memory topic → subscription → DuckDB file

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use userflow::broker::{LogDeadLetters, MemoryBroker, Publisher, DEFAULT_TOPIC};
use userflow::config::PipelineConfig;
use userflow::http::HttpClient;
use userflow::pipeline::{produce_once, Subscription};
use userflow::record::{natural_key_id, IdAssigner, NormalizedUserRecord};
use userflow::sink::{DuckDbSink, RowSink};
use userflow::source::RandomUserSource;
use userflow::state::CheckpointStore;
use userflow::types::IdStrategy;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_response() -> Value {
    json!({
        "results": [{
            "name": {"title": "Ms", "first": "Jane", "last": "Doe"},
            "gender": "female",
            "location": {
                "street": {"number": 12, "name": "Elm St"},
                "city": "Springfield",
                "state": "IL",
                "country": "US",
                "postcode": "62704",
                "coordinates": {"latitude": "0", "longitude": "0"}
            },
            "email": "jane@example.com",
            "login": {"uuid": "x", "username": "jdoe"},
            "dob": {"date": "1990-01-01", "age": 34},
            "registered": {"date": "2020-01-01", "age": 4},
            "phone": "555-1234",
            "picture": {"large": "http://img/1-l.png", "medium": "http://img/1.png"}
        }],
        "info": {"seed": "abc", "results": 1, "page": 1, "version": "1.4"}
    })
}

async fn mock_api() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(api_response()))
        .mount(&server)
        .await;
    server
}

fn expected_record() -> NormalizedUserRecord {
    serde_json::from_value(json!({
        "first_name": "Jane",
        "last_name": "Doe",
        "gender": "female",
        "address": "12 Elm St Springfield,  IL, US",
        "postcode": "62704",
        "email": "jane@example.com",
        "username": "jdoe",
        "dob": "1990-01-01",
        "registered_date": "2020-01-01",
        "phone": "555-1234",
        "picture": "http://img/1.png"
    }))
    .unwrap()
}

#[tokio::test]
async fn test_end_to_end_single_user() {
    let server = mock_api().await;
    let dir = tempfile::tempdir().unwrap();

    // Producer half
    let source = RandomUserSource::new(HttpClient::new().unwrap(), format!("{}/api/", server.uri()));
    let broker = MemoryBroker::new();
    let publisher = Publisher::new(Arc::new(broker.clone()), DEFAULT_TOPIC);

    let record = produce_once(&source, &publisher).await.unwrap();
    assert_eq!(record, expected_record());

    // Subscription half
    let db_path = dir.path().join("users.duckdb");
    let sink = Arc::new(
        DuckDbSink::open(db_path.to_str().unwrap(), "spark_streams", "created_users").unwrap(),
    );
    sink.ensure_schema().await.unwrap();
    let checkpoint = CheckpointStore::open_dir(dir.path().join("checkpoint")).unwrap();

    let mut subscription = Subscription::new(
        broker.subscribe_from(DEFAULT_TOPIC, &checkpoint.snapshot().await),
        sink.clone(),
        checkpoint.clone(),
        IdAssigner::new(IdStrategy::Deterministic),
        Arc::new(LogDeadLetters),
    );
    let stats = subscription.run().await.unwrap();
    assert_eq!(stats.persisted, 1);

    assert_eq!(sink.row_count().unwrap(), 1);
    let row = sink
        .get_row(natural_key_id(&expected_record()))
        .unwrap()
        .expect("row stored under its natural key");
    assert_eq!(row.record, expected_record());
    assert_eq!(checkpoint.get_offset(DEFAULT_TOPIC, 0).await, Some(1));
}

#[tokio::test]
async fn test_restart_does_not_duplicate_rows() {
    let server = mock_api().await;
    let dir = tempfile::tempdir().unwrap();
    let checkpoint_dir = dir.path().join("checkpoint");

    let source = RandomUserSource::new(HttpClient::new().unwrap(), format!("{}/api/", server.uri()));
    let broker = MemoryBroker::new();
    let publisher = Publisher::new(Arc::new(broker.clone()), DEFAULT_TOPIC);
    let sink = Arc::new(DuckDbSink::in_memory("spark_streams", "created_users").unwrap());
    sink.ensure_schema().await.unwrap();

    for round in 1..=3 {
        produce_once(&source, &publisher).await.unwrap();

        let checkpoint = CheckpointStore::open_dir(&checkpoint_dir).unwrap();
        let mut subscription = Subscription::new(
            broker.subscribe_from(DEFAULT_TOPIC, &checkpoint.snapshot().await),
            sink.clone(),
            checkpoint,
            IdAssigner::default(),
            Arc::new(LogDeadLetters),
        );

        // Each run only sees the message published since the last one
        let stats = subscription.run().await.unwrap();
        assert_eq!(stats.persisted, 1, "round {round}");
    }

    // Same natural key every time, so one row
    assert_eq!(sink.row_count().unwrap(), 1);
}

#[tokio::test]
async fn test_random_ids_store_every_delivery() {
    let broker = MemoryBroker::new();
    let publisher = Publisher::new(Arc::new(broker.clone()), DEFAULT_TOPIC);
    for _ in 0..2 {
        publisher.publish(&expected_record()).await.unwrap();
    }

    let sink = Arc::new(DuckDbSink::in_memory("spark_streams", "created_users").unwrap());
    sink.ensure_schema().await.unwrap();
    let mut subscription = Subscription::new(
        broker.subscribe(DEFAULT_TOPIC, 0),
        sink.clone(),
        CheckpointStore::in_memory(),
        IdAssigner::new(IdStrategy::Random),
        Arc::new(LogDeadLetters),
    );
    subscription.run().await.unwrap();

    assert_eq!(sink.row_count().unwrap(), 2);
}

#[tokio::test]
async fn test_upstream_failure_publishes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = RandomUserSource::new(HttpClient::new().unwrap(), format!("{}/api/", server.uri()));
    let broker = MemoryBroker::new();
    let publisher = Publisher::new(Arc::new(broker.clone()), DEFAULT_TOPIC);

    let err = produce_once(&source, &publisher).await.unwrap_err();
    assert!(err.is_retryable());
    assert!(broker.is_empty(DEFAULT_TOPIC));
}

#[test]
fn test_sample_config_is_valid() {
    let config = PipelineConfig::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/userflow.yaml"))
        .unwrap();
    config.validate().unwrap();
    assert_eq!(config.broker.topic, DEFAULT_TOPIC);
}
