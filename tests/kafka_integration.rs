//! Integration tests with a real Kafka broker
//!
//! These tests require a reachable broker.
//! Set KAFKA_TEST_BROKERS (e.g. `localhost:9092`) to run.

use std::sync::Arc;
use std::time::Duration;
use userflow::broker::{
    KafkaProducer, KafkaProducerConfig, KafkaSubscriber, KafkaSubscriberConfig, LogDeadLetters,
    MessageSource, Publisher,
};
use userflow::pipeline::Subscription;
use userflow::record::{IdAssigner, NormalizedUserRecord};
use userflow::sink::{DuckDbSink, RowSink};
use userflow::state::CheckpointStore;
use userflow::types::{DeliveryMode, StartingOffsets};

/// Get broker addresses from environment or skip
fn get_test_brokers() -> Option<Vec<String>> {
    std::env::var("KAFKA_TEST_BROKERS")
        .ok()
        .map(|b| b.split(',').map(String::from).collect())
}

fn unique_topic() -> String {
    format!("userflow_test_{}", uuid::Uuid::new_v4().simple())
}

fn record(username: &str) -> NormalizedUserRecord {
    NormalizedUserRecord {
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        gender: "female".to_string(),
        address: "12 Elm St Springfield,  IL, US".to_string(),
        postcode: "62704".to_string(),
        email: "jane@example.com".to_string(),
        username: username.to_string(),
        dob: "1990-01-01".to_string(),
        registered_date: "2020-01-01".to_string(),
        phone: "555-1234".to_string(),
        picture: "http://img/1.png".to_string(),
    }
}

fn subscriber_config(brokers: Vec<String>, topic: &str) -> KafkaSubscriberConfig {
    KafkaSubscriberConfig {
        brokers,
        topic: topic.to_string(),
        group_id: "userflow-test".to_string(),
        starting_offsets: StartingOffsets::Earliest,
        fail_on_data_loss: true,
        metadata_timeout: Duration::from_secs(10),
        extra: Default::default(),
    }
}

#[tokio::test]
async fn test_kafka_publish_and_consume() {
    let Some(brokers) = get_test_brokers() else {
        println!("Skipping: KAFKA_TEST_BROKERS not set");
        return;
    };
    let topic = unique_topic();

    let producer = KafkaProducer::new(&KafkaProducerConfig {
        brokers: brokers.clone(),
        delivery: DeliveryMode::Confirm,
        ..KafkaProducerConfig::default()
    })
    .expect("producer");
    let publisher = Publisher::new(Arc::new(producer), topic.clone());

    publisher.publish(&record("jdoe")).await.expect("publish jdoe");
    publisher.publish(&record("asmith")).await.expect("publish asmith");
    publisher.flush().await.expect("flush");

    let checkpoint = CheckpointStore::in_memory();
    let subscriber =
        KafkaSubscriber::connect(&subscriber_config(brokers, &topic), &checkpoint.snapshot().await)
            .expect("subscriber");

    let sink = Arc::new(DuckDbSink::in_memory("spark_streams", "created_users").unwrap());
    sink.ensure_schema().await.unwrap();

    let mut subscription = Subscription::new(
        subscriber,
        sink.clone(),
        checkpoint.clone(),
        IdAssigner::default(),
        Arc::new(LogDeadLetters),
    );

    // Kafka sources never run dry; stop after a fixed window
    let stats = subscription
        .run_until(tokio::time::sleep(Duration::from_secs(15)))
        .await
        .expect("subscription");

    assert_eq!(stats.persisted, 2);
    assert_eq!(sink.row_count().unwrap(), 2);
    println!("Consumed {} messages from {topic}", stats.processed());
}

#[tokio::test]
async fn test_kafka_subscriber_reads_raw_messages() {
    let Some(brokers) = get_test_brokers() else {
        println!("Skipping: KAFKA_TEST_BROKERS not set");
        return;
    };
    let topic = unique_topic();

    let producer = KafkaProducer::new(&KafkaProducerConfig {
        brokers: brokers.clone(),
        ..KafkaProducerConfig::default()
    })
    .expect("producer");
    let publisher = Publisher::new(Arc::new(producer), topic.clone());
    publisher.publish(&record("jdoe")).await.expect("publish");

    let mut subscriber = KafkaSubscriber::connect(
        &subscriber_config(brokers, &topic),
        &CheckpointStore::in_memory().snapshot().await,
    )
    .expect("subscriber");

    let message = tokio::time::timeout(Duration::from_secs(15), subscriber.next_message())
        .await
        .expect("message within timeout")
        .expect("read")
        .expect("some message");

    assert_eq!(message.topic, topic);
    assert_eq!(message.offset, 0);
    let decoded: NormalizedUserRecord =
        serde_json::from_slice(message.payload.as_deref().unwrap()).unwrap();
    assert_eq!(decoded.username, "jdoe");
}
