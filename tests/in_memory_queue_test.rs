mod helpers;

use helpers::{hint_config, job_with_hints};
use scanhub::application::ports::{MessageQueue, QueueError};
use scanhub::domain::{HintSeverity, JobStatus, QueueMessage, ResultMessage, WorkUnit};
use scanhub::infrastructure::queue::InMemoryQueue;

fn units(count: usize) -> Vec<QueueMessage> {
    let configs = (0..count)
        .map(|i| hint_config(&[(format!("hint-{i}").as_str(), HintSeverity::Error)]))
        .collect();
    let job = job_with_hints("https://example.com/", &["axe"], configs);
    WorkUnit::split(&job)
        .into_iter()
        .map(QueueMessage::Work)
        .collect()
}

#[tokio::test]
async fn given_sent_messages_when_receiving_then_they_arrive_in_order() {
    let queue = InMemoryQueue::new("work", 16, 64 * 1024);
    let messages = units(3);

    for message in &messages {
        queue.send(message).await.unwrap();
    }

    assert_eq!(queue.messages_count().await.unwrap(), 3);
    for expected in &messages {
        assert_eq!(queue.receive().await.unwrap().as_ref(), Some(expected));
    }
    assert_eq!(queue.messages_count().await.unwrap(), 0);
}

#[tokio::test]
async fn given_message_over_limit_when_sending_then_payload_too_large() {
    let queue = InMemoryQueue::new("results", 16, 64);
    let message = units(1).remove(0);

    let result = queue.send(&message).await;

    let error = result.unwrap_err();
    assert!(matches!(error, QueueError::PayloadTooLarge { limit: 64, .. }));
    assert!(error.is_size_limit());
    assert_eq!(queue.messages_count().await.unwrap(), 0);
}

#[tokio::test]
async fn given_closed_queue_when_draining_then_pending_messages_arrive_before_none() {
    let queue = InMemoryQueue::new("work", 16, 64 * 1024);
    let message = units(1).remove(0);
    queue.send(&message).await.unwrap();

    queue.close().await;

    assert_eq!(queue.receive().await.unwrap(), Some(message.clone()));
    assert_eq!(queue.receive().await.unwrap(), None);
    assert!(matches!(queue.send(&message).await, Err(QueueError::Closed)));
}

#[tokio::test]
async fn given_result_message_when_round_tripping_then_kind_is_preserved() {
    let queue = InMemoryQueue::new("results", 4, 64 * 1024);
    let unit = WorkUnit::split(&job_with_hints(
        "https://example.com/",
        &["axe"],
        vec![hint_config(&[("axe", HintSeverity::Error)])],
    ))
    .remove(0);
    let message = QueueMessage::Result(ResultMessage::from_unit(&unit, JobStatus::Started));

    queue.send(&message).await.unwrap();

    assert!(matches!(
        queue.receive().await.unwrap(),
        Some(QueueMessage::Result(result)) if result.status == JobStatus::Started
    ));
}

#[test]
fn given_bad_request_about_body_size_when_classifying_then_it_is_a_size_limit() {
    let oversized = QueueError::BadRequest(format!(
        "400: {}",
        scanhub::application::ports::BODY_TOO_LARGE_MESSAGE
    ));
    let other = QueueError::BadRequest("malformed".to_string());

    assert!(oversized.is_size_limit());
    assert!(!other.is_size_limit());
    assert!(!QueueError::Closed.is_size_limit());
}
