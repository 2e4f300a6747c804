//! Integration tests for the collection indexer orchestrator.
//!
//! These tests use the real Orchestrator with mock collaborators (document
//! store, search sink, message bus, definitions and spill store).

mod common;

use std::time::Duration;

use collection_indexer::errors::IngestError;
use collection_indexer::orchestrator::TaskKind;
use collection_indexer_schema::SchemaError;
use common::{fast_config, Harness, MockSink, BOOK_IDS};

fn index_header(id: &str) -> String {
    format!(r#"{{"index":{{"_index":"books","_id":"{}"}}}}"#, id)
}

fn delete_header(id: &str) -> String {
    format!(r#"{{"delete":{{"_index":"books","_id":"{}"}}}}"#, id)
}

fn event(action: &str, id: &str) -> Vec<u8> {
    format!(r#"{{"action":"{}","id":"{}","indexName":"books"}}"#, action, id).into_bytes()
}

#[tokio::test]
async fn test_refresh_indexes_whole_collection() {
    let harness = Harness::standard();

    let task = harness.orchestrator.refresh("books", None).await.unwrap();
    harness.wait_until_idle().await;

    let headers = harness.sink.headers();
    assert_eq!(headers.len(), 3);
    for id in BOOK_IDS {
        assert!(headers.contains(&index_header(id)), "missing {}", id);
    }

    let payloads = harness.sink.payloads();
    assert_eq!(payloads.len(), 2, "three entries with a batch size of two");
    let dune = format!(
        "{}\n{}\n",
        index_header(BOOK_IDS[0]),
        r#"{"all":"Dune / 100","title":"Dune"}"#
    );
    assert!(payloads.concat().contains(&dune));

    assert_eq!(task.documents_read(), 3);
    assert_eq!(task.documents_written(), 3);
    assert!(!task.is_cancelled());
}

#[tokio::test]
async fn test_refresh_unknown_index_fails() {
    let harness = Harness::standard();

    let err = harness.orchestrator.refresh("films", Some("short")).await.unwrap_err();

    assert!(matches!(
        err,
        IngestError::SchemaError(SchemaError::DefinitionNotFound { .. })
    ));
    assert!(harness.orchestrator.active_tasks().await.is_empty());
    assert!(harness.sink.payloads().is_empty());
}

#[tokio::test]
async fn test_incremental_indexes_and_deletes_events() {
    let harness = Harness::standard();
    harness.orchestrator.start_incremental().await.unwrap();

    harness.inbound.send(event("index", BOOK_IDS[0])).await.unwrap();
    harness.inbound.send(b"not json".to_vec()).await.unwrap();
    harness
        .inbound
        .send(event("index", "65a1b2c3d4e5f60718293aff"))
        .await
        .unwrap();
    harness.inbound.send(event("delete", BOOK_IDS[1])).await.unwrap();

    harness.wait_for(|h| h.sink.headers().len() >= 2).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let headers = harness.sink.headers();
    assert_eq!(headers.len(), 2, "undecodable and missing documents are dropped");
    assert!(headers.contains(&index_header(BOOK_IDS[0])));
    assert!(headers.contains(&delete_header(BOOK_IDS[1])));

    let tasks = harness.orchestrator.active_tasks().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].kind, TaskKind::Incremental);
    assert_eq!(tasks[0].documents_written, 2);

    harness.orchestrator.shutdown().await;
    assert!(harness.orchestrator.active_tasks().await.is_empty());
}

#[tokio::test]
async fn test_spilled_payloads_are_replayed_first() {
    let spilled = format!("{}\n", delete_header(BOOK_IDS[2]));
    let harness = Harness::new(MockSink::new(), vec![spilled.clone()], fast_config());

    harness.orchestrator.start_incremental().await.unwrap();
    harness.inbound.send(event("index", BOOK_IDS[0])).await.unwrap();
    harness.wait_for(|h| h.sink.payloads().len() >= 2).await;

    let payloads = harness.sink.payloads();
    assert_eq!(payloads[0], spilled);
    assert!(payloads[1].starts_with(&index_header(BOOK_IDS[0])));
    assert!(harness.spill.stored().is_empty());

    harness.orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_client_error_fails_refresh_and_spills_batch() {
    let harness = Harness::new(MockSink::failing(400), Vec::new(), fast_config());

    let task = harness.orchestrator.refresh("books", None).await.unwrap();
    harness.wait_until_idle().await;

    assert_eq!(harness.sink.payloads().len(), 1, "client errors are not retried");
    let stored = harness.spill.stored();
    assert_eq!(stored, harness.sink.payloads());
    assert_eq!(task.documents_written(), 0);
}

#[tokio::test]
async fn test_failed_incremental_task_stays_registered() {
    let harness = Harness::new(MockSink::failing(400), Vec::new(), fast_config());
    let task = harness.orchestrator.start_incremental().await.unwrap();

    harness.inbound.send(event("index", BOOK_IDS[0])).await.unwrap();
    harness.wait_for(|h| !h.spill.stored().is_empty()).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(harness.orchestrator.task(task.id()).await.is_some());
    assert!(harness.spill.stored()[0].starts_with(&index_header(BOOK_IDS[0])));
}

#[tokio::test]
async fn test_retryable_errors_exhaust_and_fail_task() {
    let harness = Harness::new(MockSink::failing(503), Vec::new(), fast_config());

    let task = harness.orchestrator.refresh("books", None).await.unwrap();
    harness.wait_until_idle().await;

    // one attempt plus one retry
    assert_eq!(harness.sink.payloads().len(), 2);
    assert_eq!(harness.spill.stored().len(), 1);
    assert_eq!(task.documents_written(), 0);
}

#[tokio::test]
async fn test_runaway_backlog_cancels_task() {
    let mut config = fast_config();
    config.batch_max_size = 1;
    config.max_processing_requests = 1;
    let harness = Harness::new(MockSink::new(), Vec::new(), config);

    let admission = harness.orchestrator.admission().clone();
    let _held = vec![admission.admit().await, admission.admit().await, admission.admit().await];

    let task = harness.orchestrator.refresh("books", None).await.unwrap();
    harness.wait_until_idle().await;

    assert!(task.is_cancelled());
    assert_eq!(harness.sink.payloads().len(), 1, "no sink calls after cancellation");
    assert_eq!(task.documents_written(), 1);
}

#[tokio::test]
async fn test_run_until_shutdown_cancels_tasks() {
    let harness = Harness::standard();
    harness.orchestrator.start_incremental().await.unwrap();
    assert_eq!(harness.orchestrator.active_tasks().await.len(), 1);

    tokio::time::timeout(Duration::from_secs(5), harness.orchestrator.run_until(async {}))
        .await
        .expect("shutdown timed out")
        .unwrap();

    assert!(harness.orchestrator.active_tasks().await.is_empty());
}
