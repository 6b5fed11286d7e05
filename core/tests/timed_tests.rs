// tests/timed_tests.rs
mod common;

use common::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use ticketry::{timed_await, TicketryError};

#[tokio::test]
async fn test_timed_await_returns_value_within_deadline() {
  setup_tracing();
  let value = timed_await("rename-channel", Duration::from_millis(500), async { 41 + 1 })
    .await
    .unwrap();
  assert_eq!(value, 42);
}

#[tokio::test]
async fn test_timed_await_reports_timeout_without_cancelling() {
  setup_tracing();
  let finished = Arc::new(AtomicBool::new(false));
  let flag = finished.clone();

  let result = timed_await("rename-channel", Duration::from_millis(20), async move {
    tokio::time::sleep(Duration::from_millis(100)).await;
    flag.store(true, Ordering::SeqCst);
  })
  .await;

  match result {
    Err(TicketryError::Timeout { operation, limit }) => {
      assert_eq!(operation, "rename-channel");
      assert_eq!(limit, Duration::from_millis(20));
    }
    other => panic!("Expected Timeout, got {:?}", other),
  }
  assert!(!finished.load(Ordering::SeqCst));

  tokio::time::sleep(Duration::from_millis(300)).await;
  assert!(finished.load(Ordering::SeqCst), "operation should keep running after the deadline");
}

#[tokio::test]
async fn test_timed_await_surfaces_panics() {
  setup_tracing();
  let result: Result<(), _> = timed_await("explode", Duration::from_millis(500), async {
    panic!("rate limited");
  })
  .await;
  match result {
    Err(TicketryError::Internal(msg)) => assert!(msg.contains("explode")),
    other => panic!("Expected Internal, got {:?}", other),
  }
}
