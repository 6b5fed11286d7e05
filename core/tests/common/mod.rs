// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use once_cell::sync::Lazy;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use ticketry::{Action, TicketryError, Worker, WorkerContext, WorkerControl};
use tracing::Level;

// --- Common Instance/Params Structs ---
#[derive(Clone, Debug, Default)]
pub struct Scratch {
  pub log: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct TestParams {
  pub ticket: String,
  pub cancel_at: Option<&'static str>,
}

// --- Common Error Type for Tests ---
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Ticketry error: {0}")]
  Ticketry(String), // stored as String for Eq comparison

  #[error("Test worker failed: {0}")]
  Worker(String),

  #[error("Test listener failed: {0}")]
  Listener(String),
}

impl From<TicketryError> for TestError {
  fn from(err: TicketryError) -> Self {
    TestError::Ticketry(format!("{:?}", err))
  }
}

pub type TestAction = Action<Scratch, TestParams, TestError>;
pub type TestWorker = Worker<Scratch, TestParams, TestError>;

// --- Common Worker Creators ---

/// Appends `entry` to `instance.log`; cancels when `params.cancel_at` names this worker.
pub fn logging_worker(id: &'static str, priority: i32, entry: &'static str) -> TestWorker {
  Worker::new(id, priority, move |ctx: WorkerContext<Scratch, TestParams>| async move {
    ctx.instance.write().log.push(entry.to_string());
    tracing::debug!(target: "test_workers", worker = id, "executed");
    if ctx.params.cancel_at == Some(id) {
      return Ok::<_, TestError>(WorkerControl::Cancel);
    }
    Ok(WorkerControl::Continue)
  })
}

pub fn failing_worker(id: &'static str, priority: i32, message: &'static str) -> TestWorker {
  Worker::new(id, priority, move |_ctx: WorkerContext<Scratch, TestParams>| async move {
    tracing::warn!(target: "test_workers", worker = id, "failing with: '{}'", message);
    Err::<WorkerControl, _>(TestError::Worker(message.to_string()))
  })
}

pub fn cancelling_worker(id: &'static str, priority: i32) -> TestWorker {
  Worker::new(id, priority, |_ctx: WorkerContext<Scratch, TestParams>| async move {
    Ok::<_, TestError>(WorkerControl::Cancel)
  })
}

/// Backup worker appending `entry` and counting its invocations.
pub fn counting_backup(entry: &'static str, counter: Arc<AtomicUsize>) -> TestWorker {
  Worker::new("backup", 0, move |ctx: WorkerContext<Scratch, TestParams>| {
    let counter = counter.clone();
    async move {
      counter.fetch_add(1, Ordering::SeqCst);
      ctx.instance.write().log.push(entry.to_string());
      Ok::<_, TestError>(WorkerControl::Continue)
    }
  })
}

// --- Helper for Tracing Setup ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Atomic counters for checking execution counts ---
pub static LISTENER_EXEC_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));

pub fn reset_counters() {
  LISTENER_EXEC_COUNTER.store(0, Ordering::SeqCst);
}
