// tests/error_handling_tests.rs
mod common;

use common::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use ticketry::{Instance, Source, Worker, WorkerContext, WorkerControl};

#[tokio::test]
async fn test_failure_runs_backup_once_then_reraises() {
  setup_tracing();
  let backups = Arc::new(AtomicUsize::new(0));
  let action = TestAction::new("A");
  action.workers().add(failing_worker("w1", 5, "w1 exploded")).unwrap();
  action.workers().add(logging_worker("w2", 1, "y")).unwrap();
  action.workers().set_backup(counting_backup("z", backups.clone())).unwrap();

  let instance = Instance::new(Scratch::default());
  let result = action
    .workers()
    .execute(instance.clone(), Arc::new(TestParams::default()), Source::from("slash"))
    .await;

  assert_eq!(result.unwrap_err(), TestError::Worker("w1 exploded".to_string()));
  assert_eq!(instance.read().log, vec!["z"]); // w2 never ran
  assert_eq!(backups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failure_deep_in_plugin_stack_still_runs_backup() {
  setup_tracing();
  let backups = Arc::new(AtomicUsize::new(0));
  let action = TestAction::new("deep");
  for (id, priority) in [("p9", 9), ("p8", 8), ("p7", 7), ("p6", 6), ("p5", 5), ("p4", 4)] {
    action.workers().add(logging_worker(id, priority, id)).unwrap();
  }
  action.workers().add(failing_worker("bottom", -3, "plugin bug")).unwrap();
  action.workers().set_backup(counting_backup("restored", backups.clone())).unwrap();
  action.freeze();

  let instance = Instance::new(Scratch::default());
  let result = action
    .workers()
    .execute(instance.clone(), Arc::new(TestParams::default()), Source::from("slash"))
    .await;

  assert!(result.is_err());
  assert_eq!(backups.load(Ordering::SeqCst), 1);
  assert_eq!(instance.read().log.last().map(String::as_str), Some("restored"));
  assert_eq!(instance.read().log.len(), 7);
}

#[tokio::test]
async fn test_failure_without_backup_simply_reraises() {
  setup_tracing();
  let action = TestAction::new("no_backup");
  action.workers().add(logging_worker("w1", 2, "x")).unwrap();
  action.workers().add(failing_worker("w2", 1, "boom")).unwrap();
  action.workers().add(logging_worker("w3", 0, "never")).unwrap();
  assert!(!action.workers().has_backup());

  let result = action.run("slash", TestParams::default()).await;
  match result {
    Err(TestError::Worker(msg)) => assert_eq!(msg, "boom"),
    other => panic!("Expected TestError::Worker, got {:?}", other.map(|r| r.outcome)),
  }
}

#[tokio::test]
async fn test_failing_backup_does_not_swallow_original_error() {
  setup_tracing();
  let action = TestAction::new("bad_backup");
  action.workers().add(failing_worker("w1", 0, "original")).unwrap();
  action.workers().set_backup(failing_worker("backup", 0, "secondary")).unwrap();

  let err = action.run("slash", TestParams::default()).await.unwrap_err();
  assert_eq!(err, TestError::Worker("original".to_string()));
}

#[tokio::test]
async fn test_backup_sees_params_of_failed_run() {
  setup_tracing();
  let action = TestAction::new("backup_params");
  action.workers().add(failing_worker("w1", 0, "fail")).unwrap();
  action
    .workers()
    .set_backup(Worker::new("cancel-busy", 0, |ctx: WorkerContext<Scratch, TestParams>| async move {
      let ticket = ctx.params.ticket.clone();
      ctx.instance.write().log.push(format!("released {}", ticket));
      Ok::<_, TestError>(WorkerControl::Continue)
    }))
    .unwrap();

  let instance = Instance::new(Scratch::default());
  let params = Arc::new(TestParams {
    ticket: "t-42".to_string(),
    ..Default::default()
  });
  let _ = action
    .workers()
    .execute(instance.clone(), params, Source::from("button"))
    .await;
  assert_eq!(instance.read().log, vec!["released t-42"]);
}

#[tokio::test]
async fn test_panicking_worker_is_a_failure() {
  setup_tracing();
  let backups = Arc::new(AtomicUsize::new(0));
  let action = TestAction::new("panics");
  action
    .workers()
    .add(Worker::new("panicker", 1, |_ctx: WorkerContext<Scratch, TestParams>| async move {
      if true {
        panic!("worker blew up");
      }
      Ok::<_, TestError>(WorkerControl::Continue)
    }))
    .unwrap();
  action.workers().add(logging_worker("after", 0, "after")).unwrap();
  action.workers().set_backup(counting_backup("z", backups.clone())).unwrap();

  let err = action.run("slash", TestParams::default()).await.unwrap_err();
  match err {
    TestError::Ticketry(s) => {
      assert!(s.contains("WorkerPanicked"));
      assert!(s.contains("worker blew up"));
    }
    other => panic!("Expected WorkerPanicked, got {:?}", other),
  }
  assert_eq!(backups.load(Ordering::SeqCst), 1);
}
