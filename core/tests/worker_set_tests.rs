// tests/worker_set_tests.rs
mod common;

use common::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use ticketry::{Action, RunOutcome, Source, Worker, WorkerContext, WorkerControl};

#[tokio::test]
async fn test_workers_run_in_descending_priority_with_stable_ties() {
  setup_tracing();
  let action = TestAction::new("ordering");
  action
    .workers()
    .add_all([
      logging_worker("first_two", 2, "a"),
      logging_worker("zero", 0, "c"),
      logging_worker("second_two", 2, "b"),
    ])
    .unwrap();

  let run = action.run("slash", TestParams::default()).await.unwrap();

  assert_eq!(run.outcome, RunOutcome::Completed);
  assert_eq!(run.instance.read().log, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_negative_priorities_run_last() {
  setup_tracing();
  let action = TestAction::new("negative");
  action.workers().add(logging_worker("logs", -1, "logs")).unwrap();
  action.workers().add(logging_worker("main", 0, "main")).unwrap();
  action.workers().add(logging_worker("permissions", 1, "permissions")).unwrap();

  assert_eq!(action.workers().ids(), vec!["permissions", "main", "logs"]);
  let run = action.run("slash", TestParams::default()).await.unwrap();
  assert_eq!(run.instance.read().log, vec!["permissions", "main", "logs"]);
}

#[tokio::test]
async fn test_cancel_stops_later_workers_and_resolves() {
  setup_tracing();
  let action = TestAction::new("cancel");
  action.workers().add(logging_worker("w1", 5, "x")).unwrap();
  action.workers().add(logging_worker("w2", 1, "y")).unwrap();

  let params = TestParams {
    cancel_at: Some("w1"),
    ..Default::default()
  };
  let run = action.run("button", params).await.unwrap();

  assert_eq!(run.outcome, RunOutcome::Cancelled);
  assert!(run.is_cancelled());
  assert_eq!(run.instance.read().log, vec!["x"]);
}

#[tokio::test]
async fn test_cancel_does_not_invoke_backup() {
  setup_tracing();
  let backups = Arc::new(AtomicUsize::new(0));
  let action = TestAction::new("cancel_no_backup");
  action.workers().add(cancelling_worker("w1", 5)).unwrap();
  action.workers().add(logging_worker("w2", 1, "y")).unwrap();
  action.workers().set_backup(counting_backup("z", backups.clone())).unwrap();

  let run = action.run("slash", TestParams::default()).await.unwrap();

  assert_eq!(run.outcome, RunOutcome::Cancelled);
  assert!(run.instance.read().log.is_empty());
  assert_eq!(backups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_workers_share_instance_and_params() {
  setup_tracing();
  let action = TestAction::new("sharing");
  action
    .workers()
    .add(Worker::new("producer", 2, |ctx: WorkerContext<Scratch, TestParams>| async move {
      let ticket = ctx.params.ticket.clone();
      ctx.instance.write().log.push(format!("seen {}", ticket));
      Ok::<_, TestError>(WorkerControl::Continue)
    }))
    .unwrap();
  action
    .workers()
    .add(Worker::new("consumer", 1, |ctx: WorkerContext<Scratch, TestParams>| async move {
      let count = ctx.instance.read().log.len();
      let source = ctx.source.to_string();
      ctx.instance.write().log.push(format!("{} via {}", count, source));
      Ok::<_, TestError>(WorkerControl::Continue)
    }))
    .unwrap();

  let params = TestParams {
    ticket: "ticket-1".to_string(),
    ..Default::default()
  };
  let run = action.run(Source::from("clear"), params).await.unwrap();
  assert_eq!(run.instance.read().log, vec!["seen ticket-1", "1 via clear"]);
}

#[tokio::test]
async fn test_workers_added_between_runs_are_sorted_in() {
  setup_tracing();
  let action = TestAction::new("plugin_extension");
  action.workers().add(logging_worker("builtin", 1, "builtin")).unwrap();
  let first = action.run("slash", TestParams::default()).await.unwrap();
  assert_eq!(first.instance.read().log, vec!["builtin"]);

  action.workers().add(logging_worker("plugin", 3, "plugin")).unwrap();
  let second = action.run("slash", TestParams::default()).await.unwrap();
  assert_eq!(second.instance.read().log, vec!["plugin", "builtin"]);
}

#[tokio::test]
async fn test_remove_worker() {
  setup_tracing();
  let action = TestAction::new("removal");
  action.workers().add(logging_worker("keep", 1, "keep")).unwrap();
  action.workers().add(logging_worker("drop", 0, "drop")).unwrap();

  assert!(action.workers().remove("drop").unwrap());
  assert!(!action.workers().remove("unknown").unwrap());

  let run = action.run("slash", TestParams::default()).await.unwrap();
  assert_eq!(run.instance.read().log, vec!["keep"]);
}

#[tokio::test]
async fn test_frozen_worker_set_rejects_mutation() {
  setup_tracing();
  let action = TestAction::new("frozen");
  action.workers().add(logging_worker("low", 0, "low")).unwrap();
  action.workers().add(logging_worker("high", 9, "high")).unwrap();
  action.freeze();
  action.freeze(); // no-op

  assert!(action.workers().is_frozen());
  assert_eq!(action.workers().ids(), vec!["high", "low"]);

  let add_err = action.workers().add(logging_worker("late", 5, "late")).unwrap_err();
  assert!(add_err.to_string().contains("frozen"));
  assert!(add_err.to_string().contains("late"));
  assert!(action.workers().remove("low").is_err());
  assert!(action.workers().set_backup(logging_worker("backup", 0, "b")).is_err());
  assert!(action.workers().clear_backup().is_err());

  let run = action.run("slash", TestParams::default()).await.unwrap();
  assert_eq!(run.instance.read().log, vec!["high", "low"]);
}

#[tokio::test]
async fn test_empty_action_completes() {
  setup_tracing();
  let action = TestAction::new("empty");
  assert!(action.workers().is_empty());
  let run = action.run("slash", TestParams::default()).await.unwrap();
  assert_eq!(run.outcome, RunOutcome::Completed);
  assert!(run.instance.read().log.is_empty());
}

#[tokio::test]
async fn test_run_with_instance_keeps_supplied_state() {
  setup_tracing();
  let action: Action<Scratch, TestParams, TestError> = Action::new("seeded");
  action.workers().add(logging_worker("w", 0, "after")).unwrap();

  let seeded = Scratch {
    log: vec!["before".to_string()],
  };
  let run = action
    .run_with_instance("text", TestParams::default(), seeded)
    .await
    .unwrap();
  assert_eq!(run.instance.snapshot().log, vec!["before", "after"]);
}
