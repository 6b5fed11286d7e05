// ticketry/examples/backup_worker.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use ticketry::{Action, TicketryError, Worker, WorkerContext, WorkerControl};
use tracing::{error, info};

// 1. Define a custom application error type
#[derive(Debug, thiserror::Error)]
enum ExampleAppError {
  #[error("The chat platform refused the request: {0}")]
  Platform(String),

  #[error("Ticketry error during action execution: {0}")]
  Ticketry(#[from] TicketryError),
}

// 2. Shared state outliving a single run (the ticket's busy flag)
#[derive(Debug, Default)]
struct Ticket {
  busy: AtomicBool,
}

#[derive(Debug, Default)]
struct DeleteInstance {
  steps: Vec<String>,
}

struct DeleteParams {
  ticket: Arc<Ticket>,
  refuse: bool,
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Backup Worker Example ---");

  let action = Action::<DeleteInstance, DeleteParams, ExampleAppError>::new("delete-ticket");
  let setup = action
    .workers()
    .add(Worker::new(
      "delete-ticket:mark-busy",
      2,
      |ctx: WorkerContext<DeleteInstance, DeleteParams>| async move {
        ctx.params.ticket.busy.store(true, Ordering::SeqCst);
        ctx.instance.write().steps.push("busy".to_string());
        Ok::<_, ExampleAppError>(WorkerControl::Continue)
      },
    ))
    .and_then(|_| {
      action.workers().add(Worker::new(
        "delete-ticket:delete-channel",
        0,
        |ctx: WorkerContext<DeleteInstance, DeleteParams>| async move {
          if ctx.params.refuse {
            return Err(ExampleAppError::Platform("Missing Permissions".to_string()));
          }
          ctx.instance.write().steps.push("deleted".to_string());
          ctx.params.ticket.busy.store(false, Ordering::SeqCst);
          Ok(WorkerControl::Continue)
        },
      ))
    })
    // 3. The backup only runs when a worker fails; it restores the busy flag
    .and_then(|_| {
      action.workers().set_backup(Worker::new(
        "delete-ticket:backup",
        0,
        |ctx: WorkerContext<DeleteInstance, DeleteParams>| async move {
          ctx.params.ticket.busy.store(false, Ordering::SeqCst);
          ctx.instance.write().steps.push("backup".to_string());
          Ok::<_, ExampleAppError>(WorkerControl::Continue)
        },
      ))
    });
  if let Err(e) = setup {
    error!("Failed to build action: {}", e);
    return;
  }
  action.freeze();

  // Scenario 1: the platform refuses, backup restores the flag, error still reaches the caller
  let ticket = Arc::new(Ticket::default());
  let result = action
    .run(
      "slash",
      DeleteParams {
        ticket: ticket.clone(),
        refuse: true,
      },
    )
    .await;
  match result {
    Err(ExampleAppError::Platform(msg)) => info!("Action failed as expected: {}", msg),
    Err(e) => error!("Unexpected error type: {:?}", e),
    Ok(run) => error!("Action unexpectedly succeeded: {:?}", run.outcome),
  }
  assert!(!ticket.busy.load(Ordering::SeqCst));

  // Scenario 2: the happy path never touches the backup
  let run = action
    .run(
      "slash",
      DeleteParams {
        ticket: ticket.clone(),
        refuse: false,
      },
    )
    .await;
  match run {
    Ok(run) => {
      let steps = run.instance.read().steps.clone();
      info!("Steps: {:?}", steps);
      assert_eq!(steps, vec!["busy", "deleted"]);
    }
    Err(e) => error!("Unexpected failure: {}", e),
  }
}
