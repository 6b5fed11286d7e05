// ticketry/src/action/execution.rs

//! Contains `WorkerSet::execute()`, which runs the workers of one invocation
//! in priority order, honours cancellation and invokes the backup worker on failure.

use crate::action::worker_set::{SharedWorker, WorkerSet};
use crate::core::control::{Flow, RunOutcome};
use crate::core::instance::Instance;
use crate::core::source::Source;
use crate::core::worker::WorkerContext;
use crate::error::TicketryError;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{event, instrument, span, Instrument, Level};

impl<I, P, E> WorkerSet<I, P, E>
where
  I: Send + Sync + 'static,
  P: Send + Sync + 'static,
  E: std::error::Error + From<TicketryError> + Send + Sync + 'static,
{
  /// Executes the workers against `instance` and `params`.
  ///
  /// - Workers run one at a time, highest priority first.
  /// - A worker returning `WorkerControl::Cancel` ends the run with `Ok(RunOutcome::Cancelled)`.
  /// - A worker returning `Err` (or panicking) ends the run: the backup worker,
  ///   if any, runs exactly once with the same instance and params, then the
  ///   original error is returned. A failing backup worker is logged and does
  ///   not replace the original error.
  #[instrument(
    name = "WorkerSet::execute",
    skip_all,
    fields(owner = %self.owner(), source = %source),
    err(Display)
  )]
  pub async fn execute(&self, instance: Instance<I>, params: Arc<P>, source: Source) -> Result<RunOutcome, E> {
    let (workers, backup) = self.snapshot();
    event!(Level::DEBUG, num_workers = workers.len(), has_backup = backup.is_some(), "Worker set run starting.");

    let ctx = WorkerContext::new(instance, params, source);

    for (worker_idx, worker) in workers.iter().enumerate() {
      let worker_span = span!(
        Level::DEBUG,
        "worker_execution",
        worker_id = worker.id(),
        priority = worker.priority(),
        worker_index = worker_idx
      );

      let flow = self.call_guarded(worker, ctx.clone()).instrument(worker_span).await;

      match flow {
        Flow::Continue => {}
        Flow::Cancelled => {
          event!(Level::INFO, worker_id = worker.id(), "Run cancelled by worker.");
          return Ok(RunOutcome::Cancelled);
        }
        Flow::Failed(err) => {
          event!(Level::ERROR, worker_id = worker.id(), error = %err, "Worker failed.");
          if let Some(backup_worker) = &backup {
            self.run_backup(backup_worker, ctx.clone()).await;
          }
          return Err(err);
        }
      }
    }

    event!(Level::DEBUG, "Worker set run completed.");
    Ok(RunOutcome::Completed)
  }

  async fn call_guarded(&self, worker: &SharedWorker<I, P, E>, ctx: WorkerContext<I, P>) -> Flow<E> {
    match AssertUnwindSafe(worker.call(ctx)).catch_unwind().await {
      Ok(result) => Flow::from(result),
      Err(panic) => Flow::Failed(E::from(TicketryError::WorkerPanicked {
        owner: self.owner().to_string(),
        worker_id: worker.id().to_string(),
        message: panic_message(panic.as_ref()),
      })),
    }
  }

  async fn run_backup(&self, backup_worker: &SharedWorker<I, P, E>, ctx: WorkerContext<I, P>) {
    let backup_span = span!(Level::DEBUG, "backup_worker", worker_id = backup_worker.id());
    event!(Level::DEBUG, worker_id = backup_worker.id(), "Running backup worker.");
    // The control value is irrelevant; the run is already over.
    if let Flow::Failed(backup_err) = self.call_guarded(backup_worker, ctx).instrument(backup_span).await {
      event!(
        Level::ERROR,
        worker_id = backup_worker.id(),
        error = %backup_err,
        "Backup worker failed; propagating the original error."
      );
    }
  }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
  if let Some(msg) = panic.downcast_ref::<&str>() {
    (*msg).to_string()
  } else if let Some(msg) = panic.downcast_ref::<String>() {
    msg.clone()
  } else {
    "non-string panic payload".to_string()
  }
}
