// ticketry/src/core/control.rs

//! Signals for controlling a worker set run and the outcome of a run.

/// Signal returned by every worker.
///
/// Returning `Cancel` is how a worker ends the run early. It does not roll back
/// anything the worker already did, and the backup worker is not invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerControl {
  /// Proceed with the next worker.
  Continue,
  /// Stop the run. No later worker in this run executes.
  Cancel,
}

/// Resolved value of a run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
  /// Every worker ran.
  Completed,
  /// A worker returned `WorkerControl::Cancel`.
  Cancelled,
}

impl RunOutcome {
  pub fn is_cancelled(&self) -> bool {
    matches!(self, RunOutcome::Cancelled)
  }
}

/// State threaded through one worker set iteration.
#[derive(Debug)]
pub(crate) enum Flow<E> {
  Continue,
  Cancelled,
  Failed(E),
}

impl<E> From<Result<WorkerControl, E>> for Flow<E> {
  fn from(result: Result<WorkerControl, E>) -> Self {
    match result {
      Ok(WorkerControl::Continue) => Flow::Continue,
      Ok(WorkerControl::Cancel) => Flow::Cancelled,
      Err(e) => Flow::Failed(e),
    }
  }
}
