// ticketry/src/action/worker_set.rs

//! Contains the `WorkerSet<I, P, E>` struct and its registration-phase mutators.
//! Execution lives in `execution.rs`.

use crate::core::worker::Worker;
use crate::error::{TicketryError, TicketryResult};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{event, Level};

pub(crate) type SharedWorker<I, P, E> = Arc<Worker<I, P, E>>;

/// The ordered workers of one action plus an optional backup worker.
///
/// Two-phase lifecycle:
/// - while unfrozen, workers may be added or removed (plugins extend built-in
///   pipelines this way) and every run sorts a snapshot by priority;
/// - after `freeze()`, the set is sorted once and all mutation is rejected
///   with `TicketryError::WorkerSetFrozen`.
///
/// Sorting is stable: equal priorities keep their registration order.
pub struct WorkerSet<I, P, E>
where
  I: Send + Sync + 'static,
  P: Send + Sync + 'static,
  E: std::error::Error + Send + Sync + 'static,
{
  owner: String,
  state: RwLock<WorkerSetState<I, P, E>>,
}

struct WorkerSetState<I, P, E>
where
  I: Send + Sync + 'static,
  P: Send + Sync + 'static,
  E: std::error::Error + Send + Sync + 'static,
{
  workers: Vec<SharedWorker<I, P, E>>,
  backup: Option<SharedWorker<I, P, E>>,
  frozen: bool,
}

impl<I, P, E> WorkerSet<I, P, E>
where
  I: Send + Sync + 'static,
  P: Send + Sync + 'static,
  E: std::error::Error + Send + Sync + 'static,
{
  /// Creates an empty set. `owner` is the id of the action it belongs to.
  pub fn new(owner: impl Into<String>) -> Self {
    Self {
      owner: owner.into(),
      state: RwLock::new(WorkerSetState {
        workers: Vec::new(),
        backup: None,
        frozen: false,
      }),
    }
  }

  pub fn owner(&self) -> &str {
    &self.owner
  }

  fn ensure_mutable(&self, state: &WorkerSetState<I, P, E>, worker_id: &str, operation: &'static str) -> TicketryResult<()> {
    if state.frozen {
      event!(Level::ERROR, owner = %self.owner, %worker_id, operation, "Rejected mutation of frozen worker set.");
      return Err(TicketryError::WorkerSetFrozen {
        owner: self.owner.clone(),
        worker_id: worker_id.to_string(),
        operation,
      });
    }
    Ok(())
  }

  /// Appends a worker. Its position among equal priorities is its registration order.
  pub fn add(&self, worker: Worker<I, P, E>) -> TicketryResult<()> {
    let mut state = self.state.write();
    self.ensure_mutable(&state, worker.id(), "add")?;
    event!(Level::DEBUG, owner = %self.owner, worker_id = worker.id(), priority = worker.priority(), "Worker added.");
    state.workers.push(Arc::new(worker));
    Ok(())
  }

  pub fn add_all(&self, workers: impl IntoIterator<Item = Worker<I, P, E>>) -> TicketryResult<()> {
    for worker in workers {
      self.add(worker)?;
    }
    Ok(())
  }

  /// Removes the first worker with the given id. Returns `Ok(false)` when none matched.
  pub fn remove(&self, worker_id: &str) -> TicketryResult<bool> {
    let mut state = self.state.write();
    self.ensure_mutable(&state, worker_id, "remove")?;
    match state.workers.iter().position(|w| w.id() == worker_id) {
      Some(idx) => {
        state.workers.remove(idx);
        event!(Level::DEBUG, owner = %self.owner, %worker_id, "Worker removed.");
        Ok(true)
      }
      None => Ok(false),
    }
  }

  /// Designates the worker that runs once when any worker of a run fails.
  /// Replaces a previous backup worker.
  pub fn set_backup(&self, worker: Worker<I, P, E>) -> TicketryResult<()> {
    let mut state = self.state.write();
    self.ensure_mutable(&state, worker.id(), "set backup")?;
    if let Some(previous) = &state.backup {
      event!(Level::WARN, owner = %self.owner, previous = previous.id(), replacement = worker.id(), "Replacing backup worker.");
    }
    state.backup = Some(Arc::new(worker));
    Ok(())
  }

  pub fn clear_backup(&self) -> TicketryResult<()> {
    let mut state = self.state.write();
    self.ensure_mutable(&state, "<backup>", "clear backup")?;
    state.backup = None;
    Ok(())
  }

  pub fn has_backup(&self) -> bool {
    self.state.read().backup.is_some()
  }

  /// Sorts the set once and rejects every later mutation. Freezing twice is a no-op.
  pub fn freeze(&self) {
    let mut state = self.state.write();
    if state.frozen {
      return;
    }
    sort_by_priority(&mut state.workers);
    state.frozen = true;
    event!(Level::DEBUG, owner = %self.owner, num_workers = state.workers.len(), "Worker set frozen.");
  }

  pub fn is_frozen(&self) -> bool {
    self.state.read().frozen
  }

  pub fn len(&self) -> usize {
    self.state.read().workers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Worker ids in the order the next run would execute them.
  pub fn ids(&self) -> Vec<String> {
    self.snapshot().0.iter().map(|w| w.id().to_string()).collect()
  }

  /// Clones the workers (execution order) and backup out of the lock,
  /// so no guard is held while the run awaits.
  pub(crate) fn snapshot(&self) -> (Vec<SharedWorker<I, P, E>>, Option<SharedWorker<I, P, E>>) {
    let state = self.state.read();
    let mut workers = state.workers.clone();
    if !state.frozen {
      sort_by_priority(&mut workers);
    }
    (workers, state.backup.clone())
  }
}

fn sort_by_priority<I, P, E>(workers: &mut [SharedWorker<I, P, E>])
where
  I: Send + Sync + 'static,
  P: Send + Sync + 'static,
  E: std::error::Error + Send + Sync + 'static,
{
  // sort_by_key is stable
  workers.sort_by_key(|w| std::cmp::Reverse(w.priority()));
}
