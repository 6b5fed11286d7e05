// ticketry/src/action/definition.rs

//! Defines `Action<I, P, E>`: a named pipeline owning one worker set.

use crate::action::worker_set::WorkerSet;
use crate::core::control::RunOutcome;
use crate::core::instance::Instance;
use crate::core::source::Source;
use crate::error::TicketryError;
use crate::registry::Keyed;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// Result of a run that did not fail: how it ended, and the instance as last mutated.
#[derive(Debug)]
pub struct ActionRun<I: Send + Sync + 'static> {
  pub outcome: RunOutcome,
  pub instance: Instance<I>,
}

impl<I: Send + Sync + 'static> ActionRun<I> {
  pub fn is_cancelled(&self) -> bool {
    self.outcome.is_cancelled()
  }
}

/// A named, reusable pipeline of prioritized workers.
///
/// - `I` is the per-run instance (scratch) type.
/// - `P` is the params bag supplied by the caller of `run`.
/// - `E` is the error type workers fail with; it must absorb `TicketryError`.
pub struct Action<I, P, E>
where
  I: Send + Sync + 'static,
  P: Send + Sync + 'static,
  E: std::error::Error + From<TicketryError> + Send + Sync + 'static,
{
  id: String,
  workers: WorkerSet<I, P, E>,
}

impl<I, P, E> Action<I, P, E>
where
  I: Send + Sync + 'static,
  P: Send + Sync + 'static,
  E: std::error::Error + From<TicketryError> + Send + Sync + 'static,
{
  pub fn new(id: impl Into<String>) -> Self {
    let id = id.into();
    Self {
      workers: WorkerSet::new(id.clone()),
      id,
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  /// The action's worker set. Mutable until frozen.
  pub fn workers(&self) -> &WorkerSet<I, P, E> {
    &self.workers
  }

  pub fn freeze(&self) {
    self.workers.freeze();
  }

  /// Runs the action against a caller-supplied instance.
  #[instrument(name = "Action::run", skip_all, fields(action_id = %self.id), err(Display))]
  pub async fn run_with_instance(&self, source: impl Into<Source>, params: P, instance: I) -> Result<ActionRun<I>, E> {
    let source = source.into();
    event!(Level::DEBUG, %source, "Running action.");
    let instance = Instance::new(instance);
    let outcome = self.workers.execute(instance.clone(), Arc::new(params), source).await?;
    Ok(ActionRun { outcome, instance })
  }
}

impl<I, P, E> Action<I, P, E>
where
  I: Default + Send + Sync + 'static,
  P: Send + Sync + 'static,
  E: std::error::Error + From<TicketryError> + Send + Sync + 'static,
{
  /// Runs the action with a fresh default instance.
  pub async fn run(&self, source: impl Into<Source>, params: P) -> Result<ActionRun<I>, E> {
    self.run_with_instance(source, params, I::default()).await
  }
}

impl<I, P, E> Keyed<String> for Action<I, P, E>
where
  I: Send + Sync + 'static,
  P: Send + Sync + 'static,
  E: std::error::Error + From<TicketryError> + Send + Sync + 'static,
{
  fn key(&self) -> String {
    self.id.clone()
  }
}
