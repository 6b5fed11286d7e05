// ticketry/src/core/worker.rs

//! Defines the `Worker<I, P, E>` stage type and the `WorkerContext<I, P>` every worker receives.

use crate::core::control::WorkerControl;
use crate::core::instance::Instance;
use crate::core::source::Source;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future produced by a worker function.
pub type WorkerFuture<E> = Pin<Box<dyn Future<Output = Result<WorkerControl, E>> + Send>>;

/// Type-erased worker function.
///
/// A worker takes ownership of a `WorkerContext` (cheap clones of the run's
/// instance, params and source) and resolves to `Result<WorkerControl, E>`.
///
/// Workers are responsible for:
/// 1. Dropping instance lock guards BEFORE any `.await` suspension point.
/// 2. Handling recoverable conditions themselves (reply, then `WorkerControl::Cancel`).
/// 3. Returning `Err` only for conditions that should trigger the backup worker.
pub type WorkerFn<I, P, E> = Arc<dyn Fn(WorkerContext<I, P>) -> WorkerFuture<E> + Send + Sync>;

/// Everything a worker sees of the current run.
pub struct WorkerContext<I, P>
where
  I: Send + Sync + 'static,
  P: Send + Sync + 'static,
{
  pub instance: Instance<I>,
  pub params: Arc<P>,
  pub source: Source,
}

impl<I, P> WorkerContext<I, P>
where
  I: Send + Sync + 'static,
  P: Send + Sync + 'static,
{
  pub fn new(instance: Instance<I>, params: Arc<P>, source: Source) -> Self {
    Self {
      instance,
      params,
      source,
    }
  }
}

impl<I, P> Clone for WorkerContext<I, P>
where
  I: Send + Sync + 'static,
  P: Send + Sync + 'static,
{
  fn clone(&self) -> Self {
    Self {
      instance: self.instance.clone(),
      params: Arc::clone(&self.params),
      source: self.source.clone(),
    }
  }
}

/// A single named, prioritized stage of an action's pipeline.
///
/// Higher priority runs first. The id only needs to be unique enough to be
/// useful for logging and removal inside one worker set.
pub struct Worker<I, P, E>
where
  I: Send + Sync + 'static,
  P: Send + Sync + 'static,
  E: std::error::Error + Send + Sync + 'static,
{
  id: String,
  priority: i32,
  run: WorkerFn<I, P, E>,
}

impl<I, P, E> Worker<I, P, E>
where
  I: Send + Sync + 'static,
  P: Send + Sync + 'static,
  E: std::error::Error + Send + Sync + 'static,
{
  /// Creates a worker from an async function.
  ///
  /// The function's own error type only needs to convert `Into<E>`.
  pub fn new<F, UserErr>(
    id: impl Into<String>,
    priority: i32,
    worker_fn: impl Fn(WorkerContext<I, P>) -> F + Send + Sync + 'static,
  ) -> Self
  where
    F: Future<Output = Result<WorkerControl, UserErr>> + Send + 'static,
    UserErr: Into<E> + Send + Sync + 'static,
  {
    let run: WorkerFn<I, P, E> = Arc::new(move |ctx| {
      let user_fut = worker_fn(ctx);
      Box::pin(async move { user_fut.await.map_err(Into::into) })
    });
    Self {
      id: id.into(),
      priority,
      run,
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn priority(&self) -> i32 {
    self.priority
  }

  pub(crate) fn call(&self, ctx: WorkerContext<I, P>) -> WorkerFuture<E> {
    (self.run)(ctx)
  }
}

impl<I, P, E> fmt::Debug for Worker<I, P, E>
where
  I: Send + Sync + 'static,
  P: Send + Sync + 'static,
  E: std::error::Error + Send + Sync + 'static,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Worker")
      .field("id", &self.id)
      .field("priority", &self.priority)
      .finish()
  }
}
