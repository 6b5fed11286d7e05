// ticketry/src/event.rs

//! Side-channel notification: `Event<K, A, E>` and the `EventBus<K, A, E>` registry.
//!
//! Events have no priority, no cancellation and no backup. Listeners run
//! strictly in registration order, each awaited before the next starts, and
//! the first failing listener ends the emission with its error.

use crate::error::{TicketryError, TicketryResult};
use crate::registry::{DuplicatePolicy, Keyed, Registry, RegistryKey};
use parking_lot::RwLock;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{event, instrument, Level};

pub type ListenerFuture<E> = Pin<Box<dyn Future<Output = Result<(), E>> + Send>>;
pub type Listener<A, E> = Arc<dyn Fn(Arc<A>) -> ListenerFuture<E> + Send + Sync>;

pub struct Event<K, A, E>
where
  K: RegistryKey,
  A: Send + Sync + 'static,
  E: std::error::Error + Send + Sync + 'static,
{
  id: K,
  listeners: RwLock<Vec<Listener<A, E>>>,
}

impl<K, A, E> Event<K, A, E>
where
  K: RegistryKey,
  A: Send + Sync + 'static,
  E: std::error::Error + Send + Sync + 'static,
{
  pub fn new(id: K) -> Self {
    Self {
      id,
      listeners: RwLock::new(Vec::new()),
    }
  }

  pub fn id(&self) -> &K {
    &self.id
  }

  /// Appends a listener. The args are shared between listeners behind an `Arc`.
  pub fn listen<F, UserErr>(&self, listener_fn: impl Fn(Arc<A>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<(), UserErr>> + Send + 'static,
    UserErr: Into<E> + Send + Sync + 'static,
  {
    let listener: Listener<A, E> = Arc::new(move |args| {
      let user_fut = listener_fn(args);
      Box::pin(async move { user_fut.await.map_err(Into::into) })
    });
    self.listeners.write().push(listener);
    event!(Level::DEBUG, event_id = %self.id, "Listener added.");
  }

  pub fn listener_count(&self) -> usize {
    self.listeners.read().len()
  }

  #[instrument(name = "Event::emit", skip_all, fields(event_id = %self.id), err(Display))]
  pub async fn emit(&self, args: A) -> Result<(), E> {
    // snapshot so listeners added during emission only see the next one
    let listeners: Vec<Listener<A, E>> = self.listeners.read().clone();
    let args = Arc::new(args);
    for (listener_idx, listener) in listeners.iter().enumerate() {
      if let Err(e) = listener(Arc::clone(&args)).await {
        event!(Level::ERROR, listener_index = listener_idx, error = %e, "Event listener failed.");
        return Err(e);
      }
    }
    Ok(())
  }
}

impl<K, A, E> Keyed<K> for Event<K, A, E>
where
  K: RegistryKey,
  A: Send + Sync + 'static,
  E: std::error::Error + Send + Sync + 'static,
{
  fn key(&self) -> K {
    self.id.clone()
  }
}

/// Registry of events keyed by `K`.
pub struct EventBus<K, A, E>
where
  K: RegistryKey,
  A: Send + Sync + 'static,
  E: std::error::Error + Send + Sync + 'static,
{
  registry: Registry<K, Event<K, A, E>>,
}

impl<K, A, E> EventBus<K, A, E>
where
  K: RegistryKey,
  A: Send + Sync + 'static,
  E: std::error::Error + From<TicketryError> + Send + Sync + 'static,
{
  pub fn new(policy: DuplicatePolicy) -> Self {
    Self {
      registry: Registry::with_policy("event", policy),
    }
  }

  /// Registers a new event with no listeners.
  pub fn declare(&self, id: K) -> TicketryResult<Arc<Event<K, A, E>>> {
    self.registry.add(Event::new(id))
  }

  pub fn get(&self, id: &K) -> TicketryResult<Arc<Event<K, A, E>>> {
    self.registry.get(id)
  }

  pub fn registry(&self) -> &Registry<K, Event<K, A, E>> {
    &self.registry
  }

  /// Shorthand for `get(id)?.emit(args)`.
  pub async fn emit(&self, id: &K, args: A) -> Result<(), E> {
    let event = self.get(id).map_err(E::from)?;
    event.emit(args).await
  }
}
