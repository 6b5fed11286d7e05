// ticketry/src/action/responder.rs

//! Defines `Responder<P, I, E>`, an action bound to an external trigger
//! (a command name, a button-id pattern, a modal-id pattern), and
//! `ResponderRegistry<P, I, E>`, which resolves incoming triggers to responders.

use crate::action::definition::{Action, ActionRun};
use crate::action::worker_set::WorkerSet;
use crate::core::source::Source;
use crate::error::{TicketryError, TicketryResult};
use crate::registry::{DuplicatePolicy, Keyed, Registry};
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// Raw trigger payloads expose the id responders are matched against.
pub trait Trigger {
  fn trigger_id(&self) -> &str;
}

/// How a responder decides whether it handles a trigger id.
#[derive(Clone)]
pub enum Matcher {
  /// Whole-id equality (commands).
  Exact(String),
  /// Regular expression search (buttons/modals whose ids carry extra `_`-separated parameters).
  Pattern(Regex),
}

impl Matcher {
  pub fn exact(id: impl Into<String>) -> Self {
    Matcher::Exact(id.into())
  }

  pub fn pattern(pattern: &str) -> TicketryResult<Self> {
    Regex::new(pattern)
      .map(Matcher::Pattern)
      .map_err(|source| TicketryError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
      })
  }

  pub fn matches(&self, trigger_id: &str) -> bool {
    match self {
      Matcher::Exact(id) => id == trigger_id,
      Matcher::Pattern(re) => re.is_match(trigger_id),
    }
  }
}

impl fmt::Debug for Matcher {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Matcher::Exact(id) => f.debug_tuple("Exact").field(id).finish(),
      Matcher::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
    }
  }
}

/// Builds the per-run instance from the raw trigger payload.
pub type InstanceFactory<P, I> = Arc<dyn Fn(&P) -> I + Send + Sync>;

pub struct Responder<P, I, E>
where
  P: Trigger + Send + Sync + 'static,
  I: Send + Sync + 'static,
  E: std::error::Error + From<TicketryError> + Send + Sync + 'static,
{
  action: Action<I, P, E>,
  matcher: Matcher,
  factory: InstanceFactory<P, I>,
}

impl<P, I, E> Responder<P, I, E>
where
  P: Trigger + Send + Sync + 'static,
  I: Send + Sync + 'static,
  E: std::error::Error + From<TicketryError> + Send + Sync + 'static,
{
  pub fn new(id: impl Into<String>, matcher: Matcher, factory: impl Fn(&P) -> I + Send + Sync + 'static) -> Self {
    Self {
      action: Action::new(id),
      matcher,
      factory: Arc::new(factory),
    }
  }

  pub fn id(&self) -> &str {
    self.action.id()
  }

  pub fn matcher(&self) -> &Matcher {
    &self.matcher
  }

  pub fn workers(&self) -> &WorkerSet<I, P, E> {
    self.action.workers()
  }

  pub fn accepts(&self, trigger_id: &str) -> bool {
    self.matcher.matches(trigger_id)
  }

  pub fn freeze(&self) {
    self.action.freeze();
  }

  /// Builds a fresh instance from `trigger` and runs the worker set.
  pub async fn respond(&self, source: impl Into<Source>, trigger: P) -> Result<ActionRun<I>, E> {
    let instance = (self.factory)(&trigger);
    self.action.run_with_instance(source, trigger, instance).await
  }
}

impl<P, I, E> Keyed<String> for Responder<P, I, E>
where
  P: Trigger + Send + Sync + 'static,
  I: Send + Sync + 'static,
  E: std::error::Error + From<TicketryError> + Send + Sync + 'static,
{
  fn key(&self) -> String {
    self.id().to_string()
  }
}

/// Responders of one kind (commands, buttons or modals).
pub struct ResponderRegistry<P, I, E>
where
  P: Trigger + Send + Sync + 'static,
  I: Send + Sync + 'static,
  E: std::error::Error + From<TicketryError> + Send + Sync + 'static,
{
  registry: Registry<String, Responder<P, I, E>>,
}

impl<P, I, E> ResponderRegistry<P, I, E>
where
  P: Trigger + Send + Sync + 'static,
  I: Send + Sync + 'static,
  E: std::error::Error + From<TicketryError> + Send + Sync + 'static,
{
  pub fn new(kind: impl Into<String>, policy: DuplicatePolicy) -> Self {
    Self {
      registry: Registry::with_policy(kind, policy),
    }
  }

  pub fn kind(&self) -> &str {
    self.registry.name()
  }

  pub fn add(&self, responder: Responder<P, I, E>) -> TicketryResult<Arc<Responder<P, I, E>>> {
    self.registry.add(responder)
  }

  pub fn get(&self, id: &str) -> TicketryResult<Arc<Responder<P, I, E>>> {
    self.registry.get(&id.to_string())
  }

  pub fn remove(&self, id: &str) -> Option<Arc<Responder<P, I, E>>> {
    self.registry.remove(&id.to_string())
  }

  pub fn registry(&self) -> &Registry<String, Responder<P, I, E>> {
    &self.registry
  }

  /// First registered responder whose matcher accepts `trigger_id`.
  pub fn resolve(&self, trigger_id: &str) -> Option<Arc<Responder<P, I, E>>> {
    self.registry.find(|responder| responder.accepts(trigger_id))
  }

  /// Runs the matching responder. `Ok(None)` when nothing matches, which is
  /// expected for stale components on long-lived messages.
  #[instrument(
    name = "ResponderRegistry::dispatch",
    skip_all,
    fields(kind = %self.kind(), trigger_id = %trigger.trigger_id()),
    err(Display)
  )]
  pub async fn dispatch(&self, source: impl Into<Source>, trigger: P) -> Result<Option<ActionRun<I>>, E> {
    let Some(responder) = self.resolve(trigger.trigger_id()) else {
      event!(Level::DEBUG, "No responder matched trigger; ignoring.");
      return Ok(None);
    };
    event!(Level::DEBUG, responder_id = responder.id(), "Responder matched trigger.");
    responder.respond(source, trigger).await.map(Some)
  }

  /// Freezes the worker set of every registered responder.
  pub fn freeze_all(&self) {
    for responder in self.registry.all() {
      responder.freeze();
    }
  }
}
