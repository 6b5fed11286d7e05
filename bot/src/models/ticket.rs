// ticketry-bot/src/models/ticket.rs

//! The ticket entity, its busy flag and the `Tickets` manager.

use crate::errors::{BotError, Result};
use crate::services::store::Store;
use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use ticketry::{DuplicatePolicy, Keyed, Registry};
use tracing::{event, instrument, Level};

/// Store category ticket data is persisted in.
pub const TICKETS_CATEGORY: &str = "tickets";

/// How a ticket channel's name suffix is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SuffixMode {
  #[default]
  UserName,
  UserId,
  /// A counter assigned at creation; not affected by transfers.
  Counter,
}

/// The ticket type ("option") a ticket was opened from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketOption {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub channel_prefix: String,
  #[serde(default)]
  pub channel_suffix: SuffixMode,
  #[serde(default)]
  pub admins: Vec<String>,
  #[serde(default)]
  pub readonly_admins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Participant {
  User(String),
  Role(String),
}

/// Persisted state of one ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketData {
  pub channel_id: String,
  pub option: TicketOption,
  pub opened_by: Option<String>,
  pub opened_on: DateTime<Utc>,
  #[serde(default)]
  pub previous_creators: Vec<String>,
  #[serde(default)]
  pub participants: Vec<Participant>,
  #[serde(default)]
  pub channel_suffix: String,
  /// Numeric level, resolved through `PriorityLevels::from_level`.
  #[serde(default = "default_priority")]
  pub priority: i32,
  #[serde(default)]
  pub topic: String,
  #[serde(default)]
  pub pinned: bool,
  #[serde(default)]
  pub closed: bool,
  #[serde(default)]
  pub claimed_by: Option<String>,
  #[serde(default)]
  pub for_deletion: bool,
}

fn default_priority() -> i32 {
  -1
}

impl TicketData {
  /// A freshly opened ticket owned by `creator`.
  pub fn open(channel_id: impl Into<String>, option: TicketOption, creator: &str, suffix: impl Into<String>) -> Self {
    Self {
      channel_id: channel_id.into(),
      option,
      opened_by: Some(creator.to_string()),
      opened_on: Utc::now(),
      previous_creators: Vec::new(),
      participants: vec![Participant::User(creator.to_string())],
      channel_suffix: suffix.into(),
      priority: default_priority(),
      topic: String::new(),
      pinned: false,
      closed: false,
      claimed_by: None,
      for_deletion: false,
    }
  }
}

/// Marks a ticket as being edited by some run.
///
/// Not persisted. Actions acquire it with `try_hold` before touching the
/// ticket; the engine adds no locking.
#[derive(Debug, Default)]
pub struct BusyFlag(AtomicBool);

impl BusyFlag {
  pub fn is_busy(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }

  /// Sets the flag, failing with `Precondition` when another run already holds it.
  /// The guard clears it when dropped.
  pub fn try_hold(&self) -> Result<BusyGuard<'_>> {
    self
      .0
      .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
      .map(|_| BusyGuard { flag: self })
      .map_err(|_| BotError::Precondition("Ticket is busy".to_string()))
  }

  pub fn release(&self) {
    self.0.store(false, Ordering::SeqCst);
  }
}

/// Scoped hold of a `BusyFlag`.
#[derive(Debug)]
pub struct BusyGuard<'a> {
  flag: &'a BusyFlag,
}

impl Drop for BusyGuard<'_> {
  fn drop(&mut self) {
    self.flag.release();
  }
}

#[derive(Debug)]
pub struct Ticket {
  data: RwLock<TicketData>,
  busy: BusyFlag,
}

impl Ticket {
  pub fn new(data: TicketData) -> Self {
    Self {
      data: RwLock::new(data),
      busy: BusyFlag::default(),
    }
  }

  /// The ticket id, which is its channel id.
  pub fn id(&self) -> String {
    self.data.read().channel_id.clone()
  }

  /// Read access. Do not hold the guard across an `.await`.
  pub fn read(&self) -> RwLockReadGuard<'_, TicketData> {
    self.data.read()
  }

  pub fn update<R>(&self, f: impl FnOnce(&mut TicketData) -> R) -> R {
    f(&mut self.data.write())
  }

  pub fn snapshot(&self) -> TicketData {
    self.data.read().clone()
  }

  pub fn busy(&self) -> &BusyFlag {
    &self.busy
  }

  pub fn is_busy(&self) -> bool {
    self.busy.is_busy()
  }
}

impl Keyed<String> for Ticket {
  fn key(&self) -> String {
    self.id()
  }
}

/// Which tickets `clear` targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClearFilter {
  #[default]
  All,
  Open,
  Closed,
  Claimed,
  Unclaimed,
  Pinned,
  Unpinned,
}

impl ClearFilter {
  pub fn as_str(&self) -> &'static str {
    match self {
      ClearFilter::All => "all",
      ClearFilter::Open => "open",
      ClearFilter::Closed => "closed",
      ClearFilter::Claimed => "claimed",
      ClearFilter::Unclaimed => "unclaimed",
      ClearFilter::Pinned => "pinned",
      ClearFilter::Unpinned => "unpinned",
    }
  }

  pub fn parse(value: &str) -> Option<Self> {
    [
      ClearFilter::All,
      ClearFilter::Open,
      ClearFilter::Closed,
      ClearFilter::Claimed,
      ClearFilter::Unclaimed,
      ClearFilter::Pinned,
      ClearFilter::Unpinned,
    ]
    .into_iter()
    .find(|filter| filter.as_str() == value)
  }

  pub fn accepts(&self, ticket: &TicketData) -> bool {
    match self {
      ClearFilter::All => true,
      ClearFilter::Open => !ticket.closed,
      ClearFilter::Closed => ticket.closed,
      ClearFilter::Claimed => ticket.claimed_by.is_some(),
      ClearFilter::Unclaimed => ticket.claimed_by.is_none(),
      ClearFilter::Pinned => ticket.pinned,
      ClearFilter::Unpinned => !ticket.pinned,
    }
  }
}

/// Live tickets keyed by channel id, mirrored into the `tickets` store category.
pub struct Tickets {
  registry: Registry<String, Ticket>,
  store: Arc<dyn Store>,
}

impl Tickets {
  pub fn new(store: Arc<dyn Store>) -> Self {
    Self {
      registry: Registry::with_policy("ticket", DuplicatePolicy::Reject),
      store,
    }
  }

  /// Loads every persisted ticket. Malformed entries are a configuration error.
  #[instrument(name = "Tickets::load", skip_all, err(Display))]
  pub async fn load(&self) -> Result<usize> {
    let entries = self.store.get_category(TICKETS_CATEGORY).await?;
    let mut loaded = 0;
    for (key, value) in entries {
      let data: TicketData = serde_json::from_value(value)
        .map_err(|e| BotError::Configuration(format!("Malformed ticket data for '{}': {}", key, e)))?;
      self.registry.add(Ticket::new(data))?;
      loaded += 1;
    }
    event!(Level::INFO, loaded, "Tickets loaded from store.");
    Ok(loaded)
  }

  /// Registers and persists a new ticket.
  pub async fn add(&self, data: TicketData) -> Result<Arc<Ticket>> {
    let ticket = self.registry.add(Ticket::new(data))?;
    self.save(&ticket).await?;
    Ok(ticket)
  }

  pub fn get(&self, channel_id: &str) -> Option<Arc<Ticket>> {
    self.registry.try_get(&channel_id.to_string())
  }

  /// Tickets in the order they were added.
  pub fn list(&self) -> Vec<Arc<Ticket>> {
    self.registry.all()
  }

  pub fn filter(&self, filter: ClearFilter) -> Vec<Arc<Ticket>> {
    self
      .registry
      .all()
      .into_iter()
      .filter(|ticket| filter.accepts(&ticket.read()))
      .collect()
  }

  pub fn len(&self) -> usize {
    self.registry.len()
  }

  pub fn is_empty(&self) -> bool {
    self.registry.is_empty()
  }

  pub async fn save(&self, ticket: &Ticket) -> Result<()> {
    let (key, value) = {
      let data = ticket.read();
      (data.channel_id.clone(), serde_json::to_value(&*data)?)
    };
    self.store.set(TICKETS_CATEGORY, &key, value).await?;
    Ok(())
  }

  /// Drops the ticket from memory and from the store.
  pub async fn remove(&self, channel_id: &str) -> Result<Option<Arc<Ticket>>> {
    let removed = self.registry.remove(&channel_id.to_string());
    self.store.delete(TICKETS_CATEGORY, channel_id).await?;
    Ok(removed)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn option() -> TicketOption {
    TicketOption {
      id: "support".to_string(),
      name: "Support".to_string(),
      description: String::new(),
      channel_prefix: "support-".to_string(),
      channel_suffix: SuffixMode::UserName,
      admins: vec![],
      readonly_admins: vec![],
    }
  }

  #[test]
  fn busy_guard_releases_on_drop() {
    let ticket = Ticket::new(TicketData::open("c1", option(), "u1", "alice"));
    {
      let _guard = ticket.busy().try_hold().unwrap();
      assert!(ticket.is_busy());
      assert!(matches!(ticket.busy().try_hold(), Err(BotError::Precondition(_))));
    }
    assert!(!ticket.is_busy());
  }

  #[test]
  fn clear_filters() {
    let mut data = TicketData::open("c1", option(), "u1", "alice");
    data.closed = true;
    data.pinned = true;
    assert!(ClearFilter::Closed.accepts(&data));
    assert!(!ClearFilter::Open.accepts(&data));
    assert!(ClearFilter::Unclaimed.accepts(&data));
    assert!(ClearFilter::Pinned.accepts(&data));
    assert_eq!(ClearFilter::parse("unpinned"), Some(ClearFilter::Unpinned));
    assert_eq!(ClearFilter::parse("everything"), None);
  }
}
