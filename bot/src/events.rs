// ticketry-bot/src/events.rs

//! The bot's event catalogue.

use crate::errors::BotError;
use crate::models::platform::{Channel, User};
use crate::models::priority::PriorityLevel;
use crate::models::ticket::{ClearFilter, Ticket};
use std::fmt;
use std::sync::Arc;
use ticketry::{DuplicatePolicy, EventBus, TicketryResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventId {
  OnTicketPriorityChange,
  AfterTicketPriorityChanged,
  OnTicketTopicChange,
  AfterTicketTopicChanged,
  OnTicketTransfer,
  AfterTicketTransferred,
  OnTicketDelete,
  AfterTicketDeleted,
  OnTicketsClear,
  AfterTicketsCleared,
}

impl EventId {
  pub const ALL: [EventId; 10] = [
    EventId::OnTicketPriorityChange,
    EventId::AfterTicketPriorityChanged,
    EventId::OnTicketTopicChange,
    EventId::AfterTicketTopicChanged,
    EventId::OnTicketTransfer,
    EventId::AfterTicketTransferred,
    EventId::OnTicketDelete,
    EventId::AfterTicketDeleted,
    EventId::OnTicketsClear,
    EventId::AfterTicketsCleared,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      EventId::OnTicketPriorityChange => "onTicketPriorityChange",
      EventId::AfterTicketPriorityChanged => "afterTicketPriorityChanged",
      EventId::OnTicketTopicChange => "onTicketTopicChange",
      EventId::AfterTicketTopicChanged => "afterTicketTopicChanged",
      EventId::OnTicketTransfer => "onTicketTransfer",
      EventId::AfterTicketTransferred => "afterTicketTransferred",
      EventId::OnTicketDelete => "onTicketDelete",
      EventId::AfterTicketDeleted => "afterTicketDeleted",
      EventId::OnTicketsClear => "onTicketsClear",
      EventId::AfterTicketsCleared => "afterTicketsCleared",
    }
  }
}

impl fmt::Display for EventId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Payload of every event. Listeners match on the variant they care about.
#[derive(Debug, Clone)]
pub enum TicketEvent {
  PriorityChange {
    ticket: Arc<Ticket>,
    user: User,
    channel: Channel,
    old_priority: Arc<PriorityLevel>,
    new_priority: Arc<PriorityLevel>,
    reason: Option<String>,
  },
  TopicChange {
    ticket: Arc<Ticket>,
    user: User,
    channel: Channel,
    old_topic: String,
    new_topic: String,
  },
  Transfer {
    ticket: Arc<Ticket>,
    user: User,
    channel: Channel,
    old_creator: Option<String>,
    new_creator: User,
    reason: Option<String>,
  },
  Delete {
    ticket: Arc<Ticket>,
    user: User,
    channel: Channel,
    reason: Option<String>,
  },
  Clear {
    tickets: Vec<Arc<Ticket>>,
    user: User,
    channel: Channel,
    filter: ClearFilter,
  },
}

pub type TicketEvents = EventBus<EventId, TicketEvent, BotError>;

/// Creates the bus with every `EventId` declared and no listeners.
pub fn ticket_events(policy: DuplicatePolicy) -> TicketryResult<TicketEvents> {
  let events = TicketEvents::new(policy);
  for id in EventId::ALL {
    events.declare(id)?;
  }
  Ok(events)
}
