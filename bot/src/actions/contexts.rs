// ticketry-bot/src/actions/contexts.rs

//! Params and per-run instance types of the domain actions.
//! Workers receive these through `ticketry::WorkerContext`.

use crate::models::platform::{Channel, Guild, User};
use crate::models::priority::PriorityLevel;
use crate::models::ticket::{ClearFilter, Ticket};
use crate::state::Bot;
use std::sync::Arc;

/// Params of actions that operate on a single ticket.
pub trait TicketParams: Send + Sync + 'static {
  fn bot(&self) -> &Arc<Bot>;
  fn ticket(&self) -> &Arc<Ticket>;
}

macro_rules! impl_ticket_params {
  ($($params:ty),+) => {
    $(impl TicketParams for $params {
      fn bot(&self) -> &Arc<Bot> {
        &self.bot
      }

      fn ticket(&self) -> &Arc<Ticket> {
        &self.ticket
      }
    })+
  };
}

// --- Params (supplied by the caller of `Action::run`) ---

pub struct UpdatePriorityParams {
  pub bot: Arc<Bot>,
  pub guild: Guild,
  pub channel: Channel,
  pub user: User,
  pub ticket: Arc<Ticket>,
  pub new_priority: Arc<PriorityLevel>,
  pub reason: Option<String>,
  pub send_message: bool,
}

pub struct UpdateTopicParams {
  pub bot: Arc<Bot>,
  pub guild: Guild,
  pub channel: Channel,
  pub user: User,
  pub ticket: Arc<Ticket>,
  /// `None` only refreshes the topic line from the current ticket state.
  pub new_topic: Option<String>,
  pub send_message: bool,
}

pub struct TransferParams {
  pub bot: Arc<Bot>,
  pub guild: Guild,
  pub channel: Channel,
  pub user: User,
  pub ticket: Arc<Ticket>,
  pub new_creator: User,
  pub reason: Option<String>,
  pub send_message: bool,
}

pub struct DeleteParams {
  pub bot: Arc<Bot>,
  pub guild: Guild,
  pub channel: Channel,
  pub user: User,
  pub ticket: Arc<Ticket>,
  pub reason: Option<String>,
  pub send_message: bool,
  pub without_transcript: bool,
}

pub struct ClearParams {
  pub bot: Arc<Bot>,
  pub guild: Guild,
  /// Channel the clear was requested from.
  pub channel: Channel,
  pub user: User,
  pub filter: ClearFilter,
  pub list: Vec<Arc<Ticket>>,
}

impl_ticket_params!(UpdatePriorityParams, UpdateTopicParams, TransferParams, DeleteParams);

// --- Instances (fresh per run) ---

/// Instance of an action that marks its ticket busy.
pub trait BusyInstance: Send + Sync + 'static {
  /// True when this run found the ticket held by another run.
  fn refused_busy(&self) -> bool;
  fn set_refused_busy(&mut self);
}

macro_rules! impl_busy_instance {
  ($($instance:ty),+) => {
    $(impl BusyInstance for $instance {
      fn refused_busy(&self) -> bool {
        self.refused_busy
      }

      fn set_refused_busy(&mut self) {
        self.refused_busy = true;
      }
    })+
  };
}

#[derive(Debug, Default)]
pub struct PriorityInstance {
  pub old_priority: Option<Arc<PriorityLevel>>,
  /// `Some(false)` when the rename fell back to the error message.
  pub renamed: Option<bool>,
  pub refused_busy: bool,
}

#[derive(Debug, Default)]
pub struct TopicInstance {
  pub old_topic: Option<String>,
  /// The composed channel topic line.
  pub channel_topic: Option<String>,
  pub refused_busy: bool,
}

#[derive(Debug, Default)]
pub struct TransferInstance {
  pub old_creator: Option<String>,
  pub renamed: Option<bool>,
  pub refused_busy: bool,
}

#[derive(Debug, Default)]
pub struct DeleteInstance {
  pub deleted: bool,
  pub refused_busy: bool,
}

impl_busy_instance!(PriorityInstance, TopicInstance, TransferInstance, DeleteInstance);

#[derive(Debug, Default)]
pub struct ClearInstance {
  /// `#name` of every deleted ticket channel, in deletion order.
  pub list: Vec<String>,
}
