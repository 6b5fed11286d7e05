// ticketry-bot/src/actions/mod.rs

//! The bot's domain actions, held in a typed map so every action keeps its
//! own params and instance types.

pub mod clear_tickets;
pub mod common;
pub mod contexts;
pub mod delete_ticket;
pub mod transfer_ticket;
pub mod update_priority;
pub mod update_topic;

use clear_tickets::ClearAction;
use delete_ticket::DeleteAction;
use ticketry::TicketryResult;
use transfer_ticket::TransferAction;
use update_priority::UpdatePriorityAction;
use update_topic::UpdateTopicAction;

pub struct Actions {
  pub update_ticket_priority: UpdatePriorityAction,
  pub update_ticket_topic: UpdateTopicAction,
  pub transfer_ticket: TransferAction,
  pub delete_ticket: DeleteAction,
  pub clear_tickets: ClearAction,
}

impl Actions {
  /// Empty actions with their ids and no workers.
  pub fn new() -> Self {
    Self {
      update_ticket_priority: UpdatePriorityAction::new("update-ticket-priority"),
      update_ticket_topic: UpdateTopicAction::new("update-ticket-topic"),
      transfer_ticket: TransferAction::new("transfer-ticket"),
      delete_ticket: DeleteAction::new("delete-ticket"),
      clear_tickets: ClearAction::new("clear-tickets"),
    }
  }

  /// Adds the built-in workers (and backups) to every action.
  pub fn register(&self) -> TicketryResult<()> {
    update_priority::register(&self.update_ticket_priority)?;
    update_topic::register(&self.update_ticket_topic)?;
    transfer_ticket::register(&self.transfer_ticket)?;
    delete_ticket::register(&self.delete_ticket)?;
    clear_tickets::register(&self.clear_tickets)
  }

  pub fn freeze(&self) {
    self.update_ticket_priority.freeze();
    self.update_ticket_topic.freeze();
    self.transfer_ticket.freeze();
    self.delete_ticket.freeze();
    self.clear_tickets.freeze();
  }

  pub fn ids(&self) -> [&str; 5] {
    [
      self.update_ticket_priority.id(),
      self.update_ticket_topic.id(),
      self.transfer_ticket.id(),
      self.delete_ticket.id(),
      self.clear_tickets.id(),
    ]
  }
}

impl Default for Actions {
  fn default() -> Self {
    Self::new()
  }
}
