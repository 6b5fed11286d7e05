// ticketry-bot/src/responders/mod.rs

//! Responders: the bot's commands, buttons and modals, each a worker
//! pipeline bound to a trigger id.

pub mod clear;
pub mod common;
pub mod delete;
pub mod priority;
pub mod topic;
pub mod transfer;

use crate::errors::BotError;
use common::{ButtonTrigger, CommandTrigger, Interaction, Invocation, ModalTrigger};
use ticketry::{DuplicatePolicy, Responder, ResponderRegistry, TicketryResult, WorkerContext};

pub type CommandResponders = ResponderRegistry<Invocation<CommandTrigger>, Interaction, BotError>;
pub type ButtonResponders = ResponderRegistry<Invocation<ButtonTrigger>, Interaction, BotError>;
pub type ModalResponders = ResponderRegistry<Invocation<ModalTrigger>, Interaction, BotError>;

pub type CommandResponder = Responder<Invocation<CommandTrigger>, Interaction, BotError>;
pub type ButtonResponder = Responder<Invocation<ButtonTrigger>, Interaction, BotError>;
pub type ModalResponder = Responder<Invocation<ModalTrigger>, Interaction, BotError>;

pub(crate) type CommandCtx = WorkerContext<Interaction, Invocation<CommandTrigger>>;
pub(crate) type ButtonCtx = WorkerContext<Interaction, Invocation<ButtonTrigger>>;
pub(crate) type ModalCtx = WorkerContext<Interaction, Invocation<ModalTrigger>>;

pub struct Responders {
  pub commands: CommandResponders,
  pub buttons: ButtonResponders,
  pub modals: ModalResponders,
}

impl Responders {
  pub fn new(policy: DuplicatePolicy) -> Self {
    Self {
      commands: CommandResponders::new("command", policy),
      buttons: ButtonResponders::new("button", policy),
      modals: ModalResponders::new("modal", policy),
    }
  }

  /// Registers every built-in responder.
  pub fn register(&self) -> TicketryResult<()> {
    delete::register_command(&self.commands)?;
    priority::register_command(&self.commands)?;
    transfer::register_command(&self.commands)?;
    topic::register_command(&self.commands)?;
    clear::register_command(&self.commands)?;
    delete::register_button(&self.buttons)?;
    delete::register_modal(&self.modals)
  }

  pub fn freeze(&self) {
    self.commands.freeze_all();
    self.buttons.freeze_all();
    self.modals.freeze_all();
  }
}
