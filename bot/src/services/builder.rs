// ticketry-bot/src/services/builder.rs

//! Message template rendering.

use crate::models::platform::Message;
use std::collections::BTreeMap;
use std::fmt;

/// Every message the bot knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageTemplate {
  Error,
  ErrorNoPermissions,
  ErrorNotInGuild,
  ErrorTicketUnknown,
  ErrorTicketBusy,
  ErrorChannelRename,
  DeleteMessage,
  DeleteLogs,
  PrioritySet,
  PriorityGet,
  PriorityLogs,
  TopicSet,
  TopicLogs,
  TransferMessage,
  TransferLogs,
  ClearMessage,
  ClearLogs,
  TicketMessage,
}

impl MessageTemplate {
  pub fn id(&self) -> &'static str {
    match self {
      MessageTemplate::Error => "error",
      MessageTemplate::ErrorNoPermissions => "error-no-permissions",
      MessageTemplate::ErrorNotInGuild => "error-not-in-guild",
      MessageTemplate::ErrorTicketUnknown => "error-ticket-unknown",
      MessageTemplate::ErrorTicketBusy => "error-ticket-busy",
      MessageTemplate::ErrorChannelRename => "error-channel-rename",
      MessageTemplate::DeleteMessage => "delete-message",
      MessageTemplate::DeleteLogs => "delete-logs",
      MessageTemplate::PrioritySet => "priority-set",
      MessageTemplate::PriorityGet => "priority-get",
      MessageTemplate::PriorityLogs => "priority-logs",
      MessageTemplate::TopicSet => "topic-set",
      MessageTemplate::TopicLogs => "topic-logs",
      MessageTemplate::TransferMessage => "transfer-message",
      MessageTemplate::TransferLogs => "transfer-logs",
      MessageTemplate::ClearMessage => "clear-message",
      MessageTemplate::ClearLogs => "clear-logs",
      MessageTemplate::TicketMessage => "ticket-message",
    }
  }

  pub fn is_error(&self) -> bool {
    self.id().starts_with("error")
  }

  fn title(&self) -> &'static str {
    match self {
      MessageTemplate::Error => "Something went wrong",
      MessageTemplate::ErrorNoPermissions => "No Permissions",
      MessageTemplate::ErrorNotInGuild => "Not in a server",
      MessageTemplate::ErrorTicketUnknown => "Unknown ticket",
      MessageTemplate::ErrorTicketBusy => "Ticket busy",
      MessageTemplate::ErrorChannelRename => "Failed to rename channel",
      MessageTemplate::DeleteMessage | MessageTemplate::DeleteLogs => "Ticket deleted",
      MessageTemplate::PrioritySet | MessageTemplate::PriorityLogs => "Priority changed",
      MessageTemplate::PriorityGet => "Ticket priority",
      MessageTemplate::TopicSet | MessageTemplate::TopicLogs => "Topic changed",
      MessageTemplate::TransferMessage | MessageTemplate::TransferLogs => "Ticket transferred",
      MessageTemplate::ClearMessage | MessageTemplate::ClearLogs => "Tickets cleared",
      MessageTemplate::TicketMessage => "Ticket",
    }
  }
}

impl fmt::Display for MessageTemplate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.id())
  }
}

/// Named values available to a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageContext {
  fields: BTreeMap<&'static str, String>,
}

impl MessageContext {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
    self.fields.insert(key, value.into());
    self
  }

  /// Adds the field only when `value` is present.
  pub fn with_opt(self, key: &'static str, value: Option<impl Into<String>>) -> Self {
    match value {
      Some(value) => self.with(key, value),
      None => self,
    }
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.fields.get(key).map(String::as_str)
  }

  /// Adds every field of `other`, overriding fields with the same key.
  pub fn extend(mut self, other: MessageContext) -> Self {
    self.fields.extend(other.fields);
    self
  }
}

pub trait MessageBuilder: Send + Sync {
  /// Renders `template` for a run triggered from `source`.
  fn build(&self, template: MessageTemplate, source: &str, context: &MessageContext) -> Message;
}

/// Renders `**Title**` followed by one `key: value` line per field.
/// Error templates are ephemeral.
#[derive(Debug, Default)]
pub struct PlainBuilder;

impl MessageBuilder for PlainBuilder {
  fn build(&self, template: MessageTemplate, source: &str, context: &MessageContext) -> Message {
    let title = context.get("customTitle").unwrap_or(template.title());
    let mut lines = vec![format!("**{}**", title)];
    lines.extend(
      context
        .fields
        .iter()
        .filter(|(key, _)| **key != "customTitle")
        .map(|(key, value)| format!("{}: {}", key, value)),
    );
    lines.push(format!("-# {} via {}", template.id(), source));
    Message {
      content: lines.join("\n"),
      ephemeral: template.is_error(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plain_builder_renders_fields_in_key_order() {
    let context = MessageContext::new()
      .with("reason", "spam")
      .with("channel", "#ticket-1")
      .with_opt("user", None::<String>);
    let message = PlainBuilder.build(MessageTemplate::DeleteMessage, "slash", &context);
    assert_eq!(
      message.content,
      "**Ticket deleted**\nchannel: #ticket-1\nreason: spam\n-# delete-message via slash"
    );
    assert!(!message.ephemeral);
  }

  #[test]
  fn error_templates_are_ephemeral_and_accept_custom_titles() {
    let context = MessageContext::new().with("customTitle", "Unknown Priority Level");
    let message = PlainBuilder.build(MessageTemplate::Error, "button", &context);
    assert!(message.ephemeral);
    assert!(message.content.starts_with("**Unknown Priority Level**"));
  }
}
