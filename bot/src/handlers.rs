// ticketry-bot/src/handlers.rs

//! Entry points for incoming platform triggers.

use crate::errors::Result;
use crate::models::platform::{Channel, Guild, Member, User};
use crate::responders::common::{
  ButtonTrigger, CommandTrigger, CommandVia, Interaction, Invocation, ModalTrigger, OptionValue, ResponseState,
};
use crate::services::builder::{MessageContext, MessageTemplate};
use crate::services::client::InteractionResponse;
use crate::state::Bot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use ticketry::{ActionRun, Source};
use tokio::task::JoinHandle;
use tracing::{event, Level};

/// One trigger as delivered by the platform adapter (one JSON object per line on stdin).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IncomingTrigger {
  Command(CommandTrigger),
  /// A prefixed chat message, parsed into a command when it starts with the prefix.
  Text(TextMessage),
  Button(ButtonTrigger),
  Modal(ModalTrigger),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMessage {
  pub message_id: String,
  pub content: String,
  #[serde(default)]
  pub guild: Option<Guild>,
  pub channel: Channel,
  pub user: User,
  #[serde(default)]
  pub member: Option<Member>,
}

pub type HandlerResult = Result<Option<ActionRun<Interaction>>>;

impl Bot {
  pub async fn handle(self: &Arc<Self>, incoming: IncomingTrigger) -> HandlerResult {
    match incoming {
      IncomingTrigger::Command(trigger) => self.handle_command(trigger).await,
      IncomingTrigger::Text(message) => match parse_text_command(&self.config.prefix, message) {
        Some(trigger) => self.handle_command(trigger).await,
        None => Ok(None),
      },
      IncomingTrigger::Button(trigger) => self.handle_button(trigger).await,
      IncomingTrigger::Modal(trigger) => self.handle_modal(trigger).await,
    }
  }

  /// Handles `incoming` on its own task so a slow run (a paced clear, a
  /// stalled rename) never holds up the triggers behind it.
  pub fn spawn_handle(self: &Arc<Self>, incoming: IncomingTrigger) -> JoinHandle<()> {
    let bot = self.clone();
    tokio::spawn(async move {
      match bot.handle(incoming).await {
        Ok(Some(run)) => event!(Level::DEBUG, outcome = ?run.outcome, "Trigger handled."),
        Ok(None) => event!(Level::DEBUG, "No responder matched the trigger."),
        // already logged and answered by `report`
        Err(_) => {}
      }
    })
  }

  pub async fn handle_command(self: &Arc<Self>, trigger: CommandTrigger) -> HandlerResult {
    let interaction_id = trigger.interaction_id.clone();
    let source = trigger.via.source();
    let invocation = self.invoke(trigger);
    let response = invocation.response.clone();
    let result = self.responders.commands.dispatch(source.clone(), invocation).await;
    self.report(result, &interaction_id, &response, &source).await
  }

  pub async fn handle_button(self: &Arc<Self>, trigger: ButtonTrigger) -> HandlerResult {
    let interaction_id = trigger.interaction_id.clone();
    let source = Source::from("button");
    let invocation = self.invoke(trigger);
    let response = invocation.response.clone();
    let result = self.responders.buttons.dispatch(source.clone(), invocation).await;
    self.report(result, &interaction_id, &response, &source).await
  }

  pub async fn handle_modal(self: &Arc<Self>, trigger: ModalTrigger) -> HandlerResult {
    let interaction_id = trigger.interaction_id.clone();
    let source = Source::from("modal");
    let invocation = self.invoke(trigger);
    let response = invocation.response.clone();
    let result = self.responders.modals.dispatch(source.clone(), invocation).await;
    self.report(result, &interaction_id, &response, &source).await
  }

  fn invoke<T>(self: &Arc<Self>, trigger: T) -> Invocation<T> {
    Invocation {
      bot: self.clone(),
      trigger,
      response: Arc::new(ResponseState::default()),
    }
  }

  /// Failed runs are answered with a generic error message, then handed back.
  /// An interaction that already got its reply receives it as a follow-up.
  async fn report(
    &self,
    result: HandlerResult,
    interaction_id: &str,
    response: &ResponseState,
    source: &Source,
  ) -> HandlerResult {
    let error = match result {
      Err(error) => error,
      ok => return ok,
    };
    if error.is_recoverable() {
      event!(Level::WARN, interaction = %interaction_id, kind = error.kind(), error = %error, "Responder failed.");
    } else {
      event!(Level::ERROR, interaction = %interaction_id, kind = error.kind(), error = %error, "Responder failed.");
    }
    let context = MessageContext::new().with("error", error.to_string());
    let message = self.builder.build(MessageTemplate::Error, source.as_str(), &context);
    let reply = if response.is_replied() {
      InteractionResponse::FollowUp(message)
    } else {
      InteractionResponse::Reply(message)
    };
    if let Err(reply_error) = self.client.respond(interaction_id, reply).await {
      event!(Level::WARN, error = %reply_error, "Failed to send the error reply.");
    }
    Err(error)
  }
}

/// Turns `<prefix> <command> [args...]` into a command trigger. Positional
/// arguments map onto the options the slash variant of each command takes.
pub fn parse_text_command(prefix: &str, message: TextMessage) -> Option<CommandTrigger> {
  let rest = message.content.strip_prefix(prefix)?;
  if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
    return None;
  }
  let mut words = rest.split_whitespace();
  let name = words.next()?.to_string();
  let args: Vec<&str> = words.collect();
  let joined = |from: usize| {
    let text = args.get(from..).map(|rest| rest.join(" ")).unwrap_or_default();
    (!text.is_empty()).then_some(text)
  };

  let mut subcommand = None;
  let mut options = HashMap::new();
  let mut set = |key: &str, value: Option<String>| {
    if let Some(value) = value {
      options.insert(key.to_string(), OptionValue::Str(value));
    }
  };
  match name.as_str() {
    "priority" => {
      subcommand = args.first().map(|s| s.to_string());
      if subcommand.as_deref() == Some("set") {
        set("priority", args.get(1).map(|s| s.to_string()));
        set("reason", joined(2));
      }
    }
    "delete" => set("reason", joined(0)),
    "topic" => set("topic", joined(0)),
    "clear" => set("filter", args.first().map(|s| s.to_string())),
    "transfer" => {
      set("reason", joined(1));
      if let Some(target) = args.first() {
        let id = target.trim_start_matches("<@").trim_start_matches('!').trim_end_matches('>');
        options.insert("user".to_string(), OptionValue::User(User::new(id, id)));
      }
    }
    _ => {}
  }

  Some(CommandTrigger {
    interaction_id: message.message_id,
    name,
    subcommand,
    options,
    via: CommandVia::Text,
    guild: message.guild,
    channel: message.channel,
    user: message.user,
    member: message.member,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn text(content: &str) -> TextMessage {
    TextMessage {
      message_id: "m1".to_string(),
      content: content.to_string(),
      guild: None,
      channel: Channel::text("c1", "ticket-alice"),
      user: User::new("u1", "alice"),
      member: None,
    }
  }

  #[test]
  fn parses_priority_set_with_reason() {
    let trigger = parse_text_command("!ticket", text("!ticket priority set urgent server is down")).unwrap();
    assert_eq!(trigger.name, "priority");
    assert_eq!(trigger.subcommand.as_deref(), Some("set"));
    assert_eq!(trigger.via, CommandVia::Text);
    assert_eq!(trigger.options.get("priority"), Some(&OptionValue::Str("urgent".to_string())));
    assert_eq!(
      trigger.options.get("reason"),
      Some(&OptionValue::Str("server is down".to_string()))
    );
  }

  #[test]
  fn parses_transfer_mention() {
    let trigger = parse_text_command("!ticket", text("!ticket transfer <@42>")).unwrap();
    match trigger.options.get("user") {
      Some(OptionValue::User(user)) => assert_eq!(user.id, "42"),
      other => panic!("unexpected user option: {:?}", other),
    }
    assert!(!trigger.options.contains_key("reason"));
  }

  #[test]
  fn ignores_other_messages() {
    assert!(parse_text_command("!ticket", text("hello there")).is_none());
    assert!(parse_text_command("!ticket", text("!tickets delete")).is_none());
    assert!(parse_text_command("!ticket", text("!ticket")).is_none());
  }
}
