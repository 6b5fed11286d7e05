// ticketry-bot/src/responders/common.rs

//! Trigger payloads, the per-interaction instance and helpers shared by every responder.

use crate::config::{CommandPermissions, PermissionMode};
use crate::errors::{BotError, Result};
use crate::models::platform::{Channel, Guild, Member, Message, Modal, User};
use crate::models::ticket::Ticket;
use crate::services::builder::{MessageContext, MessageTemplate};
use crate::services::client::InteractionResponse;
use crate::services::permissions::{PermissionLevel, PermissionScope};
use crate::state::Bot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use ticketry::{Instance, Source, Trigger, Worker, WorkerContext, WorkerControl};
use tracing::{event, Level};

/// A trigger paired with the bot that received it; the params of every responder.
pub struct Invocation<T> {
  pub bot: Arc<Bot>,
  pub trigger: T,
  /// Shared with the run's `Interaction`; outlives a failed run.
  pub response: Arc<ResponseState>,
}

/// Whether an interaction has been answered. A deferral is not an answer:
/// the next reply completes it.
#[derive(Debug, Default)]
pub struct ResponseState {
  replied: AtomicBool,
}

impl ResponseState {
  /// A reply, update or modal was sent; later messages must be follow-ups.
  pub fn is_replied(&self) -> bool {
    self.replied.load(Ordering::SeqCst)
  }

  fn mark_replied(&self) {
    self.replied.store(true, Ordering::SeqCst);
  }
}

impl<T: Trigger> Trigger for Invocation<T> {
  fn trigger_id(&self) -> &str {
    self.trigger.trigger_id()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommandVia {
  #[default]
  Slash,
  Text,
}

impl CommandVia {
  pub fn source(&self) -> Source {
    match self {
      CommandVia::Slash => Source::from("slash"),
      CommandVia::Text => Source::from("text"),
    }
  }
}

/// A command option value. Users arrive as objects, everything else as scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
  Bool(bool),
  Int(i64),
  User(User),
  Str(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandTrigger {
  pub interaction_id: String,
  /// Command name without prefix or subcommand (`priority`).
  pub name: String,
  #[serde(default)]
  pub subcommand: Option<String>,
  #[serde(default)]
  pub options: HashMap<String, OptionValue>,
  #[serde(default)]
  pub via: CommandVia,
  #[serde(default)]
  pub guild: Option<Guild>,
  pub channel: Channel,
  pub user: User,
  #[serde(default)]
  pub member: Option<Member>,
}

impl Trigger for CommandTrigger {
  fn trigger_id(&self) -> &str {
    &self.name
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonTrigger {
  pub interaction_id: String,
  pub custom_id: String,
  #[serde(default)]
  pub guild: Option<Guild>,
  pub channel: Channel,
  pub user: User,
  #[serde(default)]
  pub member: Option<Member>,
}

impl Trigger for ButtonTrigger {
  fn trigger_id(&self) -> &str {
    &self.custom_id
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalTrigger {
  pub interaction_id: String,
  pub custom_id: String,
  #[serde(default)]
  pub guild: Option<Guild>,
  pub channel: Channel,
  pub user: User,
  #[serde(default)]
  pub member: Option<Member>,
  /// Submitted text fields by field id.
  #[serde(default)]
  pub fields: HashMap<String, String>,
}

impl Trigger for ModalTrigger {
  fn trigger_id(&self) -> &str {
    &self.custom_id
  }
}

/// Per-run state of a responder: who asked, where, and how far the
/// interaction has been answered.
#[derive(Debug, Clone, Default)]
pub struct Interaction {
  pub id: String,
  pub custom_id: Option<String>,
  pub guild: Option<Guild>,
  pub channel: Option<Channel>,
  pub user: Option<User>,
  pub member: Option<Member>,
  pub subcommand: Option<String>,
  pub options: HashMap<String, OptionValue>,
  pub values: HashMap<String, String>,
  pub response: Arc<ResponseState>,
}

impl Interaction {
  pub fn from_command(invocation: &Invocation<CommandTrigger>) -> Self {
    let trigger = &invocation.trigger;
    Self {
      id: trigger.interaction_id.clone(),
      guild: trigger.guild.clone(),
      channel: Some(trigger.channel.clone()),
      user: Some(trigger.user.clone()),
      member: trigger.member.clone(),
      subcommand: trigger.subcommand.clone(),
      options: trigger.options.clone(),
      response: invocation.response.clone(),
      ..Self::default()
    }
  }

  pub fn from_button(invocation: &Invocation<ButtonTrigger>) -> Self {
    let trigger = &invocation.trigger;
    Self {
      id: trigger.interaction_id.clone(),
      custom_id: Some(trigger.custom_id.clone()),
      guild: trigger.guild.clone(),
      channel: Some(trigger.channel.clone()),
      user: Some(trigger.user.clone()),
      member: trigger.member.clone(),
      response: invocation.response.clone(),
      ..Self::default()
    }
  }

  pub fn from_modal(invocation: &Invocation<ModalTrigger>) -> Self {
    let trigger = &invocation.trigger;
    Self {
      id: trigger.interaction_id.clone(),
      custom_id: Some(trigger.custom_id.clone()),
      guild: trigger.guild.clone(),
      channel: Some(trigger.channel.clone()),
      user: Some(trigger.user.clone()),
      member: trigger.member.clone(),
      values: trigger.fields.clone(),
      response: invocation.response.clone(),
      ..Self::default()
    }
  }

  pub fn get_string(&self, name: &str) -> Option<String> {
    match self.options.get(name) {
      Some(OptionValue::Str(value)) => Some(value.clone()),
      _ => None,
    }
  }

  pub fn get_bool(&self, name: &str) -> Option<bool> {
    match self.options.get(name) {
      Some(OptionValue::Bool(value)) => Some(*value),
      _ => None,
    }
  }

  pub fn get_user(&self, name: &str) -> Option<User> {
    match self.options.get(name) {
      Some(OptionValue::User(user)) => Some(user.clone()),
      _ => None,
    }
  }

  /// A required string option; a missing one is a malformed trigger.
  pub fn require_string(&self, name: &str) -> Result<String> {
    self
      .get_string(name)
      .ok_or_else(|| BotError::Precondition(format!("Missing required option '{}'", name)))
  }

  pub fn text_field(&self, field: &str) -> Option<&str> {
    self.values.get(field).map(String::as_str)
  }

  /// Channel and user are always present for triggers built by the factories.
  pub fn actor(&self) -> Result<(Channel, User)> {
    match (&self.channel, &self.user) {
      (Some(channel), Some(user)) => Ok((channel.clone(), user.clone())),
      _ => Err(BotError::Precondition("Interaction without channel or user".to_string())),
    }
  }
}

/// The guild, channel and user of a responder run, for templates.
pub fn interaction_context(interaction: &Interaction) -> MessageContext {
  MessageContext::new()
    .with_opt("user", interaction.user.as_ref().map(User::mention))
    .with_opt("channel", interaction.channel.as_ref().map(|c| format!("#{}", c.name)))
}

async fn respond(bot: &Bot, instance: &Instance<Interaction>, response: InteractionResponse) -> Result<()> {
  let interaction_id = instance.read().id.clone();
  bot.client.respond(&interaction_id, response).await
}

pub async fn reply(bot: &Bot, instance: &Instance<Interaction>, message: Message) -> Result<()> {
  respond(bot, instance, InteractionResponse::Reply(message)).await?;
  instance.read().response.mark_replied();
  Ok(())
}

/// Builds `template` with the interaction's context plus `extra`, then replies.
pub async fn reply_with(
  bot: &Bot,
  instance: &Instance<Interaction>,
  template: MessageTemplate,
  source: &Source,
  extra: MessageContext,
) -> Result<()> {
  let context = interaction_context(&instance.read()).extend(extra);
  let message = bot.builder.build(template, source.as_str(), &context);
  reply(bot, instance, message).await
}

pub async fn defer(bot: &Bot, instance: &Instance<Interaction>, ephemeral: bool) -> Result<()> {
  respond(bot, instance, InteractionResponse::Defer { ephemeral }).await
}

pub async fn defer_update(bot: &Bot, instance: &Instance<Interaction>) -> Result<()> {
  respond(bot, instance, InteractionResponse::DeferUpdate).await
}

pub async fn update(bot: &Bot, instance: &Instance<Interaction>, message: Message) -> Result<()> {
  respond(bot, instance, InteractionResponse::Update(message)).await?;
  instance.read().response.mark_replied();
  Ok(())
}

pub async fn show_modal(bot: &Bot, instance: &Instance<Interaction>, modal: Modal) -> Result<()> {
  respond(bot, instance, InteractionResponse::ShowModal(modal)).await?;
  instance.read().response.mark_replied();
  Ok(())
}

/// The ticket of the interaction's channel, after the shared guard checks.
///
/// Replies with the matching error template and returns `None` when the
/// interaction is outside a server, the channel is not a ticket, or the
/// ticket is busy.
pub async fn ticket_guard(bot: &Bot, instance: &Instance<Interaction>) -> Result<Option<(Guild, Arc<Ticket>)>> {
  let (guild, channel) = {
    let interaction = instance.read();
    (interaction.guild.clone(), interaction.channel.clone())
  };
  let button = Source::from("button");
  let Some(guild) = guild else {
    reply_with(bot, instance, MessageTemplate::ErrorNotInGuild, &button, MessageContext::new()).await?;
    return Ok(None);
  };
  let ticket = channel
    .filter(|channel| !channel.is_dm_based())
    .and_then(|channel| bot.tickets.get(&channel.id));
  let Some(ticket) = ticket else {
    reply_with(bot, instance, MessageTemplate::ErrorTicketUnknown, &button, MessageContext::new()).await?;
    return Ok(None);
  };
  if ticket.is_busy() {
    reply_with(bot, instance, MessageTemplate::ErrorTicketBusy, &button, MessageContext::new()).await?;
    return Ok(None);
  }
  Ok(Some((guild, ticket)))
}

/// Permission stage (priority 1) of a command responder. `mode` picks the
/// command's entry from the configured permissions.
pub fn permission_worker<T>(mode: fn(&CommandPermissions) -> &PermissionMode) -> Worker<Interaction, Invocation<T>, BotError>
where
  T: Send + Sync + 'static,
{
  Worker::new("permissions", 1, move |ctx: WorkerContext<Interaction, Invocation<T>>| async move {
    let bot = &ctx.params.bot;
    let mode = mode(&bot.config.permissions).clone();
    check_permission(bot, &ctx.instance, &ctx.source, &mode).await
  })
}

async fn check_permission(
  bot: &Bot,
  instance: &Instance<Interaction>,
  source: &Source,
  mode: &PermissionMode,
) -> Result<WorkerControl> {
  match mode {
    PermissionMode::None => {
      reply_with(bot, instance, MessageTemplate::ErrorNoPermissions, &Source::from("button"), MessageContext::new()).await?;
      Ok(WorkerControl::Cancel)
    }
    PermissionMode::Everyone => Ok(WorkerControl::Continue),
    PermissionMode::Admin => {
      let interaction = instance.snapshot();
      let (channel, user) = interaction.actor()?;
      let granted = bot
        .permissions
        .get_permissions(
          &user,
          interaction.member.as_ref(),
          &channel,
          interaction.guild.as_ref(),
          PermissionScope::default(),
        )
        .await?;
      if bot.permissions.has_permissions(PermissionLevel::Support, &granted) {
        return Ok(WorkerControl::Continue);
      }
      let extra = MessageContext::new().with("permissions", "support");
      reply_with(bot, instance, MessageTemplate::ErrorNoPermissions, source, extra).await?;
      Ok(WorkerControl::Cancel)
    }
    PermissionMode::Role(role_id) => {
      let (guild, member) = {
        let interaction = instance.read();
        (interaction.guild.clone(), interaction.member.clone())
      };
      let (Some(guild), Some(member)) = (guild, member) else {
        let extra = MessageContext::new().with("error", "Permission Error: Not in Server #1");
        reply_with(bot, instance, MessageTemplate::Error, source, extra).await?;
        return Ok(WorkerControl::Cancel);
      };
      let Some(members) = bot.client.role_members(&guild.id, role_id).await? else {
        let extra = MessageContext::new().with("error", "Permission Error: Not in Server #2");
        reply_with(bot, instance, MessageTemplate::Error, source, extra).await?;
        return Ok(WorkerControl::Cancel);
      };
      if members.contains(&member.user_id) {
        return Ok(WorkerControl::Continue);
      }
      reply_with(bot, instance, MessageTemplate::ErrorNoPermissions, source, MessageContext::new()).await?;
      Ok(WorkerControl::Cancel)
    }
  }
}

/// Logs stage (priority -1) of a command responder.
pub fn command_logs_worker(command: &'static str) -> Worker<Interaction, Invocation<CommandTrigger>, BotError> {
  Worker::new(
    "logs",
    -1,
    move |ctx: WorkerContext<Interaction, Invocation<CommandTrigger>>| async move {
      let trigger = &ctx.params.trigger;
      let command = match &trigger.subcommand {
        Some(sub) => format!("{} {}", command, sub),
        None => command.to_string(),
      };
      event!(
        Level::INFO,
        user = %trigger.user.username,
        method = %ctx.source,
        "{} used the '{}' command!",
        trigger.user.name(),
        command
      );
      event!(Level::DEBUG, userid = %trigger.user.id, channelid = %trigger.channel.id, "Command ids.");
      Ok::<_, BotError>(WorkerControl::Continue)
    },
  )
}
