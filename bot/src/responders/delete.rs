// ticketry-bot/src/responders/delete.rs

//! The `delete` command, the delete button and the delete-with-reason modal.

use crate::actions::contexts::DeleteParams;
use crate::errors::{BotError, Result};
use crate::models::platform::Modal;
use crate::responders::common::{
  command_logs_worker, defer, defer_update, permission_worker, reply_with, show_modal, ticket_guard, update,
  Interaction,
};
use crate::responders::{
  ButtonCtx, ButtonResponder, ButtonResponders, CommandCtx, CommandResponder, CommandResponders, ModalCtx,
  ModalResponder, ModalResponders,
};
use crate::services::builder::{MessageContext, MessageTemplate};
use crate::services::permissions::{PermissionLevel, PermissionScope};
use crate::state::Bot;
use std::sync::Arc;
use ticketry::{Matcher, Source, TicketryResult, Worker, WorkerControl};
use tracing::{event, Level};

/// Sources of delete buttons that ask for a reason first.
const REASON_SOURCES: [&str; 4] = ["ticket-message", "close-message", "reopen-message", "autoclose-message"];

pub fn register_command(commands: &CommandResponders) -> TicketryResult<()> {
  let responder = CommandResponder::new("delete", Matcher::exact("delete"), Interaction::from_command);
  responder.workers().add_all([
    permission_worker(|permissions| &permissions.delete),
    Worker::new("delete", 0, delete_command),
    command_logs_worker("delete"),
  ])?;
  commands.add(responder)?;
  Ok(())
}

pub fn register_button(buttons: &ButtonResponders) -> TicketryResult<()> {
  let responder = ButtonResponder::new(
    "delete-ticket",
    Matcher::pattern("^od:delete-ticket")?,
    Interaction::from_button,
  );
  responder.workers().add(Worker::new("delete-ticket", 0, delete_button))?;
  buttons.add(responder)?;
  Ok(())
}

pub fn register_modal(modals: &ModalResponders) -> TicketryResult<()> {
  let responder = ModalResponder::new(
    "delete-ticket-reason",
    Matcher::pattern("^od:delete-ticket-reason_")?,
    Interaction::from_modal,
  );
  responder.workers().add(Worker::new("delete-ticket-reason", 0, delete_reason_modal))?;
  modals.add(responder)?;
  Ok(())
}

async fn delete_command(ctx: CommandCtx) -> Result<WorkerControl> {
  let bot = &ctx.params.bot;
  let Some((guild, ticket)) = ticket_guard(bot, &ctx.instance).await? else {
    return Ok(WorkerControl::Cancel);
  };
  let interaction = ctx.instance.snapshot();
  let (channel, user) = interaction.actor()?;
  let button = Source::from("button");

  if !bot.config.allow_close_before_message || !bot.config.allow_close_before_admin_message {
    if let Some(analysis) = bot.client.message_analysis(&channel.id).await? {
      let blocked = if !bot.config.allow_close_before_message && analysis.total_messages < 1 {
        Some("errors.descriptions.closeBeforeMessage")
      } else if !bot.config.allow_close_before_admin_message && analysis.admin_messages < 1 {
        Some("errors.descriptions.closeBeforeAdminMessage")
      } else {
        None
      };
      if let Some(description) = blocked {
        let extra = MessageContext::new()
          .with("error", bot.translations.get_translation(description))
          .with("customTitle", bot.translations.get_translation("errors.titles.noPermissions"));
        reply_with(bot, &ctx.instance, MessageTemplate::Error, &button, extra).await?;
        return Ok(WorkerControl::Cancel);
      }
    }
  }

  let reason = interaction.get_string("reason");
  let without_transcript = interaction.get_bool("notranscript").unwrap_or(false);

  if without_transcript && bot.config.admin_only_delete_without_transcript {
    let granted = bot
      .permissions
      .get_permissions(
        &user,
        interaction.member.as_ref(),
        &channel,
        Some(&guild),
        PermissionScope::global_only(),
      )
      .await?;
    if !bot.permissions.has_permissions(PermissionLevel::Support, &granted) {
      let extra = MessageContext::new().with("permissions", "support");
      reply_with(bot, &ctx.instance, MessageTemplate::ErrorNoPermissions, &button, extra).await?;
      return Ok(WorkerControl::Cancel);
    }
  }

  defer(bot, &ctx.instance, false).await?;
  let extra = MessageContext::new().with_opt("reason", reason.clone());
  reply_with(bot, &ctx.instance, MessageTemplate::DeleteMessage, &ctx.source, extra).await?;
  bot
    .actions
    .delete_ticket
    .run(
      ctx.source.clone(),
      DeleteParams {
        bot: bot.clone(),
        guild,
        channel,
        user,
        ticket,
        reason,
        send_message: false,
        without_transcript,
      },
    )
    .await?;
  Ok(WorkerControl::Continue)
}

async fn delete_button(ctx: ButtonCtx) -> Result<WorkerControl> {
  let bot = &ctx.params.bot;
  let trigger = &ctx.params.trigger;
  let original_source = trigger.custom_id.split('_').nth(1).unwrap_or_default();

  if REASON_SOURCES.contains(&original_source) {
    let modal = Modal {
      custom_id: format!("od:delete-ticket-reason_{}_{}", trigger.channel.id, original_source),
      title: "Delete Ticket".to_string(),
      fields: vec!["reason".to_string()],
    };
    show_modal(bot, &ctx.instance, modal).await?;
  } else {
    defer_update(bot, &ctx.instance).await?;
  }
  Ok(WorkerControl::Continue)
}

async fn delete_reason_modal(ctx: ModalCtx) -> Result<WorkerControl> {
  let bot = &ctx.params.bot;
  let interaction = ctx.instance.snapshot();
  let (channel, user) = interaction.actor()?;
  let Some(guild) = interaction.guild.clone() else {
    reply_with(bot, &ctx.instance, MessageTemplate::ErrorNotInGuild, &ctx.source, MessageContext::new()).await?;
    return Ok(WorkerControl::Cancel);
  };

  let mut parts = ctx.params.trigger.custom_id.split('_').skip(1);
  let ticket_id = parts.next().unwrap_or_default();
  let original_source = parts.next().unwrap_or_default().to_string();

  let ticket = if channel.is_dm_based() { None } else { bot.tickets.get(ticket_id) };
  let Some(ticket) = ticket else {
    let button = Source::from("button");
    reply_with(bot, &ctx.instance, MessageTemplate::ErrorTicketUnknown, &button, MessageContext::new()).await?;
    return Ok(WorkerControl::Continue);
  };
  let reason = interaction
    .text_field("reason")
    .map(str::to_string)
    .ok_or_else(|| BotError::Precondition("Missing required text field 'reason'".to_string()))?;

  defer_update(bot, &ctx.instance).await?;

  let params = DeleteParams {
    bot: bot.clone(),
    guild,
    channel,
    user,
    ticket: ticket.clone(),
    reason: Some(reason.clone()),
    send_message: !REASON_SOURCES[1..].contains(&original_source.as_str()),
    without_transcript: false,
  };
  // not awaited: the interaction message is updated while the channel still exists
  spawn_delete(bot.clone(), original_source.clone(), params);

  let other = Source::from("other");
  match original_source.as_str() {
    "ticket-message" => {
      ticket.update(|data| data.for_deletion = true);
      let context = MessageContext::new().with("forDeletion", "true");
      let message = bot.builder.build(MessageTemplate::TicketMessage, other.as_str(), &context);
      update(bot, &ctx.instance, message).await?;
    }
    "close-message" | "reopen-message" | "autoclose-message" => {
      let context = MessageContext::new().with("reason", reason);
      let message = bot.builder.build(MessageTemplate::DeleteMessage, other.as_str(), &context);
      update(bot, &ctx.instance, message).await?;
    }
    _ => {}
  }
  Ok(WorkerControl::Continue)
}

fn spawn_delete(bot: Arc<Bot>, source: String, params: DeleteParams) {
  tokio::spawn(async move {
    if let Err(e) = bot.actions.delete_ticket.run(source, params).await {
      event!(Level::ERROR, error = %e, kind = e.kind(), "Background ticket deletion failed.");
    }
  });
}
