// ticketry-bot/src/actions/common.rs

//! Stages and helpers shared by several domain actions.

use crate::actions::contexts::{BusyInstance, TicketParams};
use crate::errors::{BotError, Result};
use crate::models::platform::{trim_emojis, Channel, User};
use crate::models::ticket::{BusyGuard, TicketData};
use crate::services::builder::{MessageContext, MessageTemplate};
use crate::state::Bot;
use ticketry::{timed_await, Source, Worker, WorkerContext, WorkerControl};
use tracing::{event, Level};

/// Marks the run's ticket busy until the guard drops.
///
/// Fails with `Precondition` when another run holds the ticket, and records
/// the refusal so the backup worker leaves that run's flag alone.
pub fn acquire_busy<I, P>(ctx: &WorkerContext<I, P>) -> Result<BusyGuard<'_>>
where
  I: BusyInstance,
  P: TicketParams,
{
  let ticket = ctx.params.ticket();
  ticket.busy().try_hold().map_err(|e| {
    event!(Level::WARN, ticket = %ticket.id(), "Ticket is busy with another run.");
    ctx.instance.write().set_refused_busy();
    e
  })
}

/// Backup worker of every ticket action: clears the busy flag a failed run left behind.
pub fn cancel_busy_worker<I, P>() -> Worker<I, P, BotError>
where
  I: BusyInstance,
  P: TicketParams,
{
  Worker::new("cancel-busy", 0, |ctx: WorkerContext<I, P>| async move {
    let ticket = ctx.params.ticket();
    if ctx.instance.read().refused_busy() {
      return Ok(WorkerControl::Continue);
    }
    ticket.busy().release();
    event!(Level::DEBUG, ticket = %ticket.id(), "Busy flag released by backup worker.");
    Ok::<_, BotError>(WorkerControl::Continue)
  })
}

/// `pin emoji + priority emoji + base`, with emojis already in `base` removed.
pub fn ticket_channel_name(bot: &Bot, ticket: &TicketData, base: &str) -> String {
  let pin = if ticket.pinned { bot.config.pin_emoji.as_str() } else { "" };
  let level = bot.priorities.from_level(ticket.priority);
  let priority_emoji = level.channel_emoji.as_deref().unwrap_or("");
  format!("{}{}{}", pin, priority_emoji, trim_emojis(base))
}

/// Renames a ticket channel within the configured deadline.
///
/// Returns `false` when the rename failed or timed out; an
/// `error-channel-rename` message is posted in the channel instead and the
/// rename itself may still complete later.
pub async fn rename_ticket_channel(
  bot: &Bot,
  channel: &Channel,
  user: &User,
  new_name: &str,
  template_source: &'static str,
) -> Result<bool> {
  let client = bot.client.clone();
  let channel_id = channel.id.clone();
  let name = new_name.to_string();
  let outcome = timed_await("rename-channel", bot.config.rename_timeout, async move {
    client.rename_channel(&channel_id, &name).await
  })
  .await;

  let failure = match outcome {
    Ok(Ok(())) => return Ok(true),
    Ok(Err(e)) => e.to_string(),
    Err(e) => e.to_string(),
  };
  event!(
    Level::ERROR,
    channel = %channel.id,
    error = %failure,
    "Failed to rename channel on {}",
    template_source
  );

  let context = MessageContext::new()
    .with("user", user.name())
    .with("originalName", channel.name.clone())
    .with("newName", new_name);
  let message = bot.builder.build(MessageTemplate::ErrorChannelRename, template_source, &context);
  bot.client.send_message(&channel.id, message).await?;
  Ok(false)
}

/// Posts to the log channel when channel logging is configured. Failures are
/// logged and swallowed; a missing log message never fails an action.
pub async fn post_to_log_channel(bot: &Bot, template: MessageTemplate, source: &Source, context: MessageContext) {
  let Some(log_channel) = bot.config.log_channel() else {
    return;
  };
  let message = bot.builder.build(template, source.as_str(), &context);
  if let Err(e) = bot.client.send_message(log_channel, message).await {
    event!(Level::WARN, template = %template, error = %e, "Failed to post to the log channel.");
  }
}
