// ticketry-bot/src/actions/clear_tickets.rs

use crate::actions::common::post_to_log_channel;
use crate::actions::contexts::{ClearInstance, ClearParams, DeleteParams};
use crate::errors::{BotError, Result};
use crate::events::{EventId, TicketEvent};
use crate::services::builder::{MessageContext, MessageTemplate};
use ticketry::{Action, TicketryResult, Worker, WorkerContext, WorkerControl};
use tracing::{event, info, Level};

pub type ClearAction = Action<ClearInstance, ClearParams, BotError>;
type Ctx = WorkerContext<ClearInstance, ClearParams>;

/// Registers the workers of `clear-tickets`. There is no backup worker: each
/// nested `delete-ticket` run cleans up after itself.
pub fn register(action: &ClearAction) -> TicketryResult<()> {
  action.workers().add_all([
    Worker::new("clear-tickets", 2, clear_tickets),
    Worker::new("discord-logs", 1, discord_logs),
    Worker::new("logs", 0, logs),
  ])
}

async fn clear_tickets(ctx: Ctx) -> Result<WorkerControl> {
  let params = &ctx.params;
  let bot = &params.bot;
  let pacing = &bot.config.clear;

  let clear = TicketEvent::Clear {
    tickets: params.list.clone(),
    user: params.user.clone(),
    channel: params.channel.clone(),
    filter: params.filter,
  };
  bot.events.emit(&EventId::OnTicketsClear, clear.clone()).await?;

  let mut names = Vec::with_capacity(params.list.len());
  let batches: Vec<_> = params.list.chunks(pacing.batch_size.max(1)).collect();
  for (index, batch) in batches.iter().enumerate() {
    for ticket in batch.iter() {
      let ticket_id = ticket.id();
      let Some(ticket_channel) = bot.client.fetch_channel(&ticket_id).await? else {
        // stop quietly; the list is only published by a finished clear
        event!(Level::WARN, ticket = %ticket_id, deleted = names.len(), "Ticket channel not found, clear stopped.");
        return Ok(WorkerControl::Continue);
      };
      names.push(format!("#{}", ticket_channel.name));

      bot
        .actions
        .delete_ticket
        .run(
          "clear",
          DeleteParams {
            bot: bot.clone(),
            guild: params.guild.clone(),
            channel: ticket_channel,
            user: params.user.clone(),
            ticket: ticket.clone(),
            reason: Some("Cleared Ticket".to_string()),
            send_message: true,
            without_transcript: false,
          },
        )
        .await?;
      tokio::time::sleep(pacing.item_delay).await;
    }
    if index + 1 < batches.len() {
      event!(Level::DEBUG, batch = index + 1, of = batches.len(), "Clear batch done, pausing.");
      tokio::time::sleep(pacing.batch_delay).await;
    }
  }

  ctx.instance.write().list = names;
  bot.events.emit(&EventId::AfterTicketsCleared, clear).await?;
  Ok(WorkerControl::Continue)
}

async fn discord_logs(ctx: Ctx) -> Result<WorkerControl> {
  let params = &ctx.params;
  if !params.bot.config.log_deleting {
    return Ok(WorkerControl::Continue);
  }
  let list = ctx.instance.read().list.join(", ");
  let context = MessageContext::new()
    .with("user", params.user.mention())
    .with("filter", params.filter.as_str())
    .with("list", list);
  post_to_log_channel(&params.bot, MessageTemplate::ClearLogs, &ctx.source, context).await;
  Ok(WorkerControl::Continue)
}

async fn logs(ctx: Ctx) -> Result<WorkerControl> {
  let params = &ctx.params;
  info!(
    user = %params.user.username,
    method = %ctx.source,
    filter = %params.filter.as_str(),
    "{} cleared {} tickets!",
    params.user.name(),
    params.list.len()
  );
  event!(Level::DEBUG, userid = %params.user.id, "Clear ids.");
  Ok(WorkerControl::Continue)
}
