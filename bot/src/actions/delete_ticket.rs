// ticketry-bot/src/actions/delete_ticket.rs

use crate::actions::common::{acquire_busy, cancel_busy_worker, post_to_log_channel};
use crate::actions::contexts::{DeleteInstance, DeleteParams};
use crate::errors::{BotError, Result};
use crate::events::{EventId, TicketEvent};
use crate::services::builder::{MessageContext, MessageTemplate};
use ticketry::{Action, TicketryResult, Worker, WorkerContext, WorkerControl};
use tracing::{event, info, Level};

pub type DeleteAction = Action<DeleteInstance, DeleteParams, BotError>;
type Ctx = WorkerContext<DeleteInstance, DeleteParams>;

pub fn register(action: &DeleteAction) -> TicketryResult<()> {
  action.workers().add_all([
    Worker::new("delete-ticket", 2, delete_ticket),
    Worker::new("discord-logs", 1, discord_logs),
    Worker::new("logs", 0, logs),
  ])?;
  action.workers().set_backup(cancel_busy_worker())
}

async fn delete_ticket(ctx: Ctx) -> Result<WorkerControl> {
  let params = &ctx.params;
  let bot = &params.bot;
  if params.channel.is_thread() || params.channel.is_dm_based() {
    return Err(BotError::Precondition(
      "Unable to delete ticket! Threads are not supported.".to_string(),
    ));
  }

  let delete = TicketEvent::Delete {
    ticket: params.ticket.clone(),
    user: params.user.clone(),
    channel: params.channel.clone(),
    reason: params.reason.clone(),
  };
  bot.events.emit(&EventId::OnTicketDelete, delete.clone()).await?;

  {
    let _busy = acquire_busy(&ctx)?;
    if params.send_message {
      let context = MessageContext::new()
        .with("user", params.user.mention())
        .with_opt("reason", params.reason.clone());
      let message = bot.builder.build(MessageTemplate::DeleteMessage, ctx.source.as_str(), &context);
      bot.client.send_message(&params.channel.id, message).await?;
    }

    let reason = params.reason.as_deref().unwrap_or("Ticket Deleted");
    bot.client.delete_channel(&params.channel.id, reason).await?;
    bot.tickets.remove(&params.channel.id).await?;
    ctx.instance.write().deleted = true;
  } // busy released

  bot.events.emit(&EventId::AfterTicketDeleted, delete).await?;
  Ok(WorkerControl::Continue)
}

async fn discord_logs(ctx: Ctx) -> Result<WorkerControl> {
  let params = &ctx.params;
  if !params.bot.config.log_deleting {
    return Ok(WorkerControl::Continue);
  }
  let context = MessageContext::new()
    .with("user", params.user.mention())
    .with("channel", format!("#{}", params.channel.name))
    .with_opt("reason", params.reason.clone());
  post_to_log_channel(&params.bot, MessageTemplate::DeleteLogs, &ctx.source, context).await;
  Ok(WorkerControl::Continue)
}

async fn logs(ctx: Ctx) -> Result<WorkerControl> {
  let params = &ctx.params;
  info!(
    user = %params.user.username,
    channel = %format!("#{}", params.channel.name),
    reason = %params.reason.as_deref().unwrap_or("/"),
    method = %ctx.source,
    transcript = !params.without_transcript,
    "{} deleted a ticket!",
    params.user.name()
  );
  event!(Level::DEBUG, userid = %params.user.id, channelid = %params.channel.id, "Delete ids.");
  Ok(WorkerControl::Continue)
}
