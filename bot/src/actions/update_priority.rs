// ticketry-bot/src/actions/update_priority.rs

use crate::actions::common::{acquire_busy, cancel_busy_worker, post_to_log_channel, rename_ticket_channel, ticket_channel_name};
use crate::actions::contexts::{PriorityInstance, UpdatePriorityParams, UpdateTopicParams};
use crate::errors::{BotError, Result};
use crate::events::{EventId, TicketEvent};
use crate::models::platform::Channel;
use crate::services::builder::{MessageContext, MessageTemplate};
use ticketry::{Action, TicketryResult, Worker, WorkerContext, WorkerControl};
use tracing::{event, info, Level};

pub type UpdatePriorityAction = Action<PriorityInstance, UpdatePriorityParams, BotError>;
type Ctx = WorkerContext<PriorityInstance, UpdatePriorityParams>;

/// Registers the built-in workers of `update-ticket-priority`.
pub fn register(action: &UpdatePriorityAction) -> TicketryResult<()> {
  action.workers().add_all([
    Worker::new("update-ticket-priority", 2, update_priority),
    Worker::new("discord-logs", 1, discord_logs),
    Worker::new("logs", 0, logs),
  ])?;
  action.workers().set_backup(cancel_busy_worker())
}

async fn update_priority(ctx: Ctx) -> Result<WorkerControl> {
  let params = &ctx.params;
  let bot = &params.bot;
  if params.channel.is_thread() || params.channel.is_dm_based() {
    return Err(BotError::Precondition(
      "Unable to set priority of ticket! Threads are not supported.".to_string(),
    ));
  }

  let old_level = params.ticket.read().priority;
  let old_priority = bot.priorities.from_level(old_level);
  ctx.instance.write().old_priority = Some(old_priority.clone());

  let change = TicketEvent::PriorityChange {
    ticket: params.ticket.clone(),
    user: params.user.clone(),
    channel: params.channel.clone(),
    old_priority,
    new_priority: params.new_priority.clone(),
    reason: params.reason.clone(),
  };
  bot.events.emit(&EventId::OnTicketPriorityChange, change.clone()).await?;

  let channel = {
    let _busy = acquire_busy(&ctx)?;
    let data = params.ticket.update(|data| {
      data.priority = params.new_priority.priority;
      data.clone()
    });
    bot.tickets.save(&params.ticket).await?;

    let new_name = ticket_channel_name(bot, &data, &params.channel.name);
    let renamed = rename_ticket_channel(bot, &params.channel, &params.user, &new_name, "ticket-priority").await?;
    ctx.instance.write().renamed = Some(renamed);

    if params.send_message {
      let context = MessageContext::new()
        .with("user", params.user.mention())
        .with("priority", params.new_priority.render_display_name())
        .with_opt("reason", params.reason.clone());
      let message = bot.builder.build(MessageTemplate::PrioritySet, ctx.source.as_str(), &context);
      bot.client.send_message(&params.channel.id, message).await?;
    }

    Channel {
      name: if renamed { new_name } else { params.channel.name.clone() },
      ..params.channel.clone()
    }
  }; // busy released

  bot.events.emit(&EventId::AfterTicketPriorityChanged, change).await?;

  bot
    .actions
    .update_ticket_topic
    .run(
      "ticket-action",
      UpdateTopicParams {
        bot: bot.clone(),
        guild: params.guild.clone(),
        channel,
        user: params.user.clone(),
        ticket: params.ticket.clone(),
        new_topic: None,
        send_message: false,
      },
    )
    .await?;
  Ok(WorkerControl::Continue)
}

async fn discord_logs(ctx: Ctx) -> Result<WorkerControl> {
  let params = &ctx.params;
  let context = MessageContext::new()
    .with("user", params.user.mention())
    .with("channel", format!("#{}", params.channel.name))
    .with("priority", params.new_priority.render_display_name())
    .with_opt("reason", params.reason.clone());
  post_to_log_channel(&params.bot, MessageTemplate::PriorityLogs, &ctx.source, context).await;
  Ok(WorkerControl::Continue)
}

async fn logs(ctx: Ctx) -> Result<WorkerControl> {
  let params = &ctx.params;
  info!(
    user = %params.user.username,
    channel = %format!("#{}", params.channel.name),
    priority = %params.new_priority.id,
    method = %ctx.source,
    "{} changed the priority of a ticket!",
    params.user.name()
  );
  event!(Level::DEBUG, userid = %params.user.id, channelid = %params.channel.id, "Priority change ids.");
  Ok(WorkerControl::Continue)
}
