// ticketry-bot/src/responders/topic.rs

use crate::actions::contexts::UpdateTopicParams;
use crate::errors::Result;
use crate::responders::common::{command_logs_worker, defer, permission_worker, reply_with, ticket_guard, Interaction};
use crate::responders::{CommandCtx, CommandResponder, CommandResponders};
use crate::services::builder::{MessageContext, MessageTemplate};
use ticketry::{Matcher, TicketryResult, Worker, WorkerControl};

pub fn register_command(commands: &CommandResponders) -> TicketryResult<()> {
  let responder = CommandResponder::new("topic", Matcher::exact("topic"), Interaction::from_command);
  responder.workers().add_all([
    permission_worker(|permissions| &permissions.topic),
    Worker::new("topic", 0, topic_command),
    command_logs_worker("topic"),
  ])?;
  commands.add(responder)?;
  Ok(())
}

async fn topic_command(ctx: CommandCtx) -> Result<WorkerControl> {
  let bot = &ctx.params.bot;
  let Some((guild, ticket)) = ticket_guard(bot, &ctx.instance).await? else {
    return Ok(WorkerControl::Cancel);
  };
  let interaction = ctx.instance.snapshot();
  let (channel, user) = interaction.actor()?;
  let topic = interaction.require_string("topic")?;

  defer(bot, &ctx.instance, false).await?;
  bot
    .actions
    .update_ticket_topic
    .run(
      ctx.source.clone(),
      UpdateTopicParams {
        bot: bot.clone(),
        guild,
        channel,
        user,
        ticket,
        new_topic: Some(topic.clone()),
        send_message: false,
      },
    )
    .await?;
  let extra = MessageContext::new().with("topic", topic);
  reply_with(bot, &ctx.instance, MessageTemplate::TopicSet, &ctx.source, extra).await?;
  Ok(WorkerControl::Continue)
}
