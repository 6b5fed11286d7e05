// ticketry-bot/src/responders/transfer.rs

use crate::actions::contexts::TransferParams;
use crate::errors::{BotError, Result};
use crate::models::platform::mention_user;
use crate::responders::common::{command_logs_worker, defer, permission_worker, reply_with, ticket_guard, Interaction};
use crate::responders::{CommandCtx, CommandResponder, CommandResponders};
use crate::services::builder::{MessageContext, MessageTemplate};
use ticketry::{Matcher, TicketryResult, Worker, WorkerControl};

pub fn register_command(commands: &CommandResponders) -> TicketryResult<()> {
  let responder = CommandResponder::new("transfer", Matcher::exact("transfer"), Interaction::from_command);
  responder.workers().add_all([
    permission_worker(|permissions| &permissions.transfer),
    Worker::new("transfer", 0, transfer_command),
    command_logs_worker("transfer"),
  ])?;
  commands.add(responder)?;
  Ok(())
}

async fn transfer_command(ctx: CommandCtx) -> Result<WorkerControl> {
  let bot = &ctx.params.bot;
  let Some((guild, ticket)) = ticket_guard(bot, &ctx.instance).await? else {
    return Ok(WorkerControl::Cancel);
  };
  let interaction = ctx.instance.snapshot();
  let (channel, user) = interaction.actor()?;
  let new_creator = interaction
    .get_user("user")
    .ok_or_else(|| BotError::Precondition("Missing required option 'user'".to_string()))?;
  let reason = interaction.get_string("reason");
  let old_creator = ticket.read().opened_by.clone();

  defer(bot, &ctx.instance, false).await?;
  bot
    .actions
    .transfer_ticket
    .run(
      ctx.source.clone(),
      TransferParams {
        bot: bot.clone(),
        guild,
        channel,
        user,
        ticket,
        new_creator: new_creator.clone(),
        reason: reason.clone(),
        send_message: false,
      },
    )
    .await?;

  let extra = MessageContext::new()
    .with_opt("oldCreator", old_creator.as_deref().map(mention_user))
    .with("newCreator", new_creator.mention())
    .with_opt("reason", reason);
  reply_with(bot, &ctx.instance, MessageTemplate::TransferMessage, &ctx.source, extra).await?;
  Ok(WorkerControl::Continue)
}
