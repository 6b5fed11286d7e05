// ticketry-bot/src/responders/clear.rs

use crate::actions::contexts::ClearParams;
use crate::errors::Result;
use crate::models::ticket::ClearFilter;
use crate::responders::common::{command_logs_worker, defer, permission_worker, reply_with, Interaction};
use crate::responders::{CommandCtx, CommandResponder, CommandResponders};
use crate::services::builder::{MessageContext, MessageTemplate};
use ticketry::{Matcher, Source, TicketryResult, Worker, WorkerControl};

pub fn register_command(commands: &CommandResponders) -> TicketryResult<()> {
  let responder = CommandResponder::new("clear", Matcher::exact("clear"), Interaction::from_command);
  responder.workers().add_all([
    permission_worker(|permissions| &permissions.clear),
    Worker::new("clear", 0, clear_command),
    command_logs_worker("clear"),
  ])?;
  commands.add(responder)?;
  Ok(())
}

async fn clear_command(ctx: CommandCtx) -> Result<WorkerControl> {
  let bot = &ctx.params.bot;
  let interaction = ctx.instance.snapshot();
  let (channel, user) = interaction.actor()?;
  let button = Source::from("button");
  let Some(guild) = interaction.guild.clone() else {
    reply_with(bot, &ctx.instance, MessageTemplate::ErrorNotInGuild, &button, MessageContext::new()).await?;
    return Ok(WorkerControl::Cancel);
  };

  let filter = match interaction.get_string("filter") {
    None => ClearFilter::All,
    Some(raw) => match ClearFilter::parse(&raw) {
      Some(filter) => filter,
      None => {
        let extra = MessageContext::new()
          .with("error", format!("Unknown filter '{}'.", raw))
          .with("customTitle", "Invalid Filter");
        reply_with(bot, &ctx.instance, MessageTemplate::Error, &button, extra).await?;
        return Ok(WorkerControl::Cancel);
      }
    },
  };
  let list = bot.tickets.filter(filter);

  defer(bot, &ctx.instance, false).await?;
  let run = bot
    .actions
    .clear_tickets
    .run(
      ctx.source.clone(),
      ClearParams {
        bot: bot.clone(),
        guild,
        channel,
        user,
        filter,
        list,
      },
    )
    .await?;

  let cleared = run.instance.read().list.join(", ");
  let extra = MessageContext::new().with("filter", filter.as_str()).with("list", cleared);
  reply_with(bot, &ctx.instance, MessageTemplate::ClearMessage, &ctx.source, extra).await?;
  Ok(WorkerControl::Continue)
}
