// ticketry-bot/src/responders/priority.rs

use crate::actions::contexts::UpdatePriorityParams;
use crate::errors::Result;
use crate::responders::common::{command_logs_worker, defer, permission_worker, reply_with, ticket_guard, Interaction};
use crate::responders::{CommandCtx, CommandResponder, CommandResponders};
use crate::services::builder::{MessageContext, MessageTemplate};
use ticketry::{Matcher, Source, TicketryResult, Worker, WorkerControl};

pub fn register_command(commands: &CommandResponders) -> TicketryResult<()> {
  let responder = CommandResponder::new("priority", Matcher::exact("priority"), Interaction::from_command);
  responder.workers().add_all([
    permission_worker(|permissions| &permissions.priority),
    Worker::new("priority", 0, priority_command),
    command_logs_worker("priority"),
  ])?;
  commands.add(responder)?;
  Ok(())
}

async fn priority_command(ctx: CommandCtx) -> Result<WorkerControl> {
  let bot = &ctx.params.bot;
  let Some((guild, ticket)) = ticket_guard(bot, &ctx.instance).await? else {
    return Ok(WorkerControl::Cancel);
  };
  let interaction = ctx.instance.snapshot();
  let (channel, user) = interaction.actor()?;

  match interaction.subcommand.as_deref() {
    Some("set") => {
      let priority_name = interaction.require_string("priority")?;
      let reason = interaction.get_string("reason");
      let Some(priority) = bot.priorities.by_raw_name(&priority_name) else {
        let extra = MessageContext::new()
          .with("error", "Please provide a valid priority level.")
          .with("customTitle", "Unknown Priority Level");
        reply_with(bot, &ctx.instance, MessageTemplate::Error, &Source::from("button"), extra).await?;
        return Ok(WorkerControl::Cancel);
      };

      defer(bot, &ctx.instance, false).await?;
      bot
        .actions
        .update_ticket_priority
        .run(
          ctx.source.clone(),
          UpdatePriorityParams {
            bot: bot.clone(),
            guild,
            channel,
            user,
            ticket,
            new_priority: priority.clone(),
            reason: reason.clone(),
            send_message: false,
          },
        )
        .await?;
      let extra = MessageContext::new()
        .with("priority", priority.render_display_name())
        .with_opt("reason", reason);
      reply_with(bot, &ctx.instance, MessageTemplate::PrioritySet, &ctx.source, extra).await?;
    }
    Some("get") => {
      let level = ticket.read().priority;
      let priority = bot.priorities.from_level(level);
      let extra = MessageContext::new().with("priority", priority.render_display_name());
      reply_with(bot, &ctx.instance, MessageTemplate::PriorityGet, &ctx.source, extra).await?;
    }
    _ => {}
  }
  Ok(WorkerControl::Continue)
}
