// ticketry-bot/src/actions/update_topic.rs

use crate::actions::common::{acquire_busy, cancel_busy_worker};
use crate::actions::contexts::{TopicInstance, UpdateTopicParams};
use crate::errors::{BotError, Result};
use crate::events::{EventId, TicketEvent};
use crate::models::platform::{mention_role, mention_user};
use crate::models::ticket::{Participant, TicketData};
use crate::services::builder::{MessageContext, MessageTemplate};
use crate::state::Bot;
use ticketry::{Action, TicketryResult, Worker, WorkerContext, WorkerControl};
use tracing::{event, info, Level};

pub type UpdateTopicAction = Action<TopicInstance, UpdateTopicParams, BotError>;
type Ctx = WorkerContext<TopicInstance, UpdateTopicParams>;

pub fn register(action: &UpdateTopicAction) -> TicketryResult<()> {
  action.workers().add_all([
    Worker::new("update-ticket-topic", 2, update_topic),
    Worker::new("discord-logs", 1, discord_logs),
    Worker::new("logs", 0, logs),
  ])?;
  action.workers().set_backup(cancel_busy_worker())
}

/// The channel topic line for `ticket`, built from the enabled
/// `channel_topic` parts and joined with `" • "`.
pub fn compose_channel_topic(bot: &Bot, ticket: &TicketData) -> String {
  let show = &bot.config.channel_topic;
  let t = |key: &str| bot.translations.get_translation(key);
  let mut parts: Vec<String> = Vec::new();

  if show.show_option_name {
    parts.push(ticket.option.name.clone());
  }
  if show.show_option_description {
    parts.push(ticket.option.description.clone());
  }
  if show.show_option_topic {
    parts.push(ticket.topic.clone());
  }
  if show.show_priority {
    let level = bot.priorities.from_level(ticket.priority);
    parts.push(format!(
      "**{}:** {}",
      t("params.uppercase.priority"),
      level.render_display_name()
    ));
  }
  if show.show_closed {
    let status = if ticket.closed {
      t("params.uppercase.closed")
    } else {
      t("params.uppercase.open")
    };
    parts.push(format!("**{}:** {}", t("params.uppercase.status"), status));
  }
  if show.show_claimed {
    let claimer = match &ticket.claimed_by {
      Some(id) => mention_user(id),
      None => t("params.uppercase.noone"),
    };
    parts.push(format!("**{}:** {}", t("stats.properties.claimedBy"), claimer));
  }
  if show.show_pinned {
    let pinned = if ticket.pinned {
      t("params.uppercase.yes")
    } else {
      t("params.uppercase.no")
    };
    parts.push(format!("**{}:** {}", t("params.uppercase.pinned"), pinned));
  }
  if show.show_creator {
    let creator = match &ticket.opened_by {
      Some(id) => mention_user(id),
      None => t("params.uppercase.noone"),
    };
    parts.push(format!("**{}:** {}", t("params.uppercase.creator"), creator));
  }
  if show.show_participants {
    let participants = ticket
      .participants
      .iter()
      .map(|p| match p {
        Participant::User(id) => mention_user(id),
        Participant::Role(id) => mention_role(id),
      })
      .collect::<Vec<_>>()
      .join(", ");
    parts.push(format!("**{}:** {}", t("params.uppercase.participants"), participants));
  }

  parts.join(" • ")
}

async fn update_topic(ctx: Ctx) -> Result<WorkerControl> {
  let params = &ctx.params;
  let bot = &params.bot;
  if params.channel.is_thread() || params.channel.is_dm_based() {
    return Err(BotError::Precondition(
      "Unable to set topic of ticket! Threads are not supported.".to_string(),
    ));
  }

  let old_topic = params.ticket.read().topic.clone();
  ctx.instance.write().old_topic = Some(old_topic.clone());

  let change = params.new_topic.as_ref().map(|new_topic| TicketEvent::TopicChange {
    ticket: params.ticket.clone(),
    user: params.user.clone(),
    channel: params.channel.clone(),
    old_topic,
    new_topic: new_topic.clone(),
  });
  if let Some(change) = &change {
    bot.events.emit(&EventId::OnTicketTopicChange, change.clone()).await?;
  }

  {
    let _busy = acquire_busy(&ctx)?;
    let data = params.ticket.update(|data| {
      if let Some(new_topic) = &params.new_topic {
        data.topic = new_topic.clone();
      }
      data.clone()
    });
    if params.new_topic.is_some() {
      bot.tickets.save(&params.ticket).await?;
    }

    let channel_topic = compose_channel_topic(bot, &data);
    ctx.instance.write().channel_topic = Some(channel_topic.clone());
    if let Err(e) = bot.client.set_topic(&params.channel.id, &channel_topic).await {
      event!(Level::ERROR, channel = %params.channel.id, error = %e, "Failed to set the channel topic.");
    }

    if let (true, Some(new_topic)) = (params.send_message, &params.new_topic) {
      let context = MessageContext::new()
        .with("user", params.user.mention())
        .with("topic", new_topic.clone());
      let message = bot.builder.build(MessageTemplate::TopicSet, ctx.source.as_str(), &context);
      bot.client.send_message(&params.channel.id, message).await?;
    }
  } // busy released

  if let Some(change) = change {
    bot.events.emit(&EventId::AfterTicketTopicChanged, change).await?;
  }
  Ok(WorkerControl::Continue)
}

async fn discord_logs(_ctx: Ctx) -> Result<WorkerControl> {
  // topic changes are not posted to the log channel
  Ok(WorkerControl::Continue)
}

async fn logs(ctx: Ctx) -> Result<WorkerControl> {
  let params = &ctx.params;
  if let Some(new_topic) = &params.new_topic {
    info!(
      user = %params.user.username,
      channel = %format!("#{}", params.channel.name),
      topic = %new_topic,
      method = %ctx.source,
      "{} changed the topic of a ticket!",
      params.user.name()
    );
    event!(Level::DEBUG, userid = %params.user.id, channelid = %params.channel.id, "Topic change ids.");
  }
  Ok(WorkerControl::Continue)
}
