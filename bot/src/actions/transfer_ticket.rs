// ticketry-bot/src/actions/transfer_ticket.rs

use crate::actions::common::{acquire_busy, cancel_busy_worker, post_to_log_channel, rename_ticket_channel, ticket_channel_name};
use crate::actions::contexts::{TransferInstance, TransferParams, UpdateTopicParams};
use crate::errors::{BotError, Result};
use crate::events::{EventId, TicketEvent};
use crate::models::platform::{Channel, Guild, OverwriteTarget, Permission, PermissionOverwrite};
use crate::models::ticket::{Participant, SuffixMode, TicketData};
use crate::services::builder::{MessageContext, MessageTemplate};
use crate::state::Bot;
use ticketry::{Action, TicketryResult, Worker, WorkerContext, WorkerControl};
use tracing::{event, info, Level};

pub type TransferAction = Action<TransferInstance, TransferParams, BotError>;
type Ctx = WorkerContext<TransferInstance, TransferParams>;

const ADMIN_ALLOW: [Permission; 7] = [
  Permission::ViewChannel,
  Permission::SendMessages,
  Permission::AddReactions,
  Permission::AttachFiles,
  Permission::SendPolls,
  Permission::ReadMessageHistory,
  Permission::ManageMessages,
];

const PARTICIPANT_ALLOW: [Permission; 6] = [
  Permission::ViewChannel,
  Permission::SendMessages,
  Permission::AddReactions,
  Permission::AttachFiles,
  Permission::SendPolls,
  Permission::ReadMessageHistory,
];

pub fn register(action: &TransferAction) -> TicketryResult<()> {
  action.workers().add_all([
    Worker::new("transfer-ticket", 2, transfer_ticket),
    Worker::new("discord-logs", 1, discord_logs),
    Worker::new("logs", 0, logs),
  ])?;
  action.workers().set_backup(cancel_busy_worker())
}

/// Full overwrite list of a ticket channel: `@everyone` locked out, admin
/// roles (global first, then the option's), read-only admins, then every
/// user participant. A role is only listed under its strongest grant.
pub fn ticket_overwrites(bot: &Bot, guild: &Guild, ticket: &TicketData) -> Vec<PermissionOverwrite> {
  let global_admins = &bot.config.global_admins;
  let option_admins = &ticket.option.admins;

  let mut overwrites = vec![PermissionOverwrite {
    target: OverwriteTarget::Role(guild.everyone_role.clone()),
    allow: vec![],
    deny: vec![Permission::ViewChannel, Permission::SendMessages, Permission::ReadMessageHistory],
  }];

  let admin_roles = global_admins
    .iter()
    .chain(option_admins.iter().filter(|role| !global_admins.contains(role)));
  overwrites.extend(admin_roles.map(|role| PermissionOverwrite {
    target: OverwriteTarget::Role(role.clone()),
    allow: ADMIN_ALLOW.to_vec(),
    deny: vec![],
  }));

  overwrites.extend(
    ticket
      .option
      .readonly_admins
      .iter()
      .filter(|role| !global_admins.contains(role) && !option_admins.contains(role))
      .map(|role| PermissionOverwrite {
        target: OverwriteTarget::Role(role.clone()),
        allow: vec![Permission::ViewChannel, Permission::ReadMessageHistory],
        deny: vec![
          Permission::SendMessages,
          Permission::AddReactions,
          Permission::AttachFiles,
          Permission::SendPolls,
        ],
      }),
  );

  overwrites.extend(ticket.participants.iter().filter_map(|participant| match participant {
    Participant::User(id) => Some(PermissionOverwrite {
      target: OverwriteTarget::Member(id.clone()),
      allow: PARTICIPANT_ALLOW.to_vec(),
      deny: vec![],
    }),
    Participant::Role(_) => None,
  }));

  overwrites
}

async fn transfer_ticket(ctx: Ctx) -> Result<WorkerControl> {
  let params = &ctx.params;
  let bot = &params.bot;
  if params.channel.is_thread() || params.channel.is_dm_based() {
    return Err(BotError::Precondition(
      "Unable to transfer ticket! Threads are not supported.".to_string(),
    ));
  }

  let old_creator = params.ticket.read().opened_by.clone();
  ctx.instance.write().old_creator = old_creator.clone();

  let transfer = TicketEvent::Transfer {
    ticket: params.ticket.clone(),
    user: params.user.clone(),
    channel: params.channel.clone(),
    old_creator,
    new_creator: params.new_creator.clone(),
    reason: params.reason.clone(),
  };
  bot.events.emit(&EventId::OnTicketTransfer, transfer.clone()).await?;

  let channel = {
    let _busy = acquire_busy(&ctx)?;
    let new_creator = &params.new_creator;
    let data = params.ticket.update(|data| {
      if let Some(previous) = data.opened_by.take() {
        data.previous_creators.push(previous);
      }
      let already_participant = data
        .participants
        .iter()
        .any(|p| matches!(p, Participant::User(id) if *id == new_creator.id));
      if !already_participant {
        data.participants.push(Participant::User(new_creator.id.clone()));
      }
      data.opened_by = Some(new_creator.id.clone());
      match data.option.channel_suffix {
        SuffixMode::UserName => data.channel_suffix = new_creator.username.clone(),
        SuffixMode::UserId => data.channel_suffix = new_creator.id.clone(),
        SuffixMode::Counter => {}
      }
      data.clone()
    });
    bot.tickets.save(&params.ticket).await?;

    let overwrites = ticket_overwrites(bot, &params.guild, &data);
    if let Err(e) = bot.client.set_permission_overwrites(&params.channel.id, overwrites).await {
      event!(Level::ERROR, channel = %params.channel.id, error = %e, "Failed to reset channel permissions on ticket transfer!");
    }

    let base = format!("{}{}", data.option.channel_prefix, data.channel_suffix);
    let new_name = ticket_channel_name(bot, &data, &base);
    let renamed = rename_ticket_channel(bot, &params.channel, &params.user, &new_name, "ticket-transfer").await?;
    ctx.instance.write().renamed = Some(renamed);

    if params.send_message {
      let context = MessageContext::new()
        .with("user", params.user.mention())
        .with("newCreator", new_creator.mention())
        .with_opt("reason", params.reason.clone());
      let message = bot.builder.build(MessageTemplate::TransferMessage, ctx.source.as_str(), &context);
      bot.client.send_message(&params.channel.id, message).await?;
    }

    Channel {
      name: if renamed { new_name } else { params.channel.name.clone() },
      ..params.channel.clone()
    }
  }; // busy released

  bot.events.emit(&EventId::AfterTicketTransferred, transfer).await?;

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
    .with("newCreator", params.new_creator.mention())
    .with_opt("reason", params.reason.clone());
  post_to_log_channel(&params.bot, MessageTemplate::TransferLogs, &ctx.source, context).await;
  Ok(WorkerControl::Continue)
}

async fn logs(ctx: Ctx) -> Result<WorkerControl> {
  let params = &ctx.params;
  info!(
    user = %params.user.username,
    channel = %format!("#{}", params.channel.name),
    reason = %params.reason.as_deref().unwrap_or("/"),
    method = %ctx.source,
    "{} transferred a ticket to '{}'!",
    params.user.name(),
    params.new_creator.name()
  );
  event!(Level::DEBUG, userid = %params.user.id, channelid = %params.channel.id, "Transfer ids.");
  Ok(WorkerControl::Continue)
}
