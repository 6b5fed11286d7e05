// ticketry-bot/src/services/client.rs

//! The chat platform client contract and an in-memory client that records calls.

use crate::errors::{BotError, Result};
use crate::models::platform::{Channel, Message, MessageAnalysis, Modal, PermissionOverwrite};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{event, Level};

/// How an interaction gets answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionResponse {
  Reply(Message),
  /// Acknowledge now, reply later.
  Defer { ephemeral: bool },
  /// Acknowledge a component interaction without changing its message.
  DeferUpdate,
  /// Edit the message the component belongs to.
  Update(Message),
  ShowModal(Modal),
  /// Extra message once the interaction has been answered.
  FollowUp(Message),
}

#[async_trait]
pub trait ChatClient: Send + Sync {
  async fn fetch_channel(&self, channel_id: &str) -> Result<Option<Channel>>;

  /// Sends `message` and returns the new message id.
  async fn send_message(&self, channel_id: &str, message: Message) -> Result<String>;

  async fn respond(&self, interaction_id: &str, response: InteractionResponse) -> Result<()>;

  async fn rename_channel(&self, channel_id: &str, name: &str) -> Result<()>;

  async fn set_topic(&self, channel_id: &str, topic: &str) -> Result<()>;

  async fn delete_channel(&self, channel_id: &str, reason: &str) -> Result<()>;

  async fn set_permission_overwrites(&self, channel_id: &str, overwrites: Vec<PermissionOverwrite>) -> Result<()>;

  /// Member ids of a role, `None` when the role does not exist.
  async fn role_members(&self, guild_id: &str, role_id: &str) -> Result<Option<Vec<String>>>;

  /// Message counts of a ticket channel, `None` when they can't be collected.
  async fn message_analysis(&self, channel_id: &str) -> Result<Option<MessageAnalysis>>;
}

/// One recorded `ChatClient` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCall {
  SendMessage { channel_id: String, message: Message },
  Respond { interaction_id: String, response: InteractionResponse },
  RenameChannel { channel_id: String, name: String },
  SetTopic { channel_id: String, topic: String },
  DeleteChannel { channel_id: String, reason: String },
  SetPermissionOverwrites { channel_id: String, overwrites: Vec<PermissionOverwrite> },
}

impl ClientCall {
  pub fn method(&self) -> &'static str {
    match self {
      ClientCall::SendMessage { .. } => "send_message",
      ClientCall::Respond { .. } => "respond",
      ClientCall::RenameChannel { .. } => "rename_channel",
      ClientCall::SetTopic { .. } => "set_topic",
      ClientCall::DeleteChannel { .. } => "delete_channel",
      ClientCall::SetPermissionOverwrites { .. } => "set_permission_overwrites",
    }
  }
}

#[derive(Default)]
struct MemoryGuilds {
  channels: HashMap<String, Channel>,
  roles: HashMap<(String, String), Vec<String>>,
  analysis: HashMap<String, MessageAnalysis>,
}

/// In-memory client.
///
/// Records every mutating call in order, keeps channel names in sync with
/// renames, and can be told to stall renames or fail specific methods.
#[derive(Default)]
pub struct MemoryClient {
  guilds: RwLock<MemoryGuilds>,
  calls: Mutex<Vec<ClientCall>>,
  rename_delay: RwLock<Option<Duration>>,
  failing: RwLock<HashSet<&'static str>>,
  next_message_id: Mutex<u64>,
}

impl MemoryClient {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_channel(&self, channel: Channel) {
    self.guilds.write().channels.insert(channel.id.clone(), channel);
  }

  pub fn add_role(&self, guild_id: &str, role_id: &str, members: &[&str]) {
    self.guilds.write().roles.insert(
      (guild_id.to_string(), role_id.to_string()),
      members.iter().map(|m| m.to_string()).collect(),
    );
  }

  pub fn set_message_analysis(&self, channel_id: &str, analysis: MessageAnalysis) {
    self.guilds.write().analysis.insert(channel_id.to_string(), analysis);
  }

  /// Every rename sleeps this long before applying.
  pub fn set_rename_delay(&self, delay: Duration) {
    *self.rename_delay.write() = Some(delay);
  }

  /// Makes `method` (as in `ClientCall::method`) fail with `BotError::ExternalService`.
  pub fn fail_method(&self, method: &'static str) {
    self.failing.write().insert(method);
  }

  pub fn channel(&self, channel_id: &str) -> Option<Channel> {
    self.guilds.read().channels.get(channel_id).cloned()
  }

  pub fn calls(&self) -> Vec<ClientCall> {
    self.calls.lock().clone()
  }

  pub fn calls_to(&self, method: &str) -> Vec<ClientCall> {
    self.calls.lock().iter().filter(|c| c.method() == method).cloned().collect()
  }

  /// Messages sent to `channel_id`, in order.
  pub fn sent_to(&self, channel_id: &str) -> Vec<Message> {
    self
      .calls
      .lock()
      .iter()
      .filter_map(|call| match call {
        ClientCall::SendMessage { channel_id: id, message } if id == channel_id => Some(message.clone()),
        _ => None,
      })
      .collect()
  }

  /// Responses given to `interaction_id`, in order.
  pub fn responses_to(&self, interaction_id: &str) -> Vec<InteractionResponse> {
    self
      .calls
      .lock()
      .iter()
      .filter_map(|call| match call {
        ClientCall::Respond {
          interaction_id: id,
          response,
        } if id == interaction_id => Some(response.clone()),
        _ => None,
      })
      .collect()
  }

  fn check(&self, method: &'static str) -> Result<()> {
    if self.failing.read().contains(method) {
      event!(Level::WARN, %method, "Simulated chat client failure.");
      return Err(BotError::ExternalService(format!("{} failed: Missing Permissions", method)));
    }
    Ok(())
  }

  fn record(&self, call: ClientCall) {
    event!(Level::DEBUG, method = call.method(), "Chat client call recorded.");
    self.calls.lock().push(call);
  }

  fn require_channel(&self, channel_id: &str) -> Result<()> {
    if self.guilds.read().channels.contains_key(channel_id) {
      Ok(())
    } else {
      Err(BotError::ExternalService(format!("Unknown Channel '{}'", channel_id)))
    }
  }
}

#[async_trait]
impl ChatClient for MemoryClient {
  async fn fetch_channel(&self, channel_id: &str) -> Result<Option<Channel>> {
    Ok(self.channel(channel_id))
  }

  async fn send_message(&self, channel_id: &str, message: Message) -> Result<String> {
    self.check("send_message")?;
    self.require_channel(channel_id)?;
    let message_id = {
      let mut next = self.next_message_id.lock();
      *next += 1;
      format!("message-{}", *next)
    };
    self.record(ClientCall::SendMessage {
      channel_id: channel_id.to_string(),
      message,
    });
    Ok(message_id)
  }

  async fn respond(&self, interaction_id: &str, response: InteractionResponse) -> Result<()> {
    self.check("respond")?;
    self.record(ClientCall::Respond {
      interaction_id: interaction_id.to_string(),
      response,
    });
    Ok(())
  }

  async fn rename_channel(&self, channel_id: &str, name: &str) -> Result<()> {
    let delay = *self.rename_delay.read();
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
    self.check("rename_channel")?;
    self.require_channel(channel_id)?;
    if let Some(channel) = self.guilds.write().channels.get_mut(channel_id) {
      channel.name = name.to_string();
    }
    self.record(ClientCall::RenameChannel {
      channel_id: channel_id.to_string(),
      name: name.to_string(),
    });
    Ok(())
  }

  async fn set_topic(&self, channel_id: &str, topic: &str) -> Result<()> {
    self.check("set_topic")?;
    self.require_channel(channel_id)?;
    self.record(ClientCall::SetTopic {
      channel_id: channel_id.to_string(),
      topic: topic.to_string(),
    });
    Ok(())
  }

  async fn delete_channel(&self, channel_id: &str, reason: &str) -> Result<()> {
    self.check("delete_channel")?;
    if self.guilds.write().channels.remove(channel_id).is_none() {
      return Err(BotError::ExternalService(format!("Unknown Channel '{}'", channel_id)));
    }
    self.record(ClientCall::DeleteChannel {
      channel_id: channel_id.to_string(),
      reason: reason.to_string(),
    });
    Ok(())
  }

  async fn set_permission_overwrites(&self, channel_id: &str, overwrites: Vec<PermissionOverwrite>) -> Result<()> {
    self.check("set_permission_overwrites")?;
    self.require_channel(channel_id)?;
    self.record(ClientCall::SetPermissionOverwrites {
      channel_id: channel_id.to_string(),
      overwrites,
    });
    Ok(())
  }

  async fn role_members(&self, guild_id: &str, role_id: &str) -> Result<Option<Vec<String>>> {
    Ok(
      self
        .guilds
        .read()
        .roles
        .get(&(guild_id.to_string(), role_id.to_string()))
        .cloned(),
    )
  }

  async fn message_analysis(&self, channel_id: &str) -> Result<Option<MessageAnalysis>> {
    Ok(self.guilds.read().analysis.get(channel_id).copied())
  }
}
