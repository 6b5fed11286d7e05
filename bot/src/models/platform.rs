// ticketry-bot/src/models/platform.rs

//! Plain data shapes of the chat platform objects the bot works with.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id: String,
  pub username: String,
  #[serde(default)]
  pub display_name: String,
}

impl User {
  pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
    let username = username.into();
    Self {
      id: id.into(),
      display_name: username.clone(),
      username,
    }
  }

  /// Display name, falling back to the username.
  pub fn name(&self) -> &str {
    if self.display_name.is_empty() {
      &self.username
    } else {
      &self.display_name
    }
  }

  pub fn mention(&self) -> String {
    mention_user(&self.id)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
  pub user_id: String,
  #[serde(default)]
  pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
  pub id: String,
  pub name: String,
  /// Id of the implicit `@everyone` role.
  pub everyone_role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
  #[default]
  Text,
  Thread,
  Dm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub kind: ChannelKind,
}

impl Channel {
  pub fn text(id: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      kind: ChannelKind::Text,
    }
  }

  pub fn is_thread(&self) -> bool {
    self.kind == ChannelKind::Thread
  }

  pub fn is_dm_based(&self) -> bool {
    self.kind == ChannelKind::Dm
  }
}

/// A rendered message, ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  pub content: String,
  #[serde(default)]
  pub ephemeral: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modal {
  pub custom_id: String,
  pub title: String,
  /// Ids of the text fields, in display order.
  pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
  ViewChannel,
  SendMessages,
  ReadMessageHistory,
  AddReactions,
  AttachFiles,
  SendPolls,
  ManageMessages,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum OverwriteTarget {
  Role(String),
  Member(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverwrite {
  pub target: OverwriteTarget,
  pub allow: Vec<Permission>,
  pub deny: Vec<Permission>,
}

/// Message counts used by the close-before-message checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageAnalysis {
  pub total_messages: usize,
  pub admin_messages: usize,
}

pub fn mention_user(id: &str) -> String {
  format!("<@{}>", id)
}

pub fn mention_role(id: &str) -> String {
  format!("<@&{}>", id)
}

/// Strips emoji (and their joiners/selectors) from a channel name.
pub fn trim_emojis(name: &str) -> String {
  name.chars().filter(|c| !is_emoji(*c)).collect()
}

fn is_emoji(c: char) -> bool {
  matches!(
    c as u32,
    0x1F000..=0x1FAFF | 0x2300..=0x23FF | 0x2600..=0x27BF | 0x2B00..=0x2BFF | 0xFE0F | 0x200D | 0x20E3
  )
}
