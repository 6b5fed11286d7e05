// ticketry-bot/src/config.rs

use crate::errors::{BotError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use ticketry::DuplicatePolicy;

/// Who may use a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionMode {
  /// Nobody, the command always answers with a permission error.
  None,
  Everyone,
  /// Anyone the permission resolver grants at least support level.
  Admin,
  /// Members of this role id.
  Role(String),
}

impl FromStr for PermissionMode {
  type Err = BotError;

  fn from_str(value: &str) -> Result<Self> {
    match value.trim() {
      "" => Err(BotError::Configuration("Empty permission mode".to_string())),
      "none" => Ok(PermissionMode::None),
      "everyone" => Ok(PermissionMode::Everyone),
      "admin" => Ok(PermissionMode::Admin),
      role_id => Ok(PermissionMode::Role(role_id.to_string())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPermissions {
  pub delete: PermissionMode,
  pub priority: PermissionMode,
  pub transfer: PermissionMode,
  pub topic: PermissionMode,
  pub clear: PermissionMode,
}

impl Default for CommandPermissions {
  fn default() -> Self {
    Self {
      delete: PermissionMode::Admin,
      priority: PermissionMode::Admin,
      transfer: PermissionMode::Admin,
      topic: PermissionMode::Admin,
      clear: PermissionMode::Admin,
    }
  }
}

/// Which parts make up a ticket channel's topic line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTopicConfig {
  pub show_option_name: bool,
  pub show_option_description: bool,
  pub show_option_topic: bool,
  pub show_priority: bool,
  pub show_closed: bool,
  pub show_claimed: bool,
  pub show_pinned: bool,
  pub show_creator: bool,
  pub show_participants: bool,
}

impl Default for ChannelTopicConfig {
  fn default() -> Self {
    Self {
      show_option_name: true,
      show_option_description: false,
      show_option_topic: true,
      show_priority: true,
      show_closed: true,
      show_claimed: false,
      show_pinned: false,
      show_creator: true,
      show_participants: false,
    }
  }
}

/// Rate-limit pacing of the clear-tickets action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearPacing {
  pub batch_size: usize,
  pub item_delay: Duration,
  pub batch_delay: Duration,
}

impl Default for ClearPacing {
  fn default() -> Self {
    Self {
      batch_size: 10,
      item_delay: Duration::from_millis(2000),
      batch_delay: Duration::from_millis(45_000),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
  #[default]
  Pretty,
  Json,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
  /// Prefix of text commands (`!ticket priority get`).
  pub prefix: String,
  pub log_format: LogFormat,

  pub logs_enabled: bool,
  pub log_channel_id: Option<String>,
  /// Post deletions (and clears) to the log channel.
  pub log_deleting: bool,

  pub pin_emoji: String,
  /// User granted owner level everywhere.
  pub owner_id: Option<String>,
  pub global_admins: Vec<String>,
  pub permissions: CommandPermissions,

  pub admin_only_delete_without_transcript: bool,
  pub allow_close_before_message: bool,
  pub allow_close_before_admin_message: bool,

  pub clear: ClearPacing,
  pub rename_timeout: Duration,
  pub channel_topic: ChannelTopicConfig,

  pub duplicate_policy: DuplicatePolicy,
}

impl Default for BotConfig {
  fn default() -> Self {
    Self {
      prefix: "!ticket".to_string(),
      log_format: LogFormat::Pretty,
      logs_enabled: true,
      log_channel_id: None,
      log_deleting: true,
      pin_emoji: "📌".to_string(),
      owner_id: None,
      global_admins: Vec::new(),
      permissions: CommandPermissions::default(),
      admin_only_delete_without_transcript: true,
      allow_close_before_message: true,
      allow_close_before_admin_message: true,
      clear: ClearPacing::default(),
      rename_timeout: Duration::from_millis(2500),
      channel_topic: ChannelTopicConfig::default(),
      duplicate_policy: DuplicatePolicy::Reject,
    }
  }
}

impl BotConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|var_name| env::var(var_name).ok())
  }

  /// Builds the config from any `TICKETRY_*` lookup. Unset keys keep their defaults.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |key: &str| lookup(&format!("TICKETRY_{}", key)).filter(|v| !v.trim().is_empty());
    let defaults = Self::default();

    let parse_bool = |key: &str, default: bool| -> Result<bool> {
      match get_env(key) {
        None => Ok(default),
        Some(raw) => raw
          .trim()
          .parse::<bool>()
          .map_err(|e| BotError::Configuration(format!("Invalid TICKETRY_{} value '{}': {}", key, raw, e))),
      }
    };
    let parse_millis = |key: &str, default: Duration| -> Result<Duration> {
      match get_env(key) {
        None => Ok(default),
        Some(raw) => raw
          .trim()
          .parse::<u64>()
          .map(Duration::from_millis)
          .map_err(|e| BotError::Configuration(format!("Invalid TICKETRY_{} value '{}': {}", key, raw, e))),
      }
    };
    let parse_mode = |key: &str, default: &PermissionMode| -> Result<PermissionMode> {
      get_env(key).map_or_else(|| Ok(default.clone()), |raw| raw.parse())
    };

    let log_format = match get_env("LOG_FORMAT").as_deref().map(str::trim) {
      None | Some("pretty") => LogFormat::Pretty,
      Some("json") => LogFormat::Json,
      Some(other) => {
        return Err(BotError::Configuration(format!(
          "Invalid TICKETRY_LOG_FORMAT '{}', expected 'pretty' or 'json'",
          other
        )))
      }
    };

    let duplicate_policy = match get_env("DUPLICATE_POLICY").as_deref().map(str::trim) {
      None | Some("reject") => DuplicatePolicy::Reject,
      Some("replace") => DuplicatePolicy::Replace,
      Some(other) => {
        return Err(BotError::Configuration(format!(
          "Invalid TICKETRY_DUPLICATE_POLICY '{}', expected 'reject' or 'replace'",
          other
        )))
      }
    };

    let batch_size = match get_env("CLEAR_BATCH_SIZE") {
      None => defaults.clear.batch_size,
      Some(raw) => match raw.trim().parse::<usize>() {
        Ok(0) => return Err(BotError::Configuration("TICKETRY_CLEAR_BATCH_SIZE must be at least 1".to_string())),
        Ok(size) => size,
        Err(e) => {
          return Err(BotError::Configuration(format!(
            "Invalid TICKETRY_CLEAR_BATCH_SIZE '{}': {}",
            raw, e
          )))
        }
      },
    };

    let global_admins = get_env("GLOBAL_ADMINS")
      .map(|raw| {
        raw
          .split(',')
          .map(str::trim)
          .filter(|id| !id.is_empty())
          .map(String::from)
          .collect()
      })
      .unwrap_or_default();

    let topic_defaults = &defaults.channel_topic;
    let channel_topic = ChannelTopicConfig {
      show_option_name: parse_bool("TOPIC_SHOW_OPTION_NAME", topic_defaults.show_option_name)?,
      show_option_description: parse_bool("TOPIC_SHOW_OPTION_DESCRIPTION", topic_defaults.show_option_description)?,
      show_option_topic: parse_bool("TOPIC_SHOW_OPTION_TOPIC", topic_defaults.show_option_topic)?,
      show_priority: parse_bool("TOPIC_SHOW_PRIORITY", topic_defaults.show_priority)?,
      show_closed: parse_bool("TOPIC_SHOW_CLOSED", topic_defaults.show_closed)?,
      show_claimed: parse_bool("TOPIC_SHOW_CLAIMED", topic_defaults.show_claimed)?,
      show_pinned: parse_bool("TOPIC_SHOW_PINNED", topic_defaults.show_pinned)?,
      show_creator: parse_bool("TOPIC_SHOW_CREATOR", topic_defaults.show_creator)?,
      show_participants: parse_bool("TOPIC_SHOW_PARTICIPANTS", topic_defaults.show_participants)?,
    };

    let permission_defaults = &defaults.permissions;
    let permissions = CommandPermissions {
      delete: parse_mode("PERMISSION_DELETE", &permission_defaults.delete)?,
      priority: parse_mode("PERMISSION_PRIORITY", &permission_defaults.priority)?,
      transfer: parse_mode("PERMISSION_TRANSFER", &permission_defaults.transfer)?,
      topic: parse_mode("PERMISSION_TOPIC", &permission_defaults.topic)?,
      clear: parse_mode("PERMISSION_CLEAR", &permission_defaults.clear)?,
    };

    let config = Self {
      prefix: get_env("PREFIX").unwrap_or(defaults.prefix),
      log_format,
      logs_enabled: parse_bool("LOGS_ENABLED", defaults.logs_enabled)?,
      log_channel_id: get_env("LOG_CHANNEL_ID"),
      log_deleting: parse_bool("LOG_DELETING", defaults.log_deleting)?,
      pin_emoji: get_env("PIN_EMOJI").unwrap_or(defaults.pin_emoji),
      owner_id: get_env("OWNER_ID").filter(|id| !id.trim().is_empty()),
      global_admins,
      permissions,
      admin_only_delete_without_transcript: parse_bool(
        "ADMIN_ONLY_DELETE_WITHOUT_TRANSCRIPT",
        defaults.admin_only_delete_without_transcript,
      )?,
      allow_close_before_message: parse_bool("ALLOW_CLOSE_BEFORE_MESSAGE", defaults.allow_close_before_message)?,
      allow_close_before_admin_message: parse_bool(
        "ALLOW_CLOSE_BEFORE_ADMIN_MESSAGE",
        defaults.allow_close_before_admin_message,
      )?,
      clear: ClearPacing {
        batch_size,
        item_delay: parse_millis("CLEAR_ITEM_DELAY_MS", defaults.clear.item_delay)?,
        batch_delay: parse_millis("CLEAR_BATCH_DELAY_MS", defaults.clear.batch_delay)?,
      },
      rename_timeout: parse_millis("RENAME_TIMEOUT_MS", defaults.rename_timeout)?,
      channel_topic,
      duplicate_policy,
    };

    tracing::info!("Bot configuration loaded successfully.");
    tracing::debug!(
      prefix = %config.prefix,
      global_admins = config.global_admins.len(),
      log_channel = ?config.log_channel_id,
      "Loaded config details"
    );
    Ok(config)
  }

  /// The log channel, when logging to a channel is enabled and configured.
  pub fn log_channel(&self) -> Option<&str> {
    if self.logs_enabled {
      self.log_channel_id.as_deref()
    } else {
      None
    }
  }
}
