// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use ticketry_bot::config::{ClearPacing, PermissionMode};
use ticketry_bot::models::platform::{Channel, ChannelKind, Guild, Member, User};
use ticketry_bot::models::ticket::{SuffixMode, Ticket, TicketData, TicketOption};
use ticketry_bot::responders::common::{ButtonTrigger, CommandTrigger, CommandVia, ModalTrigger, OptionValue};
use ticketry_bot::services::client::MemoryClient;
use ticketry_bot::services::store::MemoryStore;
use ticketry_bot::{Bot, BotConfig, Services};
use tracing::Level;

pub const GUILD_ID: &str = "guild-1";
pub const ADMIN_ROLE: &str = "role-admin";
pub const SUPPORT_ROLE: &str = "role-support";
pub const LOG_CHANNEL: &str = "logs";

pub struct Fixture {
  pub bot: Arc<Bot>,
  pub client: Arc<MemoryClient>,
  pub store: Arc<MemoryStore>,
}

/// Config with a log channel, one global admin role and no clear pacing delays.
pub fn test_config() -> BotConfig {
  BotConfig {
    log_channel_id: Some(LOG_CHANNEL.to_string()),
    global_admins: vec![ADMIN_ROLE.to_string()],
    clear: ClearPacing {
      batch_size: 2,
      item_delay: Duration::ZERO,
      batch_delay: Duration::ZERO,
    },
    rename_timeout: Duration::from_millis(200),
    ..BotConfig::default()
  }
}

/// A bot whose worker sets are still open for plugins.
pub fn unfrozen_fixture(config: BotConfig) -> Fixture {
  let client = Arc::new(MemoryClient::new());
  let store = Arc::new(MemoryStore::new());
  client.add_channel(Channel::text(LOG_CHANNEL, "logs"));
  let bot = Bot::new(config, Services::in_memory(client.clone(), store.clone())).unwrap();
  Fixture { bot, client, store }
}

pub fn fixture_with(config: BotConfig) -> Fixture {
  let fixture = unfrozen_fixture(config);
  fixture.bot.freeze();
  fixture
}

pub fn fixture() -> Fixture {
  fixture_with(test_config())
}

pub fn guild() -> Guild {
  Guild {
    id: GUILD_ID.to_string(),
    name: "Test Server".to_string(),
    everyone_role: GUILD_ID.to_string(),
  }
}

pub fn admin() -> User {
  User::new("admin-1", "alice")
}

pub fn admin_member() -> Member {
  Member {
    user_id: "admin-1".to_string(),
    roles: vec![ADMIN_ROLE.to_string()],
  }
}

pub fn customer() -> User {
  User::new("user-1", "bob")
}

pub fn customer_member() -> Member {
  Member {
    user_id: "user-1".to_string(),
    roles: vec![],
  }
}

pub fn support_option() -> TicketOption {
  TicketOption {
    id: "support".to_string(),
    name: "Support".to_string(),
    description: "General help".to_string(),
    channel_prefix: "support-".to_string(),
    channel_suffix: SuffixMode::UserName,
    admins: vec![SUPPORT_ROLE.to_string()],
    readonly_admins: vec!["role-readonly".to_string()],
  }
}

/// Registers a ticket channel `support-<creator>` with id `channel_id`.
pub async fn open_ticket(fixture: &Fixture, channel_id: &str, creator: &User) -> Arc<Ticket> {
  let name = format!("support-{}", creator.username);
  fixture.client.add_channel(Channel::text(channel_id, name.clone()));
  fixture
    .bot
    .tickets
    .add(TicketData::open(channel_id, support_option(), &creator.id, creator.username.clone()))
    .await
    .unwrap()
}

pub fn ticket_channel(fixture: &Fixture, channel_id: &str) -> Channel {
  fixture.client.channel(channel_id).unwrap()
}

pub fn thread(channel_id: &str) -> Channel {
  Channel {
    id: channel_id.to_string(),
    name: "thread".to_string(),
    kind: ChannelKind::Thread,
  }
}

/// A slash command sent by the admin in `channel_id`.
pub fn command(
  interaction_id: &str,
  name: &str,
  subcommand: Option<&str>,
  options: &[(&str, OptionValue)],
  channel: Channel,
) -> CommandTrigger {
  CommandTrigger {
    interaction_id: interaction_id.to_string(),
    name: name.to_string(),
    subcommand: subcommand.map(String::from),
    options: options.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
    via: CommandVia::Slash,
    guild: Some(guild()),
    channel,
    user: admin(),
    member: Some(admin_member()),
  }
}

pub fn as_customer(mut trigger: CommandTrigger) -> CommandTrigger {
  trigger.user = customer();
  trigger.member = Some(customer_member());
  trigger
}

pub fn string(value: &str) -> OptionValue {
  OptionValue::Str(value.to_string())
}

pub fn button(interaction_id: &str, custom_id: &str, channel: Channel) -> ButtonTrigger {
  ButtonTrigger {
    interaction_id: interaction_id.to_string(),
    custom_id: custom_id.to_string(),
    guild: Some(guild()),
    channel,
    user: admin(),
    member: Some(admin_member()),
  }
}

pub fn modal(interaction_id: &str, custom_id: &str, channel: Channel, fields: &[(&str, &str)]) -> ModalTrigger {
  ModalTrigger {
    interaction_id: interaction_id.to_string(),
    custom_id: custom_id.to_string(),
    guild: Some(guild()),
    channel,
    user: admin(),
    member: Some(admin_member()),
    fields: fields
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect::<HashMap<_, _>>(),
  }
}

pub fn everyone_may(config: &mut BotConfig) {
  config.permissions.delete = PermissionMode::Everyone;
  config.permissions.priority = PermissionMode::Everyone;
  config.permissions.transfer = PermissionMode::Everyone;
  config.permissions.topic = PermissionMode::Everyone;
  config.permissions.clear = PermissionMode::Everyone;
}

/// Polls until `condition` holds, for work spawned in the background.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
  for _ in 0..100 {
    if condition() {
      return;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  panic!("condition not met in time");
}

// --- Helper for Tracing Setup ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
