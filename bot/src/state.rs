// ticketry-bot/src/state.rs

//! The shared `Bot` every worker reaches through its params.

use crate::actions::Actions;
use crate::config::BotConfig;
use crate::errors::Result;
use crate::events::{ticket_events, TicketEvents};
use crate::models::priority::PriorityLevels;
use crate::models::ticket::Tickets;
use crate::responders::Responders;
use crate::services::builder::{MessageBuilder, PlainBuilder};
use crate::services::client::{ChatClient, MemoryClient};
use crate::services::permissions::{ConfigPermissions, PermissionResolver};
use crate::services::store::{MemoryStore, Store};
use crate::services::translations::{StaticTranslations, Translations};
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// External collaborators the bot is built from.
pub struct Services {
  pub client: Arc<dyn ChatClient>,
  pub store: Arc<dyn Store>,
  pub translations: Arc<dyn Translations>,
  pub builder: Arc<dyn MessageBuilder>,
  /// `None` uses `ConfigPermissions` over the bot's own config and tickets.
  pub permissions: Option<Arc<dyn PermissionResolver>>,
}

impl Services {
  /// In-memory collaborators with English strings and plain messages.
  pub fn in_memory(client: Arc<MemoryClient>, store: Arc<MemoryStore>) -> Self {
    Self {
      client,
      store,
      translations: Arc::new(StaticTranslations::english()),
      builder: Arc::new(PlainBuilder),
      permissions: None,
    }
  }
}

pub struct Bot {
  pub config: Arc<BotConfig>,
  pub client: Arc<dyn ChatClient>,
  pub store: Arc<dyn Store>,
  pub translations: Arc<dyn Translations>,
  pub builder: Arc<dyn MessageBuilder>,
  pub permissions: Arc<dyn PermissionResolver>,
  pub tickets: Arc<Tickets>,
  pub priorities: PriorityLevels,
  pub events: TicketEvents,
  pub actions: Actions,
  pub responders: Responders,
}

impl Bot {
  /// Builds the bot and registers every built-in action, responder, event
  /// and priority level. Nothing is frozen yet, so callers can still add,
  /// remove or replace workers before calling `freeze`.
  #[instrument(name = "Bot::new", skip_all, err(Display))]
  pub fn new(config: BotConfig, services: Services) -> Result<Arc<Self>> {
    let config = Arc::new(config);
    let policy = config.duplicate_policy;
    let tickets = Arc::new(Tickets::new(services.store.clone()));
    let permissions: Arc<dyn PermissionResolver> = match services.permissions {
      Some(permissions) => permissions,
      None => Arc::new(ConfigPermissions::new(config.clone(), tickets.clone())),
    };

    let priorities = PriorityLevels::with_defaults(policy, services.translations.as_ref())?;
    let events = ticket_events(policy)?;

    let actions = Actions::new();
    actions.register()?;
    let responders = Responders::new(policy);
    responders.register()?;

    event!(
      Level::INFO,
      actions = actions.ids().len(),
      commands = responders.commands.registry().len(),
      buttons = responders.buttons.registry().len(),
      modals = responders.modals.registry().len(),
      "Bot built."
    );

    Ok(Arc::new(Self {
      config,
      client: services.client,
      store: services.store,
      translations: services.translations,
      builder: services.builder,
      permissions,
      tickets,
      priorities,
      events,
      actions,
      responders,
    }))
  }

  /// Freezes every worker set. Call once all plugins have registered.
  pub fn freeze(&self) {
    self.actions.freeze();
    self.responders.freeze();
    event!(Level::INFO, "All worker sets frozen.");
  }
}
