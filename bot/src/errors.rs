// ticketry-bot/src/errors.rs

use thiserror::Error;
use ticketry::TicketryError;

/// Error type shared by every action, responder and event listener of the bot.
///
/// Recoverable classes (`PermissionDenied`, `Precondition`) are normally
/// answered inside a worker with a reply plus `WorkerControl::Cancel`; they
/// only surface here when a worker chooses to fail instead.
#[derive(Debug, Error)]
pub enum BotError {
  #[error("Configuration Error: {0}")]
  Configuration(String),

  #[error("Permission Denied: {0}")]
  PermissionDenied(String),

  #[error("Precondition Failed: {0}")]
  Precondition(String),

  #[error("External Service Error: {0}")]
  ExternalService(String),

  #[error("Ticketry Engine Error: {source}")]
  Engine {
    #[from] // Allows conversion from ticketry::TicketryError
    source: TicketryError,
  },

  #[error("Store Error: {0}")]
  Store(String),

  #[error("Serialization Error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("Unexpected Failure: {0}")]
  Unexpected(anyhow::Error),
}

// Lets workers use `?` on anyhow::Result helpers.
impl From<anyhow::Error> for BotError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<TicketryError>() {
      Ok(source) => BotError::Engine { source },
      Err(err) => BotError::Unexpected(err),
    }
  }
}

impl BotError {
  /// A missing registry entry is a startup mistake, not a runtime condition.
  pub fn is_configuration(&self) -> bool {
    match self {
      BotError::Configuration(_) => true,
      BotError::Engine { source } => source.is_not_found(),
      _ => false,
    }
  }

  /// Conditions a worker can answer with a localized reply.
  pub fn is_recoverable(&self) -> bool {
    matches!(
      self,
      BotError::PermissionDenied(_) | BotError::Precondition(_) | BotError::ExternalService(_)
    )
  }

  /// Short label used in log fields.
  pub fn kind(&self) -> &'static str {
    match self {
      BotError::Configuration(_) => "configuration",
      BotError::PermissionDenied(_) => "permission-denied",
      BotError::Precondition(_) => "precondition",
      BotError::ExternalService(_) => "external-service",
      BotError::Engine { .. } if self.is_configuration() => "configuration",
      BotError::Engine { .. } => "engine",
      BotError::Store(_) => "store",
      BotError::Serialization(_) => "serialization",
      BotError::Unexpected(_) => "unexpected",
    }
  }
}

// Define a Result type alias for the bot
pub type Result<T, E = BotError> = std::result::Result<T, E>;
