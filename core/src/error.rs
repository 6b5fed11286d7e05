// ticketry/src/error.rs
use anyhow::Error as AnyhowError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TicketryError {
  #[error("Id '{id}' already exists in the {registry} registry")]
  DuplicateId { registry: String, id: String },

  #[error("Id '{id}' not found in the {registry} registry")]
  NotFound { registry: String, id: String },

  #[error("Worker set of '{owner}' is frozen; cannot {operation} worker '{worker_id}'")]
  WorkerSetFrozen {
    owner: String,
    worker_id: String,
    operation: &'static str,
  },

  #[error("Invalid responder pattern '{pattern}'. Source: {source}")]
  InvalidPattern {
    pattern: String,
    #[source]
    source: regex::Error,
  },

  #[error("Operation '{operation}' did not finish within {limit:?}")]
  Timeout { operation: String, limit: Duration },

  #[error("Worker '{worker_id}' of '{owner}' panicked: {message}")]
  WorkerPanicked {
    owner: String,
    worker_id: String,
    message: String,
  },

  #[error("Error in user-provided worker or external operation. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal ticketry error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for TicketryError {
  fn from(err: AnyhowError) -> Self {
    // An anyhow error that already wraps a TicketryError is kept wrapped, not flattened.
    TicketryError::HandlerError { source: err }
  }
}

impl TicketryError {
  /// True for the registry lookup failure, which callers treat as a configuration error.
  pub fn is_not_found(&self) -> bool {
    matches!(self, TicketryError::NotFound { .. })
  }
}

pub type TicketryResult<T, E = TicketryError> = std::result::Result<T, E>;
