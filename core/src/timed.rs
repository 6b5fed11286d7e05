// ticketry/src/timed.rs

//! Opt-in bounded waits for externally rate-limited calls.

use crate::error::{TicketryError, TicketryResult};
use std::future::Future;
use std::time::Duration;
use tracing::{event, Level};

/// Races `operation` against `limit`.
///
/// The operation is spawned onto the current tokio runtime. When the deadline
/// passes first, `TicketryError::Timeout` is returned and the operation keeps
/// running in the background; it is not cancelled. A panic inside the
/// operation surfaces as `TicketryError::Internal`.
pub async fn timed_await<F, T>(operation: &str, limit: Duration, fut: F) -> TicketryResult<T>
where
  F: Future<Output = T> + Send + 'static,
  T: Send + 'static,
{
  let handle = tokio::spawn(fut);
  match tokio::time::timeout(limit, handle).await {
    Ok(Ok(value)) => Ok(value),
    Ok(Err(join_err)) => {
      event!(Level::ERROR, %operation, error = %join_err, "Timed operation aborted.");
      Err(TicketryError::Internal(format!("operation '{}' aborted: {}", operation, join_err)))
    }
    Err(_) => {
      // dropping the JoinHandle detaches the task
      event!(Level::WARN, %operation, ?limit, "Timed operation exceeded its deadline.");
      Err(TicketryError::Timeout {
        operation: operation.to_string(),
        limit,
      })
    }
  }
}
