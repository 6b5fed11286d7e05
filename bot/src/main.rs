// ticketry-bot/src/main.rs

use std::sync::Arc;
use ticketry_bot::config::LogFormat;
use ticketry_bot::services::client::MemoryClient;
use ticketry_bot::services::store::MemoryStore;
use ticketry_bot::{Bot, BotConfig, IncomingTrigger, Services};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt().with_env_filter(filter);
  match format {
    LogFormat::Pretty => builder.init(),
    LogFormat::Json => builder.json().init(),
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let config = BotConfig::from_env()?;
  init_tracing(config.log_format);
  tracing::info!(prefix = %config.prefix, "Starting ticket bot console adapter...");

  let services = Services::in_memory(Arc::new(MemoryClient::new()), Arc::new(MemoryStore::new()));
  let bot = Bot::new(config, services)?;
  let loaded = bot.tickets.load().await?;
  bot.freeze();
  tracing::info!(tickets = loaded, "Bot ready, reading triggers from stdin (one JSON object per line).");

  let mut in_flight = Vec::new();
  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  while let Some(line) = lines.next_line().await? {
    let line = line.trim();
    if line.is_empty() {
      continue;
    }
    let incoming: IncomingTrigger = match serde_json::from_str(line) {
      Ok(incoming) => incoming,
      Err(e) => {
        tracing::warn!(error = %e, "Skipping malformed trigger.");
        continue;
      }
    };
    in_flight.retain(|task: &tokio::task::JoinHandle<()>| !task.is_finished());
    in_flight.push(bot.spawn_handle(incoming));
  }

  tracing::info!(pending = in_flight.len(), "Input closed, waiting for running triggers.");
  for task in in_flight {
    if let Err(e) = task.await {
      tracing::error!(error = %e, "Trigger task panicked.");
    }
  }
  tracing::info!("Shutting down.");
  Ok(())
}
