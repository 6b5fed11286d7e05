// ticketry/examples/basic_action.rs

use ticketry::{Action, TicketryError, Worker, WorkerContext, WorkerControl};
use tracing::info;

// 1. The per-run instance workers share
#[derive(Clone, Debug, Default)]
struct RenameInstance {
  steps: Vec<String>,
  channel_name: String,
}

// 2. The params the caller passes to `run`
#[derive(Clone, Debug)]
struct RenameParams {
  ticket: String,
  emoji: &'static str,
}

#[tokio::main]
async fn main() -> Result<(), TicketryError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Basic Action Example ---");

  // 3. Action<Instance, Params, Err> where Err must be From<TicketryError>
  let action = Action::<RenameInstance, RenameParams, TicketryError>::new("update-ticket-priority");

  // 4. Workers run highest priority first
  action.workers().add(Worker::new(
    "update-ticket-priority:logs",
    -1,
    |ctx: WorkerContext<RenameInstance, RenameParams>| async move {
      let name = ctx.instance.read().channel_name.clone();
      info!(source = %ctx.source, "Logged rename to '{}'", name);
      ctx.instance.write().steps.push("logs".to_string());
      Ok::<_, TicketryError>(WorkerControl::Continue)
    },
  ))?;

  action.workers().add(Worker::new(
    "update-ticket-priority:ticket-priority",
    0,
    |ctx: WorkerContext<RenameInstance, RenameParams>| async move {
      let mut instance = ctx.instance.write();
      instance.channel_name = format!("{}{}", ctx.params.emoji, ctx.params.ticket);
      instance.steps.push("rename".to_string());
      Ok::<_, TicketryError>(WorkerControl::Continue)
    },
  ))?;

  // 5. A plugin can slot a stage in between before the set is frozen
  action.workers().add(Worker::new(
    "plugin:uppercase",
    0,
    |ctx: WorkerContext<RenameInstance, RenameParams>| async move {
      let mut instance = ctx.instance.write();
      instance.channel_name = instance.channel_name.to_uppercase();
      instance.steps.push("plugin".to_string());
      Ok::<_, TicketryError>(WorkerControl::Continue)
    },
  ))?;
  action.freeze();

  let params = RenameParams {
    ticket: "ticket-0042".to_string(),
    emoji: "🔴",
  };
  let run = action.run("slash", params).await?;

  let instance = run.instance.read();
  info!("Outcome: {:?}", run.outcome);
  info!("Steps: {:?}", instance.steps);
  info!("Channel name: {}", instance.channel_name);
  assert_eq!(instance.steps, vec!["rename", "plugin", "logs"]);
  assert_eq!(instance.channel_name, "🔴TICKET-0042");

  Ok(())
}
