// tests/priority_tests.rs
mod common;

use common::*;
use serial_test::serial;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use ticketry::{RunOutcome, Worker, WorkerContext, WorkerControl};
use ticketry_bot::actions::contexts::{PriorityInstance, UpdatePriorityParams};
use ticketry_bot::models::ticket::Ticket;
use ticketry_bot::services::client::{ClientCall, InteractionResponse};
use ticketry_bot::services::store::Store;
use ticketry_bot::{BotError, EventId, TicketEvent};

fn params(fixture: &Fixture, ticket: &Arc<Ticket>, raw_name: &str, send_message: bool) -> UpdatePriorityParams {
  UpdatePriorityParams {
    bot: fixture.bot.clone(),
    guild: guild(),
    channel: ticket_channel(fixture, &ticket.id()),
    user: admin(),
    ticket: ticket.clone(),
    new_priority: fixture.bot.priorities.by_raw_name(raw_name).unwrap(),
    reason: Some("outage".to_string()),
    send_message,
  }
}

#[tokio::test]
async fn test_set_priority_renames_channel_and_refreshes_topic() {
  setup_tracing();
  let fx = fixture();
  let ticket = open_ticket(&fx, "t1", &customer()).await;

  let run = fx
    .bot
    .actions
    .update_ticket_priority
    .run("slash", params(&fx, &ticket, "urgent", true))
    .await
    .unwrap();

  assert_eq!(run.outcome, RunOutcome::Completed);
  assert_eq!(run.instance.read().renamed, Some(true));
  assert_eq!(run.instance.read().old_priority.as_ref().unwrap().raw_name, "none");
  assert_eq!(ticket.read().priority, 5);
  assert!(!ticket.is_busy());
  assert_eq!(ticket_channel(&fx, "t1").name, "🔴support-bob");

  let topics = fx.client.calls_to("set_topic");
  assert_eq!(topics.len(), 1);
  match &topics[0] {
    ClientCall::SetTopic { topic, .. } => {
      assert!(topic.contains("**Priority:** 🔴 Urgent"), "topic was {}", topic);
      assert!(topic.contains("**Creator:** <@user-1>"));
    }
    other => panic!("unexpected call {:?}", other),
  }

  let in_ticket = fx.client.sent_to("t1");
  assert_eq!(in_ticket.len(), 1);
  assert!(in_ticket[0].content.contains("priority-set via slash"));
  let logged = fx.client.sent_to(LOG_CHANNEL);
  assert_eq!(logged.len(), 1);
  assert!(logged[0].content.contains("reason: outage"));

  let stored = fx.store.get("tickets", "t1").await.unwrap().unwrap();
  assert_eq!(stored["priority"], 5);
}

#[tokio::test]
async fn test_pinned_ticket_keeps_pin_before_priority_emoji() {
  setup_tracing();
  let fx = fixture();
  let ticket = open_ticket(&fx, "t1", &customer()).await;
  ticket.update(|data| data.pinned = true);

  fx.bot
    .actions
    .update_ticket_priority
    .run("slash", params(&fx, &ticket, "low", false))
    .await
    .unwrap();

  assert_eq!(ticket_channel(&fx, "t1").name, "📌🔵support-bob");
  assert!(fx.client.sent_to("t1").is_empty());
}

#[tokio::test]
#[serial]
async fn test_slow_rename_falls_back_to_error_message() {
  setup_tracing();
  let mut config = test_config();
  config.rename_timeout = Duration::from_millis(50);
  let fx = fixture_with(config);
  fx.client.set_rename_delay(Duration::from_millis(300));
  let ticket = open_ticket(&fx, "t1", &customer()).await;

  let run = fx
    .bot
    .actions
    .update_ticket_priority
    .run("slash", params(&fx, &ticket, "urgent", false))
    .await
    .unwrap();

  assert_eq!(run.instance.read().renamed, Some(false));
  assert!(!ticket.is_busy());
  let in_ticket = fx.client.sent_to("t1");
  assert_eq!(in_ticket.len(), 1);
  assert!(in_ticket[0].content.starts_with("**Failed to rename channel**"));
  assert!(in_ticket[0].content.contains("newName: 🔴support-bob"));
  assert_eq!(ticket_channel(&fx, "t1").name, "support-bob");

  // the rename itself was not aborted
  tokio::time::sleep(Duration::from_millis(400)).await;
  assert_eq!(ticket_channel(&fx, "t1").name, "🔴support-bob");
}

#[tokio::test]
#[serial]
async fn test_overlapping_run_is_refused_while_ticket_is_busy() {
  setup_tracing();
  let mut config = test_config();
  config.rename_timeout = Duration::from_secs(2);
  let fx = fixture_with(config);
  fx.client.set_rename_delay(Duration::from_millis(300));
  let ticket = open_ticket(&fx, "t1", &customer()).await;

  let bot = fx.bot.clone();
  let first_params = params(&fx, &ticket, "urgent", false);
  let first = tokio::spawn(async move { bot.actions.update_ticket_priority.run("slash", first_params).await });
  tokio::time::sleep(Duration::from_millis(100)).await;
  assert!(ticket.is_busy());

  let second = fx
    .bot
    .actions
    .update_ticket_priority
    .run("slash", params(&fx, &ticket, "low", false))
    .await;
  assert!(matches!(second, Err(BotError::Precondition(_))));
  // the refused run must not clear the flag the first run still holds
  assert!(ticket.is_busy());
  assert_eq!(ticket.read().priority, 5);

  let run = first.await.unwrap().unwrap();
  assert_eq!(run.outcome, RunOutcome::Completed);
  assert!(!ticket.is_busy());
  assert_eq!(ticket.read().priority, 5);
}

#[tokio::test]
async fn test_threads_are_rejected() {
  setup_tracing();
  let fx = fixture();
  let ticket = open_ticket(&fx, "t1", &customer()).await;
  let mut params = params(&fx, &ticket, "high", false);
  params.channel = thread("t1");

  let err = fx.bot.actions.update_ticket_priority.run("slash", params).await.unwrap_err();

  assert!(matches!(err, BotError::Precondition(_)));
  assert_eq!(ticket.read().priority, -1);
  assert!(fx.client.calls_to("rename_channel").is_empty());
}

#[tokio::test]
async fn test_failed_message_stops_the_run_and_clears_busy() {
  setup_tracing();
  let fx = fixture();
  fx.client.fail_method("send_message");
  let ticket = open_ticket(&fx, "t1", &customer()).await;

  let err = fx
    .bot
    .actions
    .update_ticket_priority
    .run("slash", params(&fx, &ticket, "urgent", true))
    .await
    .unwrap_err();

  assert!(matches!(err, BotError::ExternalService(_)));
  assert!(!ticket.is_busy());
  // neither the nested topic refresh nor the log workers ran
  assert!(fx.client.calls_to("set_topic").is_empty());
}

#[tokio::test]
async fn test_backup_worker_clears_busy_left_by_a_failing_plugin() {
  setup_tracing();
  let fx = unfrozen_fixture(test_config());
  fx.bot
    .actions
    .update_ticket_priority
    .workers()
    .add(Worker::new(
      "plugin:lock-and-fail",
      3,
      |ctx: WorkerContext<PriorityInstance, UpdatePriorityParams>| async move {
        std::mem::forget(ctx.params.ticket.busy().try_hold().unwrap());
        Err::<WorkerControl, _>(BotError::Precondition("plugin gave up".to_string()))
      },
    ))
    .unwrap();
  fx.bot.freeze();
  let ticket = open_ticket(&fx, "t1", &customer()).await;

  let result = fx
    .bot
    .actions
    .update_ticket_priority
    .run("slash", params(&fx, &ticket, "urgent", false))
    .await;

  assert!(matches!(result, Err(BotError::Precondition(_))));
  assert!(!ticket.is_busy());
  assert_eq!(ticket.read().priority, -1);
}

#[tokio::test]
async fn test_plugin_can_cancel_before_the_main_worker() {
  setup_tracing();
  let fx = unfrozen_fixture(test_config());
  fx.bot
    .actions
    .update_ticket_priority
    .workers()
    .add(Worker::new(
      "plugin:no-urgent",
      3,
      |ctx: WorkerContext<PriorityInstance, UpdatePriorityParams>| async move {
        if ctx.params.new_priority.raw_name == "urgent" {
          return Ok::<_, BotError>(WorkerControl::Cancel);
        }
        Ok(WorkerControl::Continue)
      },
    ))
    .unwrap();
  fx.bot.freeze();
  let ticket = open_ticket(&fx, "t1", &customer()).await;

  let run = fx
    .bot
    .actions
    .update_ticket_priority
    .run("slash", params(&fx, &ticket, "urgent", false))
    .await
    .unwrap();

  assert!(run.is_cancelled());
  assert_eq!(ticket.read().priority, -1);
  assert!(fx.client.calls().iter().all(|call| call.method() != "rename_channel"));
}

#[tokio::test]
async fn test_events_fire_around_the_change_and_can_veto() {
  setup_tracing();
  let fx = fixture();
  let ticket = open_ticket(&fx, "t1", &customer()).await;
  let journal = Arc::new(Mutex::new(Vec::<String>::new()));

  let on_journal = journal.clone();
  fx.bot
    .events
    .get(&EventId::OnTicketPriorityChange)
    .unwrap()
    .listen(move |args: Arc<TicketEvent>| {
      let journal = on_journal.clone();
      async move {
        if let TicketEvent::PriorityChange {
          old_priority,
          new_priority,
          ..
        } = &*args
        {
          journal
            .lock()
            .unwrap()
            .push(format!("on {}->{}", old_priority.raw_name, new_priority.raw_name));
          if new_priority.raw_name == "very-low" {
            return Err(BotError::Precondition("vetoed".to_string()));
          }
        }
        Ok(())
      }
    });
  let after_journal = journal.clone();
  fx.bot
    .events
    .get(&EventId::AfterTicketPriorityChanged)
    .unwrap()
    .listen(move |_args: Arc<TicketEvent>| {
      let journal = after_journal.clone();
      async move {
        journal.lock().unwrap().push("after".to_string());
        Ok::<_, BotError>(())
      }
    });

  fx.bot
    .actions
    .update_ticket_priority
    .run("slash", params(&fx, &ticket, "high", false))
    .await
    .unwrap();
  let vetoed = fx
    .bot
    .actions
    .update_ticket_priority
    .run("slash", params(&fx, &ticket, "very-low", false))
    .await;

  assert!(vetoed.is_err());
  assert_eq!(ticket.read().priority, 3);
  assert!(!ticket.is_busy());
  assert_eq!(
    *journal.lock().unwrap(),
    vec!["on none->high", "after", "on high->very-low"]
  );
}

#[tokio::test]
async fn test_priority_commands() {
  setup_tracing();
  let fx = fixture();
  let ticket = open_ticket(&fx, "t1", &customer()).await;
  let channel = ticket_channel(&fx, "t1");

  let set = command(
    "i1",
    "priority",
    Some("set"),
    &[("priority", string("high")), ("reason", string("vip"))],
    channel.clone(),
  );
  let run = fx.bot.handle_command(set).await.unwrap().unwrap();
  assert_eq!(run.outcome, RunOutcome::Completed);
  assert_eq!(ticket.read().priority, 3);
  let responses = fx.client.responses_to("i1");
  assert_eq!(responses.len(), 2);
  assert_eq!(responses[0], InteractionResponse::Defer { ephemeral: false });
  match &responses[1] {
    InteractionResponse::Reply(message) => {
      assert!(message.content.contains("priority: 🟡 High"));
      assert!(message.content.contains("reason: vip"));
    }
    other => panic!("unexpected response {:?}", other),
  }

  let get = command("i2", "priority", Some("get"), &[], ticket_channel(&fx, "t1"));
  fx.bot.handle_command(get).await.unwrap();
  match fx.client.responses_to("i2").as_slice() {
    [InteractionResponse::Reply(message)] => assert!(message.content.contains("priority-get")),
    other => panic!("unexpected responses {:?}", other),
  }

  let unknown = command("i3", "priority", Some("set"), &[("priority", string("critical"))], channel);
  let run = fx.bot.handle_command(unknown).await.unwrap().unwrap();
  assert!(run.is_cancelled());
  match fx.client.responses_to("i3").as_slice() {
    [InteractionResponse::Reply(message)] => {
      assert!(message.ephemeral);
      assert!(message.content.starts_with("**Unknown Priority Level**"));
    }
    other => panic!("unexpected responses {:?}", other),
  }
  assert_eq!(ticket.read().priority, 3);
}
