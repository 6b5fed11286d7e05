// src/lib.rs

//! Ticketry: the action and worker dispatch engine behind a chat ticket bot.
//!
//! Every user-facing operation (slash command, button press, modal
//! submission, scheduled cleanup) is an `Action` built from prioritized
//! `Worker`s:
//!  - Workers run one at a time, highest priority first, ties in registration order.
//!  - Any worker may end the run early by returning `WorkerControl::Cancel`.
//!  - When a worker fails, the worker set's backup worker runs once before
//!    the error reaches the caller, so shared state (a ticket's busy flag) is restored.
//!  - Worker sets stay mutable during startup so plugins can insert stages,
//!    then get frozen.
//!  - `Responder`s bind actions to triggers (exact command names, id patterns).
//!  - `EventBus` fans notifications out to listeners, sequentially.
//!  - `Registry` maps typed ids to all of the above.

pub mod action;
pub mod core;
pub mod error;
pub mod event;
pub mod registry;
pub mod timed;

// --- Re-exports for the Public API ---

pub use crate::core::control::{RunOutcome, WorkerControl};
pub use crate::core::instance::Instance;
pub use crate::core::source::Source;
pub use crate::core::worker::{Worker, WorkerContext};

pub use crate::action::{Action, ActionRun, Matcher, Responder, ResponderRegistry, Trigger, WorkerSet};

pub use crate::event::{Event, EventBus};

pub use crate::error::{TicketryError, TicketryResult};

pub use crate::registry::{DuplicatePolicy, Keyed, Registry};

pub use crate::timed::timed_await;

/*
    Typical startup:
    1. Create the registries (`Registry`, `ResponderRegistry`, `EventBus`) once.
    2. Register actions and responders; add workers with `workers().add(...)`
       and a backup with `workers().set_backup(...)`.
    3. Let plugins add, remove or replace workers.
    4. Freeze every worker set.
    5. Feed incoming triggers to `ResponderRegistry::dispatch`.
*/
