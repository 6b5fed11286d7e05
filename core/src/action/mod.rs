// ticketry/src/action/mod.rs

//! Worker sets, actions and responders: definition, mutation and execution.

pub mod definition;
pub mod execution;
pub mod responder;
pub mod worker_set;

pub use definition::{Action, ActionRun};
pub use responder::{InstanceFactory, Matcher, Responder, ResponderRegistry, Trigger};
pub use worker_set::WorkerSet;
