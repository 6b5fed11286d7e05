// ticketry-bot/src/lib.rs

//! A chat ticket bot built on the `ticketry` dispatch engine.
//!
//! Commands, buttons and modals are `Responder`s; the work they trigger
//! (priority, topic, transfer, delete, clear) lives in typed `Action`s that
//! plugins can extend with extra workers before the bot is frozen.

pub mod actions;
pub mod config;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod models;
pub mod responders;
pub mod services;
pub mod state;

pub use crate::config::BotConfig;
pub use crate::errors::{BotError, Result};
pub use crate::events::{EventId, TicketEvent};
pub use crate::handlers::IncomingTrigger;
pub use crate::state::{Bot, Services};
