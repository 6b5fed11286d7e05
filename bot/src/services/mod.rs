// ticketry-bot/src/services/mod.rs

//! External collaborators the bot talks to, each with an in-memory implementation.

pub mod builder;
pub mod client;
pub mod permissions;
pub mod store;
pub mod translations;
