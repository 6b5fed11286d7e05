// ticketry-bot/src/models/mod.rs

pub mod platform;
pub mod priority;
pub mod ticket;
