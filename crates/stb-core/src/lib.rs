//! Core domain + application logic for the support ticket bot.
//!
//! This crate is framework-agnostic. The chat platform, the ticket database and
//! the transcript renderer live behind ports (traits); adapter crates implement them.

pub mod command;
pub mod config;
pub mod cooldown;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod permissions;
pub mod resolver;
pub mod tickets;
pub mod transcript;
pub mod utils;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
