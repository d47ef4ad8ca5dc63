//! Outbound messaging abstractions (Telegram today).

pub mod notice;
pub mod port;
pub mod throttled;
