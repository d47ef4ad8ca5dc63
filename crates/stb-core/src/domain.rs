use std::fmt;

use serde::{Deserialize, Serialize};

/// Platform user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// The private conversation with this user.
    ///
    /// On Telegram a user's private chat shares the user's numeric id.
    pub fn private_chat(self) -> ChatId {
        ChatId(self.0)
    }
}

/// Platform chat id (numeric). Tickets are bound to one chat each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

/// Platform message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a sent message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Ticket number, unique across the open and closed partitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub u32);

impl fmt::Display for TicketId {
    /// Tickets are always shown zero-padded to five digits (`00042`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:05}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketState {
    Open,
    Closed,
}

/// A support ticket as read from the store. The core never mutates tickets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub id: TicketId,
    pub channel: ChatId,
    pub creator: UserId,
    pub state: TicketState,
}

impl Ticket {
    pub fn is_open(&self) -> bool {
        self.state == TicketState::Open
    }
}

/// The user who invoked a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Requester {
    pub id: UserId,
    pub display_name: String,
    /// Platform mention markup, already safe to embed in HTML.
    pub mention: String,
}

/// The chat a command was invoked from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Channel {
    pub id: ChatId,
    pub name: String,
}
