//! Telegram update handlers.
//!
//! Commands go to `commands`; any other text in a chat bound to an open ticket is
//! journaled so transcripts can be rendered later.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use stb_core::{
    domain::{ChatId, UserId},
    transcript::JournalEntry,
};

use crate::router::AppState;

mod commands;
mod transcript;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text().or_else(|| msg.caption()) else {
        return Ok(());
    };

    if msg.text().is_some() && commands::is_command(text, &state.cfg.command_prefix) {
        return commands::handle_command(bot, msg, state).await;
    }

    if !msg.chat.is_private() {
        journal_if_ticket(&msg, text, &state).await;
    }

    Ok(())
}

async fn journal_if_ticket(msg: &Message, text: &str, state: &AppState) {
    let Some(user) = msg.from() else {
        return;
    };
    let chat = ChatId(msg.chat.id.0);

    let ticket = match state.store.open_ticket_for_channel(chat).await {
        Ok(Some(ticket)) => ticket,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(chat = chat.0, "ticket lookup for journal failed: {e}");
            return;
        }
    };

    let entry = JournalEntry::new(
        ticket.id,
        chat,
        UserId(user.id.0 as i64),
        &user.full_name(),
        text,
    );
    if let Err(e) = state.journal.record(&entry).await {
        tracing::warn!(chat = chat.0, "failed to journal message: {e}");
    }
}
