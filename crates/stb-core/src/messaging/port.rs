use std::path::Path;

use async_trait::async_trait;

use crate::{domain::ChatId, domain::MessageRef, messaging::notice::Notice, Result};

/// Outbound messenger port.
///
/// Implementations must report a recipient that refuses messages from the bot
/// (blocked bot, private chat never opened) as `Error::Forbidden`, so callers can
/// recover from it without swallowing other failures.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Send a standalone notice.
    async fn send_notice(&self, chat_id: ChatId, notice: &Notice) -> Result<MessageRef>;

    /// Upload a file with the notice as its caption.
    async fn send_file(&self, chat_id: ChatId, path: &Path, notice: &Notice)
        -> Result<MessageRef>;
}
