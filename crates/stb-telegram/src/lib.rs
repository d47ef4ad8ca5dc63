//! Telegram adapter (teloxide).
//!
//! Implements the `stb-core` MessagingPort over the Telegram Bot API and routes
//! updates to the command handlers.

use std::path::Path;

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InputFile, ParseMode},
    ApiError, RequestError,
};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use stb_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        notice::{Notice, Severity},
        port::MessagingPort,
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    sleep(d).await;
                }
                Err(other) => return Err(map_err(other)),
            }
        }
    }
}

/// Recipients that refuse the bot become `Error::Forbidden`; everything else is fatal.
fn map_err(e: RequestError) -> Error {
    match e {
        RequestError::Api(
            api @ (ApiError::BotBlocked
            | ApiError::CantInitiateConversation
            | ApiError::UserDeactivated),
        ) => Error::Forbidden(api.to_string()),
        other => Error::Delivery(format!("telegram error: {other}")),
    }
}

/// Telegram has no embed colours, so severity becomes a leading marker.
pub fn render_notice(notice: &Notice) -> String {
    let marker = match notice.severity {
        Severity::Success => "🟢",
        Severity::Error => "🔴",
    };
    let mut out = format!("{marker} {}", notice.body.trim_end());
    if let Some(footer) = &notice.footer {
        out.push_str(&format!("\n<i>{footer}</i>"));
    }
    out
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_notice(&self, chat_id: ChatId, notice: &Notice) -> Result<MessageRef> {
        let html = render_notice(notice);
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), html.clone())
                    .parse_mode(ParseMode::Html)
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn send_file(
        &self,
        chat_id: ChatId,
        path: &Path,
        notice: &Notice,
    ) -> Result<MessageRef> {
        let caption = render_notice(notice);
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_document(Self::tg_chat(chat_id), InputFile::file(path.to_path_buf()))
                    .caption(caption.clone())
                    .parse_mode(ParseMode::Html)
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }
}
