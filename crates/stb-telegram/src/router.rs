use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tokio_util::sync::CancellationToken;

use stb_core::{
    command::TranscriptCommand,
    config::Config,
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger},
    },
    permissions::PermissionChecker,
    tickets::{JsonTicketStore, TicketStore},
    transcript::{Journal, JournalTranscriber},
    utils::AuditLogger,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub store: Arc<dyn TicketStore>,
    pub journal: Journal,
    pub transcript: Arc<TranscriptCommand>,
    pub audit: Arc<AuditLogger>,
    /// Cancelled on shutdown; in-flight commands are abandoned.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(cfg: Arc<Config>, messenger: Arc<dyn MessagingPort>) -> Self {
        let store: Arc<dyn TicketStore> = Arc::new(JsonTicketStore::new(&cfg.ticket_db_path));
        let journal = Journal::new(&cfg.journal_dir);
        let generator = Arc::new(JournalTranscriber::new(
            journal.clone(),
            &cfg.transcript_dir,
        ));

        let transcript = Arc::new(TranscriptCommand::new(
            store.clone(),
            generator,
            messenger,
            PermissionChecker::new(cfg.permissions.clone()),
            &cfg.transcript_settings(),
        ));

        Self {
            audit: Arc::new(AuditLogger::new(
                cfg.audit_log_path.clone(),
                cfg.audit_log_json,
            )),
            cfg,
            store,
            journal,
            transcript,
            shutdown: CancellationToken::new(),
        }
    }
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => tracing::info!("stb started: @{}", me.username()),
        Err(e) => tracing::warn!("get_me failed: {e}"),
    }
    tracing::info!(
        tickets = %cfg.ticket_db_path.display(),
        transcripts = %cfg.transcript_dir.display(),
        log_channel = ?cfg.log_channel.map(|c| c.0),
        "configuration loaded"
    );

    // Throttle outbound calls; the adapter still retries a single 429 RetryAfter.
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        ThrottleConfig::default(),
    ));

    let state = Arc::new(AppState::new(cfg, messenger));

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state.clone()])
        .build();

    let shutdown = dispatcher.shutdown_token();
    let cancel = state.shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::info!("shutting down");
        cancel.cancel();
        if let Ok(done) = shutdown.shutdown() {
            done.await;
        }
    });

    dispatcher.dispatch().await;

    Ok(())
}
