//! The `transcript [ticketId]` command: cooldown, permission gate, resolution,
//! generation and delivery, strictly in that order.

use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::{
    cooldown::{Admission, RateLimiter},
    dispatch::{Delivery, DeliveryReport, NotificationDispatcher},
    domain::{Channel, ChatId, Requester, TicketId, UserId},
    messaging::{notice::Notice, port::MessagingPort},
    permissions::{PermissionChecker, PermissionDecision, TRANSCRIPT},
    resolver::{Access, LookupKey, ResolveFailure, TicketResolver},
    tickets::TicketStore,
    transcript::TranscriptGenerator,
    Result,
};

/// One raw command invocation.
#[derive(Clone, Debug)]
pub struct Invocation {
    pub channel: Channel,
    pub requester: Requester,
    /// Everything after the command name.
    pub args: String,
}

/// Resolved addressing for a single run; dropped once delivery finishes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptRequest {
    pub ticket: TicketId,
    pub ticket_channel: ChatId,
    pub requester: UserId,
    pub access: Access,
    pub regenerate: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    RateLimited { retry_after: Duration },
    Denied(PermissionDecision),
    Rejected(ResolveFailure),
    Delivered {
        request: TranscriptRequest,
        report: DeliveryReport,
    },
    /// The caller went away before the run finished. Nothing was written to the store.
    Cancelled,
}

/// Injected settings for the command (see `Config::transcript_settings`).
#[derive(Clone, Debug)]
pub struct TranscriptSettings {
    /// Only used to format the hint pointing at the list command.
    pub command_prefix: String,
    pub log_channel: Option<ChatId>,
    pub cooldown: Duration,
}

pub struct TranscriptCommand {
    store: Arc<dyn TicketStore>,
    generator: Arc<dyn TranscriptGenerator>,
    messenger: Arc<dyn MessagingPort>,
    permissions: PermissionChecker,
    dispatcher: NotificationDispatcher,
    cooldown: Mutex<RateLimiter>,
    prefix: String,
}

impl TranscriptCommand {
    pub fn new(
        store: Arc<dyn TicketStore>,
        generator: Arc<dyn TranscriptGenerator>,
        messenger: Arc<dyn MessagingPort>,
        permissions: PermissionChecker,
        settings: &TranscriptSettings,
    ) -> Self {
        Self {
            store,
            generator,
            dispatcher: NotificationDispatcher::new(messenger.clone(), settings.log_channel),
            messenger,
            permissions,
            cooldown: Mutex::new(RateLimiter::per_user_cooldown(settings.cooldown)),
            prefix: settings.command_prefix.clone(),
        }
    }

    /// Like `execute`, but abandons the run as soon as `token` is cancelled.
    pub async fn execute_until_cancelled(
        &self,
        invocation: &Invocation,
        token: &CancellationToken,
    ) -> Result<CommandOutcome> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::info!(
                    user = invocation.requester.id.0,
                    chat = invocation.channel.id.0,
                    "transcript run abandoned"
                );
                Ok(CommandOutcome::Cancelled)
            }
            outcome = self.execute(invocation) => outcome,
        }
    }

    /// Run the command once.
    ///
    /// Expected rejections come back as `Ok` after the user has been told why.
    /// Store, generation and delivery faults come back as `Err`; for the latter two
    /// the user has already been sent an explicit failure notice.
    pub async fn execute(&self, invocation: &Invocation) -> Result<CommandOutcome> {
        let origin = &invocation.channel;
        let requester = &invocation.requester;

        let admission = { self.cooldown.lock().await.check(requester.id) };
        if let Admission::Throttled { retry_after } = admission {
            self.messenger
                .send_notice(origin.id, &Notice::rate_limited(requester, retry_after))
                .await?;
            return Ok(CommandOutcome::RateLimited { retry_after });
        }

        let decision = self.permissions.check(requester.id, TRANSCRIPT);
        if !decision.granted {
            tracing::info!(
                user = requester.id.0,
                capability = %decision.capability,
                "user tried to use the transcript command without permission"
            );
            self.messenger
                .send_notice(origin.id, &Notice::permission_denied())
                .await?;
            return Ok(CommandOutcome::Denied(decision));
        }

        let resolver = TicketResolver::new(self.store.as_ref(), &self.permissions);
        let resolved = match LookupKey::parse(origin.id, &invocation.args) {
            Ok(key) => resolver.resolve(requester.id, key).await?,
            Err(failure) => Err(failure),
        };
        let resolved = match resolved {
            Ok(resolved) => resolved,
            Err(failure) => {
                tracing::debug!(user = requester.id.0, "transcript request rejected: {failure}");
                self.messenger
                    .send_notice(origin.id, &self.rejection_notice(&failure))
                    .await?;
                return Ok(CommandOutcome::Rejected(failure));
            }
        };

        let request = TranscriptRequest {
            ticket: resolved.ticket.id,
            ticket_channel: resolved.ticket.channel,
            requester: requester.id,
            access: resolved.access,
            regenerate: resolved.regenerate,
        };

        // Closed tickets still go through the generator; it is idempotent for them.
        if let Err(e) = self
            .generator
            .execute(request.ticket_channel, request.ticket)
            .await
        {
            tracing::error!(ticket = %request.ticket, "could not save transcript: {e}");
            self.notify_failure(origin.id, Notice::generation_failed())
                .await;
            return Err(e);
        }
        let artifact = self.generator.path(request.ticket);

        let report = match self
            .dispatcher
            .deliver(Delivery {
                ticket: request.ticket,
                artifact: &artifact,
                requester,
                origin,
            })
            .await
        {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(ticket = %request.ticket, "could not deliver transcript: {e}");
                self.notify_failure(origin.id, Notice::delivery_failed())
                    .await;
                return Err(e);
            }
        };

        tracing::info!(
            ticket = %request.ticket,
            user = requester.id.0,
            regenerate = request.regenerate,
            "transcript delivered"
        );
        Ok(CommandOutcome::Delivered { request, report })
    }

    fn rejection_notice(&self, failure: &ResolveFailure) -> Notice {
        match failure {
            ResolveFailure::InvalidArgument { .. } => Notice::invalid_argument(),
            ResolveFailure::NotATicketChannel => Notice::not_a_ticket_channel(),
            ResolveFailure::TicketNotFound { list_hint } => {
                Notice::ticket_not_found(*list_hint, &self.prefix)
            }
        }
    }

    /// The original error is what the caller sees; a failed notice is only logged.
    async fn notify_failure(&self, chat: ChatId, notice: Notice) {
        if let Err(e) = self.messenger.send_notice(chat, &notice).await {
            tracing::warn!(chat = chat.0, "failed to send failure notice: {e}");
        }
    }
}
