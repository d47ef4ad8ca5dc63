//! Routes a generated transcript to the log channel, the requester and the
//! invoking chat.

use std::{path::Path, sync::Arc};

use crate::{
    domain::{Channel, ChatId, Requester, TicketId},
    errors::Error,
    messaging::{notice::Notice, port::MessagingPort},
    Result,
};

/// What happened to the log channel copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuditDelivery {
    NotConfigured,
    Sent,
    /// Best-effort: the error is logged and the run continues.
    Failed(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrivateDelivery {
    /// File delivered privately and acknowledged in the invoking chat.
    Delivered,
    /// Recipient refuses private messages; a fallback notice went to the invoking chat.
    Blocked,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryReport {
    pub audit: AuditDelivery,
    pub private: PrivateDelivery,
}

/// Everything needed to deliver one artifact.
#[derive(Clone, Copy, Debug)]
pub struct Delivery<'a> {
    pub ticket: TicketId,
    pub artifact: &'a Path,
    pub requester: &'a Requester,
    pub origin: &'a Channel,
}

pub struct NotificationDispatcher {
    messenger: Arc<dyn MessagingPort>,
    log_channel: Option<ChatId>,
}

impl NotificationDispatcher {
    pub fn new(messenger: Arc<dyn MessagingPort>, log_channel: Option<ChatId>) -> Self {
        Self {
            messenger,
            log_channel,
        }
    }

    /// Log copy, then private delivery with an in-chat fallback.
    ///
    /// Only `Error::Forbidden` from the private delivery is recovered; any other
    /// delivery error is returned to the caller.
    pub async fn deliver(&self, d: Delivery<'_>) -> Result<DeliveryReport> {
        let audit = self.send_audit_copy(&d).await;

        let private = match self
            .messenger
            .send_file(
                d.requester.id.private_chat(),
                d.artifact,
                &Notice::transcript_delivered(d.requester),
            )
            .await
        {
            Ok(_) => {
                self.messenger
                    .send_notice(d.origin.id, &Notice::transcript_sent(d.requester))
                    .await?;
                PrivateDelivery::Delivered
            }
            Err(Error::Forbidden(reason)) => {
                tracing::info!(
                    ticket = %d.ticket,
                    user = d.requester.id.0,
                    "private delivery refused: {reason}"
                );
                self.messenger
                    .send_notice(d.origin.id, &Notice::direct_message_blocked(d.requester))
                    .await?;
                PrivateDelivery::Blocked
            }
            Err(e) => return Err(e),
        };

        Ok(DeliveryReport { audit, private })
    }

    async fn send_audit_copy(&self, d: &Delivery<'_>) -> AuditDelivery {
        let Some(log_channel) = self.log_channel else {
            return AuditDelivery::NotConfigured;
        };

        let notice = Notice::transcript_logged(d.ticket, d.requester, d.origin);
        match self
            .messenger
            .send_file(log_channel, d.artifact, &notice)
            .await
        {
            Ok(_) => AuditDelivery::Sent,
            Err(e) => {
                tracing::warn!(
                    ticket = %d.ticket,
                    log_channel = log_channel.0,
                    "failed to post transcript to log channel: {e}"
                );
                AuditDelivery::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use crate::messaging::notice::NoticeKind;
    use crate::testing::{FailMode, RecordingMessenger};
    use std::path::PathBuf;

    const LOG: ChatId = ChatId(-999);
    const ORIGIN: ChatId = ChatId(-42);
    const USER: UserId = UserId(100);

    fn requester() -> Requester {
        Requester {
            id: USER,
            display_name: "ana".to_string(),
            mention: "@ana".to_string(),
        }
    }

    fn origin() -> Channel {
        Channel {
            id: ORIGIN,
            name: "ticket-00042".to_string(),
        }
    }

    async fn run(
        messenger: Arc<RecordingMessenger>,
        log_channel: Option<ChatId>,
    ) -> Result<DeliveryReport> {
        let dispatcher = NotificationDispatcher::new(messenger, log_channel);
        let artifact = PathBuf::from("/tmp/transcript-00042.html");
        let requester = requester();
        let origin = origin();
        dispatcher
            .deliver(Delivery {
                ticket: TicketId(42),
                artifact: &artifact,
                requester: &requester,
                origin: &origin,
            })
            .await
    }

    #[tokio::test]
    async fn delivers_to_log_then_privately_then_acknowledges() {
        let messenger = Arc::new(RecordingMessenger::default());
        let report = run(messenger.clone(), Some(LOG)).await.unwrap();

        assert_eq!(report.audit, AuditDelivery::Sent);
        assert_eq!(report.private, PrivateDelivery::Delivered);
        assert_eq!(
            messenger.sent_kinds(),
            vec![
                (LOG, NoticeKind::TranscriptLogged { ticket: TicketId(42) }),
                (USER.private_chat(), NoticeKind::TranscriptDelivered),
                (ORIGIN, NoticeKind::TranscriptSent),
            ]
        );
        assert_eq!(messenger.files().len(), 2);
    }

    #[tokio::test]
    async fn skips_log_copy_when_not_configured() {
        let messenger = Arc::new(RecordingMessenger::default());
        let report = run(messenger.clone(), None).await.unwrap();

        assert_eq!(report.audit, AuditDelivery::NotConfigured);
        assert!(messenger.sent_to(LOG).is_empty());
        assert_eq!(messenger.sent_to(ORIGIN), vec![NoticeKind::TranscriptSent]);
    }

    #[tokio::test]
    async fn privacy_block_sends_exactly_one_fallback_and_no_ack() {
        let messenger = Arc::new(
            RecordingMessenger::default().fail_for(USER.private_chat(), FailMode::Forbidden),
        );
        let report = run(messenger.clone(), None).await.unwrap();

        assert_eq!(report.private, PrivateDelivery::Blocked);
        assert_eq!(
            messenger.sent_to(ORIGIN),
            vec![NoticeKind::DirectMessageBlocked]
        );
    }

    #[tokio::test]
    async fn other_private_delivery_errors_propagate_without_fallback() {
        let messenger = Arc::new(
            RecordingMessenger::default().fail_for(USER.private_chat(), FailMode::Other),
        );
        let err = run(messenger.clone(), Some(LOG)).await.unwrap_err();

        assert!(matches!(err, Error::Delivery(_)));
        assert!(messenger.sent_to(ORIGIN).is_empty());
    }

    #[tokio::test]
    async fn log_failure_does_not_stop_private_delivery() {
        for mode in [FailMode::Other, FailMode::Forbidden] {
            let messenger = Arc::new(RecordingMessenger::default().fail_for(LOG, mode));
            let report = run(messenger.clone(), Some(LOG)).await.unwrap();

            assert!(matches!(report.audit, AuditDelivery::Failed(_)));
            assert_eq!(report.private, PrivateDelivery::Delivered);
            assert_eq!(
                messenger.sent_to(USER.private_chat()),
                vec![NoticeKind::TranscriptDelivered]
            );
            assert_eq!(messenger.sent_to(ORIGIN), vec![NoticeKind::TranscriptSent]);
        }
    }
}
