use std::time::Duration;

use crate::domain::{Channel, Requester, TicketId};
use crate::formatting::escape_html;

/// Severity tag carried by every user-facing message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// What a notice reports. Adapters only render it; tests match on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    PermissionDenied,
    RateLimited,
    InvalidArgument,
    NotATicketChannel,
    TicketNotFound { list_hint: bool },
    GenerationFailed,
    DeliveryFailed,
    TranscriptLogged { ticket: TicketId },
    TranscriptDelivered,
    TranscriptSent,
    DirectMessageBlocked,
}

/// A short structured message: severity, HTML body and an optional footer line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub severity: Severity,
    pub body: String,
    pub footer: Option<String>,
}

impl Notice {
    fn error(kind: NoticeKind, body: String) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            body,
            footer: None,
        }
    }

    fn success(kind: NoticeKind, body: String) -> Self {
        Self {
            kind,
            severity: Severity::Success,
            body,
            footer: None,
        }
    }

    pub fn permission_denied() -> Self {
        Self::error(
            NoticeKind::PermissionDenied,
            "You do not have permission to use this command.".to_string(),
        )
    }

    pub fn rate_limited(requester: &Requester, retry_after: Duration) -> Self {
        let secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
        Self::error(
            NoticeKind::RateLimited,
            format!(
                "Slow down, {}. Try again in {secs}s.",
                requester.mention
            ),
        )
    }

    pub fn invalid_argument() -> Self {
        Self::error(
            NoticeKind::InvalidArgument,
            "Argument must be a number.".to_string(),
        )
    }

    pub fn not_a_ticket_channel() -> Self {
        Self::error(
            NoticeKind::NotATicketChannel,
            "This channel is not a ticket.".to_string(),
        )
    }

    /// `prefix` is only used to format the hint pointing at the list command.
    pub fn ticket_not_found(list_hint: bool, prefix: &str) -> Self {
        let mut body =
            "Could not find a closed ticket with that number which you opened.".to_string();
        if list_hint {
            body.push_str(&format!(
                "\n(Use the {}list command to see all your tickets)",
                escape_html(prefix)
            ));
        }
        Self::error(NoticeKind::TicketNotFound { list_hint }, body)
    }

    pub fn generation_failed() -> Self {
        Self::error(
            NoticeKind::GenerationFailed,
            "ERROR: Could not save transcript file. Aborting...".to_string(),
        )
    }

    pub fn delivery_failed() -> Self {
        Self::error(
            NoticeKind::DeliveryFailed,
            "ERROR: Could not deliver transcript file. Aborting...".to_string(),
        )
    }

    /// Summary attached to the copy posted in the log channel.
    pub fn transcript_logged(ticket: TicketId, requester: &Requester, origin: &Channel) -> Self {
        let mut n = Self::success(
            NoticeKind::TranscriptLogged { ticket },
            format!(
                "Ticket {ticket} transcript generated by {}.\n",
                requester.mention
            ),
        );
        n.footer = Some(format!("#{}", escape_html(&origin.name)));
        n
    }

    pub fn transcript_delivered(requester: &Requester) -> Self {
        Self::success(
            NoticeKind::TranscriptDelivered,
            format!("Transcript generated, {}!\n", requester.mention),
        )
    }

    pub fn transcript_sent(requester: &Requester) -> Self {
        Self::success(
            NoticeKind::TranscriptSent,
            format!("Transcript sent, {}!\n", requester.mention),
        )
    }

    pub fn direct_message_blocked(requester: &Requester) -> Self {
        Self::error(
            NoticeKind::DirectMessageBlocked,
            format!(
                "Not allowed to send direct message to you, {}, please check your privacy settings.\n",
                requester.mention
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, UserId};

    fn requester() -> Requester {
        Requester {
            id: UserId(9),
            display_name: "dana".to_string(),
            mention: "@dana".to_string(),
        }
    }

    #[test]
    fn list_hint_is_appended_only_when_requested() {
        let with = Notice::ticket_not_found(true, "/");
        assert!(with.body.contains("Use the /list command"));
        assert_eq!(with.kind, NoticeKind::TicketNotFound { list_hint: true });

        let without = Notice::ticket_not_found(false, "/");
        assert!(!without.body.contains("list command"));
        assert_eq!(without.severity, Severity::Error);
    }

    #[test]
    fn log_summary_pads_ticket_and_names_origin() {
        let origin = Channel {
            id: ChatId(-100),
            name: "billing-help".to_string(),
        };
        let n = Notice::transcript_logged(TicketId(42), &requester(), &origin);
        assert_eq!(n.body, "Ticket 00042 transcript generated by @dana.\n");
        assert_eq!(n.footer.as_deref(), Some("#billing-help"));
        assert_eq!(n.severity, Severity::Success);
    }

    #[test]
    fn rate_limit_rounds_retry_up() {
        let n = Notice::rate_limited(&requester(), Duration::from_millis(2100));
        assert!(n.body.ends_with("Try again in 3s."));
    }
}
