use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{Message, User},
};

use stb_core::{
    command::{CommandOutcome, Invocation},
    dispatch::PrivateDelivery,
    domain::{Channel, ChatId, Requester, UserId},
    formatting::user_mention,
    resolver::ResolveFailure,
    utils::{AuditEvent, AuditLogger},
};

use crate::router::AppState;

fn requester_of(user: &User) -> Requester {
    let id = user.id.0 as i64;
    let display_name = user.full_name();
    Requester {
        id: UserId(id),
        mention: user_mention(id, &display_name),
        display_name,
    }
}

fn channel_of(msg: &Message) -> Channel {
    let name = msg
        .chat
        .title()
        .or_else(|| msg.chat.username())
        .unwrap_or("private");
    Channel {
        id: ChatId(msg.chat.id.0),
        name: name.to_string(),
    }
}

fn outcome_label(outcome: &CommandOutcome) -> (&'static str, Option<String>) {
    match outcome {
        CommandOutcome::RateLimited { .. } => ("rate_limited", None),
        CommandOutcome::Denied(_) => ("permission_denied", None),
        CommandOutcome::Rejected(ResolveFailure::InvalidArgument { .. }) => {
            ("invalid_argument", None)
        }
        CommandOutcome::Rejected(ResolveFailure::NotATicketChannel) => {
            ("not_a_ticket_channel", None)
        }
        CommandOutcome::Rejected(ResolveFailure::TicketNotFound { .. }) => {
            ("ticket_not_found", None)
        }
        CommandOutcome::Delivered { request, report } => (
            match report.private {
                PrivateDelivery::Delivered => "delivered",
                PrivateDelivery::Blocked => "direct_message_blocked",
            },
            Some(request.ticket.to_string()),
        ),
        CommandOutcome::Cancelled => ("cancelled", None),
    }
}

/// Audit failures never fail the command; they are logged and reported back.
fn write_audit(audit: &AuditLogger, event: AuditEvent) -> bool {
    match audit.write(event) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(path = %audit.path().display(), "audit log write failed: {e}");
            false
        }
    }
}

pub(super) async fn handle_transcript(
    msg: &Message,
    user: &User,
    args: String,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let invocation = Invocation {
        channel: channel_of(msg),
        requester: requester_of(user),
        args,
    };
    let username = user
        .username
        .clone()
        .unwrap_or_else(|| "unknown".to_string());
    let user_id = invocation.requester.id.0;

    let event = match state
        .transcript
        .execute_until_cancelled(&invocation, &state.shutdown)
        .await
    {
        Ok(outcome) => {
            if let CommandOutcome::RateLimited { retry_after } = &outcome {
                write_audit(
                    &state.audit,
                    AuditEvent::rate_limit(user_id, &username, retry_after.as_secs_f64()),
                );
            }
            let (label, ticket) = outcome_label(&outcome);
            AuditEvent::command(
                user_id,
                &username,
                invocation.channel.id.0,
                "transcript",
                ticket.as_deref(),
                label,
            )
        }
        Err(e) => {
            // The user has already been told; this is the top of the invocation.
            tracing::error!(
                user = user_id,
                chat = invocation.channel.id.0,
                "transcript command failed: {e}"
            );
            AuditEvent::error(user_id, &username, &e.to_string(), Some("transcript"))
        }
    };

    write_audit(&state.audit, event);
    Ok(())
}
