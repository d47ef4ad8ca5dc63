//! Decides which ticket a `transcript [id]` invocation refers to and whether the
//! caller may see it.

use crate::{
    domain::{ChatId, Ticket, TicketId, UserId},
    permissions::{PermissionChecker, LIST},
    tickets::TicketStore,
    Result,
};

/// How the ticket is addressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupKey {
    /// The open ticket bound to the invoking chat.
    ByChannel(ChatId),
    ById(TicketId),
}

impl LookupKey {
    /// Build the key from the raw command arguments. Only the first token counts.
    pub fn parse(channel: ChatId, args: &str) -> std::result::Result<Self, ResolveFailure> {
        let Some(raw) = args.split_whitespace().next() else {
            return Ok(LookupKey::ByChannel(channel));
        };
        raw.parse::<u32>()
            .map(|id| LookupKey::ById(TicketId(id)))
            .map_err(|_| ResolveFailure::InvalidArgument {
                raw: raw.to_string(),
            })
    }
}

/// Why the caller may see the ticket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Creator,
    Staff,
    /// Invoked from inside the ticket chat by someone other than the creator.
    ChannelMember,
}

/// A ticket the caller is allowed to see.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTicket {
    pub ticket: Ticket,
    /// Open tickets are regenerated since the conversation may have moved on;
    /// closed ones are immutable and may reuse the existing artifact.
    pub regenerate: bool,
    pub access: Access,
}

/// Expected, user-facing rejections.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveFailure {
    #[error("argument {raw:?} is not a ticket number")]
    InvalidArgument { raw: String },

    #[error("this channel is not a ticket")]
    NotATicketChannel,

    /// Covers both "no such ticket" and "not yours": callers must not learn
    /// whether a ticket they cannot see exists.
    #[error("no accessible ticket with that number")]
    TicketNotFound { list_hint: bool },
}

pub struct TicketResolver<'a> {
    store: &'a dyn TicketStore,
    permissions: &'a PermissionChecker,
}

impl<'a> TicketResolver<'a> {
    pub fn new(store: &'a dyn TicketStore, permissions: &'a PermissionChecker) -> Self {
        Self { store, permissions }
    }

    /// Store faults are `Err`; rejections are `Ok(Err(_))`.
    pub async fn resolve(
        &self,
        caller: UserId,
        key: LookupKey,
    ) -> Result<std::result::Result<ResolvedTicket, ResolveFailure>> {
        match key {
            LookupKey::ByChannel(channel) => {
                Ok(match self.store.open_ticket_for_channel(channel).await? {
                    Some(ticket) => Ok(ResolvedTicket {
                        access: if ticket.creator == caller {
                            Access::Creator
                        } else {
                            Access::ChannelMember
                        },
                        ticket,
                        regenerate: true,
                    }),
                    None => Err(ResolveFailure::NotATicketChannel),
                })
            }
            LookupKey::ById(id) => self.resolve_by_id(caller, id).await,
        }
    }

    async fn resolve_by_id(
        &self,
        caller: UserId,
        id: TicketId,
    ) -> Result<std::result::Result<ResolvedTicket, ResolveFailure>> {
        // Open wins over closed; only the creator may pull an open ticket by id.
        if let Some(ticket) = self.store.open_ticket(id).await? {
            if ticket.creator == caller {
                return Ok(Ok(ResolvedTicket {
                    ticket,
                    regenerate: true,
                    access: Access::Creator,
                }));
            }
        }

        if let Some(ticket) = self.store.closed_ticket(id).await? {
            let access = if ticket.creator == caller {
                Some(Access::Creator)
            } else if self.store.is_staff(caller).await? {
                Some(Access::Staff)
            } else {
                None
            };
            if let Some(access) = access {
                return Ok(Ok(ResolvedTicket {
                    ticket,
                    regenerate: false,
                    access,
                }));
            }
        }

        Ok(Err(ResolveFailure::TicketNotFound {
            list_hint: self.permissions.has_permission(caller, LIST),
        }))
    }
}
