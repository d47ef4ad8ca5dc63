//! Port fakes shared by the unit tests.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef, Ticket, TicketId, TicketState, UserId},
    errors::Error,
    messaging::{
        notice::{Notice, NoticeKind},
        port::MessagingPort,
    },
    tickets::TicketStore,
    transcript::TranscriptGenerator,
    Result,
};

// ============== Store ==============

#[derive(Default)]
pub struct FakeStore {
    tickets: Vec<Ticket>,
    staff: Vec<UserId>,
    fail: bool,
    lookups: AtomicUsize,
}

impl FakeStore {
    pub fn with_ticket(mut self, ticket: Ticket) -> Self {
        self.tickets.push(ticket);
        self
    }

    pub fn with_staff(mut self, user: UserId) -> Self {
        self.staff.push(user);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn find(&self, pred: impl Fn(&Ticket) -> bool) -> Result<Option<Ticket>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Store("database unavailable".to_string()));
        }
        Ok(self.tickets.iter().find(|t| pred(t)).cloned())
    }
}

#[async_trait]
impl TicketStore for FakeStore {
    async fn open_ticket_for_channel(&self, channel: ChatId) -> Result<Option<Ticket>> {
        self.find(|t| t.state == TicketState::Open && t.channel == channel)
    }

    async fn open_ticket(&self, id: TicketId) -> Result<Option<Ticket>> {
        self.find(|t| t.state == TicketState::Open && t.id == id)
    }

    async fn closed_ticket(&self, id: TicketId) -> Result<Option<Ticket>> {
        self.find(|t| t.state == TicketState::Closed && t.id == id)
    }

    async fn is_staff(&self, user: UserId) -> Result<bool> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Store("database unavailable".to_string()));
        }
        Ok(self.staff.contains(&user))
    }
}

// ============== Generator ==============

#[derive(Default)]
pub struct FakeGenerator {
    fail: bool,
    calls: Mutex<Vec<(ChatId, TicketId)>>,
}

impl FakeGenerator {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(ChatId, TicketId)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscriptGenerator for FakeGenerator {
    async fn execute(&self, channel: ChatId, ticket: TicketId) -> Result<PathBuf> {
        self.calls.lock().unwrap().push((channel, ticket));
        if self.fail {
            return Err(Error::Generation("disk full".to_string()));
        }
        Ok(self.path(ticket))
    }

    fn path(&self, ticket: TicketId) -> PathBuf {
        PathBuf::from(format!("/tmp/stb-fake/transcript-{ticket}.html"))
    }
}

// ============== Messenger ==============

#[derive(Clone, Copy, Debug)]
pub enum FailMode {
    Forbidden,
    Other,
}

#[derive(Clone, Debug)]
pub struct Sent {
    pub chat: ChatId,
    pub notice: Notice,
    pub file: Option<PathBuf>,
}

/// Records every successful send; sends to chats listed in `fail_for` error out.
#[derive(Default)]
pub struct RecordingMessenger {
    next_id: Mutex<i32>,
    sent: Mutex<Vec<Sent>>,
    failures: HashMap<ChatId, FailMode>,
}

impl RecordingMessenger {
    pub fn fail_for(mut self, chat: ChatId, mode: FailMode) -> Self {
        self.failures.insert(chat, mode);
        self
    }

    pub fn notices(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_kinds(&self) -> Vec<(ChatId, NoticeKind)> {
        self.notices()
            .into_iter()
            .map(|s| (s.chat, s.notice.kind))
            .collect()
    }

    pub fn sent_to(&self, chat: ChatId) -> Vec<NoticeKind> {
        self.notices()
            .into_iter()
            .filter(|s| s.chat == chat)
            .map(|s| s.notice.kind)
            .collect()
    }

    pub fn files(&self) -> Vec<(ChatId, PathBuf)> {
        self.notices()
            .into_iter()
            .filter_map(|s| s.file.map(|f| (s.chat, f)))
            .collect()
    }

    fn record(&self, chat: ChatId, notice: &Notice, file: Option<&Path>) -> Result<MessageRef> {
        match self.failures.get(&chat) {
            Some(FailMode::Forbidden) => {
                return Err(Error::Forbidden("bot was blocked by the user".to_string()))
            }
            Some(FailMode::Other) => {
                return Err(Error::Delivery("upstream timed out".to_string()))
            }
            None => {}
        }

        let mut guard = self.next_id.lock().unwrap();
        *guard += 1;
        let message_id = MessageId(*guard);
        self.sent.lock().unwrap().push(Sent {
            chat,
            notice: notice.clone(),
            file: file.map(Path::to_path_buf),
        });
        Ok(MessageRef {
            chat_id: chat,
            message_id,
        })
    }
}

#[async_trait]
impl MessagingPort for RecordingMessenger {
    async fn send_notice(&self, chat_id: ChatId, notice: &Notice) -> Result<MessageRef> {
        self.record(chat_id, notice, None)
    }

    async fn send_file(
        &self,
        chat_id: ChatId,
        path: &Path,
        notice: &Notice,
    ) -> Result<MessageRef> {
        self.record(chat_id, notice, Some(path))
    }
}
