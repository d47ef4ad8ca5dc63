//! Read side of the ticket database.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    domain::{ChatId, Ticket, TicketId, TicketState, UserId},
    errors::Error,
    Result,
};

/// Keyed ticket store, split into open and closed partitions.
///
/// Every method is a single read; implementations must never report a ticket
/// as both open and closed.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// The open ticket bound to `channel`, if any.
    async fn open_ticket_for_channel(&self, channel: ChatId) -> Result<Option<Ticket>>;

    async fn open_ticket(&self, id: TicketId) -> Result<Option<Ticket>>;

    async fn closed_ticket(&self, id: TicketId) -> Result<Option<Ticket>>;

    async fn is_staff(&self, user: UserId) -> Result<bool>;
}

#[derive(Clone, Debug, Deserialize)]
struct TicketRow {
    id: TicketId,
    channel: ChatId,
    creator: UserId,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    open: Vec<TicketRow>,
    #[serde(default)]
    closed: Vec<TicketRow>,
    #[serde(default)]
    staff: Vec<UserId>,
}

/// One consistent view of the database.
#[derive(Clone, Debug, Default)]
pub struct TicketSnapshot {
    open: Vec<Ticket>,
    closed: Vec<Ticket>,
    staff: HashSet<UserId>,
}

impl TicketSnapshot {
    /// Parse and validate a snapshot document.
    pub fn from_json(raw: &str) -> Result<Self> {
        let file: SnapshotFile = serde_json::from_str(raw)?;

        let mut open_channels = HashSet::new();
        let mut ids = HashSet::new();
        for row in &file.open {
            if !open_channels.insert(row.channel) {
                return Err(Error::Store(format!(
                    "channel {} has more than one open ticket",
                    row.channel.0
                )));
            }
        }
        for row in file.open.iter().chain(file.closed.iter()) {
            if !ids.insert(row.id) {
                return Err(Error::Store(format!("duplicate ticket id {}", row.id)));
            }
        }

        let to_ticket = |state: TicketState| {
            move |row: TicketRow| Ticket {
                id: row.id,
                channel: row.channel,
                creator: row.creator,
                state,
            }
        };

        Ok(Self {
            open: file.open.into_iter().map(to_ticket(TicketState::Open)).collect(),
            closed: file
                .closed
                .into_iter()
                .map(to_ticket(TicketState::Closed))
                .collect(),
            staff: file.staff.into_iter().collect(),
        })
    }

    pub fn open_ticket_for_channel(&self, channel: ChatId) -> Option<Ticket> {
        self.open.iter().find(|t| t.channel == channel).cloned()
    }

    pub fn open_ticket(&self, id: TicketId) -> Option<Ticket> {
        self.open.iter().find(|t| t.id == id).cloned()
    }

    pub fn closed_ticket(&self, id: TicketId) -> Option<Ticket> {
        self.closed.iter().find(|t| t.id == id).cloned()
    }

    pub fn is_staff(&self, user: UserId) -> bool {
        self.staff.contains(&user)
    }
}

/// Store backed by a JSON snapshot file:
///
/// ```json
/// { "open":   [{ "id": 42, "channel": -1001, "creator": 7 }],
///   "closed": [{ "id": 7,  "channel": -1002, "creator": 7 }],
///   "staff":  [1, 2] }
/// ```
///
/// The file is re-read on every lookup, so a writer that replaces it with a
/// rename is always observed as a whole. A missing file is an empty database.
#[derive(Clone, Debug)]
pub struct JsonTicketStore {
    path: PathBuf,
}

impl JsonTicketStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn snapshot(&self) -> Result<TicketSnapshot> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => TicketSnapshot::from_json(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TicketSnapshot::default()),
            Err(e) => Err(Error::Store(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }
}

#[async_trait]
impl TicketStore for JsonTicketStore {
    async fn open_ticket_for_channel(&self, channel: ChatId) -> Result<Option<Ticket>> {
        Ok(self.snapshot().await?.open_ticket_for_channel(channel))
    }

    async fn open_ticket(&self, id: TicketId) -> Result<Option<Ticket>> {
        Ok(self.snapshot().await?.open_ticket(id))
    }

    async fn closed_ticket(&self, id: TicketId) -> Result<Option<Ticket>> {
        Ok(self.snapshot().await?.closed_ticket(id))
    }

    async fn is_staff(&self, user: UserId) -> Result<bool> {
        Ok(self.snapshot().await?.is_staff(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn tmp_file(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_nanos();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}.json"))
    }

    const DB: &str = r#"{
        "open":   [{ "id": 42, "channel": -1001, "creator": 7 }],
        "closed": [{ "id": 7, "channel": -1002, "creator": 7 }],
        "staff":  [1]
    }"#;

    #[tokio::test]
    async fn reads_both_partitions_and_staff() {
        let path = tmp_file("stb-store");
        std::fs::write(&path, DB).unwrap();
        let store = JsonTicketStore::new(&path);

        let open = store.open_ticket(TicketId(42)).await.unwrap().unwrap();
        assert_eq!(open.state, TicketState::Open);
        assert_eq!(open.channel, ChatId(-1001));
        assert_eq!(
            store.open_ticket_for_channel(ChatId(-1001)).await.unwrap(),
            Some(open)
        );

        let closed = store.closed_ticket(TicketId(7)).await.unwrap().unwrap();
        assert!(!closed.is_open());
        assert!(store.open_ticket(TicketId(7)).await.unwrap().is_none());
        assert!(store.closed_ticket(TicketId(42)).await.unwrap().is_none());

        assert!(store.is_staff(UserId(1)).await.unwrap());
        assert!(!store.is_staff(UserId(7)).await.unwrap());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn missing_file_is_an_empty_database() {
        let store = JsonTicketStore::new(tmp_file("stb-store-missing"));
        assert!(store
            .open_ticket_for_channel(ChatId(1))
            .await
            .unwrap()
            .is_none());
        assert!(!store.is_staff(UserId(1)).await.unwrap());
    }

    #[test]
    fn rejects_two_open_tickets_on_one_channel() {
        let raw = r#"{ "open": [
            { "id": 1, "channel": 5, "creator": 1 },
            { "id": 2, "channel": 5, "creator": 2 }
        ] }"#;
        let err = TicketSnapshot::from_json(raw).unwrap_err();
        assert!(matches!(err, Error::Store(_)));
    }

    #[test]
    fn rejects_ids_shared_between_partitions() {
        let raw = r#"{
            "open":   [{ "id": 3, "channel": 5, "creator": 1 }],
            "closed": [{ "id": 3, "channel": 6, "creator": 1 }]
        }"#;
        assert!(TicketSnapshot::from_json(raw).is_err());
    }
}
