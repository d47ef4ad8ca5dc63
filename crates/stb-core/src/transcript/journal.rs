use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::{
    domain::{ChatId, TicketId, UserId},
    utils::iso_timestamp_utc,
    Result,
};

/// One message observed in a ticket chat while `ticket` was open there.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: String,
    pub ticket: TicketId,
    pub chat: ChatId,
    pub author: UserId,
    pub author_name: String,
    pub text: String,
}

impl JournalEntry {
    pub fn new(
        ticket: TicketId,
        chat: ChatId,
        author: UserId,
        author_name: &str,
        text: &str,
    ) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            ticket,
            chat,
            author,
            author_name: author_name.to_string(),
            text: text.to_string(),
        }
    }
}

/// Append-only JSON-lines log per ticket (`<dir>/<ticket id>.jsonl`).
///
/// The bot API cannot page back through chat history, so the adapter records
/// ticket chat messages as they arrive and transcripts are rendered from here.
/// Keying by ticket means a chat reused by a later ticket never touches the
/// journal of a closed one.
#[derive(Clone, Debug)]
pub struct Journal {
    dir: PathBuf,
}

impl Journal {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, ticket: TicketId) -> PathBuf {
        self.dir.join(format!("{ticket}.jsonl"))
    }

    pub async fn record(&self, entry: &JournalEntry) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_for(entry.ticket))
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// All entries for `ticket` in arrival order. A ticket with no journal has no entries.
    pub async fn read(&self, ticket: TicketId) -> Result<Vec<JournalEntry>> {
        let path = self.file_for(ticket);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<JournalEntry>(line) {
                Ok(entry) => out.push(entry),
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    line = idx + 1,
                    "skipping malformed journal line: {e}"
                ),
            }
        }
        Ok(out)
    }
}
