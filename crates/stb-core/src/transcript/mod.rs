//! Transcript artifacts: the generator port and the journal-backed implementation.

mod journal;
mod render;

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, TicketId},
    errors::Error,
    Result,
};

pub use journal::{Journal, JournalEntry};

/// Produces transcript artifacts at deterministic paths.
#[async_trait]
pub trait TranscriptGenerator: Send + Sync {
    /// Generate (or regenerate) the transcript for `ticket`, held in `channel`.
    ///
    /// Must be idempotent for an unchanged history and safe to run concurrently
    /// for the same ticket. Failures are `Error::Generation`.
    async fn execute(&self, channel: ChatId, ticket: TicketId) -> Result<PathBuf>;

    /// Where the artifact for `ticket` lives, without generating it.
    fn path(&self, ticket: TicketId) -> PathBuf;
}

/// Renders the per-ticket message journal into `<output_dir>/transcript-00042.html`.
#[derive(Clone, Debug)]
pub struct JournalTranscriber {
    journal: Journal,
    output_dir: PathBuf,
}

impl JournalTranscriber {
    pub fn new(journal: Journal, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            journal,
            output_dir: output_dir.into(),
        }
    }
}

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// A temp path next to `path` that no other in-flight write shares.
fn unique_tmp(path: &Path) -> PathBuf {
    let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
    path.with_extension(format!("html.{}.{seq}.tmp", std::process::id()))
}

fn generation_error(path: &Path, e: std::io::Error) -> Error {
    Error::Generation(format!("{}: {e}", path.display()))
}

#[async_trait]
impl TranscriptGenerator for JournalTranscriber {
    async fn execute(&self, channel: ChatId, ticket: TicketId) -> Result<PathBuf> {
        let entries = self
            .journal
            .read(ticket)
            .await
            .map_err(|e| Error::Generation(format!("failed to read journal: {e}")))?;
        let html = render::render_html(ticket, channel, &entries);

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| generation_error(&self.output_dir, e))?;

        // Readers only ever see a complete file.
        let path = self.path(ticket);
        let tmp = unique_tmp(&path);
        tokio::fs::write(&tmp, html.as_bytes())
            .await
            .map_err(|e| generation_error(&tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(generation_error(&path, e));
        }

        tracing::debug!(
            ticket = %ticket,
            messages = entries.len(),
            path = %path.display(),
            "transcript written"
        );
        Ok(path)
    }

    fn path(&self, ticket: TicketId) -> PathBuf {
        self.output_dir.join(format!("transcript-{ticket}.html"))
    }
}
