//! Stream implementation over the tail-follow loop.

use crate::error::Result;
use crate::journal::FileJournal;
use crate::source::{Entry, JournalSource};
use crate::tail::{tail_task, FollowConfig};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// A stream of newly appended journal entries.
///
/// Opening the stream seeks the journal to its tail; only entries appended
/// afterwards are yielded, strictly in journal order, one at a time. A
/// fatal follow-loop error arrives as the stream's final `Err` item.
/// Dropping the stream shuts the loop down, interrupting a pending wait.
pub struct JournalStream {
    boot_id: String,
    receiver: mpsc::UnboundedReceiver<Result<Entry>>,
    _shutdown_tx: broadcast::Sender<()>,
    _task_handle: JoinHandle<()>,
}

impl JournalStream {
    /// Opens a journal target and starts following its tail.
    ///
    /// Open and boot-id failures are fatal here; seek failures are reported
    /// by the follow loop but do not fail the stream.
    pub async fn open(target: &str, config: FollowConfig) -> Result<Self> {
        let journal = FileJournal::open(target).await?;
        let boot_id = journal.boot_id()?;
        Ok(Self::spawn(journal, boot_id, config))
    }

    /// Starts a follow loop over an already-open source.
    pub(crate) fn spawn<S>(source: S, boot_id: String, config: FollowConfig) -> Self
    where
        S: JournalSource + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task_handle = tokio::spawn(tail_task(source, config, tx, shutdown_rx));

        JournalStream {
            boot_id,
            receiver: rx,
            _shutdown_tx: shutdown_tx,
            _task_handle: task_handle,
        }
    }

    /// The boot session identifier, read once at open.
    pub fn boot_id(&self) -> &str {
        &self.boot_id
    }

    /// Check if the follow loop is gone and the stream has drained.
    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }
}

impl Drop for JournalStream {
    fn drop(&mut self) {
        // Ignore errors if the loop already ended on its own
        let _ = self._shutdown_tx.send(());
    }
}

impl Stream for JournalStream {
    type Item = Result<Entry>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}
