//! The tail-follow loop: position at the tail, then advance, classify,
//! wait, deliver, forever.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::source::{Advance, Entry, JournalSource};

/// How the loop reacts to a transient read error (a recoverable per-entry
/// failure, as opposed to a call-level failure, which is always fatal).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Retry the next advance immediately, without delay or cap.
    #[default]
    Immediate,
    /// Sleep between retries.
    Backoff { delay: Duration },
    /// Sleep between retries and give up after `limit` consecutive
    /// failures, ending the loop with [`Error::RetryLimit`].
    Capped { delay: Duration, limit: u32 },
}

/// Configuration for a follow loop.
#[derive(Debug, Clone, Default)]
pub struct FollowConfig {
    pub retry: RetryPolicy,
}

/// Establishes the starting position: seek to the tail, then one throwaway
/// advance to discard the stale position the seek leaves behind (the next
/// read after a bare seek returns the newest *existing* entry, not a new
/// one).
///
/// Failure here is reported but deliberately not fatal; the loop follows
/// from whatever position the cursor ended up at.
pub(crate) async fn seek_to_tail<S: JournalSource>(source: &mut S) {
    let seeked = match source.seek_tail().await {
        Ok(()) => source.advance().await.map(|_| ()),
        Err(e) => Err(e),
    };

    if let Err(error) = seeked {
        warn!(%error, "seek to tail failed; following from the current position");
    }
}

/// Runs the follow loop until a fatal error, consumer hang-up, or shutdown.
///
/// Entries and the final fatal error (if any) are pushed through `tx`; the
/// loop itself never terminates the process. Shutdown interrupts a pending
/// indefinite wait.
pub(crate) async fn tail_task<S: JournalSource>(
    mut source: S,
    config: FollowConfig,
    tx: mpsc::UnboundedSender<Result<Entry>>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    seek_to_tail(&mut source).await;

    let mut transient_failures = 0u32;

    loop {
        if shutdown_rx.try_recv().is_ok() {
            debug!("shutdown requested; stopping follow loop");
            break;
        }

        match source.advance().await {
            Err(error) => {
                let _ = tx.send(Err(error));
                break;
            }
            Ok(Advance::Transient(errno)) => {
                transient_failures += 1;
                warn!(
                    errno,
                    attempt = transient_failures,
                    "transient error while reading next entry"
                );
                match config.retry {
                    RetryPolicy::Immediate => {}
                    RetryPolicy::Backoff { delay } => tokio::time::sleep(delay).await,
                    RetryPolicy::Capped { delay, limit } => {
                        if transient_failures >= limit {
                            let _ = tx.send(Err(Error::RetryLimit { limit, errno }));
                            break;
                        }
                        tokio::time::sleep(delay).await;
                    }
                }
            }
            Ok(Advance::NoData) => {
                transient_failures = 0;
                debug!("no new entry; waiting for journal change");
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("shutdown requested during wait; stopping follow loop");
                        break;
                    }
                    signal = source.wait(None) => {
                        // All change classifications get the same treatment:
                        // go around and advance again.
                        debug!(?signal, "journal change signal");
                    }
                }
            }
            Ok(Advance::Entry) => {
                transient_failures = 0;
                debug!(cursor = %source.cursor(), "delivering journal entry");
                match source.current_entry() {
                    Err(error) => {
                        let _ = tx.send(Err(error));
                        break;
                    }
                    Ok(entry) => {
                        if tx.send(Ok(entry)).is_err() {
                            // Consumer dropped the stream
                            break;
                        }
                    }
                }
            }
        }
    }
}
