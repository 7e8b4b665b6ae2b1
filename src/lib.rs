//! A journal tail-follower: attaches to an append-only, indexed log store,
//! positions itself just past the newest entry, and then streams newly
//! appended entries as they arrive, indefinitely.
//!
//! The open target is a single string: the `LOCAL_SYSTEM_JOURNAL` sentinel
//! (or an empty string) for the live local journal, a directory of journal
//! files, or a single journal file.
//!
//! # Example
//!
//! ```rust,no_run
//! use journal_tail::follow_journal;
//! use tokio_stream::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut stream = follow_journal("/var/log/journal").await?;
//!     println!("BootID: {}", stream.boot_id());
//!
//!     while let Some(entry) = stream.next().await {
//!         match entry {
//!             Ok(entry) => println!("{}", entry),
//!             Err(e) => eprintln!("Error: {}", e),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

// Internal modules - not part of public API
mod error;
mod journal;
mod stream;
mod tail;
mod watcher;

// The source interface is public so alternative backends can be followed
pub mod source;

#[cfg(test)]
mod test_helpers;

// Public API exports
pub use error::{Error, Result};
pub use journal::{FileJournal, LOCAL_SYSTEM_JOURNAL};
pub use source::{Advance, ChangeSignal, Cursor, Entry, JournalSource};
pub use stream::JournalStream;
pub use tail::{FollowConfig, RetryPolicy};

/// Opens a journal target and follows its tail with default configuration.
///
/// Entries that existed before the call are never yielded; the first item
/// is the first entry appended afterwards. See [`JournalStream::open`] for
/// configuring the transient-error retry policy.
pub async fn follow_journal(target: &str) -> Result<JournalStream> {
    JournalStream::open(target, FollowConfig::default()).await
}
