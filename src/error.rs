//! Error types for journal tailing.

use thiserror::Error;

/// The main error type for journal operations.
///
/// Startup errors (`Open`, `BootId`) and in-loop call-level errors
/// (`Advance`, `Retrieve`, `NoCurrentEntry`) are fatal to the follow loop.
/// `Seek` is reported but the loop proceeds from the current position.
/// Transient read errors never surface here; they are absorbed by the
/// retry policy unless a capped policy runs out, which yields `RetryLimit`.
#[derive(Error, Debug)]
pub enum Error {
    /// The open target was missing, unreadable, or malformed.
    #[error("failed to open journal target '{target}': {source}")]
    Open {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// The boot identifier could not be determined.
    #[error("failed to read boot id: {0}")]
    BootId(String),

    /// Seeking to the journal tail failed. Non-fatal: the follow loop
    /// continues from wherever the cursor currently points.
    #[error("failed to seek to journal tail: {0}")]
    Seek(std::io::Error),

    /// A cursor advance failed at the call level.
    #[error("journal advance failed: {0}")]
    Advance(std::io::Error),

    /// The current entry could not be materialized. The file-backed
    /// journal captures entries during the advance itself and only fails
    /// retrieval with [`Error::NoCurrentEntry`]; this variant is for
    /// [`JournalSource`](crate::JournalSource) backends whose retrieval
    /// does I/O of its own.
    #[error("failed to retrieve current entry: {0}")]
    Retrieve(std::io::Error),

    /// `current_entry` was called without a preceding successful advance.
    #[error("no current entry: retrieve requires a successful advance first")]
    NoCurrentEntry,

    /// Consecutive transient read errors exceeded a capped retry policy.
    #[error("transient read errors exceeded retry limit of {limit} (last errno {errno})")]
    RetryLimit { limit: u32, errno: i32 },

    /// Change watching errors from the notify crate.
    #[error("journal watcher error: {0}")]
    Watcher(#[from] notify::Error),
}

/// A convenient Result type for journal operations.
pub type Result<T> = std::result::Result<T, Error>;
