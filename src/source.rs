//! The journal source interface and its data model.
//!
//! A [`JournalSource`] is an open, seekable, waitable log store with a
//! monotonic cursor. The follow loop in this crate is written against this
//! trait so that any backend with journal semantics can be tailed.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Field holding the human-readable entry payload.
pub const MESSAGE_FIELD: &str = "MESSAGE";

/// Field holding the path of the file the entry was read from.
pub const SOURCE_FILE_FIELD: &str = "_SOURCE_FILE";

/// Field holding the serialized cursor of the entry's position.
pub const CURSOR_FIELD: &str = "__CURSOR";

/// An explicit read position within a journal.
///
/// `file` indexes into the ordered file set the journal was opened over;
/// `offset` is the byte offset within that file. Cursors compare in journal
/// order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor {
    pub file: usize,
    pub offset: u64,
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.offset)
    }
}

/// Outcome of moving the cursor forward by one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Exactly one new entry is now current and may be retrieved.
    Entry,
    /// The cursor is at the tail; no new entry is available yet.
    NoData,
    /// The store reported a recoverable read error (system error code).
    /// The entry at that position is skipped; the caller decides how to
    /// retry.
    Transient(i32),
}

/// Classification of a blocking wait's outcome.
///
/// The follow loop handles all four values identically; the distinction
/// exists for observability only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSignal {
    /// The wait timed out without the store signalling anything.
    NoChange,
    /// New data was appended to the store.
    Appended,
    /// Part of the store was invalidated (rotated, removed, renamed).
    Invalidated,
    /// The store signalled something this crate does not classify.
    Unrecognized,
}

/// One retrieved journal record: a mapping from field name to field value.
///
/// Entries are captured (copied out of the source) at retrieval time, so
/// they remain valid after the cursor advances again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    fields: HashMap<String, String>,
}

impl Entry {
    pub(crate) fn from_fields(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// The entry's payload, if present.
    pub fn message(&self) -> Option<&str> {
        self.field(MESSAGE_FIELD)
    }

    /// The serialized cursor of the entry's position, if present.
    pub fn cursor_token(&self) -> Option<&str> {
        self.field(CURSOR_FIELD)
    }

    /// The file this entry was read from, if present.
    pub fn source_file(&self) -> Option<&str> {
        self.field(SOURCE_FILE_FIELD)
    }

    /// Iterates over all fields in unspecified order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Entry {
    /// Renders all fields as `NAME=value` pairs, sorted by name.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();

        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}={}", name, &self.fields[*name])?;
        }
        Ok(())
    }
}

/// An open, seekable, waitable log store with a monotonic cursor.
///
/// At most one entry is "current" at any time, established by an
/// [`Advance::Entry`] result; calling [`current_entry`](Self::current_entry)
/// without one returns [`Error::NoCurrentEntry`](crate::Error::NoCurrentEntry).
#[async_trait]
pub trait JournalSource: Send {
    /// The opaque token identifying the current machine boot session.
    /// Read once after opening; used for display and diagnostics only.
    fn boot_id(&self) -> Result<String>;

    /// Positions the cursor at the newest existing entry, so that one
    /// further advance consumes it and subsequent advances only see entries
    /// appended afterwards.
    async fn seek_tail(&mut self) -> Result<()>;

    /// Moves the cursor forward by exactly one entry if available.
    async fn advance(&mut self) -> Result<Advance>;

    /// Materializes the entry at the current cursor position.
    fn current_entry(&self) -> Result<Entry>;

    /// Blocks until the store signals a change or the timeout elapses.
    /// `None` waits indefinitely.
    async fn wait(&mut self, timeout: Option<Duration>) -> ChangeSignal;

    /// The current read position.
    fn cursor(&self) -> Cursor;
}
