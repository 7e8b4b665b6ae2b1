//! A file-backed journal source.
//!
//! The journal is line-oriented: one complete, newline-terminated line is
//! one entry. A target may name the local system journal directory, an
//! arbitrary directory of journal files, or a single file. The file set is
//! fixed at open time; each advance scans the set round-robin from the
//! current position, so an append landing in any of the files gets
//! delivered, with an explicit byte-offset cursor per file.

use std::collections::HashMap;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::source::{
    Advance, ChangeSignal, Cursor, Entry, JournalSource, CURSOR_FIELD, MESSAGE_FIELD,
    SOURCE_FILE_FIELD,
};
use crate::watcher::JournalWatcher;

/// Sentinel target naming the live local system journal.
pub const LOCAL_SYSTEM_JOURNAL: &str = "LOCAL_SYSTEM_JOURNAL";

/// Where the sentinel (or an empty target) resolves to.
const LOCAL_JOURNAL_DIR: &str = "/var/log/journal";

/// Boot session token, one per machine boot.
const BOOT_ID_PATH: &str = "/proc/sys/kernel/random/boot_id";

/// Linux EILSEQ, reported for entries that fail to decode.
const EILSEQ: i32 = 84;

/// An open file-backed journal.
pub struct FileJournal {
    files: Vec<PathBuf>,
    /// Byte offset of the next unread entry in each file.
    consumed: Vec<u64>,
    cursor: Cursor,
    current: Option<Entry>,
    watcher: JournalWatcher,
    /// Stands in for the boot id on hosts without a readable boot_id file.
    fallback_boot_id: String,
}

impl FileJournal {
    /// Opens a journal from a target string.
    ///
    /// Resolution order: the [`LOCAL_SYSTEM_JOURNAL`] sentinel (or an empty
    /// target) maps to the local system journal directory; otherwise the
    /// path is stat'ed to distinguish a directory of journal files from a
    /// single file. Stat failure surfaces as [`Error::Open`].
    pub async fn open(target: &str) -> Result<Self> {
        let files = resolve_target(target).await?;
        debug!(target, file_count = files.len(), "opened journal target");

        let watcher = JournalWatcher::new(&files)?;

        Ok(Self {
            consumed: vec![0; files.len()],
            files,
            cursor: Cursor::default(),
            current: None,
            watcher,
            fallback_boot_id: Uuid::new_v4().to_string(),
        })
    }

    /// The ordered file set this journal reads from.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    fn make_entry(&self, message: String, position: Cursor) -> Entry {
        let mut fields = HashMap::new();
        fields.insert(MESSAGE_FIELD.to_string(), message);
        fields.insert(
            SOURCE_FILE_FIELD.to_string(),
            self.files[position.file].display().to_string(),
        );
        fields.insert(CURSOR_FIELD.to_string(), position.to_string());
        Entry::from_fields(fields)
    }
}

#[async_trait]
impl JournalSource for FileJournal {
    fn boot_id(&self) -> Result<String> {
        match std::fs::read_to_string(BOOT_ID_PATH) {
            Ok(raw) => {
                let id = raw.trim().to_string();
                if id.is_empty() {
                    Err(Error::BootId("boot id token is empty".to_string()))
                } else {
                    Ok(id)
                }
            }
            // Not a Linux host (or /proc unavailable); a handle-lifetime
            // token still gives callers a usable identifier.
            Err(_) => Ok(self.fallback_boot_id.clone()),
        }
    }

    /// Skips every complete entry in every file, then re-exposes the
    /// newest entry of the last file. The next advance re-reads that
    /// entry; the follow loop's throwaway advance discards it so only
    /// entries appended after this point get delivered.
    async fn seek_tail(&mut self) -> Result<()> {
        let last = self.files.len() - 1;

        for idx in 0..=last {
            let (start, end) = scan_complete_lines(&self.files[idx])
                .await
                .map_err(Error::Seek)?;
            self.consumed[idx] = if idx == last { start } else { end };
        }

        self.cursor = Cursor {
            file: last,
            offset: self.consumed[last],
        };
        self.current = None;
        debug!(cursor = %self.cursor, "sought to journal tail");
        Ok(())
    }

    async fn advance(&mut self) -> Result<Advance> {
        // Scan the file set round-robin from the current position; a live
        // append can land in any of the opened files.
        let count = self.files.len();
        for step in 0..count {
            let idx = (self.cursor.file + step) % count;

            let size = match tokio::fs::metadata(&self.files[idx]).await {
                Ok(meta) => meta.len(),
                // A removed file reads as empty until it reappears.
                Err(e) if e.kind() == ErrorKind::NotFound => 0,
                Err(e) => return Err(Error::Advance(e)),
            };

            // Truncation (rotation in place): start over from the new head.
            if size < self.consumed[idx] {
                debug!(file = idx, size, "journal file truncated; resetting offset");
                self.consumed[idx] = 0;
            }

            let offset = self.consumed[idx];
            if offset >= size {
                continue;
            }

            let file = File::open(&self.files[idx]).await.map_err(Error::Advance)?;
            let mut reader = BufReader::new(file);
            reader
                .seek(SeekFrom::Start(offset))
                .await
                .map_err(Error::Advance)?;

            let mut raw = Vec::new();
            let n = reader
                .read_until(b'\n', &mut raw)
                .await
                .map_err(Error::Advance)?;
            if n == 0 || raw.last() != Some(&b'\n') {
                // Vanished under us, or a partial trailing line whose write
                // is still in flight; look at the other files.
                continue;
            }

            let position = Cursor { file: idx, offset };
            self.consumed[idx] += n as u64;
            self.cursor = Cursor {
                file: idx,
                offset: self.consumed[idx],
            };

            raw.pop();
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }

            return match String::from_utf8(raw) {
                Ok(message) => {
                    self.current = Some(self.make_entry(message, position));
                    Ok(Advance::Entry)
                }
                Err(_) => {
                    // Undecodable entry: skip it, report a transient error.
                    self.current = None;
                    Ok(Advance::Transient(EILSEQ))
                }
            };
        }

        Ok(Advance::NoData)
    }

    fn current_entry(&self) -> Result<Entry> {
        self.current.clone().ok_or(Error::NoCurrentEntry)
    }

    async fn wait(&mut self, timeout: Option<std::time::Duration>) -> ChangeSignal {
        self.watcher.change(timeout).await
    }

    fn cursor(&self) -> Cursor {
        self.cursor
    }
}

/// Offsets of the start of a file's last complete line and of the position
/// just past it. Both zero for an empty or missing file; a trailing
/// partial line is not counted.
async fn scan_complete_lines(path: &Path) -> std::io::Result<(u64, u64)> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok((0, 0)),
        Err(e) => return Err(e),
    };

    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut pos = 0u64;
    let (mut start, mut end) = (0u64, 0u64);
    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf).await?;
        if n == 0 {
            break;
        }
        if buf.last() == Some(&b'\n') {
            start = pos;
            end = pos + n as u64;
        }
        pos += n as u64;
    }
    Ok((start, end))
}

/// Expands an open target into the ordered set of journal files to read.
async fn resolve_target(target: &str) -> Result<Vec<PathBuf>> {
    let path = if target.is_empty() || target == LOCAL_SYSTEM_JOURNAL {
        PathBuf::from(LOCAL_JOURNAL_DIR)
    } else {
        PathBuf::from(target)
    };

    let open_error = |source: std::io::Error| Error::Open {
        target: target.to_string(),
        source,
    };

    let meta = tokio::fs::metadata(&path).await.map_err(open_error)?;

    if !meta.is_dir() {
        return Ok(vec![path]);
    }

    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(&path).await.map_err(open_error)?;
    while let Some(dirent) = entries.next_entry().await.map_err(open_error)? {
        let candidate = dirent.path();
        let is_file = dirent
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if is_file && is_journal_file(&candidate) {
            files.push(candidate);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(open_error(std::io::Error::new(
            ErrorKind::NotFound,
            "no journal files in directory",
        )));
    }
    Ok(files)
}

fn is_journal_file(path: &std::path::Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("journal") | Some("log")
    )
}
