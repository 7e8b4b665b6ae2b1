//! Change notification for journal files, built on the notify crate.

use crate::error::Result;
use crate::source::ChangeSignal;
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

/// Watches the parent directories of a fixed set of journal files and
/// turns filesystem events into [`ChangeSignal`]s.
pub(crate) struct JournalWatcher {
    _watcher: RecommendedWatcher,
    receiver: mpsc::UnboundedReceiver<notify::Result<Event>>,
    file_names: Vec<String>,
}

impl JournalWatcher {
    /// Creates a watcher over the given journal files. Each distinct parent
    /// directory is watched non-recursively; events for unrelated files in
    /// those directories are filtered out.
    pub(crate) fn new(files: &[PathBuf]) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        let mut dirs: Vec<PathBuf> = files
            .iter()
            .map(|path| parent_dir(path).to_path_buf())
            .collect();
        dirs.sort();
        dirs.dedup();

        for dir in &dirs {
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
        }

        let file_names = files
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().to_string())
            .collect();

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            file_names,
        })
    }

    /// Blocks until a relevant change arrives or the timeout elapses.
    /// `None` waits indefinitely.
    pub(crate) async fn change(&mut self, timeout: Option<Duration>) -> ChangeSignal {
        match timeout {
            None => self.next_relevant().await,
            Some(limit) => tokio::time::timeout(limit, self.next_relevant())
                .await
                .unwrap_or(ChangeSignal::NoChange),
        }
    }

    async fn next_relevant(&mut self) -> ChangeSignal {
        loop {
            match self.receiver.recv().await {
                // Watcher dropped; nothing more will ever arrive.
                None => return ChangeSignal::NoChange,
                Some(Err(error)) => {
                    warn!(%error, "journal watcher reported an error");
                    return ChangeSignal::Unrecognized;
                }
                Some(Ok(event)) => {
                    if !is_event_relevant(&event, &self.file_names) {
                        continue;
                    }
                    match classify_event(&event) {
                        // Access and other non-change events keep us waiting.
                        ChangeSignal::NoChange => continue,
                        signal => return signal,
                    }
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn file_names(&self) -> &[String] {
        &self.file_names
    }
}

/// The directory to register with notify for a given journal file.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Check if a notify event touches any of the watched journal files.
pub(crate) fn is_event_relevant(event: &Event, file_names: &[String]) -> bool {
    event.paths.iter().any(|path| {
        path.file_name()
            .map(|name| file_names.iter().any(|f| name.to_string_lossy() == *f))
            .unwrap_or(false)
    })
}

/// Maps a filesystem event onto the journal change taxonomy.
pub(crate) fn classify_event(event: &Event) -> ChangeSignal {
    match event.kind {
        EventKind::Create(_) => ChangeSignal::Appended,
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) => ChangeSignal::Appended,
        EventKind::Modify(ModifyKind::Name(_)) | EventKind::Remove(_) => ChangeSignal::Invalidated,
        EventKind::Access(_) => ChangeSignal::NoChange,
        _ => ChangeSignal::Unrecognized,
    }
}
