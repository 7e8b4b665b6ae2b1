//! Test utilities for creating temporary journal directories.

#[cfg(test)]
use std::fs::{File, OpenOptions};
#[cfg(test)]
use std::io::Write;
#[cfg(test)]
use std::path::{Path, PathBuf};

/// A temporary journal directory holding one primary file
/// (`system.journal`) that tests can append entries to.
#[cfg(test)]
pub struct TempJournal {
    path: PathBuf,
    _temp_dir: tempfile::TempDir,
}

#[cfg(test)]
impl TempJournal {
    /// Create a new temporary journal with an empty primary file
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("system.journal");

        File::create(&path)?;

        Ok(Self {
            path,
            _temp_dir: temp_dir,
        })
    }

    /// Create a temporary journal seeded with one entry per line
    pub fn with_entries(entries: &[&str]) -> std::io::Result<Self> {
        let journal = Self::new()?;
        for entry in entries {
            journal.append_entry(entry)?;
        }
        Ok(journal)
    }

    /// Append one newline-terminated entry to the primary file
    pub fn append_entry(&self, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;

        writeln!(file, "{}", entry)?;
        file.flush()?;
        Ok(())
    }

    /// Append raw bytes without a trailing newline (partial writes,
    /// undecodable content)
    pub fn append_raw(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;

        file.write_all(bytes)?;
        file.flush()?;
        Ok(())
    }

    /// Append one newline-terminated entry to a named file in the
    /// journal directory
    pub fn append_to(&self, name: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(self._temp_dir.path().join(name))?;

        writeln!(file, "{}", entry)?;
        file.flush()?;
        Ok(())
    }

    /// Create an additional file in the journal directory
    pub fn create_file(&self, name: &str, content: &str) -> std::io::Result<()> {
        let mut file = File::create(self._temp_dir.path().join(name))?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Truncate the primary file (simulate rotation in place)
    pub fn truncate(&self) -> std::io::Result<()> {
        File::create(&self.path)?;
        Ok(())
    }

    /// Path of the primary journal file
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    /// Path of the journal directory
    pub fn dir_path(&self) -> &Path {
        self._temp_dir.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_journal_creation() {
        let journal = TempJournal::new().unwrap();
        assert!(journal.file_path().exists());
        assert!(journal.dir_path().is_dir());
    }

    #[test]
    fn test_with_entries() {
        let journal = TempJournal::with_entries(&["one", "two"]).unwrap();

        let content = std::fs::read_to_string(journal.file_path()).unwrap();
        assert_eq!(content, "one\ntwo\n");
    }

    #[test]
    fn test_append_entry() {
        let journal = TempJournal::new().unwrap();
        journal.append_entry("line 1").unwrap();
        journal.append_entry("line 2").unwrap();

        let content = std::fs::read_to_string(journal.file_path()).unwrap();
        assert!(content.contains("line 1"));
        assert!(content.contains("line 2"));
    }

    #[test]
    fn test_append_raw_has_no_newline() {
        let journal = TempJournal::new().unwrap();
        journal.append_raw(b"partial").unwrap();

        let content = std::fs::read_to_string(journal.file_path()).unwrap();
        assert_eq!(content, "partial");
    }

    #[test]
    fn test_append_to_named_file() {
        let journal = TempJournal::new().unwrap();
        journal.append_to("a.journal", "first").unwrap();
        journal.append_to("a.journal", "second").unwrap();

        let content = std::fs::read_to_string(journal.dir_path().join("a.journal")).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn test_create_file() {
        let journal = TempJournal::new().unwrap();
        journal.create_file("archive.journal", "archived\n").unwrap();

        let content =
            std::fs::read_to_string(journal.dir_path().join("archive.journal")).unwrap();
        assert_eq!(content, "archived\n");
    }

    #[test]
    fn test_truncate() {
        let journal = TempJournal::with_entries(&["initial content"]).unwrap();
        journal.truncate().unwrap();

        let content = std::fs::read_to_string(journal.file_path()).unwrap();
        assert!(content.is_empty());
    }
}
