//! Append-only JSON-lines journal of committed units of work.
//!
//! Each line is one [`JournalEntry`]. An entry is flushed and synced before
//! the in-memory state it describes becomes visible, so replaying the file
//! reproduces exactly the committed history.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};

use closingdesk_core::{EngineError, EngineResult};

use super::unit_of_work::JournalEntry;

#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    file: File,
    /// Length of the file up to the last fully appended entry.
    len: u64,
    /// Set when a failed append could not be rolled back; the tail of the
    /// file is then unknown and no further entry may be written after it.
    broken: bool,
}

fn io_error(path: &Path, err: std::io::Error) -> EngineError {
    EngineError::storage(format!("journal {}: {err}", path.display()))
}

impl Journal {
    /// Open (or create) the journal and return every entry already in it.
    ///
    /// A torn final line (crash mid-write) is truncated away.
    pub fn open(path: impl AsRef<Path>) -> EngineResult<(Self, Vec<JournalEntry>)> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| io_error(&path, e))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| io_error(&path, e))?;

        let mut entries = Vec::new();
        let mut valid_len = 0usize;
        let mut offset = 0usize;

        for (line_no, line) in contents.split_inclusive('\n').enumerate() {
            offset += line.len();
            let complete = line.ends_with('\n');
            let body = line.trim_end();
            if body.is_empty() {
                valid_len = offset;
                continue;
            }

            // Every append ends in a newline; a line without one never finished.
            if !complete {
                tracing::warn!(
                    path = %path.display(),
                    line = line_no + 1,
                    "discarding torn journal tail"
                );
                file.set_len(valid_len as u64)
                    .map_err(|e| io_error(&path, e))?;
                break;
            }

            let entry = serde_json::from_str::<JournalEntry>(body).map_err(|err| {
                EngineError::storage(format!(
                    "journal {} line {}: {err}",
                    path.display(),
                    line_no + 1
                ))
            })?;
            entries.push(entry);
            valid_len = offset;
        }

        Ok((
            Self {
                path,
                file,
                len: valid_len as u64,
                broken: false,
            },
            entries,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durably append one entry.
    ///
    /// On failure the file is cut back to its previous length, so a later
    /// append never lands behind a partial line.
    pub fn append(&mut self, entry: &JournalEntry) -> EngineResult<()> {
        if self.broken {
            return Err(EngineError::storage(format!(
                "journal {} is unusable after a failed append",
                self.path.display()
            )));
        }

        let mut line = serde_json::to_vec(entry)
            .map_err(|e| EngineError::storage(format!("journal encode: {e}")))?;
        line.push(b'\n');

        let written = self
            .file
            .write_all(&line)
            .and_then(|_| self.file.flush())
            .and_then(|_| self.file.sync_data());
        match written {
            Ok(()) => {
                self.len += line.len() as u64;
                Ok(())
            }
            Err(err) => Err(self.roll_back(err)),
        }
    }

    fn roll_back(&mut self, cause: std::io::Error) -> EngineError {
        if let Err(err) = self
            .file
            .set_len(self.len)
            .and_then(|_| self.file.sync_data())
        {
            tracing::error!(
                path = %self.path.display(),
                error = %err,
                "could not truncate journal after failed append"
            );
            self.broken = true;
        }
        io_error(&self.path, cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use closingdesk_core::DealId;

    use crate::store::unit_of_work::Write;

    fn entry(id: &str) -> JournalEntry {
        JournalEntry {
            writes: vec![Write::DeleteDeal(DealId::parse(id).unwrap())],
            audit: Vec::new(),
        }
    }

    #[test]
    fn appended_entries_are_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.journal");

        {
            let (mut journal, existing) = Journal::open(&path).unwrap();
            assert!(existing.is_empty());
            journal.append(&entry("a")).unwrap();
            journal.append(&entry("b")).unwrap();
        }

        let (_, entries) = Journal::open(&path).unwrap();
        assert_eq!(entries, vec![entry("a"), entry("b")]);
    }

    #[test]
    fn torn_tail_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.journal");

        {
            let (mut journal, _) = Journal::open(&path).unwrap();
            journal.append(&entry("a")).unwrap();
        }
        let intact = std::fs::metadata(&path).unwrap().len();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(b"{\"writes\":[{\"delete_").unwrap();
        }

        let (mut journal, entries) = Journal::open(&path).unwrap();
        assert_eq!(entries, vec![entry("a")]);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), intact);

        journal.append(&entry("b")).unwrap();
        drop(journal);
        let (_, entries) = Journal::open(&path).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn failed_append_is_rolled_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.journal");

        let (mut journal, _) = Journal::open(&path).unwrap();
        journal.append(&entry("a")).unwrap();
        let intact = std::fs::metadata(&path).unwrap().len();

        // Half a line reached the disk before the write failed.
        journal.file.write_all(b"{\"writes\":[{\"delete_").unwrap();
        let err = journal.roll_back(std::io::Error::other("disk full"));
        assert_eq!(err.kind(), "storage_error");
        assert_eq!(std::fs::metadata(&path).unwrap().len(), intact);

        journal.append(&entry("b")).unwrap();
        drop(journal);
        let (_, entries) = Journal::open(&path).unwrap();
        assert_eq!(entries, vec![entry("a"), entry("b")]);
    }

    #[test]
    fn journal_refuses_appends_once_rollback_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.journal");

        let (mut journal, _) = Journal::open(&path).unwrap();
        journal.append(&entry("a")).unwrap();

        // A read-only handle fails both the write and the truncation.
        journal.file = File::open(&path).unwrap();
        assert_eq!(journal.append(&entry("b")).unwrap_err().kind(), "storage_error");
        assert!(journal.broken);

        journal.file = OpenOptions::new().append(true).open(&path).unwrap();
        assert_eq!(journal.append(&entry("c")).unwrap_err().kind(), "storage_error");
        drop(journal);

        let (_, entries) = Journal::open(&path).unwrap();
        assert_eq!(entries, vec![entry("a")]);
    }

    #[test]
    fn corrupt_middle_line_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.journal");
        std::fs::write(&path, "not json\n").unwrap();

        let err = Journal::open(&path).unwrap_err();
        assert_eq!(err.kind(), "storage_error");
    }
}
