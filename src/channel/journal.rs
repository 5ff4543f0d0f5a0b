use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::batch::FlushBatch;

/// Append-only audit trail of everything sent to the renderer.
#[derive(Debug, Clone)]
pub(crate) struct Journal {
    path: PathBuf,
}

impl Journal {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, write: impl FnOnce(&mut dyn Write) -> io::Result<()>) {
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|file| {
                let mut out = BufWriter::new(file);
                write(&mut out)?;
                out.flush()
            });
        if let Err(e) = result {
            log::warn!("journal {} not written: {e}", self.path.display());
        }
    }

    /// Record a flushed batch under a `# batch <seq>` header.
    pub(crate) fn record_batch(&self, batch: &FlushBatch) {
        self.append(|out| {
            writeln!(out, "# batch {}", batch.seq())?;
            for line in batch.lines() {
                writeln!(out, "{line}")?;
            }
            Ok(())
        });
    }

    /// Record a line written straight to the control stream.
    pub(crate) fn record_direct(&self, line: &str) {
        self.append(|out| writeln!(out, "# direct\n{line}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;

    #[test]
    fn batches_accumulate() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("session.log"));
        let cmd = Command::new("show sticks").unwrap();
        journal.record_batch(&FlushBatch::new(1, vec![cmd.clone()], "END"));
        journal.record_batch(&FlushBatch::new(2, vec![cmd], "END"));
        journal.record_direct("quit");
        let text = std::fs::read_to_string(journal.path()).unwrap();
        assert_eq!(
            text,
            "# batch 1\nshow sticks\nEND1\n# batch 2\nshow sticks\nEND2\n\
             # direct\nquit\n"
        );
    }

    #[test]
    fn unwritable_journal_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("missing").join("s.log"));
        journal.record_direct("quit");
        assert!(!journal.path().exists());
    }
}
