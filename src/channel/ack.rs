use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use web_time::Instant;

/// Result of waiting for an acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AckWait {
    Confirmed { after: Duration },
    TimedOut { waited: Duration },
}

/// Polls the acknowledgment file the renderer writes after each batch.
#[derive(Debug, Clone)]
pub(crate) struct AckWatcher {
    path: PathBuf,
}

impl AckWatcher {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Remove a stale acknowledgment file left by an earlier session.
    pub(crate) fn reset(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Whether any line of the file equals `seq`. Scans from the top.
    pub(crate) fn contains(&self, seq: u64) -> bool {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return false;
        };
        let expected = seq.to_string();
        content.lines().any(|line| line.trim() == expected)
    }

    /// Block until `seq` is acknowledged or `timeout` elapses.
    pub(crate) fn wait_for(
        &self,
        seq: u64,
        timeout: Duration,
        interval: Duration,
    ) -> AckWait {
        let start = Instant::now();
        loop {
            if self.contains(seq) {
                return AckWait::Confirmed {
                    after: start.elapsed(),
                };
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return AckWait::TimedOut { waited: elapsed };
            }
            std::thread::sleep(interval.min(timeout - elapsed));
        }
    }
}
