use std::path::PathBuf;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[schemars(title = "Channel", inline)]
#[serde(default)]
/// Shared-file channel locations and acknowledgment timing.
pub struct ChannelOptions {
    /// Directory holding the command, acknowledgment and journal files.
    #[schemars(title = "Working Directory")]
    pub work_dir: PathBuf,
    /// Command file name, overwritten on every flush.
    #[schemars(title = "Command File")]
    pub command_file: String,
    /// Acknowledgment file name, written by the renderer.
    #[schemars(title = "Acknowledgment File")]
    pub ack_file: String,
    /// Session journal file name, appended with every batch.
    #[schemars(title = "Journal File")]
    pub journal_file: String,
    /// Prefix of the sentinel line closing every batch.
    #[schemars(title = "End Marker")]
    pub end_marker: String,
    /// How long a flush waits for its acknowledgment.
    #[schemars(title = "Ack Timeout (ms)", range(min = 100, max = 60000))]
    pub ack_timeout_ms: u64,
    /// Sleep between acknowledgment file polls.
    #[schemars(title = "Poll Interval (ms)", range(min = 1, max = 1000))]
    pub poll_interval_ms: u64,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("molrelay"),
            command_file: "commands.pml".into(),
            ack_file: "ack.txt".into(),
            journal_file: "session.log".into(),
            end_marker: "END".into(),
            ack_timeout_ms: 4000,
            poll_interval_ms: 25,
        }
    }
}

impl ChannelOptions {
    /// Channel options rooted at `work_dir`, other fields default.
    #[must_use]
    pub fn in_dir(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            ..Self::default()
        }
    }

    /// Full path of the command file.
    #[must_use]
    pub fn command_path(&self) -> PathBuf {
        self.work_dir.join(&self.command_file)
    }

    /// Full path of the acknowledgment file.
    #[must_use]
    pub fn ack_path(&self) -> PathBuf {
        self.work_dir.join(&self.ack_file)
    }

    /// Full path of the session journal.
    #[must_use]
    pub fn journal_path(&self) -> PathBuf {
        self.work_dir.join(&self.journal_file)
    }

    /// Acknowledgment timeout as a [`Duration`].
    #[must_use]
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    /// Poll interval as a [`Duration`] (at least one millisecond).
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
