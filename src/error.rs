//! Crate-level error types.

use std::fmt;
use std::time::Duration;

/// Errors produced by the molrelay crate.
///
/// Every variant is recoverable at the facade boundary: the host keeps
/// running with visualization degraded.
#[derive(Debug)]
pub enum RelayError {
    /// Writing to the renderer's control stream failed (broken pipe or
    /// exited process). The channel is now disconnected.
    Transport(std::io::Error),
    /// A batch was delivered but never acknowledged. The channel is now
    /// degraded and refuses flushes until it is explicitly reconnected.
    AckTimeout {
        /// Sequence number of the unacknowledged batch.
        seq: u64,
        /// How long the channel waited before giving up.
        waited: Duration,
    },
    /// The channel is degraded after an acknowledgment timeout.
    Degraded,
    /// No renderer is connected.
    NotConnected,
    /// The channel has been shut down for good.
    ShutDown,
    /// An edge set packs into more groups than the renderer accepts.
    SelectionTooLarge {
        /// Distinct first coordinates after packing.
        groups: usize,
        /// Configured group ceiling.
        limit: usize,
    },
    /// Command text contained a line break.
    InvalidCommand(String),
    /// The renderer executable could not be launched.
    Launch(std::io::Error),
    /// Generic I/O failure (command file, journal, options file).
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "renderer transport error: {e}"),
            Self::AckTimeout { seq, waited } => write!(
                f,
                "batch {seq} not acknowledged within {} ms",
                waited.as_millis()
            ),
            Self::Degraded => {
                write!(f, "channel degraded; reconnect before flushing")
            }
            Self::NotConnected => write!(f, "no renderer connected"),
            Self::ShutDown => write!(f, "channel has been shut down"),
            Self::SelectionTooLarge { groups, limit } => write!(
                f,
                "selection too large: {groups} groups exceed limit of {limit}"
            ),
            Self::InvalidCommand(text) => {
                write!(f, "command contains a line break: {text:?}")
            }
            Self::Launch(e) => write!(f, "failed to launch renderer: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
        }
    }
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) | Self::Launch(e) | Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RelayError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
