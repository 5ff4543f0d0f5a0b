use std::fmt;

/// Lifecycle of a [`CommandChannel`](super::CommandChannel).
///
/// ```text
/// Disconnected -> Idle -> Flushing -> AwaitingAck -> Idle -> ... -> ShutDown
///                   \                     \
///                    \-> Disconnected      \-> Degraded -> (recover) Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    /// No control stream bound; commands are dropped.
    #[default]
    Disconnected,
    /// Connected and accepting commands.
    Idle,
    /// Writing a batch to the command file.
    Flushing,
    /// Batch delivered, waiting for its acknowledgment.
    AwaitingAck,
    /// An acknowledgment timed out; flushes are refused until recovery.
    Degraded,
    /// Closed for good.
    ShutDown,
}

impl ChannelState {
    /// Whether a control stream is bound (even if degraded).
    #[must_use]
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            Self::Idle | Self::Flushing | Self::AwaitingAck | Self::Degraded
        )
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Idle => "idle",
            Self::Flushing => "flushing",
            Self::AwaitingAck => "awaiting-ack",
            Self::Degraded => "degraded",
            Self::ShutDown => "shut-down",
        };
        f.write_str(name)
    }
}
