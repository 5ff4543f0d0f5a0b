//! Flow-controlled, acknowledged delivery of command batches.
//!
//! Commands accumulate in an in-memory buffer. [`CommandChannel::flush`]
//! writes them to the shared command file followed by a sentinel line
//! carrying the batch sequence number, tells the renderer to execute the
//! file over its control stream, then blocks until the renderer writes the
//! sequence number into the acknowledgment file or the timeout elapses.
//!
//! Delivery is at-most-once. The buffer is cleared before any I/O, and
//! neither a timeout nor a broken control stream is retried: the channel
//! drops to [`ChannelState::Degraded`] or [`ChannelState::Disconnected`]
//! and stays there until its owner reconnects it.

mod ack;
mod batch;
mod journal;
mod state;
#[cfg(test)]
pub(crate) mod test_support;

use std::io::Write;
use std::path::{Path, PathBuf};

pub use batch::FlushBatch;
pub use state::ChannelState;

use self::ack::{AckWait, AckWatcher};
use self::journal::Journal;
use crate::command::Command;
use crate::error::RelayError;
use crate::options::ChannelOptions;

/// Control stream the channel writes `@<file>` instructions to.
pub type ControlSink = Box<dyn Write + Send>;

/// What a successful flush did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// The buffer was empty; nothing was written.
    Empty,
    /// The batch was executed and acknowledged.
    Acknowledged {
        /// Sequence number of the batch.
        seq: u64,
    },
}

/// Owns the command buffer and the channel state.
pub struct CommandChannel {
    options: ChannelOptions,
    command_path: PathBuf,
    ack: AckWatcher,
    journal: Journal,
    sink: Option<ControlSink>,
    buffer: Vec<Command>,
    state: ChannelState,
    last_seq: u64,
}

impl CommandChannel {
    /// Disconnected channel whose files live in `options.work_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Io`] if the working directory cannot be
    /// created or resolved to an absolute path.
    pub fn new(options: ChannelOptions) -> Result<Self, RelayError> {
        std::fs::create_dir_all(&options.work_dir)?;
        let command_path = std::path::absolute(options.command_path())?;
        let ack = AckWatcher::new(std::path::absolute(options.ack_path())?);
        let journal =
            Journal::new(std::path::absolute(options.journal_path())?);
        Ok(Self {
            options,
            command_path,
            ack,
            journal,
            sink: None,
            buffer: Vec::new(),
            state: ChannelState::Disconnected,
            last_seq: 0,
        })
    }

    /// Bind the channel to a renderer's control stream.
    ///
    /// Any acknowledgment file left over from an earlier session is removed.
    /// Sequence numbers keep counting from where they were.
    ///
    /// # Errors
    ///
    /// [`RelayError::ShutDown`] after [`close`](Self::close);
    /// [`RelayError::Io`] if the stale acknowledgment file cannot be
    /// removed.
    pub fn connect(&mut self, sink: ControlSink) -> Result<(), RelayError> {
        if self.state == ChannelState::ShutDown {
            return Err(RelayError::ShutDown);
        }
        self.ack.reset()?;
        self.sink = Some(sink);
        self.buffer.clear();
        self.state = ChannelState::Idle;
        log::debug!("channel connected, next batch {}", self.last_seq + 1);
        Ok(())
    }

    /// Rebind after a transport failure. Same as [`connect`](Self::connect).
    ///
    /// # Errors
    ///
    /// As for [`connect`](Self::connect).
    pub fn reconnect(&mut self, sink: ControlSink) -> Result<(), RelayError> {
        self.connect(sink)
    }

    /// Leave the degraded state while keeping the bound control stream.
    ///
    /// # Errors
    ///
    /// [`RelayError::NotConnected`] when no control stream is bound;
    /// [`RelayError::ShutDown`] after [`close`](Self::close).
    pub fn recover(&mut self) -> Result<(), RelayError> {
        match self.state {
            ChannelState::Degraded if self.sink.is_some() => {
                log::info!("channel recovered after batch {}", self.last_seq);
                self.state = ChannelState::Idle;
                Ok(())
            }
            ChannelState::Idle => Ok(()),
            ChannelState::ShutDown => Err(RelayError::ShutDown),
            _ => Err(RelayError::NotConnected),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Whether commands are currently accepted.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == ChannelState::Idle
    }

    /// Number of buffered, not yet flushed commands.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Sequence number of the most recent batch (0 before the first).
    #[must_use]
    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    /// Absolute path of the command file.
    #[must_use]
    pub fn command_path(&self) -> &Path {
        &self.command_path
    }

    /// Absolute path of the acknowledgment file.
    #[must_use]
    pub fn ack_path(&self) -> &Path {
        self.ack.path()
    }

    /// Absolute path of the session journal.
    #[must_use]
    pub fn journal_path(&self) -> &Path {
        self.journal.path()
    }

    /// Append a command to the buffer.
    ///
    /// Outside [`ChannelState::Idle`] the command is dropped with a warning.
    pub fn enqueue(&mut self, command: Command) {
        if self.state == ChannelState::Idle {
            self.buffer.push(command);
        } else {
            log::warn!("channel {}: dropping command {command}", self.state);
        }
    }

    /// Append several commands, preserving their order.
    pub fn enqueue_all(&mut self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.enqueue(command);
        }
    }

    /// Deliver the buffered commands and wait for their acknowledgment.
    ///
    /// An empty buffer returns [`FlushOutcome::Empty`] immediately without
    /// touching any file.
    ///
    /// # Errors
    ///
    /// - [`RelayError::Degraded`], [`RelayError::NotConnected`] or
    ///   [`RelayError::ShutDown`] when the channel is not idle; the buffer is
    ///   discarded.
    /// - [`RelayError::Io`] when the command file cannot be written.
    /// - [`RelayError::Transport`] when the control stream write fails; the
    ///   channel is now disconnected.
    /// - [`RelayError::AckTimeout`] when no acknowledgment arrives in time;
    ///   the channel is now degraded.
    pub fn flush(&mut self) -> Result<FlushOutcome, RelayError> {
        if self.buffer.is_empty() {
            return Ok(FlushOutcome::Empty);
        }
        if let Some(refusal) = self.refusal() {
            log::warn!(
                "channel {}: discarding {} unflushed commands",
                self.state,
                self.buffer.len()
            );
            self.buffer.clear();
            return Err(refusal);
        }

        self.state = ChannelState::Flushing;
        self.last_seq += 1;
        let batch = FlushBatch::new(
            self.last_seq,
            std::mem::take(&mut self.buffer),
            &self.options.end_marker,
        );
        let written = batch.write_to(&self.command_path);
        self.journal.record_batch(&batch);
        if let Err(e) = written {
            log::error!(
                "batch {} not written to {}: {e}",
                batch.seq(),
                self.command_path.display()
            );
            self.state = ChannelState::Idle;
            return Err(RelayError::Io(e));
        }

        let instruction = format!("@{}", self.command_path.display());
        self.write_control(&instruction)?;
        log::debug!(
            "batch {} sent ({} commands)",
            batch.seq(),
            batch.commands().len()
        );

        self.state = ChannelState::AwaitingAck;
        match self.ack.wait_for(
            batch.seq(),
            self.options.ack_timeout(),
            self.options.poll_interval(),
        ) {
            AckWait::Confirmed { after } => {
                log::debug!(
                    "batch {} acknowledged after {} ms",
                    batch.seq(),
                    after.as_millis()
                );
                self.state = ChannelState::Idle;
                Ok(FlushOutcome::Acknowledged { seq: batch.seq() })
            }
            AckWait::TimedOut { waited } => {
                log::error!(
                    "batch {} not acknowledged within {} ms, channel degraded",
                    batch.seq(),
                    waited.as_millis()
                );
                self.state = ChannelState::Degraded;
                Err(RelayError::AckTimeout {
                    seq: batch.seq(),
                    waited,
                })
            }
        }
    }

    /// Write one command straight to the control stream, bypassing the
    /// buffer and without waiting for any acknowledgment.
    ///
    /// # Errors
    ///
    /// [`RelayError::NotConnected`] without a control stream;
    /// [`RelayError::Transport`] when the write fails.
    pub fn send_direct(&mut self, command: &Command) -> Result<(), RelayError> {
        self.journal.record_direct(command.as_str());
        self.write_control(command.as_str())
    }

    /// Drop the control stream and refuse all further use. Idempotent.
    pub fn close(&mut self) {
        if self.state == ChannelState::ShutDown {
            return;
        }
        self.sink = None;
        self.buffer.clear();
        self.state = ChannelState::ShutDown;
        log::debug!("channel closed after batch {}", self.last_seq);
    }

    fn refusal(&self) -> Option<RelayError> {
        match self.state {
            ChannelState::Idle => None,
            ChannelState::Degraded => Some(RelayError::Degraded),
            ChannelState::ShutDown => Some(RelayError::ShutDown),
            ChannelState::Disconnected
            | ChannelState::Flushing
            | ChannelState::AwaitingAck => Some(RelayError::NotConnected),
        }
    }

    fn write_control(&mut self, line: &str) -> Result<(), RelayError> {
        let Some(sink) = self.sink.as_mut() else {
            return Err(RelayError::NotConnected);
        };
        let written = writeln!(sink, "{line}").and_then(|()| sink.flush());
        if let Err(e) = written {
            log::error!("renderer control stream failed: {e}");
            self.sink = None;
            self.state = ChannelState::Disconnected;
            return Err(RelayError::Transport(e));
        }
        Ok(())
    }
}

impl Drop for CommandChannel {
    fn drop(&mut self) {
        self.close();
    }
}
