//! In-process stand-ins for a renderer's control stream.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::command::Command;
use crate::options::ChannelOptions;

pub(crate) fn cmd(text: &str) -> Command {
    Command::new(text).unwrap()
}

/// Channel options rooted at `dir` with a short timeout.
pub(crate) fn quick_options(dir: &Path) -> ChannelOptions {
    ChannelOptions {
        ack_timeout_ms: 300,
        poll_interval_ms: 5,
        ..ChannelOptions::in_dir(dir)
    }
}

/// Acknowledge batches `1..=last`.
pub(crate) fn ack_through(path: &Path, last: u64) {
    let text: String = (1..=last).map(|seq| format!("{seq}\n")).collect();
    std::fs::write(path, text).unwrap();
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_owned)
        .collect()
}

/// Records everything written to it.
#[derive(Clone, Default)]
pub(crate) struct SharedSink {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedSink {
    pub(crate) fn lines(&self) -> Vec<String> {
        split_lines(&self.bytes.lock().unwrap())
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A control stream whose reader has gone away.
pub(crate) struct FailingSink;

impl Write for FailingSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }
}

#[derive(Default)]
struct EchoState {
    partial: Vec<u8>,
    executed: Vec<String>,
    direct: Vec<String>,
}

/// Executes `@<file>` instructions synchronously: records every command in
/// the file and acknowledges the sentinel's sequence number.
#[derive(Clone)]
pub(crate) struct EchoRenderer {
    ack_path: PathBuf,
    end_marker: String,
    state: Arc<Mutex<EchoState>>,
}

impl EchoRenderer {
    pub(crate) fn new(ack_path: &Path, end_marker: &str) -> Self {
        Self {
            ack_path: ack_path.to_path_buf(),
            end_marker: end_marker.to_owned(),
            state: Arc::default(),
        }
    }

    /// Commands executed from command files, in order.
    pub(crate) fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }

    /// Lines written to the control stream that were not `@<file>`.
    pub(crate) fn direct(&self) -> Vec<String> {
        self.state.lock().unwrap().direct.clone()
    }

    fn execute(&self, state: &mut EchoState, line: &str) -> io::Result<()> {
        let Some(path) = line.strip_prefix('@') else {
            state.direct.push(line.to_owned());
            return Ok(());
        };
        for command in std::fs::read_to_string(path)?.lines() {
            let seq = command
                .strip_prefix(&self.end_marker)
                .and_then(|rest| rest.parse::<u64>().ok());
            match seq {
                Some(seq) => {
                    let mut ack = OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(&self.ack_path)?;
                    writeln!(ack, "{seq}")?;
                }
                None => state.executed.push(command.to_owned()),
            }
        }
        Ok(())
    }
}

impl Write for EchoRenderer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        state.partial.extend_from_slice(buf);
        while let Some(end) = state.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = state.partial.drain(..=end).collect();
            let line = String::from_utf8_lossy(&line).trim_end().to_owned();
            self.execute(&mut state, &line)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
