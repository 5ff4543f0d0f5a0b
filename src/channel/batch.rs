use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::command::Command;

/// One flush worth of commands plus its closing sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushBatch {
    seq: u64,
    commands: Vec<Command>,
    sentinel: String,
}

impl FlushBatch {
    /// Batch `seq` closed by `<end_marker><seq>`.
    #[must_use]
    pub fn new(seq: u64, commands: Vec<Command>, end_marker: &str) -> Self {
        Self {
            seq,
            commands,
            sentinel: format!("{end_marker}{seq}"),
        }
    }

    /// Batch sequence number.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Commands in submission order.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Closing sentinel line.
    #[must_use]
    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// Every line of the batch, sentinel last.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.commands
            .iter()
            .map(Command::as_str)
            .chain(std::iter::once(self.sentinel.as_str()))
    }

    /// Write the batch to `out`, one line each.
    ///
    /// # Errors
    ///
    /// Any error from `out`.
    pub fn write_lines<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for line in self.lines() {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    /// Overwrite the command file at `path` with this batch.
    ///
    /// # Errors
    ///
    /// Any error creating or writing the file.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_lines(&mut out)?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_closes_the_batch() {
        let batch = FlushBatch::new(
            12,
            vec![Command::new("a").unwrap(), Command::new("b").unwrap()],
            "END",
        );
        let lines: Vec<&str> = batch.lines().collect();
        assert_eq!(lines, ["a", "b", "END12"]);
    }

    #[test]
    fn write_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.pml");
        std::fs::write(&path, "stale\nstale\nstale\nstale\n").unwrap();
        FlushBatch::new(1, vec![Command::new("zoom").unwrap()], "END")
            .write_to(&path)
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "zoom\nEND1\n");
    }
}
