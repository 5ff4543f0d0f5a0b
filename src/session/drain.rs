use std::io::{self, BufRead, BufReader, Read};
use std::thread::JoinHandle;

/// Log target renderer output is forwarded under.
pub const RENDERER_LOG_TARGET: &str = "molrelay::renderer";

/// Background thread forwarding one of the renderer's output streams to the
/// log, so the renderer never stalls on a full pipe.
pub(crate) struct OutputDrain {
    name: &'static str,
    handle: Option<JoinHandle<usize>>,
}

impl OutputDrain {
    /// Spawn a drain thread named `name` reading `stream` until EOF.
    pub(crate) fn spawn<R>(
        name: &'static str,
        stream: R,
        level: log::Level,
    ) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let handle = std::thread::Builder::new()
            .name(name.into())
            .spawn(move || forward_lines(stream, level))?;
        Ok(Self {
            name,
            handle: Some(handle),
        })
    }

    /// Wait for the stream to close. Returns the number of lines forwarded.
    pub(crate) fn join(mut self) -> usize {
        let Some(handle) = self.handle.take() else {
            return 0;
        };
        match handle.join() {
            Ok(lines) => {
                log::debug!("{} drained {lines} lines", self.name);
                lines
            }
            Err(_) => {
                log::warn!("{} drain thread panicked", self.name);
                0
            }
        }
    }
}

/// Forward every line of `stream` to the log at `level`. Bytes that are not
/// UTF-8 are replaced, so the pipe keeps draining until EOF.
fn forward_lines<R: Read>(stream: R, level: log::Level) -> usize {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    let mut count = 0;
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                log::log!(target: RENDERER_LOG_TARGET, level, "{line}");
                count += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                log::debug!("renderer output closed: {e}");
                break;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn drain_runs_to_end_of_stream() {
        let output = Cursor::new(b"PyMOL>load x\n Executive: done\n".to_vec());
        let drain =
            OutputDrain::spawn("test-drain", output, log::Level::Info).unwrap();
        assert_eq!(drain.join(), 2);
    }

    #[test]
    fn partial_last_line_is_forwarded() {
        assert_eq!(forward_lines(Cursor::new("a\nb"), log::Level::Debug), 2);
        assert_eq!(forward_lines(io::empty(), log::Level::Debug), 0);
    }

    #[test]
    fn invalid_utf8_does_not_stop_the_drain() {
        let output =
            Cursor::new(b"ok line\ncaf\xe9 latin1\nafter 1\nafter 2\n".to_vec());
        assert_eq!(forward_lines(output, log::Level::Info), 4);
    }
}
