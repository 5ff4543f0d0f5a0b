//! Renderer process lifecycle.
//!
//! A [`Session`] launches the renderer with piped standard streams, drains
//! its output on background threads, binds a [`CommandChannel`] to its
//! standard input, sends the prologue, and finally shuts everything down.
//! A renderer that cannot be launched leaves the session in
//! [`SessionMode::NoRenderer`], where every visualization request is
//! accepted and dropped.

mod drain;

use std::process::{Child, Command as ProcessCommand, Stdio};
use std::time::Duration;

pub use drain::RENDERER_LOG_TARGET;
use web_time::Instant;

use self::drain::OutputDrain;
use crate::channel::{CommandChannel, ControlSink, FlushOutcome};
use crate::command::Command;
use crate::error::RelayError;
use crate::options::{ChannelOptions, ProcessOptions};

/// Whether a renderer process backs the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// A renderer process was launched.
    Renderer,
    /// Launch failed; requests are silently dropped.
    NoRenderer,
}

/// One renderer process and the channel driving it.
pub struct Session {
    process: ProcessOptions,
    channel: CommandChannel,
    child: Option<Child>,
    drains: Vec<OutputDrain>,
    mode: SessionMode,
    shut_down: bool,
}

impl Session {
    /// Launch the renderer and bind a channel to it.
    ///
    /// A launch failure is logged and yields a session in
    /// [`SessionMode::NoRenderer`].
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Io`] only if the channel's working directory
    /// cannot be prepared.
    pub fn startup(
        process: ProcessOptions,
        channel: ChannelOptions,
    ) -> Result<Self, RelayError> {
        let mut session = Self {
            process,
            channel: CommandChannel::new(channel)?,
            child: None,
            drains: Vec::new(),
            mode: SessionMode::NoRenderer,
            shut_down: false,
        };
        if let Err(e) = session.launch() {
            log::error!("{e}; continuing without a renderer");
        }
        Ok(session)
    }

    /// Session over a control stream the host already owns (for example a
    /// renderer it launched itself). No process is managed; a relaunch on
    /// [`reconnect`](Self::reconnect) uses `process`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Io`] if the channel's working directory cannot
    /// be prepared.
    pub fn attach(
        process: ProcessOptions,
        channel: ChannelOptions,
        sink: ControlSink,
    ) -> Result<Self, RelayError> {
        let mut channel = CommandChannel::new(channel)?;
        channel.connect(sink)?;
        Ok(Self {
            process,
            channel,
            child: None,
            drains: Vec::new(),
            mode: SessionMode::Renderer,
            shut_down: false,
        })
    }

    /// Send the prologue and flush it synchronously.
    ///
    /// Without a renderer this is a no-op returning
    /// [`FlushOutcome::Empty`].
    ///
    /// # Errors
    ///
    /// [`RelayError::InvalidCommand`] for a malformed prologue line (nothing
    /// is sent), otherwise whatever [`CommandChannel::flush`] reports.
    pub fn initialize(&mut self) -> Result<FlushOutcome, RelayError> {
        if self.mode == SessionMode::NoRenderer {
            return Ok(FlushOutcome::Empty);
        }
        let prologue = self
            .process
            .prologue
            .iter()
            .map(|line| Command::new(line.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        self.channel.enqueue_all(prologue);
        let outcome = self.channel.flush()?;
        log::info!("renderer session ready");
        Ok(outcome)
    }

    /// Explicitly bring a degraded or disconnected channel back.
    ///
    /// A degraded channel whose renderer is still running simply resumes.
    /// Otherwise the renderer is relaunched and re-initialized.
    ///
    /// # Errors
    ///
    /// [`RelayError::ShutDown`] after [`shutdown`](Self::shutdown);
    /// [`RelayError::Launch`] if the relaunch fails (the session is then in
    /// [`SessionMode::NoRenderer`]); any error from
    /// [`initialize`](Self::initialize).
    pub fn reconnect(&mut self) -> Result<(), RelayError> {
        if self.shut_down {
            return Err(RelayError::ShutDown);
        }
        if self.channel.is_ready() {
            return Ok(());
        }
        if self.renderer_alive() && self.channel.state().is_connected() {
            return self.channel.recover();
        }
        log::info!("relaunching renderer");
        self.terminate_renderer(Duration::ZERO);
        self.launch()?;
        self.initialize().map(|_| ())
    }

    /// Quit the renderer and release its streams. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        if self.channel.state().is_connected() {
            match Command::new(self.process.quit_command.as_str()) {
                Ok(quit) => {
                    if let Err(e) = self.channel.send_direct(&quit) {
                        log::warn!("quit not delivered: {e}");
                    }
                }
                Err(e) => log::warn!("quit not sent: {e}"),
            }
        }
        self.channel.close();
        self.terminate_renderer(self.process.shutdown_grace());
        log::info!("renderer session shut down");
    }

    /// Whether a renderer process backs the session.
    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Whether the session has been shut down.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Process id of the running renderer.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// The channel driving the renderer.
    #[must_use]
    pub fn channel(&self) -> &CommandChannel {
        &self.channel
    }

    /// Mutable access to the channel driving the renderer.
    pub fn channel_mut(&mut self) -> &mut CommandChannel {
        &mut self.channel
    }

    fn launch(&mut self) -> Result<(), RelayError> {
        self.mode = SessionMode::NoRenderer;
        let mut child = ProcessCommand::new(&self.process.executable)
            .args(&self.process.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(RelayError::Launch)?;

        let (stdin, stdout, stderr) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take());
        log::info!(
            "launched renderer {} (pid {})",
            self.process.executable,
            child.id()
        );
        self.child = Some(child);

        if let Some(stdout) = stdout {
            self.drains.push(OutputDrain::spawn(
                "renderer-stdout",
                stdout,
                log::Level::Info,
            )?);
        }
        if let Some(stderr) = stderr {
            self.drains.push(OutputDrain::spawn(
                "renderer-stderr",
                stderr,
                log::Level::Warn,
            )?);
        }
        let Some(stdin) = stdin else {
            self.terminate_renderer(Duration::ZERO);
            return Err(RelayError::Launch(std::io::Error::other(
                "renderer stdin not captured",
            )));
        };
        self.channel.connect(Box::new(stdin))?;
        self.mode = SessionMode::Renderer;
        Ok(())
    }

    /// Whether the renderer can still be talked to. An attached session
    /// has no process to check and counts as alive.
    fn renderer_alive(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => self.mode == SessionMode::Renderer,
        }
    }

    /// Wait up to `grace` for the renderer to exit, then kill it. Joins
    /// the drain threads once the process is gone.
    fn terminate_renderer(&mut self, grace: Duration) {
        if let Some(mut child) = self.child.take() {
            let deadline = Instant::now() + grace;
            loop {
                match child.try_wait() {
                    Ok(Some(status)) => {
                        log::debug!("renderer exited with {status}");
                        break;
                    }
                    Ok(None) if Instant::now() < deadline => {
                        std::thread::sleep(Duration::from_millis(10));
                    }
                    _ => {
                        log::warn!("killing renderer (pid {})", child.id());
                        let _ = child.kill();
                        let _ = child.wait();
                        break;
                    }
                }
            }
        }
        for drain in self.drains.drain(..) {
            let _ = drain.join();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}
