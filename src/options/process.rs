use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[schemars(title = "Process", inline)]
#[serde(default)]
/// How the renderer process is launched, prepared and stopped.
pub struct ProcessOptions {
    /// Renderer executable, looked up on `PATH` when not absolute.
    #[schemars(title = "Executable")]
    pub executable: String,
    /// Fixed argument set passed on launch.
    #[schemars(title = "Arguments")]
    pub args: Vec<String>,
    /// Environment setup commands flushed once after connecting.
    #[schemars(title = "Prologue")]
    pub prologue: Vec<String>,
    /// Command written unbuffered on shutdown.
    #[schemars(skip)]
    pub quit_command: String,
    /// How long shutdown waits for the renderer to exit before killing it.
    #[schemars(title = "Shutdown Grace (ms)", range(min = 0, max = 30000))]
    pub shutdown_grace_ms: u64,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            executable: "pymol".into(),
            args: vec!["-q".into(), "-p".into()],
            prologue: vec![
                "set dash_gap, 0".into(),
                "set dash_width, 1.5".into(),
                "set dash_color, yellow".into(),
                "set cartoon_transparency, 0.3".into(),
                "bg_color white".into(),
            ],
            quit_command: "quit".into(),
            shutdown_grace_ms: 2000,
        }
    }
}

impl ProcessOptions {
    /// Shutdown grace period as a [`Duration`].
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
