//! Relay configuration with TOML file support.
//!
//! All tweakable settings (renderer launch, channel files and timing,
//! edge-set compaction limits) are consolidated here. Options serialize
//! to/from TOML so a host application can keep them next to its own
//! settings.

mod channel;
mod compaction;
mod process;

use std::path::Path;

pub use channel::ChannelOptions;
pub use compaction::CompactionOptions;
pub use process::ProcessOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[channel]`) work correctly.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema,
)]
#[serde(default)]
pub struct RelayOptions {
    /// Renderer process launch and shutdown.
    pub process: ProcessOptions,
    /// Command/acknowledgment file channel.
    pub channel: ChannelOptions,
    /// Edge-set compaction limits.
    pub compaction: CompactionOptions,
}

impl RelayOptions {
    /// Generate JSON Schema describing the options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(RelayOptions)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// [`RelayError::Io`] if the file cannot be read,
    /// [`RelayError::OptionsParse`] if it is not valid options TOML.
    pub fn load(path: &Path) -> Result<Self, RelayError> {
        let content = std::fs::read_to_string(path).map_err(RelayError::Io)?;
        toml::from_str(&content)
            .map_err(|e| RelayError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed), creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// [`RelayError::OptionsParse`] on serialization failure,
    /// [`RelayError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), RelayError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RelayError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(RelayError::Io)?;
        }
        std::fs::write(path, content).map_err(RelayError::Io)
    }
}
