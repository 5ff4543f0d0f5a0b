use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[schemars(title = "Compaction", inline)]
#[serde(default)]
/// Limits steering how edge sets are turned into commands.
pub struct CompactionOptions {
    /// Edge count above which edges are packed into adjacency lists.
    #[schemars(title = "Packing Threshold", range(min = 1, max = 100000))]
    pub threshold: usize,
    /// Maximum number of distinct first coordinates after packing.
    #[schemars(title = "Max Groups", range(min = 1, max = 100000))]
    pub max_groups: usize,
    /// Longest packed command, in bytes, before it is split.
    #[schemars(title = "Max Command Length", range(min = 64, max = 65536))]
    pub max_command_len: usize,
}

impl Default for CompactionOptions {
    fn default() -> Self {
        Self {
            threshold: 400,
            max_groups: 500,
            max_command_len: 1000,
        }
    }
}
