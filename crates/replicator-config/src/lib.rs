//! Configuration management for the replicator runtime.
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (`REPLICATOR_*` prefix, highest precedence)
//! 2. `replicator.local.toml` (gitignored, local overrides)
//! 3. `replicator.toml` (git-tracked, project config)
//! 4. `~/.config/replicator/config.toml` (user defaults)
//! 5. Built-in defaults (lowest precedence)

use serde::{Deserialize, Serialize};
use std::path::Path;

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Knobs governing a replica's configuration/role state machine (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicaConfig {
    /// Per-attempt timeout for the reconfiguration RPC to the meta-server
    /// (§5, §6: `CoordinatorRpcCallTimeoutMs`). A timed-out attempt counts
    /// as a transient error and is retried identically.
    pub coordinator_rpc_call_timeout_ms: u64,

    /// Disconnect timeout the learner/group-check subsystem uses to decide
    /// a potential secondary has stalled. Read by this crate for forward
    /// compatibility; not enforced by the role state machine itself, which
    /// treats the learner/group-check subsystem as an external collaborator
    /// (§1 Non-goals).
    pub group_check_disconnect_timeout_ms: u64,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self {
            coordinator_rpc_call_timeout_ms: 5_000,
            group_check_disconnect_timeout_ms: 60_000,
        }
    }
}

impl ReplicaConfig {
    /// Loads configuration from default locations.
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Loads configuration rooted at a specific project directory.
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_values() {
        let config = ReplicaConfig::default();
        assert_eq!(config.coordinator_rpc_call_timeout_ms, 5_000);
        assert_eq!(config.group_check_disconnect_timeout_ms, 60_000);
    }
}
