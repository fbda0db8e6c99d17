//! # replicator-types: core value types for the replica configuration and role state machine
//!
//! This crate contains the shared value types used across the replicator
//! workspace:
//! - Ordering primitives ([`Ballot`], [`Decree`])
//! - Identifiers ([`Gpid`], [`Endpoint`])
//! - The group view and per-replica projection ([`PartitionConfiguration`],
//!   [`ReplicaConfiguration`])
//! - The role and proposal enums ([`Status`], [`ConfigurationType`])
//! - Wire-level result codes ([`ErrorCode`])
//!
//! These are pure value types: no IO, no randomness, no clocks. They are
//! `Serialize`/`Deserialize` so higher layers (`replicator-wire`,
//! `replicator-config`) can move them across the wire or load them from
//! configuration without this crate knowing about either.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

// ============================================================================
// Ballot - monotonically increasing epoch
// ============================================================================

/// Monotonically increasing epoch for a partition group.
///
/// Ballot ordering is the arbiter of truth for the whole replication
/// protocol: any message or configuration carrying a stale ballot is
/// ignored, any carrying a higher ballot supersedes local state. A ballot
/// is never decreased by any transition ([`Status`] changes notwithstanding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Ballot(u64);

impl Ballot {
    /// The initial ballot held by a freshly created replica.
    pub const ZERO: Ballot = Ballot(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next ballot (incremented by 1).
    #[must_use]
    pub fn next(self) -> Self {
        Ballot(self.0 + 1)
    }
}

impl Display for Ballot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Ballot {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Ballot> for u64 {
    fn from(ballot: Ballot) -> Self {
        ballot.0
    }
}

// ============================================================================
// Decree - sequence number of a committed write within a partition
// ============================================================================

/// Monotonically assigned sequence number of a committed write within a
/// partition.
///
/// Signed so that [`Decree::INVALID`] can be represented as `-1`, matching
/// the "initially an invalid sentinel" language used for
/// `RemoteLearnerState::prepare_start_decree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Decree(i64);

impl Decree {
    /// Sentinel meaning "no decree yet" (e.g. a learner that has not started).
    pub const INVALID: Decree = Decree(-1);
    /// The decree preceding the first real write.
    pub const ZERO: Decree = Decree(0);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(self) -> i64 {
        self.0
    }

    pub fn is_invalid(self) -> bool {
        self == Self::INVALID
    }

    #[must_use]
    pub fn next(self) -> Self {
        Decree(self.0 + 1)
    }
}

impl Default for Decree {
    fn default() -> Self {
        Self::INVALID
    }
}

impl Display for Decree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Decree {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Decree> for i64 {
    fn from(decree: Decree) -> Self {
        decree.0
    }
}

// ============================================================================
// Gpid - group partition identifier
// ============================================================================

/// Group partition identifier: an opaque `(app id, partition index)` pair
/// that never changes for the lifetime of a replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Gpid {
    pub app_id: i32,
    pub partition_index: i32,
}

impl Gpid {
    pub fn new(app_id: i32, partition_index: i32) -> Self {
        Self {
            app_id,
            partition_index,
        }
    }
}

impl Display for Gpid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_id, self.partition_index)
    }
}

// ============================================================================
// Endpoint - (host, port) pair
// ============================================================================

/// A `(host, port)` network endpoint.
///
/// [`Endpoint::INVALID`] is the sentinel meaning "no primary" / "no node".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Sentinel denoting the absence of an endpoint (e.g. no current primary).
    pub fn invalid() -> Self {
        Self {
            host: String::new(),
            port: 0,
        }
    }

    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.host.is_empty() && self.port == 0
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::invalid()
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_invalid() {
            write!(f, "<invalid>")
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

// ============================================================================
// Status - the only states of the role state machine
// ============================================================================

/// Role of a replica within its partition's replication group.
///
/// These are the only states of the role state machine (§4.D). Transitions
/// between them are governed entirely by `replicator-core`'s role state
/// machine; this enum just names the states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Primary,
    Secondary,
    PotentialSecondary,
    Inactive,
    Error,
}

impl Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Primary => "PRIMARY",
            Status::Secondary => "SECONDARY",
            Status::PotentialSecondary => "POTENTIAL_SECONDARY",
            Status::Inactive => "INACTIVE",
            Status::Error => "ERROR",
        };
        write!(f, "{s}")
    }
}

// ============================================================================
// ConfigurationType - the kinds of reconfiguration proposal / request
// ============================================================================

/// The kind of reconfiguration a meta-server proposal or
/// `ConfigurationUpdateRequest` carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigurationType {
    AssignPrimary,
    AddSecondary,
    UpgradeToSecondary,
    DowngradeToSecondary,
    DowngradeToInactive,
    Remove,
}

impl Display for ConfigurationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfigurationType::AssignPrimary => "CT_ASSIGN_PRIMARY",
            ConfigurationType::AddSecondary => "CT_ADD_SECONDARY",
            ConfigurationType::UpgradeToSecondary => "CT_UPGRADE_TO_SECONDARY",
            ConfigurationType::DowngradeToSecondary => "CT_DOWNGRADE_TO_SECONDARY",
            ConfigurationType::DowngradeToInactive => "CT_DOWNGRADE_TO_INACTIVE",
            ConfigurationType::Remove => "CT_REMOVE",
        };
        write!(f, "{s}")
    }
}

// ============================================================================
// ErrorCode - wire-level result codes
// ============================================================================

/// Result code carried by `ConfigurationUpdateResponse` and similar replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    Success,
    Timeout,
    ObjectNotFound,
    InvalidState,
    Busy,
    Unknown,
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::Success => "ERR_SUCCESS",
            ErrorCode::Timeout => "ERR_TIMEOUT",
            ErrorCode::ObjectNotFound => "ERR_OBJECT_NOT_FOUND",
            ErrorCode::InvalidState => "ERR_INVALID_STATE",
            ErrorCode::Busy => "ERR_BUSY",
            ErrorCode::Unknown => "ERR_UNKNOWN",
        };
        write!(f, "{s}")
    }
}

// ============================================================================
// ReplicaConfiguration - per-replica projection
// ============================================================================

/// Per-replica projection of a [`PartitionConfiguration`]: what role a
/// single node plays in the group this configuration describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaConfiguration {
    pub gpid: Gpid,
    pub ballot: Ballot,
    pub status: Status,
}

// ============================================================================
// PartitionConfiguration - the full group view ("Membership Record")
// ============================================================================

/// The full group view of a partition's replication membership.
///
/// # Invariants
/// - `primary` is never present in `secondaries` or `drop_outs`.
/// - `secondaries` and `drop_outs` are disjoint.
///
/// `drop_outs` is used for two distinct, easily-conflated purposes: nodes a
/// primary is currently shipping state to as learners (tracked here while
/// `ADD_SECONDARY` is in flight) and nodes that have dropped out of the
/// group entirely (tracked here after `REMOVE` while the node was a
/// potential secondary). Both are "members the meta-server still tracks but
/// that are not currently primary or secondary" — this type does not
/// distinguish the two; `replicator-core`'s primary-side state does, via its
/// own `Learners` map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionConfiguration {
    pub gpid: Gpid,
    pub app_type: String,
    pub ballot: Ballot,
    pub primary: Endpoint,
    pub secondaries: Vec<Endpoint>,
    pub drop_outs: Vec<Endpoint>,
    pub last_committed_decree: Decree,
}

impl PartitionConfiguration {
    /// Creates a configuration with no primary, no secondaries, and no drop-outs.
    pub fn new(gpid: Gpid, app_type: impl Into<String>, ballot: Ballot) -> Self {
        Self {
            gpid,
            app_type: app_type.into(),
            ballot,
            primary: Endpoint::invalid(),
            secondaries: Vec::new(),
            drop_outs: Vec::new(),
            last_committed_decree: Decree::INVALID,
        }
    }

    /// Removes `endpoint` from `sequence` if present, preserving the order
    /// of the remaining elements.
    ///
    /// Returns whether a removal occurred (§4.A).
    pub fn remove_node(endpoint: &Endpoint, sequence: &mut Vec<Endpoint>) -> bool {
        let before = sequence.len();
        sequence.retain(|e| e != endpoint);
        sequence.len() != before
    }

    /// Projects the per-replica view of `node` as defined in §3:
    /// - `Primary` if `node == primary`
    /// - `Secondary` if `node` is in `secondaries`
    /// - `PotentialSecondary` if `node` is in `drop_outs` AND `is_learning`
    /// - `Inactive` otherwise
    pub fn project(&self, node: &Endpoint, is_learning: bool) -> ReplicaConfiguration {
        let status = if &self.primary == node {
            Status::Primary
        } else if self.secondaries.contains(node) {
            Status::Secondary
        } else if is_learning && self.drop_outs.contains(node) {
            Status::PotentialSecondary
        } else {
            Status::Inactive
        };

        ReplicaConfiguration {
            gpid: self.gpid,
            ballot: self.ballot,
            status,
        }
    }

    /// Checks the disjoint-node-sets invariant (§8): `{primary} ∩
    /// secondaries = ∅`, `{primary} ∩ drop_outs = ∅`, `secondaries ∩
    /// drop_outs = ∅`.
    pub fn has_disjoint_node_sets(&self) -> bool {
        if !self.primary.is_invalid() {
            if self.secondaries.contains(&self.primary) || self.drop_outs.contains(&self.primary) {
                return false;
            }
        }
        self.secondaries.iter().all(|s| !self.drop_outs.contains(s))
    }
}

#[cfg(test)]
mod tests;
