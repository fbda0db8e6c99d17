//! Error and outcome types realizing §7's three error kinds.
//!
//! Invariant violations (§7.1) are *not* represented here: they use
//! `assert!`/`assert_eq!`/`panic!` and abort the process, exactly as §7.1
//! specifies. The types below cover the other two kinds: stale/racing
//! messages (§7.2, surfaced as [`ProposalOutcome`] variants instead of a
//! silently-swallowed `()`) and transient RPC failures (§7.3, [`RpcError`]).

use replicator_types::ErrorCode;

/// Result of dispatching a proposal or driving a transition, distinguishing
/// the silent-drop paths of §7.2/§8 so tests can assert on them directly.
///
/// This is additive observability only: a caller that ignores the return
/// value gets exactly the spec's silent-drop behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalOutcome {
    /// The proposal (or transition) was applied.
    Applied,
    /// Dropped: the carried ballot was not current, or the configuration
    /// no longer matches this replica's view of the membership.
    DroppedStale,
    /// Dropped: a primary-only proposal arrived while this replica is not
    /// (or is no longer) the primary.
    DroppedNotPrimary,
    /// Dropped: the proposal was a duplicate of one already applied or in
    /// flight (e.g. a node already a learner, or already primary/secondary).
    DroppedDuplicate,
    /// Rejected by a forbidden-transition guard (§4.D), logged at debug
    /// and left for the caller to retry later.
    Rejected(RejectReason),
}

impl ProposalOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, ProposalOutcome::Applied)
    }
}

/// Why [`ProposalOutcome::Rejected`] refused a transition (§4.D forbidden
/// transitions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// `ERROR` is sticky except for an explicit reset outside this
    /// component (§4.D).
    ErrorIsSticky,
    /// `POTENTIAL_SECONDARY` cannot safely exit to `ERROR`/`INACTIVE` while
    /// a learner handshake is still running (§4.D, §9).
    StillLearning,
}

/// Transient failure of the reconfiguration RPC (§7.3). Drives the
/// Reconfiguration Client's retry loop; never propagated as fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// The per-attempt `CoordinatorRpcCallTimeoutMs` elapsed with no reply.
    Timeout,
    /// The RPC could not be delivered at all (connection refused, DNS
    /// failure, etc).
    Transport(String),
    /// The meta-server replied with a non-success [`ErrorCode`] at the
    /// transport layer (distinct from `ConfigurationUpdateResponse::err`,
    /// which is handled as part of the normal reply path).
    Remote(ErrorCode),
}
