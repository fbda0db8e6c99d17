//! Trait boundaries to the host replica/stub and its neighboring RPC
//! collaborators (§6 External Interfaces).
//!
//! None of these traits are implemented in production terms by this crate:
//! the host ("stub"), the liveness monitor, and the RPC clients are all
//! owned and wired up by whatever embeds a [`crate::Replica`]. `replicator-sim`
//! provides deterministic, synchronous test doubles for all four.

use replicator_types::{Endpoint, ReplicaConfiguration};
use replicator_wire::{ConfigurationUpdateRequest, GroupCheckRequest};

/// Handle to an outstanding asynchronous operation — an in-flight
/// reconfiguration RPC or a learner timeout — that can be cancelled before
/// it completes.
///
/// §5: "a new [reconfiguration RPC] cancels the prior"; cancellation is the
/// only lifecycle operation this component needs on a pending async task,
/// since the component itself never awaits one (§5 "Suspension points:
/// none internal").
pub trait CancelHandle: std::fmt::Debug {
    fn cancel(&self);
}

/// The enclosing replica/stub that owns this component (§6 "To the host
/// replica/stub").
pub trait ReplicaHost {
    /// Fire-and-forget notification on every successful transition,
    /// including no-op ballot updates (§4.D post-transition side effects).
    fn notify_replica_state_update(&self, config: &ReplicaConfiguration, is_closing: bool);

    /// Requests graceful teardown of this replica. Called only when the
    /// preceding `notify_replica_state_update` carried `is_closing = true`.
    fn begin_close_replica(&self);
}

/// Source of meta-server addresses and connectivity (§6
/// `liveness_monitor`, `is_connected`).
pub trait LivenessMonitor {
    /// The meta-server currently believed to be the active contact.
    fn current_server_contact(&self) -> Endpoint;

    /// The full known meta-server cluster membership, used to refresh the
    /// contact on retry.
    fn get_servers(&self) -> Vec<Endpoint>;

    /// Gates whether the reconfiguration RPC retry loop continues (§5
    /// "a status change out of INACTIVE, or host disconnect, silently
    /// abandons the retry loop").
    fn is_connected(&self) -> bool;
}

/// Sends the reconfiguration RPC to the meta-server cluster (§4.C, §6
/// `RPC_CM_UPDATE_PARTITION_CONFIGURATION`).
///
/// This trait has no reply callback: per §5's "RPCs ... completion
/// callbacks ... posted back to the same context", the reply is fed back
/// into the same [`crate::Replica`] explicitly via
/// [`crate::Replica::on_reply`] by whatever runtime observed it — a queue
/// drain, a polled future, or (in `replicator-sim`) a synchronous, scripted
/// call. This keeps the trait free of executor or thread-safety
/// requirements foreign to a single-threaded-per-partition component.
pub trait MetaServerClient {
    /// Issues (or re-issues, on retry) the request. Returns a handle the
    /// caller can cancel if a newer reconfiguration supersedes this one
    /// before a reply is observed.
    fn call_update_configuration(
        &self,
        contact: &Endpoint,
        servers: &[Endpoint],
        request: &ConfigurationUpdateRequest,
        timeout_ms: u64,
    ) -> Box<dyn CancelHandle>;
}

/// Sends fire-and-forget requests to peer replicas (§6
/// `RPC_LEARN_ADD_LEARNER`, `RPC_REMOVE_REPLICA`).
pub trait PeerClient {
    /// Used both to bootstrap a fresh learner (`add_potential_secondary`)
    /// and to ping an existing secondary (`init_group_check`) — both share
    /// the `GroupCheckRequest` wire shape (§6).
    fn send_group_check(&self, node: &Endpoint, request: GroupCheckRequest);

    /// Tells a node it has been removed from the group, so it can tear
    /// itself down (§4.C `on_reply`: sent only for `REMOVE` when the
    /// removed node is not self).
    fn send_remove_replica(&self, node: &Endpoint, config: ReplicaConfiguration);
}
