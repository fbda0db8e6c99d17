//! # replicator-core: per-replica configuration and role state machine
//!
//! This crate is the subject of the specification: a single replica's
//! authoritative knowledge of its partition group's membership (ballot +
//! role assignment), the reconfiguration protocol with the meta-server,
//! and the role transitions and side effects that keep them consistent.
//!
//! ## Components (§2)
//!
//! - **Membership Record** (§4.A) lives in `replicator-types` as
//!   [`replicator_types::PartitionConfiguration`] — a pure value type, not
//!   duplicated here.
//! - [`primary_state`] — Primary-Side State (§3 `PrimaryState`,
//!   `RemoteLearnerState`), held only while this replica's role is
//!   `PRIMARY`.
//! - [`potential_secondary`] — this replica's own learner-handshake
//!   substate while its role is `POTENTIAL_SECONDARY`.
//! - [`reconfiguration_client`] — Component C, the Reconfiguration Client
//!   (§4.C): sends configuration-update RPCs and applies replies.
//! - [`state_machine`] — Component D, the role state machine (§4.D): the
//!   transition table and its pre/post actions.
//! - [`dispatcher`] — Component E, the Proposal Dispatcher (§4.E): the
//!   entry point classifying meta-server proposals.
//! - [`replica::Replica`] owns all of the above; the component impls are
//!   `impl Replica` blocks spread across the files listed so each
//!   component's methods live together while sharing one struct and one
//!   execution context (§5: "cooperative, per-partition single-threaded").
//! - [`host`] — the trait boundary to the host replica/stub, the liveness
//!   monitor, and the meta-server/peer RPC clients (§6).
//! - [`error`] — [`ProposalOutcome`]/[`RejectReason`]/[`RpcError`],
//!   realizing §7's three error kinds (invariant violations use
//!   `assert!`/`panic!` directly and are not represented as types).

mod dispatcher;
mod error;
mod host;
mod potential_secondary;
mod primary_state;
mod reconfiguration_client;
mod replica;
mod state_machine;

pub use error::{ProposalOutcome, RejectReason, RpcError};
pub use host::{CancelHandle, LivenessMonitor, MetaServerClient, PeerClient, ReplicaHost};
pub use potential_secondary::PotentialSecondaryState;
pub use primary_state::{PrimaryState, RemoteLearnerState};
pub use replica::{Replica, ReplicaEnvironment};

#[cfg(test)]
mod tests;
