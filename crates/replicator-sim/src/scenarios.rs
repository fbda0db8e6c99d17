//! Reusable scenario building blocks over [`SimHarness`] (§8 "Scenarios").
//!
//! Each helper here sets up — or advances — a harness into one of the
//! named states the specification's literal scenarios describe, so both
//! this crate's own integration tests and any downstream simulation code
//! can build on the same starting points instead of re-deriving them.

use replicator_types::{Ballot, ConfigurationType, Endpoint, Gpid, PartitionConfiguration, Status};
use replicator_wire::ConfigurationUpdateRequest;

use crate::harness::SimHarness;

/// The `app_type` every scenario in this crate uses; arbitrary, but fixed
/// so assertions can compare against a known constant.
pub const APP_TYPE: &str = "simple_kv";

pub fn gpid() -> Gpid {
    Gpid::new(1, 0)
}

pub fn self_address() -> Endpoint {
    Endpoint::new("self", 1)
}

/// A fresh harness at `(status = INACTIVE, ballot = 0)` — the lifecycle's
/// starting point (§3).
pub fn fresh_harness() -> SimHarness {
    let initial_config = PartitionConfiguration::new(gpid(), APP_TYPE, Ballot::ZERO);
    SimHarness::new(self_address(), initial_config, 5_000)
}

/// Scenario 1 (§8): proposes `ASSIGN_PRIMARY` for `self`, carrying
/// `secondaries` as the meta-server's already-known group membership, and
/// resolves the resulting RPC with the meta-server's default approval,
/// leaving the harness at `(PRIMARY, ballot + 1)` with `secondaries`
/// visible in `PrimaryState::membership`.
///
/// `secondaries` seeded this way, rather than added afterwards, mirrors
/// how a real meta-server proposal works: the nodes a freshly elected
/// primary already shares the group with arrive in the very proposal that
/// elects it, not through a later same-ballot sync (§4.E `assign_primary`
/// only ever clears *self* out of the proposal's `secondaries`/`drop_outs`,
/// leaving every other entry untouched).
pub fn bootstrap_to_primary(h: &mut SimHarness, secondaries: Vec<Endpoint>) {
    let mut proposed = PartitionConfiguration::new(gpid(), APP_TYPE, h.replica.ballot().next());
    proposed.secondaries = secondaries;

    let outcome = h.replica.on_config_proposal(ConfigurationUpdateRequest {
        config_type: ConfigurationType::AssignPrimary,
        node: self_address(),
        config: proposed,
    });
    assert!(outcome.is_applied(), "ASSIGN_PRIMARY proposal must be applied");
    assert_eq!(h.replica.status(), Status::Inactive, "2PC must be disabled while the RPC is in flight");

    h.resolve_all();
    assert_eq!(h.replica.status(), Status::Primary);
}
