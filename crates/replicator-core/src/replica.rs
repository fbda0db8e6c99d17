//! [`Replica`]: owns a single partition's configuration and role state
//! (§2 Components A–E, wired together).
//!
//! One `Replica` exists per `gpid`, runs on one logical execution context
//! (§5: "cooperative, per-partition single-threaded"), and is not
//! re-entrant from another thread. The role state machine (`state_machine`
//! module), the proposal dispatcher (`dispatcher` module), and the
//! reconfiguration client (`reconfiguration_client` module) are all
//! `impl Replica` blocks in their own files, grouping methods by the
//! component they realize while sharing one struct.

use replicator_kernel::{Application, Clock, PrepareList};
use replicator_types::{Ballot, Endpoint, Gpid, PartitionConfiguration, ReplicaConfiguration, Status};

use crate::host::{CancelHandle, LivenessMonitor, MetaServerClient, PeerClient, ReplicaHost};
use crate::potential_secondary::PotentialSecondaryState;
use crate::primary_state::PrimaryState;

pub struct Replica {
    pub(crate) self_address: Endpoint,
    pub(crate) gpid: Gpid,

    /// The per-replica projection: `(gpid, ballot, status)`. This is the
    /// single source of truth for "local ballot" and "local status"
    /// throughout §4.
    pub(crate) config: ReplicaConfiguration,
    /// The last full group view applied via `update_configuration` —
    /// needed to seed a freshly constructed `PrimaryState` on entry to
    /// `PRIMARY`, since `ReplicaConfiguration` itself only carries the
    /// per-replica projection, not the full membership.
    pub(crate) last_full_configuration: PartitionConfiguration,

    pub(crate) primary_state: Option<PrimaryState>,
    pub(crate) potential_secondary: PotentialSecondaryState,

    /// At most one outstanding meta-server RPC (§3, §5, §8 "At-most-one
    /// in-flight"). Deliberately **not** nested inside `PrimaryState`: the
    /// first `ASSIGN_PRIMARY` round-trip happens while this replica is not
    /// yet primary, and every other round-trip disables 2PC by forcing
    /// local status to `INACTIVE` *before* the new task handle exists,
    /// which would otherwise destroy the very `PrimaryState` meant to hold
    /// it. See `DESIGN.md`.
    pub(crate) reconfiguration_task: Option<Box<dyn CancelHandle>>,

    pub(crate) last_config_change_time_ms: u64,
    pub(crate) rpc_timeout_ms: u64,

    pub(crate) host: Box<dyn ReplicaHost>,
    pub(crate) liveness: Box<dyn LivenessMonitor>,
    pub(crate) meta_client: Box<dyn MetaServerClient>,
    pub(crate) peer_client: Box<dyn PeerClient>,
    pub(crate) prepare_list: Box<dyn PrepareList>,
    pub(crate) app: Box<dyn Application>,
    pub(crate) clock: Box<dyn Clock>,
}

impl std::fmt::Debug for Replica {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Replica")
            .field("self_address", &self.self_address)
            .field("gpid", &self.gpid)
            .field("config", &self.config)
            .field("is_primary", &self.primary_state.is_some())
            .field("reconfiguration_in_flight", &self.reconfiguration_task.is_some())
            .finish_non_exhaustive()
    }
}

/// Everything a [`Replica`] needs from the outside world, bundled so
/// [`Replica::new`] doesn't take seven trailing trait-object parameters.
pub struct ReplicaEnvironment {
    pub host: Box<dyn ReplicaHost>,
    pub liveness: Box<dyn LivenessMonitor>,
    pub meta_client: Box<dyn MetaServerClient>,
    pub peer_client: Box<dyn PeerClient>,
    pub prepare_list: Box<dyn PrepareList>,
    pub app: Box<dyn Application>,
    pub clock: Box<dyn Clock>,
}

impl Replica {
    /// Creates a replica in the initial `INACTIVE` state (§3 Lifecycle),
    /// projected from `initial_config` for `self_address`.
    pub fn new(
        self_address: Endpoint,
        initial_config: PartitionConfiguration,
        rpc_timeout_ms: u64,
        env: ReplicaEnvironment,
    ) -> Self {
        let gpid = initial_config.gpid;
        let config = initial_config.project(&self_address, false);
        let last_config_change_time_ms = env.clock.now_ms();
        Self {
            self_address,
            gpid,
            config,
            last_full_configuration: initial_config,
            primary_state: None,
            potential_secondary: PotentialSecondaryState::default(),
            reconfiguration_task: None,
            last_config_change_time_ms,
            rpc_timeout_ms,
            host: env.host,
            liveness: env.liveness,
            meta_client: env.meta_client,
            peer_client: env.peer_client,
            prepare_list: env.prepare_list,
            app: env.app,
            clock: env.clock,
        }
    }

    pub fn self_address(&self) -> &Endpoint {
        &self.self_address
    }

    pub fn gpid(&self) -> Gpid {
        self.gpid
    }

    pub fn ballot(&self) -> Ballot {
        self.config.ballot
    }

    pub fn status(&self) -> Status {
        self.config.status
    }

    pub fn config(&self) -> &ReplicaConfiguration {
        &self.config
    }

    pub fn last_full_configuration(&self) -> &PartitionConfiguration {
        &self.last_full_configuration
    }

    pub fn is_primary(&self) -> bool {
        self.status() == Status::Primary
    }

    pub fn primary_state(&self) -> Option<&PrimaryState> {
        self.primary_state.as_ref()
    }

    pub fn has_reconfiguration_in_flight(&self) -> bool {
        self.reconfiguration_task.is_some()
    }

    pub fn last_config_change_time_ms(&self) -> u64 {
        self.last_config_change_time_ms
    }
}
