//! [`SimHarness`]: a [`replicator_core::Replica`] wired to
//! [`SyncMetaServer`] and this crate's host/liveness/peer doubles, with the
//! request/reply loop automated.
//!
//! Where `replicator-core`'s own internal tests call `on_reply` by hand
//! after fishing the sent request back out of a recording double, this
//! harness's [`SimHarness::resolve_pending`] does that for the caller —
//! the thing §9's Design Notes ask for: driving the meta-server contract
//! synchronously rather than needing a real RPC round trip to observe a
//! scenario's outcome.

use std::cell::Cell;
use std::rc::Rc;

use replicator_kernel::{Clock, InMemoryApplication, InMemoryPrepareList};
use replicator_core::Replica;
use replicator_core::ReplicaEnvironment;
use replicator_types::{Decree, Endpoint, PartitionConfiguration};

use crate::doubles::{host_shim, liveness_shim, peer_client_shim, ControllableLiveness, RecordingHost, RecordingPeerClient};
use crate::sync_meta_server::{meta_client_shim, SyncMetaServer};

/// Deterministic [`Clock`] double: ticks by one millisecond per call,
/// rather than reading the wall clock, so scenarios are reproducible.
#[derive(Debug, Default)]
struct TickingClock(Cell<u64>);
impl Clock for TickingClock {
    fn now_ms(&self) -> u64 {
        self.0.set(self.0.get() + 1);
        self.0.get()
    }
}

/// A [`Replica`] plus `Rc`-shared handles to every collaborator it was
/// built with, so a scenario can both drive the replica and inspect what
/// each collaborator observed.
pub struct SimHarness {
    pub replica: Replica,
    pub meta_server: Rc<SyncMetaServer>,
    pub peer_client: Rc<RecordingPeerClient>,
    pub host: Rc<RecordingHost>,
    pub liveness: Rc<ControllableLiveness>,
}

impl SimHarness {
    /// Builds a harness for `self_address` starting in `INACTIVE` at
    /// `initial_config`'s ballot, with a single meta-server contact.
    pub fn new(self_address: Endpoint, initial_config: PartitionConfiguration, rpc_timeout_ms: u64) -> Self {
        Self::with_meta_servers(self_address, initial_config, rpc_timeout_ms, vec![Endpoint::new("meta1", 100)])
    }

    pub fn with_meta_servers(
        self_address: Endpoint,
        initial_config: PartitionConfiguration,
        rpc_timeout_ms: u64,
        meta_servers: Vec<Endpoint>,
    ) -> Self {
        let meta_server = Rc::new(SyncMetaServer::new());
        let peer_client = Rc::new(RecordingPeerClient::default());
        let host = Rc::new(RecordingHost::default());
        let contact = meta_servers.first().cloned().unwrap_or_else(Endpoint::invalid);
        let liveness = Rc::new(ControllableLiveness::new(contact, meta_servers));

        let env = ReplicaEnvironment {
            host: host_shim(host.clone()),
            liveness: liveness_shim(liveness.clone()),
            meta_client: meta_client_shim(meta_server.clone()),
            peer_client: peer_client_shim(peer_client.clone()),
            prepare_list: Box::new(InMemoryPrepareList::new(Decree::ZERO)),
            app: Box::new(InMemoryApplication::default()),
            clock: Box::new(TickingClock::default()),
        };

        let replica = Replica::new(self_address, initial_config, rpc_timeout_ms, env);
        Self {
            replica,
            meta_server,
            peer_client,
            host,
            liveness,
        }
    }

    /// Resolves the oldest unresolved reconfiguration RPC against its
    /// scripted (or default) reply, feeding it back through
    /// [`Replica::on_reply`]. Returns `false` if nothing was pending.
    pub fn resolve_next(&mut self) -> bool {
        let Some((request, outcome)) = self.meta_server.take_next() else {
            return false;
        };
        self.replica.on_reply(request, outcome);
        true
    }

    /// Drains every currently-outstanding reconfiguration RPC, including
    /// any a resolved reply itself triggers (e.g. a retry re-queues
    /// immediately). Bounded so a scripted infinite-retry loop can't hang
    /// a test.
    pub fn resolve_all(&mut self) {
        for _ in 0..64 {
            if !self.resolve_next() {
                return;
            }
        }
        panic!("resolve_all: more than 64 reconfiguration RPCs outstanding, likely a scripted retry loop");
    }
}
