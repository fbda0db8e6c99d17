//! Minimal, `Rc`-shared test doubles for the host/liveness/peer trait
//! boundaries a [`replicator_core::Replica`] is built from (§6).
//!
//! `Box<dyn Trait>` can't be constructed directly from an `Rc<T>` (the
//! orphan rule blocks `impl Trait for Rc<T>` when both `Trait` and the
//! outer `Rc` are foreign to this crate), so each double is exposed
//! through a thin shim that holds the shared handle and forwards to it —
//! the same pattern `replicator-core`'s own internal tests use.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use replicator_core::{CancelHandle, LivenessMonitor, PeerClient, ReplicaHost};
use replicator_types::{Endpoint, ReplicaConfiguration};
use replicator_wire::GroupCheckRequest;

/// Cancellation handle that counts how many times it was cancelled.
#[derive(Debug, Default)]
pub struct CountingCancelHandle {
    cancelled: Rc<Cell<u32>>,
}

impl CountingCancelHandle {
    pub fn new() -> (Self, Rc<Cell<u32>>) {
        let cancelled = Rc::new(Cell::new(0));
        (
            Self {
                cancelled: cancelled.clone(),
            },
            cancelled,
        )
    }
}

impl CancelHandle for CountingCancelHandle {
    fn cancel(&self) {
        self.cancelled.set(self.cancelled.get() + 1);
    }
}

/// Records every `(config, is_closing)` notification and every
/// `begin_close_replica` call a [`replicator_core::Replica`] makes (§6
/// `notify_replica_state_update`, `begin_close_replica`).
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub notifications: RefCell<Vec<(ReplicaConfiguration, bool)>>,
    pub closes: Cell<u32>,
}

impl RecordingHost {
    pub fn last_notification(&self) -> Option<(ReplicaConfiguration, bool)> {
        self.notifications.borrow().last().cloned()
    }

    pub fn clear(&self) {
        self.notifications.borrow_mut().clear();
        self.closes.set(0);
    }
}

struct HostShim(Rc<RecordingHost>);
impl ReplicaHost for HostShim {
    fn notify_replica_state_update(&self, config: &ReplicaConfiguration, is_closing: bool) {
        self.0.notifications.borrow_mut().push((config.clone(), is_closing));
    }
    fn begin_close_replica(&self) {
        self.0.closes.set(self.0.closes.get() + 1);
    }
}

pub(crate) fn host_shim(host: Rc<RecordingHost>) -> Box<dyn ReplicaHost> {
    Box::new(HostShim(host))
}

/// A [`LivenessMonitor`] whose contact, server list, and connectivity can
/// be changed mid-scenario (§5: "a status change out of INACTIVE, or host
/// disconnect, silently abandons the retry loop" — tests need to flip
/// `is_connected` to exercise that).
#[derive(Debug)]
pub struct ControllableLiveness {
    pub contact: RefCell<Endpoint>,
    pub servers: RefCell<Vec<Endpoint>>,
    pub connected: Cell<bool>,
}

impl ControllableLiveness {
    pub fn new(contact: Endpoint, servers: Vec<Endpoint>) -> Self {
        Self {
            contact: RefCell::new(contact),
            servers: RefCell::new(servers),
            connected: Cell::new(true),
        }
    }

    pub fn disconnect(&self) {
        self.connected.set(false);
    }
}

struct LivenessShim(Rc<ControllableLiveness>);
impl LivenessMonitor for LivenessShim {
    fn current_server_contact(&self) -> Endpoint {
        self.0.contact.borrow().clone()
    }
    fn get_servers(&self) -> Vec<Endpoint> {
        self.0.servers.borrow().clone()
    }
    fn is_connected(&self) -> bool {
        self.0.connected.get()
    }
}

pub(crate) fn liveness_shim(liveness: Rc<ControllableLiveness>) -> Box<dyn LivenessMonitor> {
    Box::new(LivenessShim(liveness))
}

/// Records every `GroupCheckRequest`/`RPC_REMOVE_REPLICA` a primary sends
/// to a peer (§6 `RPC_LEARN_ADD_LEARNER`, `RPC_REMOVE_REPLICA`).
#[derive(Debug, Default)]
pub struct RecordingPeerClient {
    pub group_checks: RefCell<Vec<(Endpoint, GroupCheckRequest)>>,
    pub removes: RefCell<Vec<(Endpoint, ReplicaConfiguration)>>,
}

impl RecordingPeerClient {
    pub fn learners_notified(&self) -> Vec<Endpoint> {
        self.group_checks.borrow().iter().map(|(node, _)| node.clone()).collect()
    }
}

struct PeerClientShim(Rc<RecordingPeerClient>);
impl PeerClient for PeerClientShim {
    fn send_group_check(&self, node: &Endpoint, request: GroupCheckRequest) {
        self.0.group_checks.borrow_mut().push((node.clone(), request));
    }
    fn send_remove_replica(&self, node: &Endpoint, config: ReplicaConfiguration) {
        self.0.removes.borrow_mut().push((node.clone(), config));
    }
}

pub(crate) fn peer_client_shim(peer: Rc<RecordingPeerClient>) -> Box<dyn PeerClient> {
    Box::new(PeerClientShim(peer))
}
