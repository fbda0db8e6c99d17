//! Integration tests covering the six literal scenarios and the forbidden-
//! transition/idempotence properties of §8.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use replicator_kernel::{Clock, InMemoryApplication, InMemoryPrepareList};
use replicator_types::{Ballot, ConfigurationType, Decree, Endpoint, ErrorCode, Gpid, PartitionConfiguration, Status};
use replicator_wire::{ConfigurationUpdateRequest, ConfigurationUpdateResponse, GroupCheckRequest};

use crate::error::RpcError;
use crate::host::{CancelHandle, LivenessMonitor, MetaServerClient, PeerClient, ReplicaHost};
use crate::replica::{Replica, ReplicaEnvironment};

#[derive(Debug)]
struct NoopCancelHandle {
    cancelled: Rc<Cell<usize>>,
}
impl CancelHandle for NoopCancelHandle {
    fn cancel(&self) {
        self.cancelled.set(self.cancelled.get() + 1);
    }
}

#[derive(Default)]
struct RecordingMetaClient {
    requests: RefCell<Vec<ConfigurationUpdateRequest>>,
    cancelled: Rc<Cell<usize>>,
}
impl MetaServerClient for RecordingMetaClient {
    fn call_update_configuration(
        &self,
        _contact: &Endpoint,
        _servers: &[Endpoint],
        request: &ConfigurationUpdateRequest,
        _timeout_ms: u64,
    ) -> Box<dyn CancelHandle> {
        self.requests.borrow_mut().push(request.clone());
        Box::new(NoopCancelHandle {
            cancelled: self.cancelled.clone(),
        })
    }
}

#[derive(Default)]
struct RecordingPeerClient {
    group_checks: RefCell<Vec<(Endpoint, GroupCheckRequest)>>,
    removes: RefCell<Vec<Endpoint>>,
}
impl PeerClient for RecordingPeerClient {
    fn send_group_check(&self, node: &Endpoint, request: GroupCheckRequest) {
        self.group_checks.borrow_mut().push((node.clone(), request));
    }
    fn send_remove_replica(&self, node: &Endpoint, _config: replicator_types::ReplicaConfiguration) {
        self.removes.borrow_mut().push(node.clone());
    }
}

#[derive(Default)]
struct RecordingHost {
    notifications: RefCell<Vec<(replicator_types::ReplicaConfiguration, bool)>>,
    closes: Cell<usize>,
}
impl ReplicaHost for RecordingHost {
    fn notify_replica_state_update(&self, config: &replicator_types::ReplicaConfiguration, is_closing: bool) {
        self.notifications.borrow_mut().push((config.clone(), is_closing));
    }
    fn begin_close_replica(&self) {
        self.closes.set(self.closes.get() + 1);
    }
}

struct StaticLiveness {
    contact: Endpoint,
    servers: Vec<Endpoint>,
    connected: Cell<bool>,
}
impl LivenessMonitor for StaticLiveness {
    fn current_server_contact(&self) -> Endpoint {
        self.contact.clone()
    }
    fn get_servers(&self) -> Vec<Endpoint> {
        self.servers.clone()
    }
    fn is_connected(&self) -> bool {
        self.connected.get()
    }
}

struct FixedClock(Cell<u64>);
impl Clock for FixedClock {
    fn now_ms(&self) -> u64 {
        self.0.set(self.0.get() + 1);
        self.0.get()
    }
}

/// Harness bundling a `Replica` with `Rc`-shared handles to its test
/// doubles, so assertions can inspect what each collaborator observed.
struct Harness {
    replica: Replica,
    meta_client: Rc<RecordingMetaClient>,
    peer_client: Rc<RecordingPeerClient>,
    host: Rc<RecordingHost>,
}

/// `Box<dyn Trait>` can't be built directly from an `Rc`, so each
/// collaborator is wrapped in a thin forwarding shim that holds the shared
/// handle and implements the trait by delegating to it.
macro_rules! rc_shim {
    ($name:ident, $trait_name:path, $inner:ty, { $($method:tt)* }) => {
        struct $name(Rc<$inner>);
        impl $trait_name for $name {
            $($method)*
        }
    };
}

rc_shim!(MetaClientShim, MetaServerClient, RecordingMetaClient, {
    fn call_update_configuration(
        &self,
        contact: &Endpoint,
        servers: &[Endpoint],
        request: &ConfigurationUpdateRequest,
        timeout_ms: u64,
    ) -> Box<dyn CancelHandle> {
        self.0.call_update_configuration(contact, servers, request, timeout_ms)
    }
});

rc_shim!(PeerClientShim, PeerClient, RecordingPeerClient, {
    fn send_group_check(&self, node: &Endpoint, request: GroupCheckRequest) {
        self.0.send_group_check(node, request)
    }
    fn send_remove_replica(&self, node: &Endpoint, config: replicator_types::ReplicaConfiguration) {
        self.0.send_remove_replica(node, config)
    }
});

rc_shim!(HostShim, ReplicaHost, RecordingHost, {
    fn notify_replica_state_update(&self, config: &replicator_types::ReplicaConfiguration, is_closing: bool) {
        self.0.notify_replica_state_update(config, is_closing)
    }
    fn begin_close_replica(&self) {
        self.0.begin_close_replica()
    }
});

fn self_address() -> Endpoint {
    Endpoint::new("self", 1)
}

fn gpid() -> Gpid {
    Gpid::new(1, 0)
}

fn harness() -> Harness {
    let meta_client = Rc::new(RecordingMetaClient::default());
    let peer_client = Rc::new(RecordingPeerClient::default());
    let host = Rc::new(RecordingHost::default());

    let initial_config = PartitionConfiguration::new(gpid(), "simple_kv", Ballot::ZERO);
    let env = ReplicaEnvironment {
        host: Box::new(HostShim(host.clone())),
        liveness: Box::new(StaticLiveness {
            contact: Endpoint::new("meta1", 100),
            servers: vec![Endpoint::new("meta1", 100), Endpoint::new("meta2", 100)],
            connected: Cell::new(true),
        }),
        meta_client: Box::new(MetaClientShim(meta_client.clone())),
        peer_client: Box::new(PeerClientShim(peer_client.clone())),
        prepare_list: Box::new(InMemoryPrepareList::new(Decree::ZERO)),
        app: Box::new(InMemoryApplication::default()),
        clock: Box::new(FixedClock(Cell::new(0))),
    };

    let replica = Replica::new(self_address(), initial_config, 5_000, env);
    Harness {
        replica,
        meta_client,
        peer_client,
        host,
    }
}

fn success_reply(config: PartitionConfiguration) -> ConfigurationUpdateResponse {
    ConfigurationUpdateResponse {
        err: ErrorCode::Success,
        config,
    }
}

// 1. Bootstrap to primary.
#[test]
fn scenario_bootstrap_to_primary() {
    let mut h = harness();
    assert_eq!(h.replica.status(), Status::Inactive);
    assert_eq!(h.replica.ballot(), Ballot::ZERO);

    let mut proposed = PartitionConfiguration::new(gpid(), "simple_kv", Ballot::new(1));
    proposed.primary = Endpoint::invalid();

    let outcome = h.replica.on_config_proposal(ConfigurationUpdateRequest {
        config_type: ConfigurationType::AssignPrimary,
        node: self_address(),
        config: proposed,
    });
    assert!(outcome.is_applied());

    let sent = h.meta_client.requests.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].config.ballot, Ballot::new(2));
    assert_eq!(sent[0].config.primary, self_address());
    drop(sent);

    assert_eq!(h.replica.status(), Status::Inactive);
    assert_eq!(h.replica.ballot(), Ballot::new(1));

    let sent_request = h.meta_client.requests.borrow()[0].clone();
    let mut reply_config = sent_request.config.clone();
    reply_config.ballot = Ballot::new(2);
    h.replica.on_reply(sent_request, Ok(success_reply(reply_config)));

    assert_eq!(h.replica.status(), Status::Primary);
    assert_eq!(h.replica.ballot(), Ballot::new(2));
    assert!(h.replica.primary_state().is_some());
}

fn make_primary(h: &mut Harness, secondaries: Vec<Endpoint>) {
    let mut proposed = PartitionConfiguration::new(gpid(), "simple_kv", Ballot::new(1));
    proposed.primary = Endpoint::invalid();
    proposed.secondaries = secondaries;
    h.replica.on_config_proposal(ConfigurationUpdateRequest {
        config_type: ConfigurationType::AssignPrimary,
        node: self_address(),
        config: proposed,
    });
    let request = h.meta_client.requests.borrow().last().unwrap().clone();
    let reply_config = request.config.clone();
    h.replica.on_reply(request, Ok(success_reply(reply_config)));
    assert_eq!(h.replica.status(), Status::Primary);
}

// 2. Add secondary idempotence.
#[test]
fn scenario_add_secondary_idempotence() {
    let mut h = harness();
    let node_b = Endpoint::new("b", 2);
    let node_c = Endpoint::new("c", 3);
    make_primary(&mut h, vec![node_b.clone()]);

    let membership = h.replica.primary_state().unwrap().membership.clone();
    let proposal = ConfigurationUpdateRequest {
        config_type: ConfigurationType::AddSecondary,
        node: node_c.clone(),
        config: membership.clone(),
    };

    let outcome = h.replica.on_config_proposal(proposal.clone());
    assert!(outcome.is_applied());
    assert_eq!(h.replica.primary_state().unwrap().learners.len(), 1);
    let signature = h.replica.primary_state().unwrap().learners[&node_c].signature;
    assert_ne!(signature, 0, "signature should be a freshly rolled random token");
    assert_eq!(h.peer_client.group_checks.borrow().len(), 1);

    // Second identical proposal: no state change, no RPC.
    let outcome2 = h.replica.on_config_proposal(proposal);
    assert_eq!(outcome2, crate::error::ProposalOutcome::DroppedDuplicate);
    assert_eq!(h.replica.primary_state().unwrap().learners.len(), 1);
    assert_eq!(h.peer_client.group_checks.borrow().len(), 1);
}

// 3. Stale ballot.
#[test]
fn scenario_stale_ballot_is_dropped() {
    let mut h = harness();
    make_primary(&mut h, vec![]);
    let current_ballot = h.replica.ballot();

    let mut stale_config = h.replica.primary_state().unwrap().membership.clone();
    stale_config.ballot = Ballot::new(current_ballot.as_u64().saturating_sub(1));

    let outcome = h.replica.on_config_proposal(ConfigurationUpdateRequest {
        config_type: ConfigurationType::AddSecondary,
        node: Endpoint::new("c", 3),
        config: stale_config,
    });

    assert_eq!(outcome, crate::error::ProposalOutcome::DroppedStale);
    assert_eq!(h.replica.ballot(), current_ballot);
    assert!(h.replica.primary_state().unwrap().learners.is_empty());
}

// 4. Remove self from PRIMARY.
#[test]
fn scenario_remove_self_from_primary() {
    let mut h = harness();
    make_primary(&mut h, vec![]);
    let ballot_before = h.replica.ballot();

    let membership = h.replica.primary_state().unwrap().membership.clone();
    let outcome = h.replica.on_config_proposal(ConfigurationUpdateRequest {
        config_type: ConfigurationType::Remove,
        node: self_address(),
        config: membership,
    });
    assert!(outcome.is_applied());
    assert_eq!(h.replica.status(), Status::Inactive);

    let request = h.meta_client.requests.borrow().last().unwrap().clone();
    assert!(request.config.primary.is_invalid());
    assert_eq!(request.config.ballot, ballot_before.next());

    h.host.notifications.borrow_mut().clear();
    h.host.closes.set(0);

    let mut reply_config = request.config.clone();
    // Self is gone: projects to INACTIVE (not primary, not secondary).
    h.replica.on_reply(request, Ok(success_reply(reply_config.clone())));
    reply_config.primary = Endpoint::invalid();

    assert_eq!(h.replica.status(), Status::Inactive);
    assert!(h.replica.primary_state().is_none());
    assert_eq!(h.host.closes.get(), 1);
    let notifications = h.host.notifications.borrow();
    assert!(notifications.iter().any(|(_, is_closing)| *is_closing));
}

// 5. RPC retry loop.
#[test]
fn scenario_rpc_retry_then_success() {
    let mut h = harness();
    let mut proposed = PartitionConfiguration::new(gpid(), "simple_kv", Ballot::new(1));
    proposed.primary = Endpoint::invalid();
    h.replica.on_config_proposal(ConfigurationUpdateRequest {
        config_type: ConfigurationType::AssignPrimary,
        node: self_address(),
        config: proposed,
    });

    let request = h.meta_client.requests.borrow().last().unwrap().clone();
    h.replica.on_reply(request.clone(), Err(RpcError::Timeout));

    assert_eq!(h.meta_client.requests.borrow().len(), 2, "timeout must trigger an identical re-issue");
    assert_eq!(h.replica.status(), Status::Inactive);

    let retried_request = h.meta_client.requests.borrow().last().unwrap().clone();
    assert_eq!(retried_request.config, request.config);

    let mut reply_config = retried_request.config.clone();
    reply_config.ballot = retried_request.config.ballot;
    h.replica.on_reply(retried_request, Ok(success_reply(reply_config)));

    assert_eq!(h.replica.status(), Status::Primary);
}

// 6. Forbidden ERROR exit.
#[test]
fn scenario_forbidden_error_exit_is_rejected() {
    let mut h = harness();

    let entered = h.replica.force_error(Ballot::new(7));
    assert!(entered.is_applied());
    assert_eq!(h.replica.status(), Status::Error);
    assert_eq!(h.replica.ballot(), Ballot::new(7));

    h.host.notifications.borrow_mut().clear();

    let mut config = PartitionConfiguration::new(gpid(), "simple_kv", Ballot::new(8));
    config.secondaries = vec![self_address()];
    let outcome = h.replica.on_configuration_sync(config);

    assert_eq!(
        outcome,
        crate::error::ProposalOutcome::Rejected(crate::error::RejectReason::ErrorIsSticky)
    );
    assert_eq!(h.replica.status(), Status::Error, "ERROR must remain sticky");
    assert_eq!(h.replica.ballot(), Ballot::new(7), "ballot must not advance on a rejected transition");
    assert!(
        h.host.notifications.borrow().is_empty(),
        "a rejected transition must not notify the host"
    );
}

// Idempotence: applying the same configuration twice is a no-op.
#[test]
fn applying_same_configuration_twice_is_idempotent() {
    let mut h = harness();
    make_primary(&mut h, vec![]);
    h.host.notifications.borrow_mut().clear();

    let config = h.replica.last_full_configuration().clone();
    let outcome = h.replica.update_configuration(config.clone());
    assert!(outcome.is_applied());
    assert!(
        h.host.notifications.borrow().len() <= 1,
        "re-applying an unchanged configuration must not repeatedly notify with a status change"
    );

    let notifications = h.host.notifications.borrow();
    if let Some((_, is_closing)) = notifications.last() {
        assert!(!is_closing);
    }
}

#[test]
fn force_error_closes_the_replica() {
    let mut h = harness();
    make_primary(&mut h, vec![]);
    h.host.notifications.borrow_mut().clear();

    let outcome = h.replica.force_error(h.replica.ballot());
    assert!(outcome.is_applied());
    assert_eq!(h.replica.status(), Status::Error);
    assert!(h.replica.primary_state().is_none(), "PrimaryState must be torn down on entry to ERROR");

    let notifications = h.host.notifications.borrow();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].1, "ERROR must always close the replica");
    assert_eq!(h.host.closes.get(), 1);
}

#[test]
fn project_is_stable_across_repeated_calls() {
    let mut config = PartitionConfiguration::new(gpid(), "simple_kv", Ballot::new(3));
    config.primary = Endpoint::new("primary", 1);
    config.secondaries = vec![Endpoint::new("secondary", 2)];

    let node = Endpoint::new("secondary", 2);
    let first = config.project(&node, false);
    let second = config.project(&node, false);
    assert_eq!(first, second);
}

use proptest::prelude::*;

proptest! {
    /// No sequence of increasing-ballot configuration applications ever
    /// moves the replica's local ballot backwards (§4.D's core invariant).
    #[test]
    fn ballot_never_regresses_across_bumps(bumps in proptest::collection::vec(1u64..6, 1..10)) {
        let mut h = harness();
        let mut last_ballot = h.replica.ballot().as_u64();

        for bump in bumps {
            let config = PartitionConfiguration::new(gpid(), "simple_kv", Ballot::new(last_ballot + bump));
            h.replica.update_configuration(config);
            prop_assert!(h.replica.ballot().as_u64() >= last_ballot);
            last_ballot = h.replica.ballot().as_u64();
        }
    }

    /// A replica that is not primary and not named in a proposal is never
    /// told it is PRIMARY: `update_configuration`'s projection only ever
    /// yields PRIMARY for the node matching `config.primary`.
    #[test]
    fn projection_only_elects_the_named_primary(
        primary_port in 1u16..200,
        secondary_ports in proptest::collection::vec(1u16..200, 0..5),
    ) {
        let mut config = PartitionConfiguration::new(gpid(), "simple_kv", Ballot::new(1));
        config.primary = Endpoint::new("node", primary_port);
        config.secondaries = secondary_ports
            .into_iter()
            .filter(|p| *p != primary_port)
            .map(|p| Endpoint::new("node", p))
            .collect();

        let bystander = Endpoint::new("node", 250);
        let projection = config.project(&bystander, false);
        prop_assert_eq!(projection.status, Status::Inactive);
    }
}
