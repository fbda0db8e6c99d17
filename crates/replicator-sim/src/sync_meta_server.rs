//! [`SyncMetaServer`]: the deterministic, synchronous meta-server test
//! double (§9 Design Notes, §8 "a test double that fulfills the
//! meta-server contract synchronously").
//!
//! It implements [`MetaServerClient`] like any real RPC client would, but
//! instead of putting a request on a wire it records it and immediately
//! computes — deterministically, from a scripted queue or a default
//! responder — the reply `SimHarness` will feed back through
//! [`replicator_core::Replica::on_reply`] on the very next harness step.
//! Nothing here is actually asynchronous; "synchronous" is the point.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use replicator_core::{CancelHandle, MetaServerClient, RpcError};
use replicator_types::{Endpoint, ErrorCode};
use replicator_wire::{ConfigurationUpdateRequest, ConfigurationUpdateResponse};

/// A queued request alongside the flag its `CancelHandle` sets. A
/// cancelled entry is never resolved — `issue_reconfiguration_rpc` always
/// cancels the previous handle before sending a new one (§4.C
/// "At-most-one in-flight"), so this double must actually retract it
/// rather than let it sit in the queue pretending to still be outstanding.
struct PendingEntry {
    request: ConfigurationUpdateRequest,
    cancelled: Rc<Cell<bool>>,
}

struct RpcCancelHandle(Rc<Cell<bool>>);
impl CancelHandle for RpcCancelHandle {
    fn cancel(&self) {
        self.0.set(true);
    }
}

/// A single scripted outcome for the next recorded request.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Reply with this response once the harness resolves the request.
    Response(ConfigurationUpdateResponse),
    /// Fail the attempt; `SimHarness::resolve_next` re-issues identically,
    /// matching §4.C's "infinite retry with current contact + server list".
    Error(RpcError),
}

/// Deterministic, synchronous meta-server double.
///
/// Every `call_update_configuration` is appended to an internal queue;
/// nothing is actually dispatched anywhere. [`SimHarness`](crate::SimHarness)
/// drains that queue, resolving each request against a scripted reply if
/// one was pushed with [`SyncMetaServer::script`], or else against the
/// default responder: approve the request's own `config` verbatim
/// (`ErrorCode::Success`), which is what a meta-server with no competing
/// proposals in flight does in practice.
#[derive(Debug, Default)]
pub struct SyncMetaServer {
    pending: RefCell<VecDeque<PendingEntry>>,
    scripted: RefCell<VecDeque<ScriptedReply>>,
}

impl std::fmt::Debug for PendingEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingEntry").field("request", &self.request).finish()
    }
}

impl SyncMetaServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply for the next request that gets resolved, ahead of
    /// the default "always approve" responder.
    pub fn script(&self, reply: ScriptedReply) {
        self.scripted.borrow_mut().push_back(reply);
    }

    /// True if at least one (non-cancelled) request is awaiting resolution.
    pub fn has_pending(&self) -> bool {
        self.pending_count() > 0
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().iter().filter(|e| !e.cancelled.get()).count()
    }

    /// Pops the oldest unresolved, non-cancelled request and its outcome:
    /// the next scripted reply if one is queued, otherwise the default
    /// approval. Cancelled entries are discarded without consuming a
    /// scripted reply — they never got one in reality either.
    pub(crate) fn take_next(&self) -> Option<(ConfigurationUpdateRequest, Result<ConfigurationUpdateResponse, RpcError>)> {
        let request = loop {
            let entry = self.pending.borrow_mut().pop_front()?;
            if !entry.cancelled.get() {
                break entry.request;
            }
        };
        let outcome = match self.scripted.borrow_mut().pop_front() {
            Some(ScriptedReply::Response(response)) => Ok(response),
            Some(ScriptedReply::Error(err)) => Err(err),
            None => Ok(ConfigurationUpdateResponse {
                err: ErrorCode::Success,
                config: request.config.clone(),
            }),
        };
        Some((request, outcome))
    }
}

struct MetaClientShim(Rc<SyncMetaServer>);
impl MetaServerClient for MetaClientShim {
    fn call_update_configuration(
        &self,
        _contact: &Endpoint,
        _servers: &[Endpoint],
        request: &ConfigurationUpdateRequest,
        _timeout_ms: u64,
    ) -> Box<dyn CancelHandle> {
        let cancelled = Rc::new(Cell::new(false));
        self.0.pending.borrow_mut().push_back(PendingEntry {
            request: request.clone(),
            cancelled: cancelled.clone(),
        });
        Box::new(RpcCancelHandle(cancelled))
    }
}

pub(crate) fn meta_client_shim(meta: Rc<SyncMetaServer>) -> Box<dyn MetaServerClient> {
    Box::new(MetaClientShim(meta))
}
