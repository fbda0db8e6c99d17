//! Primary-side bookkeeping (§3 `PrimaryState`, `RemoteLearnerState`):
//! state held only while this replica's role is `PRIMARY`.
//!
//! Created on transition *to* `PRIMARY`, destroyed on transition *from*
//! `PRIMARY` (§3 Lifecycle). `ReconfigurationTask` is deliberately **not**
//! kept here even though §3 lists it under `PrimaryState` — see
//! `DESIGN.md` for why it lives on `Replica` instead.

use std::collections::HashMap;

use replicator_types::{Decree, Endpoint, PartitionConfiguration, Status};

use crate::host::CancelHandle;

/// Per-node bookkeeping for a learner currently being shipped state by this
/// primary (§3).
#[derive(Debug)]
pub struct RemoteLearnerState {
    /// Decree the prepare list had reached when this learner was added;
    /// starts invalid (no snapshot shipped yet). The learner
    /// snapshot-shipping protocol that advances this is an external
    /// collaborator (§1 Non-goals).
    pub prepare_start_decree: Decree,
    /// Random token correlating this learner session, so a primary can
    /// distinguish replies belonging to a stale attempt from a fresh one.
    pub signature: u64,
    /// Cancelled when the learner is torn down (promoted, removed, or the
    /// primary itself steps down).
    pub timeout_task: Option<Box<dyn CancelHandle>>,
}

impl RemoteLearnerState {
    pub fn new(signature: u64) -> Self {
        Self {
            prepare_start_decree: Decree::INVALID,
            signature,
            timeout_task: None,
        }
    }
}

/// Bookkeeping held only while this replica's role is `PRIMARY` (§3).
#[derive(Debug)]
pub struct PrimaryState {
    /// The authoritative membership view, as last applied.
    pub membership: PartitionConfiguration,
    /// Learners currently being shipped state, keyed by endpoint.
    pub learners: HashMap<Endpoint, RemoteLearnerState>,
    /// Role of every member and learner this primary is tracking,
    /// including self (as `PRIMARY`).
    pub statuses: HashMap<Endpoint, Status>,
}

impl PrimaryState {
    /// Constructed on transition to `PRIMARY`, with an empty `Learners` map
    /// and `self` recorded as `PRIMARY` in `Statuses`.
    pub fn new(membership: PartitionConfiguration, self_address: Endpoint) -> Self {
        let mut statuses = HashMap::new();
        statuses.insert(self_address, Status::Primary);
        Self {
            membership,
            learners: HashMap::new(),
            statuses,
        }
    }

    /// Cancels every learner's timeout task and clears `Learners`/
    /// `Statuses`. Called on every transition away from `PRIMARY`.
    ///
    /// `ballot_changed` is retained in the signature to match §4.D's
    /// `PrimaryState.cleanup(ballotChanged)` call; this implementation
    /// does not currently branch on it (the struct is dropped by the
    /// caller immediately afterwards either way) — see `DESIGN.md`.
    pub fn cleanup(&mut self, _ballot_changed: bool) {
        for (_, learner) in self.learners.drain() {
            if let Some(task) = learner.timeout_task {
                task.cancel();
            }
        }
        self.statuses.clear();
    }

    /// Overwrites `membership` with `config`. If `lost_primary` (the new
    /// primary is not self), also clears `Learners`/`Statuses`: that
    /// bookkeeping is meaningless once self is no longer primary.
    pub fn reset_membership(&mut self, config: PartitionConfiguration, lost_primary: bool) {
        self.membership = config;
        if lost_primary {
            for (_, learner) in self.learners.drain() {
                if let Some(task) = learner.timeout_task {
                    task.cancel();
                }
            }
            self.statuses.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct RecordingHandle(std::rc::Rc<std::cell::Cell<u32>>);
    impl CancelHandle for RecordingHandle {
        fn cancel(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn membership() -> PartitionConfiguration {
        PartitionConfiguration::new(
            replicator_types::Gpid::new(1, 0),
            "simple_kv",
            replicator_types::Ballot::new(2),
        )
    }

    #[test]
    fn cleanup_cancels_every_learner_timeout() {
        let cancelled = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut state = PrimaryState::new(membership(), Endpoint::new("self", 1));
        let mut learner = RemoteLearnerState::new(42);
        learner.timeout_task = Some(Box::new(RecordingHandle(cancelled.clone())));
        state.learners.insert(Endpoint::new("learner", 2), learner);

        state.cleanup(false);

        assert_eq!(cancelled.get(), 1);
        assert!(state.learners.is_empty());
        assert!(state.statuses.is_empty());
    }

    #[test]
    fn reset_membership_keeps_learners_when_still_primary() {
        let mut state = PrimaryState::new(membership(), Endpoint::new("self", 1));
        state
            .learners
            .insert(Endpoint::new("learner", 2), RemoteLearnerState::new(1));

        let mut new_config = membership();
        new_config.ballot = new_config.ballot.next();
        state.reset_membership(new_config, false);

        assert_eq!(state.learners.len(), 1);
    }

    #[test]
    fn reset_membership_clears_learners_when_primary_lost() {
        let mut state = PrimaryState::new(membership(), Endpoint::new("self", 1));
        state
            .learners
            .insert(Endpoint::new("learner", 2), RemoteLearnerState::new(1));

        state.reset_membership(membership(), true);

        assert!(state.learners.is_empty());
        assert!(state.statuses.is_empty());
    }
}
