//! Component D: the role state machine (§4.D).
//!
//! `update_configuration` → `update_local_configuration` is the single
//! funnel every configuration change passes through, whether it arrives
//! from a meta-server proposal (dispatcher), a reconfiguration reply
//! (reconfiguration client), periodic gossip (`on_configuration_sync`), or
//! an explicit `REMOVE` from the current primary (`on_remove`).

use replicator_kernel::Mutation;
use replicator_types::{Ballot, PartitionConfiguration, ReplicaConfiguration, Status};
use tracing::{debug, info};

use crate::error::{ProposalOutcome, RejectReason};
use crate::primary_state::PrimaryState;
use crate::replica::Replica;

impl Replica {
    /// Applies a freshly received full group view (§4.D).
    ///
    /// Resets primary-side membership bookkeeping when the ballot advances
    /// or this replica's projected status differs from its current one,
    /// then funnels into `update_local_configuration`.
    pub fn update_configuration(&mut self, config: PartitionConfiguration) -> ProposalOutcome {
        assert!(
            config.ballot >= self.ballot(),
            "update_configuration: config ballot {:?} must not regress local ballot {:?}",
            config.ballot,
            self.ballot()
        );

        let is_learning = self.potential_secondary.is_learning();
        let projection = config.project(&self.self_address, is_learning);

        if config.ballot > self.ballot() || self.status() != projection.status {
            let lost_primary = projection.status != Status::Primary;
            if let Some(primary_state) = self.primary_state.as_mut() {
                primary_state.reset_membership(config.clone(), lost_primary);
            }
        }

        self.last_full_configuration = config;
        self.update_local_configuration(projection)
    }

    /// Convenience path used by the Reconfiguration Client to force local
    /// status to `status` without bumping the ballot, while a
    /// reconfiguration RPC is in flight (§4.D). Short-circuits if already
    /// in the target status.
    pub(crate) fn update_local_configuration_with_no_ballot_change(
        &mut self,
        status: Status,
    ) -> ProposalOutcome {
        if self.status() == status {
            return ProposalOutcome::Applied;
        }
        let rc = ReplicaConfiguration {
            gpid: self.gpid,
            ballot: self.ballot(),
            status,
        };
        self.update_local_configuration(rc)
    }

    /// The central transition function (§4.D).
    pub(crate) fn update_local_configuration(&mut self, rc: ReplicaConfiguration) -> ProposalOutcome {
        assert!(
            rc.ballot >= self.ballot(),
            "update_local_configuration: ballot must not regress"
        );
        assert_eq!(
            rc.gpid, self.gpid,
            "update_local_configuration: gpid must match this replica's gpid"
        );

        let old_status = self.status();
        let old_ballot = self.ballot();

        if old_status == rc.status && old_ballot == rc.ballot {
            return ProposalOutcome::Applied;
        }

        // Forbidden (§4.D): ERROR is sticky except for an explicit reset
        // outside this component. Rejected, not fatal — §8 scenario 6.
        if old_status == Status::Error
            && matches!(rc.status, Status::Secondary | Status::Primary | Status::Inactive)
        {
            debug!(from = %old_status, to = %rc.status, "rejecting transition out of ERROR");
            return ProposalOutcome::Rejected(RejectReason::ErrorIsSticky);
        }

        // Invalid execution paths (§4.D matrix): these combinations are
        // never legitimately constructed by this crate's own call graph,
        // unlike the ERROR/learning-guard cases above which are expected
        // to occur in practice and are handled as ordinary rejections.
        assert!(
            !(old_status == Status::Primary && rc.status == Status::PotentialSecondary),
            "invalid execution path: PRIMARY -> POTENTIAL_SECONDARY"
        );
        assert!(
            !(old_status == Status::PotentialSecondary && rc.status == Status::Primary),
            "invalid execution path: POTENTIAL_SECONDARY -> PRIMARY"
        );

        // Forbidden (§4.D, §9): POTENTIAL_SECONDARY cannot safely exit to
        // ERROR/INACTIVE while still learning; the substate's own
        // `cleanup(force=false)` is the arbiter.
        if old_status == Status::PotentialSecondary
            && matches!(rc.status, Status::Error | Status::Inactive)
            && !self.potential_secondary.cleanup(false)
        {
            debug!("rejecting POTENTIAL_SECONDARY exit: learner handshake still running");
            return ProposalOutcome::Rejected(RejectReason::StillLearning);
        }

        assert!(
            self.prepare_list.max_decree() >= self.prepare_list.last_committed_decree(),
            "prepare-list invariant violated: max_decree < last_committed_decree"
        );

        // PrimaryState is created on entry to PRIMARY, before the
        // transition action runs, so `init_group_check` has it available.
        if rc.status == Status::Primary && old_status != Status::Primary && self.primary_state.is_none() {
            self.primary_state = Some(PrimaryState::new(
                self.last_full_configuration.clone(),
                self.self_address.clone(),
            ));
        }

        self.run_transition_action(old_status, old_ballot, &rc);

        self.config = rc.clone();
        self.last_config_change_time_ms = self.clock.now_ms();

        let status_changed = old_status != rc.status;
        if status_changed {
            info!(from = %old_status, to = %rc.status, ballot = %rc.ballot, "replica status changed");
        }
        // Closing applies independently of whether status itself flipped:
        // PRIMARY -> INACTIVE at an unchanged ballot (disabling 2PC mid
        // reconfiguration) must not yet close, but the following
        // INACTIVE -> INACTIVE at the bumped ballot (self removed from the
        // group) must.
        let is_closing = rc.status == Status::Error || (rc.status == Status::Inactive && rc.ballot > old_ballot);

        self.host.notify_replica_state_update(&self.config, is_closing);
        if is_closing {
            self.host.begin_close_replica();
        }

        ProposalOutcome::Applied
    }

    /// The transition matrix's side effects (§4.D), excluding the status
    /// field update itself (applied by the caller afterwards).
    fn run_transition_action(&mut self, old_status: Status, old_ballot: Ballot, rc: &ReplicaConfiguration) {
        use Status::{Error, Inactive, Primary, PotentialSecondary, Secondary};

        match (old_status, rc.status) {
            (Primary, Primary) => {
                self.cleanup_preparing_mutations();
                self.replay_prepare_list();
            }
            (Primary, Secondary) => {
                self.cleanup_preparing_mutations();
                self.destroy_primary_state(false);
            }
            (Primary, Inactive) => {
                self.cleanup_preparing_mutations();
                let ballot_changed = rc.ballot != old_ballot;
                self.destroy_primary_state(ballot_changed);
            }
            (Primary, Error) => {
                self.cleanup_preparing_mutations();
                self.destroy_primary_state(false);
            }
            (Secondary, Primary) | (Inactive, Primary) => {
                self.init_group_check();
                self.replay_prepare_list();
            }
            (PotentialSecondary, Secondary) => {
                self.prepare_list.truncate(self.app.last_committed_decree());
                self.potential_secondary.cleanup(true);
            }
            (PotentialSecondary, Inactive) | (PotentialSecondary, Error) => {
                self.prepare_list.reset(self.app.last_committed_decree());
            }
            // Every other cell is "no transition action beyond the status
            // field update" (§4.D empty cells), including same-status
            // ballot bumps and the informational Secondary/Inactive/Error
            // inter-transitions.
            _ => {}
        }
    }

    /// Cancels the primary's in-flight prepare list entries that will
    /// never commit under the old role.
    ///
    /// The mutation ordering algorithm and its client-response bookkeeping
    /// live entirely in the external prepare list / mutation log (§1
    /// Non-goals); this hook exists so the transition table's documented
    /// step is named explicitly rather than silently absorbed into
    /// `replay_prepare_list`/`truncate`/`reset`.
    fn cleanup_preparing_mutations(&mut self) {}

    /// Starts (or refreshes) group checks against every current secondary
    /// on entry to `PRIMARY` (§4.D "init group check"). Uses the same
    /// `GroupCheckRequest` shape `add_potential_secondary` uses to
    /// bootstrap a learner (§6).
    fn init_group_check(&mut self) {
        let Some(primary_state) = self.primary_state.as_ref() else {
            return;
        };
        let membership = primary_state.membership.clone();
        let last_committed_decree = self.prepare_list.last_committed_decree();
        for secondary in &membership.secondaries {
            let request = replicator_wire::GroupCheckRequest {
                app_type: membership.app_type.clone(),
                node: secondary.clone(),
                config: membership.clone(),
                last_committed_decree,
                learner_signature: 0,
            };
            self.peer_client.send_group_check(secondary, request);
        }
    }

    /// Destroys `PrimaryState`, cancelling its learners' timeout tasks
    /// first (§3 Lifecycle: destroyed on transition from `PRIMARY`).
    fn destroy_primary_state(&mut self, ballot_changed: bool) {
        if let Some(mut primary_state) = self.primary_state.take() {
            primary_state.cleanup(ballot_changed);
        }
    }

    /// For each decree in `(last_committed_decree, max_decree]`, submits a
    /// fresh mutation to `init_prepare`: the prepare list's existing entry
    /// if one is held at that decree, otherwise an empty placeholder for
    /// the gap (§4.D).
    pub(crate) fn replay_prepare_list(&mut self) {
        let last_committed = self.prepare_list.last_committed_decree();
        let max_decree = self.prepare_list.max_decree();

        let mut decree = last_committed.next();
        while decree <= max_decree {
            let mutation = match self.prepare_list.get_mutation_by_decree(decree) {
                Some(existing) => Mutation {
                    decree,
                    updates: existing.updates,
                    client_requests: existing.client_requests,
                },
                None => Mutation::empty(decree),
            };
            self.prepare_list.init_prepare(mutation);
            decree = decree.next();
        }
    }

    /// Passive path from periodic gossip (§4.D): applies `config` if its
    /// ballot is current or newer, otherwise drops it.
    pub fn on_configuration_sync(&mut self, config: PartitionConfiguration) -> ProposalOutcome {
        if config.ballot < self.ballot() {
            return ProposalOutcome::DroppedStale;
        }
        self.update_configuration(config)
    }

    /// Receives an explicit `REMOVE` from the current primary (§4.D).
    pub fn on_remove(&mut self, rc: ReplicaConfiguration) -> ProposalOutcome {
        if rc.ballot < self.ballot() {
            return ProposalOutcome::DroppedStale;
        }
        assert_eq!(
            rc.status,
            Status::Inactive,
            "on_remove: the primary must always ask a removed node to go INACTIVE"
        );
        self.update_local_configuration(rc)
    }

    /// The host's entry point for reporting a fatal local condition (§3
    /// Lifecycle, §4.D matrix: every `* -> ERROR` cell). Nothing in this
    /// component's own call graph ever projects `Status::Error` — `project`
    /// only ever yields `PRIMARY`/`SECONDARY`/`POTENTIAL_SECONDARY`/
    /// `INACTIVE` — so the host needs an explicit way in. `ballot` must not
    /// regress; pass the current ballot to enter `ERROR` without a bump.
    pub fn force_error(&mut self, ballot: Ballot) -> ProposalOutcome {
        assert!(
            ballot >= self.ballot(),
            "force_error: ballot must not regress local ballot"
        );
        let rc = ReplicaConfiguration {
            gpid: self.gpid,
            ballot,
            status: Status::Error,
        };
        self.update_local_configuration(rc)
    }
}
