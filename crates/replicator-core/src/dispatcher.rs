//! Component E: the Proposal Dispatcher (§4.E) — the entry point that
//! classifies a meta-server proposal and invokes the correct primary-side
//! handler.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use replicator_types::{ConfigurationType, Endpoint, PartitionConfiguration, Status};
use replicator_wire::{ConfigurationUpdateRequest, GroupCheckRequest};
use tracing::warn;

use crate::error::ProposalOutcome;
use crate::primary_state::RemoteLearnerState;
use crate::replica::Replica;

impl Replica {
    /// Classifies `proposal` and dispatches it (§4.E).
    pub fn on_config_proposal(&mut self, proposal: ConfigurationUpdateRequest) -> ProposalOutcome {
        if proposal.config.ballot < self.ballot() {
            return ProposalOutcome::DroppedStale;
        }
        if proposal.config.ballot > self.ballot() {
            self.update_configuration(proposal.config.clone());
        }

        match proposal.config_type {
            ConfigurationType::AssignPrimary => self.assign_primary(proposal),
            ConfigurationType::AddSecondary => self.add_potential_secondary(proposal),
            ConfigurationType::DowngradeToSecondary => self.downgrade_to_secondary_on_primary(proposal),
            ConfigurationType::DowngradeToInactive => self.downgrade_to_inactive_on_primary(proposal),
            ConfigurationType::Remove => self.remove_on_primary(proposal),
            ConfigurationType::UpgradeToSecondary => {
                panic!(
                    "on_config_proposal: UPGRADE_TO_SECONDARY is never proposed by the meta-server \
                     (it originates locally from upgrade_to_secondary_on_primary)"
                );
            }
        }
    }

    fn assign_primary(&mut self, mut proposal: ConfigurationUpdateRequest) -> ProposalOutcome {
        assert_eq!(
            proposal.node, self.self_address,
            "assign_primary: proposal must target self"
        );
        if self.status() == Status::Primary {
            warn!("assign_primary proposal received while already PRIMARY, ignoring");
            return ProposalOutcome::DroppedDuplicate;
        }

        proposal.config.primary = self.self_address.clone();
        PartitionConfiguration::remove_node(&self.self_address, &mut proposal.config.secondaries);
        PartitionConfiguration::remove_node(&self.self_address, &mut proposal.config.drop_outs);

        let node = self.self_address.clone();
        self.update_configuration_on_meta_server(ConfigurationType::AssignPrimary, node, proposal.config);
        ProposalOutcome::Applied
    }

    fn add_potential_secondary(&mut self, proposal: ConfigurationUpdateRequest) -> ProposalOutcome {
        if let Some(outcome) = self.primary_preconditions(&proposal) {
            return outcome;
        }
        self.assert_matches_primary_membership(&proposal.config);

        let primary_state = self.primary_state.as_mut().expect("checked by primary_preconditions");
        if let Some(status) = primary_state.statuses.get(&proposal.node) {
            if matches!(status, Status::Primary | Status::Secondary) {
                return ProposalOutcome::DroppedDuplicate;
            }
        }
        if primary_state.learners.contains_key(&proposal.node) {
            return ProposalOutcome::DroppedDuplicate;
        }

        let signature = random_signature();
        primary_state
            .learners
            .insert(proposal.node.clone(), RemoteLearnerState::new(signature));
        primary_state
            .statuses
            .insert(proposal.node.clone(), Status::PotentialSecondary);

        let membership = primary_state.membership.clone();
        let last_committed_decree = self.prepare_list.last_committed_decree();
        let request = GroupCheckRequest {
            app_type: membership.app_type.clone(),
            node: proposal.node.clone(),
            config: membership,
            last_committed_decree,
            learner_signature: signature,
        };
        self.peer_client.send_group_check(&proposal.node, request);
        ProposalOutcome::Applied
    }

    fn downgrade_to_secondary_on_primary(&mut self, mut proposal: ConfigurationUpdateRequest) -> ProposalOutcome {
        if let Some(outcome) = self.primary_preconditions(&proposal) {
            return outcome;
        }
        self.assert_matches_primary_membership(&proposal.config);
        assert_eq!(
            proposal.node, proposal.config.primary,
            "downgrade_to_secondary_on_primary: node must be the proposal's current primary"
        );

        proposal.config.primary = Endpoint::invalid();
        proposal.config.secondaries.push(proposal.node.clone());

        let node = proposal.node.clone();
        self.update_configuration_on_meta_server(ConfigurationType::DowngradeToSecondary, node, proposal.config);
        ProposalOutcome::Applied
    }

    fn downgrade_to_inactive_on_primary(&mut self, mut proposal: ConfigurationUpdateRequest) -> ProposalOutcome {
        if let Some(outcome) = self.primary_preconditions(&proposal) {
            return outcome;
        }
        self.assert_matches_primary_membership(&proposal.config);

        if proposal.config.primary == proposal.node {
            proposal.config.primary = Endpoint::invalid();
        } else {
            let removed = PartitionConfiguration::remove_node(&proposal.node, &mut proposal.config.secondaries);
            assert!(
                removed,
                "downgrade_to_inactive_on_primary: node must be the primary or a current secondary"
            );
        }
        proposal.config.drop_outs.push(proposal.node.clone());

        let node = proposal.node.clone();
        self.update_configuration_on_meta_server(ConfigurationType::DowngradeToInactive, node, proposal.config);
        ProposalOutcome::Applied
    }

    fn remove_on_primary(&mut self, mut proposal: ConfigurationUpdateRequest) -> ProposalOutcome {
        if let Some(outcome) = self.primary_preconditions(&proposal) {
            return outcome;
        }
        self.assert_matches_primary_membership(&proposal.config);

        let node_status = self
            .primary_state
            .as_ref()
            .expect("checked by primary_preconditions")
            .statuses
            .get(&proposal.node)
            .copied();

        match node_status {
            Some(Status::Primary) => {
                assert_eq!(
                    proposal.config.primary, proposal.node,
                    "remove_on_primary: node tracked as PRIMARY must be the proposal's current primary"
                );
                proposal.config.primary = Endpoint::invalid();
            }
            Some(Status::Secondary) => {
                let removed = PartitionConfiguration::remove_node(&proposal.node, &mut proposal.config.secondaries);
                assert!(removed, "remove_on_primary: node tracked as SECONDARY must be in secondaries");
            }
            // Nodes not currently primary or secondary but still tracked
            // by the group (pending learners and former members alike)
            // live in `drop_outs` (§9 `dropOuts` resolution — see
            // DESIGN.md).
            Some(Status::PotentialSecondary) => {
                let removed = PartitionConfiguration::remove_node(&proposal.node, &mut proposal.config.drop_outs);
                assert!(
                    removed,
                    "remove_on_primary: node tracked as POTENTIAL_SECONDARY must be in drop_outs"
                );
            }
            _ => return ProposalOutcome::DroppedNotPrimary,
        }

        let node = proposal.node.clone();
        self.update_configuration_on_meta_server(ConfigurationType::Remove, node, proposal.config);
        ProposalOutcome::Applied
    }

    /// Called by the learner subsystem once a potential secondary has
    /// caught up (§4.E).
    pub fn upgrade_to_secondary_on_primary(&mut self, node: Endpoint) {
        let membership = self
            .primary_state
            .as_ref()
            .expect("upgrade_to_secondary_on_primary: must be PRIMARY")
            .membership
            .clone();

        let mut config = membership;
        let removed = PartitionConfiguration::remove_node(&node, &mut config.drop_outs);
        assert!(removed, "upgrade_to_secondary_on_primary: node must be a tracked learner");
        config.secondaries.push(node.clone());

        self.update_configuration_on_meta_server(ConfigurationType::UpgradeToSecondary, node, config);
    }

    /// Shared racing/stale-message guard for every primary-side handler
    /// except `assign_primary` (§4.E: "preconditions identical").
    ///
    /// This only covers the ballot/status check — the original source's
    /// equivalent of each handler (`replica_config.cpp`'s
    /// `add_potential_secondary`/`downgrade_to_secondary_on_primary`/
    /// `downgrade_to_inactive_on_primary`/`remove`) returns silently on
    /// exactly this condition (`proposal.config.ballot != get_ballot() ||
    /// status() != PS_PRIMARY`) but `rassert`s — a fatal invariant check,
    /// not a silent drop — on the identity fields that follow. Callers
    /// must follow a `None` result with [`Self::assert_matches_primary_membership`].
    ///
    /// Returns `Some(outcome)` with the drop reason if this precondition
    /// fails, or `None` if the proposal may proceed.
    fn primary_preconditions(&self, proposal: &ConfigurationUpdateRequest) -> Option<ProposalOutcome> {
        if self.status() != Status::Primary {
            return Some(ProposalOutcome::DroppedNotPrimary);
        }
        if proposal.config.ballot != self.ballot() {
            return Some(ProposalOutcome::DroppedStale);
        }
        None
    }

    /// Asserts that `config`'s `gpid`, `app_type`, `primary`, and
    /// `secondaries` equal this replica's local primary-state membership
    /// (§3: "mismatch is a fatal assertion"; §7.1 invariant violations
    /// abort the process). Matches `replica_config.cpp`'s `rassert`
    /// placement immediately after its ballot/status early-return in
    /// `add_potential_secondary`, `downgrade_to_secondary_on_primary`,
    /// `downgrade_to_inactive_on_primary`, and `remove`.
    fn assert_matches_primary_membership(&self, config: &PartitionConfiguration) {
        let m = &self
            .primary_state
            .as_ref()
            .expect("assert_matches_primary_membership: must be PRIMARY")
            .membership;
        assert_eq!(config.gpid, m.gpid, "proposal.config.gpid must match local primary-state membership");
        assert_eq!(
            config.app_type, m.app_type,
            "proposal.config.app_type must match local primary-state membership"
        );
        assert_eq!(
            config.primary, m.primary,
            "proposal.config.primary must match local primary-state membership"
        );
        assert_eq!(
            config.secondaries, m.secondaries,
            "proposal.config.secondaries must match local primary-state membership"
        );
    }
}

/// Random non-zero 64-bit token for a fresh learner session (§3
/// `RemoteLearnerState::signature`), matching the teacher's own pattern of
/// seeding a `SmallRng` from OS entropy for process-level tokens that need
/// not be cryptographically strong.
fn random_signature() -> u64 {
    let mut rng = SmallRng::from_entropy();
    rng.r#gen::<u64>()
}
