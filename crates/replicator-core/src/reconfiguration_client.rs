//! Component C: the Reconfiguration Client (§4.C).
//!
//! Sends configuration-update RPCs to the meta-server and retries on
//! error; applies the authoritative reply once it arrives. The retry loop
//! itself is realized as explicit re-entry: whatever runtime observed a
//! reply (or a timeout) calls [`Replica::on_reply`], which either re-issues
//! the identical RPC or applies the response — there is no captured
//! closure, matching §5's single-threaded-per-partition, no-internal-
//! suspension model.

use replicator_types::{ConfigurationType, Endpoint, ErrorCode, PartitionConfiguration, Status};
use replicator_wire::{ConfigurationUpdateRequest, ConfigurationUpdateResponse};
use tracing::warn;

use crate::error::RpcError;
use crate::replica::Replica;

impl Replica {
    /// Sends `new_config` to the meta-server as a `config_type`
    /// reconfiguration (§4.C).
    pub(crate) fn update_configuration_on_meta_server(
        &mut self,
        config_type: ConfigurationType,
        node: Endpoint,
        mut new_config: PartitionConfiguration,
    ) {
        new_config.last_committed_decree = self.prepare_list.last_committed_decree();

        if config_type != ConfigurationType::AssignPrimary {
            assert_eq!(
                self.status(),
                Status::Primary,
                "update_configuration_on_meta_server: {config_type} requires local status PRIMARY"
            );
            assert_eq!(
                new_config.ballot,
                self.ballot(),
                "update_configuration_on_meta_server: new_config ballot must match local ballot"
            );
        }

        // Disable two-phase commit during reconfiguration, uniformly
        // across every type, without bumping the ballot.
        self.update_local_configuration_with_no_ballot_change(Status::Inactive);

        new_config.ballot = new_config.ballot.next();
        let request = ConfigurationUpdateRequest {
            config_type,
            node,
            config: new_config,
        };
        self.issue_reconfiguration_rpc(request);
    }

    /// Issues `request`, cancelling any previously outstanding
    /// reconfiguration RPC first (§3, §5, §8 "At-most-one in-flight").
    fn issue_reconfiguration_rpc(&mut self, request: ConfigurationUpdateRequest) {
        if let Some(task) = self.reconfiguration_task.take() {
            task.cancel();
        }
        let contact = self.liveness.current_server_contact();
        let servers = self.liveness.get_servers();
        let handle = self
            .meta_client
            .call_update_configuration(&contact, &servers, &request, self.rpc_timeout_ms);
        self.reconfiguration_task = Some(handle);
    }

    /// Handles a reply to `request` (or its failure), fed back in by the
    /// runtime observing the meta-server call (§4.C `on_reply`).
    pub fn on_reply(
        &mut self,
        request: ConfigurationUpdateRequest,
        result: Result<ConfigurationUpdateResponse, RpcError>,
    ) {
        if self.status() != Status::Inactive || !self.liveness.is_connected() {
            // No longer awaiting this reply, or the host has disconnected:
            // abandon the retry loop silently (§5, §7.3).
            return;
        }

        match result {
            Err(err) => {
                warn!(?err, config_type = %request.config_type, "reconfiguration RPC failed, retrying");
                self.issue_reconfiguration_rpc(request);
            }
            Ok(response) => {
                if response.config.ballot < self.ballot() {
                    return;
                }

                if response.err == ErrorCode::Success {
                    assert_eq!(request.config.gpid, response.config.gpid, "on_reply: gpid must match");
                    assert_eq!(
                        request.config.app_type, response.config.app_type,
                        "on_reply: app_type must match"
                    );
                    assert_eq!(
                        request.config.primary, response.config.primary,
                        "on_reply: primary must match"
                    );
                    assert_eq!(
                        request.config.secondaries, response.config.secondaries,
                        "on_reply: secondaries must match"
                    );

                    if request.config_type == ConfigurationType::Remove && request.node != self.self_address {
                        let projected = response.config.project(&request.node, false);
                        self.peer_client.send_remove_replica(&request.node, projected);
                    }
                }

                self.update_configuration(response.config);
            }
        }
    }
}
