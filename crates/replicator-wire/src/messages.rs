//! Wire messages exchanged between a replica and the meta-server, and the
//! `Encode`/`Decode` impls for the `replicator-types` values they embed.

use replicator_types::{
    Ballot, ConfigurationType, Decree, Endpoint, ErrorCode, Gpid, PartitionConfiguration,
    ReplicaConfiguration, Status,
};

use crate::codec::{BinaryReader, BinaryWriter, Decode, Encode};
use crate::error::WireError;

impl Encode for Ballot {
    fn encode(&self, writer: &mut BinaryWriter) {
        writer.write_u64(self.as_u64());
    }
}
impl Decode for Ballot {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, WireError> {
        Ok(Ballot::new(reader.read_u64()?))
    }
}

impl Encode for Decree {
    fn encode(&self, writer: &mut BinaryWriter) {
        writer.write_i64(self.as_i64());
    }
}
impl Decode for Decree {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, WireError> {
        Ok(Decree::new(reader.read_i64()?))
    }
}

impl Encode for Gpid {
    fn encode(&self, writer: &mut BinaryWriter) {
        writer.write_i32(self.app_id);
        writer.write_i32(self.partition_index);
    }
}
impl Decode for Gpid {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, WireError> {
        Ok(Gpid::new(reader.read_i32()?, reader.read_i32()?))
    }
}

impl Encode for Endpoint {
    fn encode(&self, writer: &mut BinaryWriter) {
        writer.write_str(&self.host);
        writer.write_u16(self.port);
    }
}
impl Decode for Endpoint {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, WireError> {
        let host = reader.read_str()?;
        let port = reader.read_u16()?;
        Ok(Endpoint::new(host, port))
    }
}

impl Encode for Status {
    fn encode(&self, writer: &mut BinaryWriter) {
        let tag: u32 = match self {
            Status::Primary => 0,
            Status::Secondary => 1,
            Status::PotentialSecondary => 2,
            Status::Inactive => 3,
            Status::Error => 4,
        };
        writer.write_u32(tag);
    }
}
impl Decode for Status {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, WireError> {
        let tag = reader.read_u32()?;
        match tag {
            0 => Ok(Status::Primary),
            1 => Ok(Status::Secondary),
            2 => Ok(Status::PotentialSecondary),
            3 => Ok(Status::Inactive),
            4 => Ok(Status::Error),
            discriminant => Err(WireError::InvalidDiscriminant {
                type_name: "Status",
                discriminant,
            }),
        }
    }
}

impl Encode for ConfigurationType {
    fn encode(&self, writer: &mut BinaryWriter) {
        let tag: u32 = match self {
            ConfigurationType::AssignPrimary => 0,
            ConfigurationType::AddSecondary => 1,
            ConfigurationType::UpgradeToSecondary => 2,
            ConfigurationType::DowngradeToSecondary => 3,
            ConfigurationType::DowngradeToInactive => 4,
            ConfigurationType::Remove => 5,
        };
        writer.write_u32(tag);
    }
}
impl Decode for ConfigurationType {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, WireError> {
        let tag = reader.read_u32()?;
        match tag {
            0 => Ok(ConfigurationType::AssignPrimary),
            1 => Ok(ConfigurationType::AddSecondary),
            2 => Ok(ConfigurationType::UpgradeToSecondary),
            3 => Ok(ConfigurationType::DowngradeToSecondary),
            4 => Ok(ConfigurationType::DowngradeToInactive),
            5 => Ok(ConfigurationType::Remove),
            discriminant => Err(WireError::InvalidDiscriminant {
                type_name: "ConfigurationType",
                discriminant,
            }),
        }
    }
}

impl Encode for ErrorCode {
    fn encode(&self, writer: &mut BinaryWriter) {
        let tag: u32 = match self {
            ErrorCode::Success => 0,
            ErrorCode::Timeout => 1,
            ErrorCode::ObjectNotFound => 2,
            ErrorCode::InvalidState => 3,
            ErrorCode::Busy => 4,
            ErrorCode::Unknown => 5,
        };
        writer.write_u32(tag);
    }
}
impl Decode for ErrorCode {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, WireError> {
        let tag = reader.read_u32()?;
        match tag {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Timeout),
            2 => Ok(ErrorCode::ObjectNotFound),
            3 => Ok(ErrorCode::InvalidState),
            4 => Ok(ErrorCode::Busy),
            5 => Ok(ErrorCode::Unknown),
            discriminant => Err(WireError::InvalidDiscriminant {
                type_name: "ErrorCode",
                discriminant,
            }),
        }
    }
}

impl Encode for PartitionConfiguration {
    fn encode(&self, writer: &mut BinaryWriter) {
        self.gpid.encode(writer);
        writer.write_str(&self.app_type);
        self.ballot.encode(writer);
        self.primary.encode(writer);
        writer.write_vec(&self.secondaries);
        writer.write_vec(&self.drop_outs);
        self.last_committed_decree.encode(writer);
    }
}
impl Decode for PartitionConfiguration {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, WireError> {
        Ok(PartitionConfiguration {
            gpid: Gpid::decode(reader)?,
            app_type: reader.read_str()?,
            ballot: Ballot::decode(reader)?,
            primary: Endpoint::decode(reader)?,
            secondaries: reader.read_vec()?,
            drop_outs: reader.read_vec()?,
            last_committed_decree: Decree::decode(reader)?,
        })
    }
}

impl Encode for ReplicaConfiguration {
    fn encode(&self, writer: &mut BinaryWriter) {
        self.gpid.encode(writer);
        self.ballot.encode(writer);
        self.status.encode(writer);
    }
}
impl Decode for ReplicaConfiguration {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, WireError> {
        Ok(ReplicaConfiguration {
            gpid: Gpid::decode(reader)?,
            ballot: Ballot::decode(reader)?,
            status: Status::decode(reader)?,
        })
    }
}

/// A meta-server's proposal, or a replica's self-driven request, to change a
/// partition's configuration (`CT_*` variants of [`ConfigurationType`]).
///
/// Mirrors the `configuration_update_request` wire struct: the node the
/// proposal concerns, the proposed type, and the configuration the sender
/// believes is current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationUpdateRequest {
    pub config_type: ConfigurationType,
    pub node: Endpoint,
    pub config: PartitionConfiguration,
}

impl Encode for ConfigurationUpdateRequest {
    fn encode(&self, writer: &mut BinaryWriter) {
        self.config_type.encode(writer);
        self.node.encode(writer);
        self.config.encode(writer);
    }
}
impl Decode for ConfigurationUpdateRequest {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, WireError> {
        Ok(ConfigurationUpdateRequest {
            config_type: ConfigurationType::decode(reader)?,
            node: Endpoint::decode(reader)?,
            config: PartitionConfiguration::decode(reader)?,
        })
    }
}

/// The meta-server's reply to a [`ConfigurationUpdateRequest`].
///
/// `err` reflects whether the meta-server *applied* the request; `config`
/// is always populated with the meta-server's view of the partition,
/// whether or not `err == Success` — a replica applies it unconditionally
/// once the RPC itself completes, per the role state machine's
/// `on_configuration_sync`-style handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationUpdateResponse {
    pub err: ErrorCode,
    pub config: PartitionConfiguration,
}

impl Encode for ConfigurationUpdateResponse {
    fn encode(&self, writer: &mut BinaryWriter) {
        self.err.encode(writer);
        self.config.encode(writer);
    }
}
impl Decode for ConfigurationUpdateResponse {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, WireError> {
        Ok(ConfigurationUpdateResponse {
            err: ErrorCode::decode(reader)?,
            config: PartitionConfiguration::decode(reader)?,
        })
    }
}

/// A primary's request that a potential secondary catch up to a given
/// decree, sent when a learner is added and periodically thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCheckRequest {
    pub app_type: String,
    pub node: Endpoint,
    pub config: PartitionConfiguration,
    pub last_committed_decree: Decree,
    /// Random token identifying this learning session, so a primary can
    /// distinguish replies from a stale learner attempt after it restarts
    /// the learner's state (re-grounded as `RemoteLearnerState::signature`).
    pub learner_signature: u64,
}

impl Encode for GroupCheckRequest {
    fn encode(&self, writer: &mut BinaryWriter) {
        writer.write_str(&self.app_type);
        self.node.encode(writer);
        self.config.encode(writer);
        self.last_committed_decree.encode(writer);
        writer.write_u64(self.learner_signature);
    }
}
impl Decode for GroupCheckRequest {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, WireError> {
        Ok(GroupCheckRequest {
            app_type: reader.read_str()?,
            node: Endpoint::decode(reader)?,
            config: PartitionConfiguration::decode(reader)?,
            last_committed_decree: Decree::decode(reader)?,
            learner_signature: reader.read_u64()?,
        })
    }
}
