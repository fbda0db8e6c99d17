//! # replicator-wire: length-prefixed binary wire codec and reconfiguration messages
//!
//! This crate provides the concrete wire format the distilled spec leaves
//! unspecified (§9 Design Notes: "any length-prefixed binary encoding
//! suffices"). It has two halves:
//! - [`codec`]: a little-endian `BinaryWriter`/`BinaryReader` pair with a
//!   `Placeholder` API for back-patched length fields.
//! - [`messages`]: the `Encode`/`Decode` impls for `replicator-types`
//!   values, plus the request/response/group-check structs exchanged
//!   between a replica and the meta-server (§6).

pub mod codec;
pub mod error;
pub mod messages;

pub use codec::{BinaryReader, BinaryWriter, Decode, Encode, Placeholder, MAX_PREFIXED_LEN};
pub use error::WireError;
pub use messages::{
    ConfigurationUpdateRequest, ConfigurationUpdateResponse, GroupCheckRequest,
};
