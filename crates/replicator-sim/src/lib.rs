//! # replicator-sim: deterministic meta-server test double and scenario harness
//!
//! `replicator-core` treats the meta-server as an RPC boundary: a replica
//! fires a reconfiguration request and waits, possibly retrying, for a
//! reply that is delivered back through [`replicator_core::Replica::on_reply`]
//! by whatever runtime observed it (§5 "Suspension points: none internal").
//! In production that runtime is a real RPC client and an executor; here it
//! is this crate.
//!
//! This is the synchronous, deterministic meta-server double the
//! specification's Design Notes ask for (§9: "The commented-out
//! `SM_Simulation` branch suggests a deterministic test harness was once
//! in-tree... an implementer may ship a test double that fulfills the
//! meta-server contract synchronously"). [`SyncMetaServer`] records every
//! request a replica sends and resolves it from a scripted queue of
//! replies (or a default "the meta-server always agrees" responder);
//! [`SimHarness`] wires one up to a fresh [`replicator_core::Replica`]
//! alongside minimal host/liveness/peer-client doubles and drains the
//! request/reply loop for the caller in one step.
//!
//! Downstream consumers — `#[test]` functions in this crate, a future
//! property-based fuzzer, or another crate entirely — depend on this one
//! for the harness rather than reimplementing the wiring `replicator-core`'s
//! own internal tests use (which stays private, since `replicator-core`
//! cannot depend on `replicator-sim` without a cycle).

pub mod doubles;
pub mod harness;
pub mod scenarios;
pub mod sync_meta_server;

pub use doubles::{ControllableLiveness, RecordingHost, RecordingPeerClient};
pub use harness::SimHarness;
pub use sync_meta_server::{ScriptedReply, SyncMetaServer};
