//! # replicator-kernel: black-box collaborator traits for the role state machine
//!
//! The role state machine in `replicator-core` drives several neighboring
//! subsystems that this specification deliberately treats as external
//! collaborators (§1 Non-goals, §6 External Interfaces): the mutation
//! prepare list, the application/state-machine the mutations are applied
//! to, and the wall clock used to stamp configuration-change times.
//!
//! This crate pins those collaborators at the trait boundary only. It does
//! not implement the mutation ordering algorithm, durability, or any real
//! clock source beyond [`SystemClock`] — those are out of scope (§1). An
//! [`InMemoryPrepareList`] and [`InMemoryApplication`] are provided for
//! tests and the `replicator-sim` scenario harness.

pub mod application;
pub mod clock;
pub mod mutation;
pub mod prepare_list;

pub use application::{Application, InMemoryApplication};
pub use clock::{Clock, SystemClock};
pub use mutation::Mutation;
pub use prepare_list::{InMemoryPrepareList, PrepareList};
