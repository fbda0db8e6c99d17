//! The opaque unit the prepare list orders and the role state machine
//! replays (§4.D `replay_prepare_list`).
//!
//! The mutation ordering algorithm itself is out of scope (§1 Non-goals):
//! this crate only needs enough structure to let `replay_prepare_list`
//! carry a decree's `updates`/`client_requests` across into a freshly
//! constructed placeholder mutation for a gap in the prepare list.

use bytes::Bytes;
use replicator_types::Decree;
use serde::{Deserialize, Serialize};

/// A single proposed write at a given decree.
///
/// `updates` and `client_requests` are opaque payloads: the write-ahead log
/// encoding and the mutation ordering algorithm are both external
/// collaborators this crate does not define (§1).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Mutation {
    pub decree: Decree,
    pub updates: Vec<Bytes>,
    pub client_requests: Vec<Bytes>,
}

impl Mutation {
    /// An empty mutation for a decree the prepare list has no record of —
    /// the "placeholder for a gap" §4.D's `replay_prepare_list` emits.
    pub fn empty(decree: Decree) -> Self {
        Self {
            decree,
            updates: Vec::new(),
            client_requests: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.client_requests.is_empty()
    }
}
