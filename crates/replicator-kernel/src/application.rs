//! The application/state-machine mutations are applied to (§6 `app`).
//!
//! Only the two accessors the role state machine reads during transitions
//! are pinned here; the application itself (whatever domain state it
//! holds) is out of scope (§1 Non-goals).

use replicator_types::Decree;

/// Black-box collaborator exposing commit/durability progress.
pub trait Application {
    /// Highest decree whose mutation has been applied.
    fn last_committed_decree(&self) -> Decree;

    /// Highest decree durable on stable storage (may lag
    /// `last_committed_decree`).
    fn last_durable_decree(&self) -> Decree;
}

/// In-memory [`Application`] double for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct InMemoryApplication {
    last_committed_decree: Decree,
    last_durable_decree: Decree,
}

impl InMemoryApplication {
    pub fn new(last_committed_decree: Decree, last_durable_decree: Decree) -> Self {
        Self {
            last_committed_decree,
            last_durable_decree,
        }
    }

    pub fn set_last_committed_decree(&mut self, decree: Decree) {
        self.last_committed_decree = decree;
    }
}

impl Application for InMemoryApplication {
    fn last_committed_decree(&self) -> Decree {
        self.last_committed_decree
    }

    fn last_durable_decree(&self) -> Decree {
        self.last_durable_decree
    }
}
