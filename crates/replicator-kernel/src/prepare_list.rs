//! The in-memory window of proposed mutations awaiting commit (§6
//! `prepare_list`).
//!
//! This crate pins only the interface the role state machine needs:
//! `max_decree`, `last_committed_decree`, `get_mutation_by_decree`,
//! `truncate`, `reset`, and `init_prepare` (§1: "the prepare list is a
//! black box that accepts `init_prepare(mutation)`"). The mutation
//! ordering and commit algorithm behind it is out of scope.

use std::collections::BTreeMap;

use replicator_types::Decree;

use crate::mutation::Mutation;

/// Black-box collaborator the role state machine replays against
/// (`replay_prepare_list`) and truncates/resets during role transitions.
pub trait PrepareList {
    /// The highest decree ever prepared, whether or not it has committed.
    fn max_decree(&self) -> Decree;

    /// The highest decree known to be committed.
    fn last_committed_decree(&self) -> Decree;

    /// Returns the mutation prepared at `decree`, if the list still holds one.
    fn get_mutation_by_decree(&self, decree: Decree) -> Option<Mutation>;

    /// Discards every prepared entry at or below `decree`, keeping
    /// `last_committed_decree` at `decree` (§4.D: POTENTIAL_SECONDARY →
    /// SECONDARY truncates to `app.last_committed_decree`).
    fn truncate(&mut self, decree: Decree);

    /// Discards the entire list and resets `last_committed_decree` to
    /// `decree` (§4.D: POTENTIAL_SECONDARY → INACTIVE).
    fn reset(&mut self, decree: Decree);

    /// Accepts a freshly constructed mutation into the list — the
    /// black-box entry point `replay_prepare_list` calls per decree.
    fn init_prepare(&mut self, mutation: Mutation);
}

/// Simple in-memory [`PrepareList`] for tests and the simulation harness.
///
/// Not a production implementation: durability, real commit tracking, and
/// the ordering algorithm itself are out of scope for this crate (§1).
#[derive(Debug, Default)]
pub struct InMemoryPrepareList {
    entries: BTreeMap<i64, Mutation>,
    last_committed_decree: Decree,
}

impl InMemoryPrepareList {
    pub fn new(last_committed_decree: Decree) -> Self {
        Self {
            entries: BTreeMap::new(),
            last_committed_decree,
        }
    }

    /// Marks `decree` as committed, without otherwise touching the list
    /// (test helper: production commit bookkeeping lives outside this crate).
    pub fn advance_commit(&mut self, decree: Decree) {
        if decree > self.last_committed_decree {
            self.last_committed_decree = decree;
        }
    }
}

impl PrepareList for InMemoryPrepareList {
    fn max_decree(&self) -> Decree {
        self.entries
            .keys()
            .next_back()
            .copied()
            .map_or(self.last_committed_decree, Decree::new)
    }

    fn last_committed_decree(&self) -> Decree {
        self.last_committed_decree
    }

    fn get_mutation_by_decree(&self, decree: Decree) -> Option<Mutation> {
        self.entries.get(&decree.as_i64()).cloned()
    }

    fn truncate(&mut self, decree: Decree) {
        replicator_properties::sometimes!(
            self.entries.keys().any(|&d| d > decree.as_i64()),
            "prepare_list_truncate_drops_entries",
            "truncate called with entries still ahead of the truncation point"
        );
        self.entries.retain(|&d, _| d > decree.as_i64());
        self.last_committed_decree = decree;
    }

    fn reset(&mut self, decree: Decree) {
        self.entries.clear();
        self.last_committed_decree = decree;
    }

    fn init_prepare(&mut self, mutation: Mutation) {
        self.entries.insert(mutation.decree.as_i64(), mutation);
    }
}
