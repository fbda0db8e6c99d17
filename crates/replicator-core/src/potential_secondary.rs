//! This replica's own substate while its role is `POTENTIAL_SECONDARY`
//! (§6 `potential_secondary_states`).
//!
//! Distinct from `PrimaryState::learners`: that map tracks *other* nodes a
//! primary is shipping state to; this tracks whether *this* replica itself
//! is still mid-handshake as a learner, which is what makes the
//! `POTENTIAL_SECONDARY → {ERROR, INACTIVE}` forbidden-transition guard
//! (§4.D) able to refuse.

use crate::host::CancelHandle;

/// Whether this replica is still mid-learner-handshake, and the handle to
/// cancel if it is torn down.
#[derive(Debug, Default)]
pub struct PotentialSecondaryState {
    learning: bool,
    timeout_task: Option<Box<dyn CancelHandle>>,
}

impl PotentialSecondaryState {
    /// Marks the learner handshake as started, recording the timeout task
    /// (if any) `cleanup` should cancel when it later tears this down.
    pub fn start_learning(&mut self, timeout_task: Option<Box<dyn CancelHandle>>) {
        self.learning = true;
        self.timeout_task = timeout_task;
    }

    pub fn is_learning(&self) -> bool {
        self.learning
    }

    /// Attempts to tear down this substate.
    ///
    /// Refuses (returns `false`, leaving state untouched) while still
    /// learning and `force` is `false` — this is the refusal §4.D's
    /// forbidden-transition guard checks. Otherwise cancels the timeout
    /// task, clears the learning flag, and returns `true`.
    pub fn cleanup(&mut self, force: bool) -> bool {
        if self.learning && !force {
            return false;
        }
        if let Some(task) = self.timeout_task.take() {
            task.cancel();
        }
        self.learning = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct RecordingHandle(std::rc::Rc<std::cell::Cell<u32>>);
    impl CancelHandle for RecordingHandle {
        fn cancel(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn cleanup_refuses_while_learning_and_not_forced() {
        let mut state = PotentialSecondaryState::default();
        state.start_learning(None);
        assert!(!state.cleanup(false));
        assert!(state.is_learning());
    }

    #[test]
    fn cleanup_forced_tears_down_and_cancels_timeout() {
        let cancelled = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut state = PotentialSecondaryState::default();
        state.start_learning(Some(Box::new(RecordingHandle(cancelled.clone()))));

        assert!(state.cleanup(true));
        assert!(!state.is_learning());
        assert_eq!(cancelled.get(), 1);
    }

    #[test]
    fn cleanup_succeeds_when_not_learning() {
        let mut state = PotentialSecondaryState::default();
        assert!(state.cleanup(false));
    }
}
