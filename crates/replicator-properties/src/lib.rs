//! Antithesis-style `ALWAYS!`/`SOMETIMES!`/`NEVER!` property annotations.
//!
//! These macros mark invariants *at the call site that must uphold them*
//! without changing control flow: a violated `always!` does not panic (the
//! surrounding code is expected to enforce the invariant itself, typically
//! with `assert!`), it only records that the property was checked and
//! whether it held. A simulation or fuzzing harness can later drain the
//! recorded events and turn them into coverage signals — "did we ever
//! reach this `sometimes!`?", "did this `always!` hold on every
//! evaluation?", "did this `never!` ever fire?".
//!
//! Without the `sim` feature the macros still evaluate their condition
//! (so a property that silently stops compiling isn't a false `always!`
//! pass) but record nothing; this keeps the annotations cheap enough to
//! leave in the hot path of production builds.

#[cfg(feature = "sim")]
use std::cell::RefCell;

/// The kind of property a recorded [`PropertyEvent`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// Must hold on every evaluation.
    Always,
    /// Should hold on at least one evaluation (reachability / coverage).
    Sometimes,
    /// Must never hold on any evaluation.
    Never,
}

/// A single recorded evaluation of a named property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEvent {
    pub kind: PropertyKind,
    pub name: &'static str,
    pub details: String,
    pub condition_held: bool,
}

#[cfg(feature = "sim")]
thread_local! {
    static REGISTRY: RefCell<Vec<PropertyEvent>> = const { RefCell::new(Vec::new()) };
}

/// Records a property event in the thread-local registry (`sim` feature only).
#[cfg(feature = "sim")]
pub fn record(event: PropertyEvent) {
    REGISTRY.with(|r| r.borrow_mut().push(event));
}

#[cfg(not(feature = "sim"))]
pub fn record(_event: PropertyEvent) {}

/// Drains all property events recorded on the current thread so far.
///
/// Only meaningful with the `sim` feature; otherwise always empty.
pub fn drain_events() -> Vec<PropertyEvent> {
    #[cfg(feature = "sim")]
    {
        REGISTRY.with(|r| std::mem::take(&mut *r.borrow_mut()))
    }
    #[cfg(not(feature = "sim"))]
    {
        Vec::new()
    }
}

/// Returns true if every recorded `Always` event with the given name held.
///
/// Only meaningful with the `sim` feature.
pub fn always_held(name: &str, events: &[PropertyEvent]) -> bool {
    events
        .iter()
        .filter(|e| e.kind == PropertyKind::Always && e.name == name)
        .all(|e| e.condition_held)
}

/// Returns true if at least one recorded `Sometimes` event with the given name held.
///
/// Only meaningful with the `sim` feature.
pub fn sometimes_hit(name: &str, events: &[PropertyEvent]) -> bool {
    events
        .iter()
        .any(|e| e.kind == PropertyKind::Sometimes && e.name == name && e.condition_held)
}

/// Marks a condition that must hold on every evaluation.
#[macro_export]
macro_rules! always {
    ($cond:expr, $name:literal, $details:expr) => {{
        let __held: bool = $cond;
        $crate::record($crate::PropertyEvent {
            kind: $crate::PropertyKind::Always,
            name: $name,
            details: ($details).to_string(),
            condition_held: __held,
        });
        __held
    }};
}

/// Marks a condition that is interesting to observe at least once (coverage).
#[macro_export]
macro_rules! sometimes {
    ($cond:expr, $name:literal, $details:expr) => {{
        let __held: bool = $cond;
        $crate::record($crate::PropertyEvent {
            kind: $crate::PropertyKind::Sometimes,
            name: $name,
            details: ($details).to_string(),
            condition_held: __held,
        });
        __held
    }};
}

/// Marks a condition that must never hold.
#[macro_export]
macro_rules! never {
    ($cond:expr, $name:literal, $details:expr) => {{
        let __held: bool = $cond;
        $crate::record($crate::PropertyEvent {
            kind: $crate::PropertyKind::Never,
            name: $name,
            details: ($details).to_string(),
            condition_held: __held,
        });
        __held
    }};
}
