//! A directed, named edge between two states.

use crate::hooks::{ActionFn, GuardFn};

/// A named edge from one state to another.
///
/// `from_state_id`/`to_state_id` are immutable once added; only `is_valid`
/// can later be toggled (the engine itself never does this, but it is part
/// of the data model so a caller-defined policy can disable an edge without
/// removing it).
#[derive(Clone)]
pub struct Transition<Ctx> {
    name: String,
    from_state_id: usize,
    to_state_id: usize,
    action: Option<ActionFn<Ctx>>,
    guard: Option<GuardFn<Ctx>>,
    is_valid: bool,
}

impl<Ctx> Transition<Ctx> {
    pub(crate) fn new(
        name: String,
        from_state_id: usize,
        to_state_id: usize,
        action: Option<ActionFn<Ctx>>,
        guard: Option<GuardFn<Ctx>>,
    ) -> Self {
        Self { name, from_state_id, to_state_id, action, guard, is_valid: true }
    }

    /// Unique name within the owning machine.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source state id. Immutable after construction.
    #[must_use]
    pub fn from_state_id(&self) -> usize {
        self.from_state_id
    }

    /// Target state id. Immutable after construction.
    #[must_use]
    pub fn to_state_id(&self) -> usize {
        self.to_state_id
    }

    /// The action hook, if any.
    #[must_use]
    pub fn action(&self) -> Option<&ActionFn<Ctx>> {
        self.action.as_ref()
    }

    /// The guard predicate, if any.
    #[must_use]
    pub fn guard(&self) -> Option<&GuardFn<Ctx>> {
        self.guard.as_ref()
    }

    /// Whether this edge is currently eligible to execute.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }
}

impl<Ctx> std::fmt::Debug for Transition<Ctx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("name", &self.name)
            .field("from_state_id", &self.from_state_id)
            .field("to_state_id", &self.to_state_id)
            .field("is_valid", &self.is_valid)
            .field("has_action", &self.action.is_some())
            .field("has_guard", &self.guard.is_some())
            .finish_non_exhaustive()
    }
}
