//! A single named node in the state machine.

use crate::hooks::EnterExitFn;

/// Computes a state's self-checksum over every attribute except the
/// checksum itself, in declaration order, with fixed-width little-endian
/// encoding. Hooks are excluded — they are behavior, not data, and `Arc<dyn
/// Fn>` has no meaningful byte representation to hash.
fn compute_checksum(id: usize, name: &str, is_final: bool, is_locked: bool, version: u64, last_modified: u64) -> u32 {
    let mut buf = Vec::with_capacity(name.len() + 32);
    buf.extend_from_slice(&(id as u64).to_le_bytes());
    #[allow(clippy::cast_possible_truncation)]
    buf.extend_from_slice(&(name.len() as u32).to_le_bytes());
    buf.extend_from_slice(name.as_bytes());
    buf.push(u8::from(is_final));
    buf.push(u8::from(is_locked));
    buf.extend_from_slice(&version.to_le_bytes());
    buf.extend_from_slice(&last_modified.to_le_bytes());
    plc_hash::rotl5_add(&buf)
}

/// A named node in a [`crate::machine::StateMachine`].
///
/// `Ctx` is the application context type passed to hooks; a machine with no
/// hooks at all can use `Ctx = ()`.
#[derive(Clone)]
pub struct State<Ctx> {
    id: usize,
    name: String,
    on_enter: Option<EnterExitFn<Ctx>>,
    on_exit: Option<EnterExitFn<Ctx>>,
    is_final: bool,
    is_locked: bool,
    version: u64,
    last_modified: u64,
    checksum: u32,
}

impl<Ctx> State<Ctx> {
    pub(crate) fn new(
        id: usize,
        name: String,
        on_enter: Option<EnterExitFn<Ctx>>,
        on_exit: Option<EnterExitFn<Ctx>>,
        is_final: bool,
        now: u64,
    ) -> Self {
        let version = 1;
        let checksum = compute_checksum(id, &name, is_final, false, version, now);
        Self { id, name, on_enter, on_exit, is_final, is_locked: false, version, last_modified: now, checksum }
    }

    /// Stable id assigned at registration; equals the insertion index.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Unique, human-readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The on-enter hook, if any.
    #[must_use]
    pub fn on_enter(&self) -> Option<&EnterExitFn<Ctx>> {
        self.on_enter.as_ref()
    }

    /// The on-exit hook, if any.
    #[must_use]
    pub fn on_exit(&self) -> Option<&EnterExitFn<Ctx>> {
        self.on_exit.as_ref()
    }

    /// A final state has no outgoing transitions.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// A locked state cannot be the source or target of a transition.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.is_locked
    }

    /// Monotonically increasing; bumped on every mutation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Milliseconds since the Unix epoch at the last mutation.
    #[must_use]
    pub fn last_modified(&self) -> u64 {
        self.last_modified
    }

    /// Self-checksum over every attribute but this one.
    #[must_use]
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Recomputes the checksum from current attributes, for integrity
    /// verification. Does not mutate `self` or `self.checksum`.
    #[must_use]
    pub fn recompute_checksum(&self) -> u32 {
        compute_checksum(self.id, &self.name, self.is_final, self.is_locked, self.version, self.last_modified)
    }

    pub(crate) fn set_locked(&mut self, locked: bool, now: u64) {
        self.is_locked = locked;
        self.restamp(now);
    }

    /// Bumps `version`, refreshes `last_modified`, and recomputes
    /// `checksum` — the bookkeeping every mutating engine operation
    /// performs after changing a state's data attributes.
    pub(crate) fn restamp(&mut self, now: u64) {
        self.version += 1;
        self.last_modified = now;
        self.checksum = self.recompute_checksum();
    }

    #[cfg(test)]
    pub(crate) fn tamper_name_for_test(&mut self, new_name: String) {
        self.name = new_name;
    }
}

// Hooks (`Arc<dyn Fn>`) have no `Debug` impl, so this can't be derived.
impl<Ctx> std::fmt::Debug for State<Ctx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("is_final", &self.is_final)
            .field("is_locked", &self.is_locked)
            .field("version", &self.version)
            .field("last_modified", &self.last_modified)
            .field("checksum", &format!("{:#010x}", self.checksum))
            .finish_non_exhaustive()
    }
}

// Hooks are excluded from equality — they're behavior pointers, not data.
impl<Ctx> PartialEq for State<Ctx> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.is_final == other.is_final
            && self.is_locked == other.is_locked
            && self.version == other.version
            && self.last_modified == other.last_modified
            && self.checksum == other.checksum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_has_version_one_and_matching_checksum() {
        let state: State<()> = State::new(0, "init".to_string(), None, None, false, 1_000);
        assert_eq!(state.version(), 1);
        assert_eq!(state.checksum(), state.recompute_checksum());
    }

    #[test]
    fn restamp_bumps_version_and_checksum() {
        let mut state: State<()> = State::new(0, "init".to_string(), None, None, false, 1_000);
        let before = state.checksum();
        state.restamp(2_000);
        assert_eq!(state.version(), 2);
        assert_eq!(state.last_modified(), 2_000);
        assert_ne!(state.checksum(), before);
    }

    #[test]
    fn tampering_breaks_integrity() {
        let mut state: State<()> = State::new(1, "ready".to_string(), None, None, false, 1_000);
        let stored = state.checksum();
        state.tamper_name_for_test("re4dy".to_string());
        assert_ne!(state.recompute_checksum(), stored);
    }
}
