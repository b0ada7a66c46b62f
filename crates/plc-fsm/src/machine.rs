//! The owning container: states, transitions, current position, and
//! diagnostics.

use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{
    diagnostics::Diagnostics,
    error::FsmError,
    hooks::{ActionFn, EnterExitFn, GuardFn},
    snapshot::StateSnapshot,
    state::State,
    transition::Transition,
};

fn now_millis() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

fn validate_name(name: &str) -> Result<(), FsmError> {
    if name.is_empty() {
        return Err(FsmError::InvalidState { reason: "name must not be empty".to_string() });
    }
    if name.len() > 256 {
        return Err(FsmError::InvalidState { reason: "name exceeds 256 bytes".to_string() });
    }
    if name.as_bytes().contains(&0) {
        return Err(FsmError::InvalidState { reason: "name must not contain a NUL byte".to_string() });
    }
    Ok(())
}

/// A generic, name-driven, integrity-verified state machine.
///
/// `Ctx` is the application context type threaded through hooks and
/// guards; a topology with no hooks can use `Ctx = ()`.
pub struct StateMachine<Ctx> {
    states: Vec<State<Ctx>>,
    transitions: Vec<Transition<Ctx>>,
    current_state_id: usize,
    max_states: usize,
    max_transitions: usize,
    integrity_predicate: Option<Arc<dyn Fn(&State<Ctx>) -> bool + Send + Sync>>,
    diagnostics: Diagnostics,
}

impl<Ctx> StateMachine<Ctx> {
    /// Creates an empty machine with the given state/transition capacity.
    #[must_use]
    pub fn new(max_states: usize, max_transitions: usize) -> Self {
        Self {
            states: Vec::new(),
            transitions: Vec::new(),
            current_state_id: 0,
            max_states,
            max_transitions,
            integrity_predicate: None,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Registers an external integrity predicate, consulted in addition to
    /// the self-checksum by [`Self::verify_state_integrity`].
    #[must_use]
    pub fn with_integrity_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&State<Ctx>) -> bool + Send + Sync + 'static,
    {
        self.integrity_predicate = Some(Arc::new(predicate));
        self
    }

    /// Registers a new state.
    ///
    /// # Errors
    ///
    /// [`FsmError::InvalidState`] if `name` is empty, too long, contains a
    /// NUL byte, or duplicates an existing state's name;
    /// [`FsmError::MaxStatesReached`] at capacity.
    pub fn add_state(
        &mut self,
        name: impl Into<String>,
        on_enter: Option<EnterExitFn<Ctx>>,
        on_exit: Option<EnterExitFn<Ctx>>,
        is_final: bool,
    ) -> Result<usize, FsmError> {
        let name = name.into();
        validate_name(&name)?;
        if self.states.iter().any(|s| s.name() == name) {
            return Err(FsmError::InvalidState { reason: format!("duplicate state name: {name}") });
        }
        if self.states.len() >= self.max_states {
            return Err(FsmError::MaxStatesReached);
        }
        let id = self.states.len();
        self.states.push(State::new(id, name, on_enter, on_exit, is_final, now_millis()));
        Ok(id)
    }

    /// Registers a new transition between two existing states.
    ///
    /// # Errors
    ///
    /// [`FsmError::InvalidState`] if either id is out of range;
    /// [`FsmError::InvalidTransition`] if `from_id`'s state is final, or the
    /// name duplicates an existing transition; [`FsmError::
    /// MaxTransitionsReached`] at capacity.
    pub fn add_transition(
        &mut self,
        name: impl Into<String>,
        from_id: usize,
        to_id: usize,
        action: Option<ActionFn<Ctx>>,
        guard: Option<GuardFn<Ctx>>,
    ) -> Result<(), FsmError> {
        let name = name.into();
        let from = self.states.get(from_id).ok_or_else(|| FsmError::InvalidState {
            reason: format!("from_id {from_id} does not name a state"),
        })?;
        self.states.get(to_id).ok_or_else(|| FsmError::InvalidState {
            reason: format!("to_id {to_id} does not name a state"),
        })?;
        if from.is_final() {
            return Err(FsmError::InvalidTransition {
                reason: format!("state {from_id} ({}) is final and has no outgoing transitions", from.name()),
            });
        }
        if self.transitions.iter().any(|t| t.name() == name) {
            return Err(FsmError::InvalidTransition { reason: format!("duplicate transition name: {name}") });
        }
        if self.transitions.len() >= self.max_transitions {
            return Err(FsmError::MaxTransitionsReached);
        }
        self.transitions.push(Transition::new(name, from_id, to_id, action, guard));
        Ok(())
    }

    /// Looks up a transition by name.
    #[must_use]
    pub fn find_transition_by_name(&self, name: &str) -> Option<&Transition<Ctx>> {
        self.transitions.iter().find(|t| t.name() == name)
    }

    /// Executes the named transition against `ctx`.
    ///
    /// See the module-level documentation of
    /// [`crate`](crate) for the exact precondition order this enforces.
    ///
    /// # Errors
    ///
    /// [`FsmError::InvalidTransition`] if no such transition exists, it is
    /// marked invalid, the current state doesn't match its source, or its
    /// guard rejects the attempt; [`FsmError::StateLocked`] if either
    /// endpoint is locked.
    pub fn execute_transition(&mut self, name: &str, ctx: &mut Ctx) -> Result<(), FsmError> {
        let idx = self
            .transitions
            .iter()
            .position(|t| t.name() == name)
            .ok_or_else(|| FsmError::InvalidTransition { reason: format!("no transition named {name}") })?;
        self.execute_transition_at(idx, ctx)
    }

    /// Convenience wrapper: looks up the first transition whose
    /// `(from, to)` pair matches and executes it by name. Per the
    /// first-inserted-wins semantics of `add_transition`, the earliest
    /// matching edge is used if more than one exists between the same pair.
    ///
    /// # Errors
    ///
    /// Same as [`Self::execute_transition`], plus [`FsmError::
    /// InvalidTransition`] if no transition connects `from_id` to `to_id`.
    pub fn execute_transition_between(&mut self, from_id: usize, to_id: usize, ctx: &mut Ctx) -> Result<(), FsmError> {
        let idx = self
            .transitions
            .iter()
            .position(|t| t.from_state_id() == from_id && t.to_state_id() == to_id)
            .ok_or_else(|| FsmError::InvalidTransition {
                reason: format!("no transition from {from_id} to {to_id}"),
            })?;
        self.execute_transition_at(idx, ctx)
    }

    fn execute_transition_at(&mut self, idx: usize, ctx: &mut Ctx) -> Result<(), FsmError> {
        let transition = &self.transitions[idx];
        if !transition.is_valid() {
            return Err(FsmError::InvalidTransition {
                reason: format!("transition {} is marked invalid", transition.name()),
            });
        }
        let from_id = transition.from_state_id();
        let to_id = transition.to_state_id();

        if self.current_state_id != from_id {
            return Err(FsmError::InvalidTransition {
                reason: format!(
                    "current state {} does not match transition source {from_id}",
                    self.current_state_id
                ),
            });
        }

        if self.states[from_id].is_locked() {
            return Err(FsmError::StateLocked { state: self.states[from_id].name().to_string() });
        }
        if self.states[to_id].is_locked() {
            return Err(FsmError::StateLocked { state: self.states[to_id].name().to_string() });
        }

        if let Some(guard) = self.transitions[idx].guard().cloned()
            && !guard(&self.states[from_id], &self.states[to_id])
        {
            self.diagnostics.increment_failed_transitions();
            return Err(FsmError::InvalidTransition {
                reason: format!("guard rejected transition {}", self.transitions[idx].name()),
            });
        }

        let on_exit = self.states[from_id].on_exit().cloned();
        let action = self.transitions[idx].action().cloned();
        let on_enter = self.states[to_id].on_enter().cloned();

        // A panicking hook must not leave `current_state_id` changed: run
        // hooks before mutating any machine state, and roll back (i.e.
        // never advance) on panic.
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            if let Some(hook) = &on_exit {
                hook(ctx);
            }
            if let Some(hook) = &action {
                hook(ctx);
            }
            if let Some(hook) = &on_enter {
                hook(ctx);
            }
        }));

        if outcome.is_err() {
            self.diagnostics.increment_failed_transitions();
            return Err(FsmError::InvalidTransition {
                reason: "hook panicked during transition; rolled back to source state".to_string(),
            });
        }

        self.current_state_id = to_id;
        self.states[to_id].restamp(now_millis());
        Ok(())
    }

    /// Recomputes state `id`'s checksum (and, if registered, consults the
    /// external integrity predicate) and compares against the stored value.
    ///
    /// # Errors
    ///
    /// [`FsmError::InvalidState`] if `id` is out of range;
    /// [`FsmError::IntegrityCheckFailed`] on mismatch.
    pub fn verify_state_integrity(&mut self, id: usize) -> Result<(), FsmError> {
        let state =
            self.states.get(id).ok_or_else(|| FsmError::InvalidState { reason: format!("no state with id {id}") })?;
        let mut ok = state.recompute_checksum() == state.checksum();
        if ok && let Some(predicate) = &self.integrity_predicate {
            ok = predicate(state);
        }
        self.diagnostics.record_verification(now_millis());
        if ok {
            Ok(())
        } else {
            self.diagnostics.increment_integrity_violations();
            Err(FsmError::IntegrityCheckFailed)
        }
    }

    /// Locks state `id`, blocking it from being the source or target of any
    /// future transition.
    ///
    /// # Errors
    ///
    /// [`FsmError::InvalidState`] if `id` is out of range.
    pub fn lock_state(&mut self, id: usize) -> Result<(), FsmError> {
        let now = now_millis();
        let state =
            self.states.get_mut(id).ok_or_else(|| FsmError::InvalidState { reason: format!("no state with id {id}") })?;
        state.set_locked(true, now);
        Ok(())
    }

    /// Unlocks state `id`.
    ///
    /// # Errors
    ///
    /// [`FsmError::InvalidState`] if `id` is out of range.
    pub fn unlock_state(&mut self, id: usize) -> Result<(), FsmError> {
        let now = now_millis();
        let state =
            self.states.get_mut(id).ok_or_else(|| FsmError::InvalidState { reason: format!("no state with id {id}") })?;
        state.set_locked(false, now);
        Ok(())
    }

    /// Captures a point-in-time snapshot of state `id`.
    ///
    /// # Errors
    ///
    /// [`FsmError::InvalidState`] if `id` is out of range.
    pub fn create_state_snapshot(&self, id: usize) -> Result<StateSnapshot<Ctx>, FsmError> {
        let state =
            self.states.get(id).ok_or_else(|| FsmError::InvalidState { reason: format!("no state with id {id}") })?;
        Ok(StateSnapshot::capture(state, now_millis()))
    }

    /// Restores a state from a previously captured snapshot.
    ///
    /// # Errors
    ///
    /// [`FsmError::InvalidState`] if the snapshot's id is out of range;
    /// [`FsmError::VersionMismatch`] if the live state's version has moved
    /// on since the snapshot was taken (checked first: a lock always bumps
    /// the version when it's taken, so this is what fires for a state
    /// that's been locked since the snapshot);
    /// [`FsmError::StateLocked`] if the live state is locked but the
    /// version still matches the snapshot.
    pub fn restore_state_from_snapshot(&mut self, snapshot: &StateSnapshot<Ctx>) -> Result<(), FsmError> {
        let id = snapshot.state().id();
        let live = self.states.get_mut(id).ok_or_else(|| FsmError::InvalidState {
            reason: format!("no state with id {id}"),
        })?;
        if live.version() != snapshot.state().version() {
            return Err(FsmError::VersionMismatch { expected: snapshot.state().version(), found: live.version() });
        }
        if live.is_locked() {
            return Err(FsmError::StateLocked { state: live.name().to_string() });
        }
        *live = snapshot.state().clone();
        live.restamp(now_millis());
        Ok(())
    }

    /// The current state, or `None` if no states have been registered yet.
    #[must_use]
    pub fn current_state(&self) -> Option<&State<Ctx>> {
        self.states.get(self.current_state_id)
    }

    /// The state with the given id.
    #[must_use]
    pub fn state(&self, id: usize) -> Option<&State<Ctx>> {
        self.states.get(id)
    }

    /// The number of registered states.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Diagnostic counters for this machine.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// A machine-level checksum folding every state's checksum and every
    /// transition's name, recomputed on demand rather than cached — there is
    /// no incremental-update path to keep a cached value consistent with,
    /// so recomputation is the simpler invariant.
    #[must_use]
    pub fn checksum(&self) -> u32 {
        let mut buf = Vec::new();
        for state in &self.states {
            buf.extend_from_slice(&state.checksum().to_le_bytes());
        }
        for transition in &self.transitions {
            buf.extend_from_slice(transition.name().as_bytes());
        }
        plc_hash::rotl5_add(&buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_machine() -> StateMachine<()> {
        let mut machine = StateMachine::new(8, 8);
        machine.add_state("init", None, None, false).unwrap();
        machine.add_state("ready", None, None, false).unwrap();
        machine.add_state("running", None, None, false).unwrap();
        machine.add_state("error", None, None, true).unwrap();
        machine.add_transition("to_ready", 0, 1, None, None).unwrap();
        machine.add_transition("to_running", 1, 2, None, None).unwrap();
        machine.add_transition("to_error", 2, 3, None, None).unwrap();
        machine
    }

    #[test]
    fn fresh_machine_starts_at_state_zero() {
        let machine = linear_machine();
        assert_eq!(machine.current_state().unwrap().name(), "init");
    }

    #[test]
    fn execute_transition_advances_and_bumps_version() {
        let mut machine = linear_machine();
        let pre_version = machine.state(1).unwrap().version();
        machine.execute_transition("to_ready", &mut ()).unwrap();
        assert_eq!(machine.current_state().unwrap().name(), "ready");
        assert_eq!(machine.state(1).unwrap().version(), pre_version + 1);
    }

    #[test]
    fn execute_transition_rejects_wrong_current_state() {
        let mut machine = linear_machine();
        let err = machine.execute_transition("to_running", &mut ()).unwrap_err();
        assert!(matches!(err, FsmError::InvalidTransition { .. }));
        assert_eq!(machine.current_state().unwrap().name(), "init");
    }

    #[test]
    fn execute_transition_between_finds_the_edge() {
        let mut machine = linear_machine();
        machine.execute_transition_between(0, 1, &mut ()).unwrap();
        assert_eq!(machine.current_state().unwrap().name(), "ready");
    }

    #[test]
    fn add_transition_rejects_final_source() {
        let mut machine = linear_machine();
        let err = machine.add_transition("loop", 3, 0, None, None).unwrap_err();
        assert!(matches!(err, FsmError::InvalidTransition { .. }));
    }

    #[test]
    fn add_state_rejects_duplicate_name() {
        let mut machine = linear_machine();
        let err = machine.add_state("init", None, None, false).unwrap_err();
        assert!(matches!(err, FsmError::InvalidState { .. }));
    }

    #[test]
    fn add_state_enforces_capacity() {
        let mut machine = StateMachine::<()>::new(1, 8);
        machine.add_state("only", None, None, false).unwrap();
        let err = machine.add_state("second", None, None, false).unwrap_err();
        assert!(matches!(err, FsmError::MaxStatesReached));
    }

    #[test]
    fn add_transition_enforces_capacity() {
        let mut machine = StateMachine::<()>::new(8, 1);
        machine.add_state("a", None, None, false).unwrap();
        machine.add_state("b", None, None, false).unwrap();
        machine.add_state("c", None, None, false).unwrap();
        machine.add_transition("ab", 0, 1, None, None).unwrap();
        let err = machine.add_transition("bc", 1, 2, None, None).unwrap_err();
        assert!(matches!(err, FsmError::MaxTransitionsReached));
    }

    #[test]
    fn guard_rejection_increments_failed_transitions() {
        let mut machine = StateMachine::<()>::new(8, 8);
        machine.add_state("a", None, None, false).unwrap();
        machine.add_state("b", None, None, false).unwrap();
        let guard: GuardFn<()> = Arc::new(|_from, _to| false);
        machine.add_transition("ab", 0, 1, None, Some(guard)).unwrap();
        let err = machine.execute_transition("ab", &mut ()).unwrap_err();
        assert!(matches!(err, FsmError::InvalidTransition { .. }));
        assert_eq!(machine.diagnostics().failed_transitions(), 1);
    }

    #[test]
    fn panicking_hook_rolls_back_and_counts_as_failed() {
        let mut machine = StateMachine::<()>::new(8, 8);
        machine.add_state("a", None, None, false).unwrap();
        machine.add_state("b", None, None, false).unwrap();
        let action: ActionFn<()> = Arc::new(|_ctx| panic!("boom"));
        machine.add_transition("ab", 0, 1, Some(action), None).unwrap();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            machine.execute_transition("ab", &mut ())
        }));
        let err = result.expect("execute_transition catches the panic itself").unwrap_err();
        assert!(matches!(err, FsmError::InvalidTransition { .. }));
        assert_eq!(machine.current_state().unwrap().name(), "a");
        assert_eq!(machine.diagnostics().failed_transitions(), 1);
    }

    #[test]
    fn locked_state_blocks_transition() {
        let mut machine = linear_machine();
        machine.lock_state(1).unwrap();
        let err = machine.execute_transition("to_ready", &mut ()).unwrap_err();
        assert!(matches!(err, FsmError::StateLocked { .. }));
        machine.unlock_state(1).unwrap();
        machine.execute_transition("to_ready", &mut ()).unwrap();
    }

    #[test]
    fn integrity_tamper_is_detected() {
        // Scenario 5: flip a byte in states[1].name, verify fails.
        let mut machine = linear_machine();
        machine.states[1].tamper_name_for_test("re4dy".to_string());
        let err = machine.verify_state_integrity(1).unwrap_err();
        assert!(matches!(err, FsmError::IntegrityCheckFailed));
        assert_eq!(machine.diagnostics().integrity_violations(), 1);
    }

    #[test]
    fn snapshot_restore_is_noop_without_mutation() {
        let mut machine = linear_machine();
        let snapshot = machine.create_state_snapshot(1).unwrap();
        machine.restore_state_from_snapshot(&snapshot).unwrap();
        assert_eq!(machine.state(1).unwrap().name(), "ready");
    }

    #[test]
    fn snapshot_version_mismatch_after_lock() {
        // Scenario 6: snapshot state 2, lock it (bumps version), restore
        // must reject with VersionMismatch and leave state unchanged.
        let mut machine = linear_machine();
        let snapshot = machine.create_state_snapshot(2).unwrap();
        machine.unlock_state(2).unwrap(); // harmless no-op bump to mimic "already unlocked" start
        let pre_version = machine.state(2).unwrap().version();
        machine.lock_state(2).unwrap();
        let err = machine.restore_state_from_snapshot(&snapshot).unwrap_err();
        assert!(matches!(err, FsmError::VersionMismatch { .. }));
        assert_eq!(machine.state(2).unwrap().version(), pre_version + 1);
    }

    #[test]
    fn restore_rejects_out_of_range_id() {
        let machine_a = linear_machine();
        let mut machine_b = StateMachine::<()>::new(8, 8);
        machine_b.add_state("only", None, None, false).unwrap();
        let snapshot = machine_a.create_state_snapshot(3).unwrap();
        let err = machine_b.restore_state_from_snapshot(&snapshot).unwrap_err();
        assert!(matches!(err, FsmError::InvalidState { .. }));
    }
}
