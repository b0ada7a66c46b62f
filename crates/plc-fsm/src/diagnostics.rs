//! Monotonic counters tracking a machine's transition and integrity
//! history.

/// Diagnostic counters for a [`crate::machine::StateMachine`].
///
/// Every field only ever increases (or, for `last_verification`, moves
/// forward in time) over the life of the machine.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    failed_transitions: u64,
    integrity_violations: u64,
    last_verification: Option<u64>,
}

impl Diagnostics {
    /// Number of `execute_transition` calls that failed a precondition,
    /// rejected by a guard, or rolled back after a hook panic.
    #[must_use]
    pub fn failed_transitions(&self) -> u64 {
        self.failed_transitions
    }

    /// Number of `verify_state_integrity` calls that found a mismatch.
    #[must_use]
    pub fn integrity_violations(&self) -> u64 {
        self.integrity_violations
    }

    /// Milliseconds since the Unix epoch of the last
    /// `verify_state_integrity` call, if any has run.
    #[must_use]
    pub fn last_verification(&self) -> Option<u64> {
        self.last_verification
    }

    pub(crate) fn increment_failed_transitions(&mut self) {
        self.failed_transitions += 1;
    }

    pub(crate) fn increment_integrity_violations(&mut self) {
        self.integrity_violations += 1;
    }

    pub(crate) fn record_verification(&mut self, now: u64) {
        self.last_verification = Some(now);
    }
}
