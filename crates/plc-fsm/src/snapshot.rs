//! Point-in-time captures of a single state.

use crate::state::State;

/// An immutable copy of one [`State`], plus the time it was captured.
///
/// `checksum` is frozen at capture time (equal to `state.checksum()` then);
/// it exists as its own field, separate from `state`, so a caller can
/// verify a snapshot wasn't corrupted in transit/storage without needing to
/// reach into `state` first.
#[derive(Debug, Clone)]
pub struct StateSnapshot<Ctx> {
    state: State<Ctx>,
    captured_at: u64,
    checksum: u32,
}

impl<Ctx> StateSnapshot<Ctx> {
    pub(crate) fn capture(state: &State<Ctx>, now: u64) -> Self {
        Self { state: state.clone(), captured_at: now, checksum: state.checksum() }
    }

    /// The captured state, as it was at capture time.
    #[must_use]
    pub fn state(&self) -> &State<Ctx> {
        &self.state
    }

    /// Milliseconds since the Unix epoch when this snapshot was taken.
    #[must_use]
    pub fn captured_at(&self) -> u64 {
        self.captured_at
    }

    /// The state's checksum at capture time.
    #[must_use]
    pub fn checksum(&self) -> u32 {
        self.checksum
    }
}
