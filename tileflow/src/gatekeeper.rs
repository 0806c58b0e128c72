//! Cycle-counted admission gate.

use thiserror::Error;

use crate::valid::Valid;

/// Gatekeeper misuse errors. These are programming-contract violations, fatal to the pass
/// that triggered them; the gate itself stays in a well-defined state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GatekeeperError {
    /// `open` was called while a previous admission window was still active.
    #[error("gatekeeper reopened while still admitting ({remaining} cycles left)")]
    AlreadyOpen {
        /// Cycles left in the active window.
        remaining: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Idle,
    Admitting {
        remaining: usize,
    },
}

/// A gate that admits values from its source for an exact number of consecutive cycles.
///
/// The gate meters cycles, not values: every [`admit`](Gatekeeper::admit) call inside an open
/// window counts against the window, whether or not the cycle carried valid data. Outside a
/// window the gate blocks and emits invalid cycles. `open(0)` is the degenerate no-op pass:
/// the gate stays idle and admits nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gatekeeper {
    state: State,
}

impl Gatekeeper {
    /// Creates a closed gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the gate for exactly `cycles` admission cycles.
    ///
    /// Reopening a gate whose window is still active is a misuse error.
    pub fn open(&mut self, cycles: usize) -> Result<(), GatekeeperError> {
        match self.state {
            State::Admitting { remaining } => Err(GatekeeperError::AlreadyOpen { remaining }),
            State::Idle => {
                if cycles > 0 {
                    log::trace!("gatekeeper open for {cycles} cycles");
                    self.state = State::Admitting { remaining: cycles };
                }
                Ok(())
            }
        }
    }

    /// Advances one cycle: passes `value` through while admitting, blocks otherwise.
    pub fn admit<V: Default>(&mut self, value: Valid<V>) -> Valid<V> {
        match self.state {
            State::Idle => Valid::invalid(),
            State::Admitting { remaining } => {
                self.state = if remaining > 1 { State::Admitting { remaining: remaining - 1 } } else { State::Idle };
                value
            }
        }
    }

    /// Returns `true` while an admission window is active.
    pub fn is_admitting(&self) -> bool {
        matches!(self.state, State::Admitting { .. })
    }

    /// Forces the gate back to idle, discarding any active window.
    pub fn reset(&mut self) {
        self.state = State::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Streams `total` valid cycles through a gate opened for `window` cycles and counts how
    /// many came out valid.
    fn admitted_count(window: usize, total: usize) -> usize {
        let mut gate = Gatekeeper::new();
        gate.open(window).unwrap();
        (0..total).filter(|&i| gate.admit(Valid::valid(i)).valid).count()
    }

    #[test]
    fn admits_exactly_n_cycles() {
        for n in [0, 1, 8, 16] {
            assert_eq!(admitted_count(n, 40), n);
        }
    }

    #[test]
    fn blocks_when_idle() {
        let mut gate = Gatekeeper::new();
        assert!(!gate.admit(Valid::valid(7u32)).valid);
        assert!(!gate.is_admitting());
    }

    #[test]
    fn reopen_while_admitting_is_rejected() {
        let mut gate = Gatekeeper::new();
        gate.open(4).unwrap();
        let _ = gate.admit(Valid::valid(0u32));
        assert_eq!(gate.open(2), Err(GatekeeperError::AlreadyOpen { remaining: 3 }));
    }

    #[test]
    fn reopen_after_expiry_succeeds() {
        let mut gate = Gatekeeper::new();
        gate.open(2).unwrap();
        let _ = gate.admit(Valid::valid(0u32));
        let _ = gate.admit(Valid::valid(1u32));
        assert!(!gate.is_admitting());
        gate.open(1).unwrap();
        assert!(gate.admit(Valid::valid(2u32)).valid);
    }

    #[test]
    fn reset_discards_active_window() {
        let mut gate = Gatekeeper::new();
        gate.open(8).unwrap();
        gate.reset();
        assert!(!gate.is_admitting());
        assert!(!gate.admit(Valid::valid(0u32)).valid);
    }
}
