//! Acceptance policy
//!
//! The coordinator only answers "is this state newer than the ledger?". The
//! planner verifies presence and checksums of older states itself.

use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::state::State;

/// Compares candidate states against the ledger's current state
#[derive(Debug, Clone, Copy)]
pub struct Coordinator<'a> {
    ledger: &'a Ledger,
}

impl<'a> Coordinator<'a> {
    #[inline]
    #[must_use]
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }

    /// `target > current`, compared as plain strings
    #[inline]
    #[must_use]
    pub fn accept(current: &State, target: &State) -> bool {
        target > current
    }

    /// Current state of the ledger
    ///
    /// # Errors
    /// Returns an error when the ledger cannot be read.
    #[inline]
    pub fn current_state(&self) -> Result<State, LedgerError> {
        self.ledger.current_state()
    }

    /// Whether `target` is newer than the ledger's current state
    ///
    /// # Errors
    /// Returns an error when the ledger cannot be read.
    pub fn accepts(&self, target: &State) -> Result<bool, LedgerError> {
        Ok(Self::accept(&self.current_state()?, target))
    }

    #[inline]
    #[must_use]
    pub fn ledger(&self) -> &'a Ledger {
        self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::Checksum;
    use crate::ledger::{LedgerRow, MemoryLedger, MutationStatus};

    fn state(token: &str) -> State {
        State::parse(token).unwrap()
    }

    #[test]
    fn accept_is_strictly_greater() {
        let current = state("201502011200");
        assert!(Coordinator::accept(&current, &state("201502011210")));
        assert!(!Coordinator::accept(&current, &state("201502011200")));
        assert!(!Coordinator::accept(&current, &state("201502011159")));
    }

    #[test]
    fn accepts_everything_on_empty_ledger() {
        let ledger = Ledger::in_memory();
        let coordinator = Coordinator::new(&ledger);
        assert!(coordinator.accepts(&state("000000000001")).unwrap());
    }

    #[test]
    fn accepts_against_recorded_state() {
        let ledger = Ledger::new(MemoryLedger::with_rows([LedgerRow::new(
            state("201502011200"),
            "M201502011200_Init_1.sql",
            Checksum::compute(b"x"),
            0,
            MutationStatus::Success,
        )]));
        let coordinator = Coordinator::new(&ledger);
        assert!(!coordinator.accepts(&state("201502011200")).unwrap());
        assert!(coordinator.accepts(&state("201502011210")).unwrap());
    }
}
