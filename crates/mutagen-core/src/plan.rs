//! Plan execution
//!
//! A [`Plan`] runs its mutations one at a time, in order, and stops at the
//! first fault. Every attempt is written to the ledger, the failed one
//! included, before the run returns.
//!
//! # Run states
//!
//! `Idle -> Running -> { Success | Halted }`. Halting is terminal for the
//! run: nothing is retried and completed side effects are not rolled back.

use crate::error::MutagenError;
use crate::ledger::{Ledger, LedgerRow, MutationStatus};
use crate::mutation::{Mutation, MutationContext};
use crate::state::State;
use crate::target::Target;
use std::collections::VecDeque;
use std::time::Instant;

/// Ordered pending mutations bound to the ledger they were planned against
#[derive(Debug)]
pub struct Plan<'a> {
    mutations: Vec<Mutation>,
    ledger: &'a Ledger,
}

impl<'a> Plan<'a> {
    #[inline]
    #[must_use]
    pub fn new(mutations: Vec<Mutation>, ledger: &'a Ledger) -> Self {
        Self { mutations, ledger }
    }

    /// Pending mutations, ascending by state
    #[inline]
    #[must_use]
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn ledger(&self) -> &'a Ledger {
        self.ledger
    }

    /// Apply every pending mutation against `target`
    ///
    /// Faults do not surface as `Err`; they halt the run and are reported in
    /// [`MigrationResult::error`].
    #[must_use]
    pub fn execute(self, target: &dyn Target) -> MigrationResult {
        let ledger = self.ledger;
        let mut remaining: VecDeque<Mutation> = self.mutations.into();
        let mut completed = Vec::new();
        let mut last_state = None;
        let mut error = None;

        tracing::info!(pending = remaining.len(), "executing plan");

        while let Some(mutation) = remaining.pop_front() {
            let state = mutation.state().clone();
            let ctx = MutationContext::new(&state, target, ledger);

            let started = Instant::now();
            let outcome = mutation.apply(&ctx);
            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            let status = if outcome.is_ok() {
                MutationStatus::Success
            } else {
                MutationStatus::Failed
            };
            let row = LedgerRow::new(
                state.clone(),
                mutation.resource_name(),
                mutation.checksum().clone(),
                elapsed_ms,
                status,
            );
            let recorded = ledger.record(&row);

            match (outcome, recorded) {
                (Ok(()), Ok(())) => {
                    tracing::info!(%state, resource = %mutation.resource_name(), elapsed_ms, "mutation applied");
                    last_state = Some(state);
                    completed.push(mutation);
                }
                (Ok(()), Err(ledger_err)) => {
                    tracing::error!(%state, error = %ledger_err, "mutation applied but could not be recorded");
                    remaining.push_front(mutation);
                    error = Some(MutagenError::from(ledger_err));
                    break;
                }
                (Err(cause), recorded) => {
                    if let Err(ledger_err) = recorded {
                        tracing::error!(%state, error = %ledger_err, "could not record failed mutation");
                    }
                    tracing::error!(%state, resource = %mutation.resource_name(), elapsed_ms, "mutation failed: {cause:#}");
                    remaining.push_front(mutation);
                    error = Some(MutagenError::MigrationExecution { state, cause });
                    break;
                }
            }
        }

        let result = MigrationResult {
            completed,
            remaining: remaining.into(),
            last_state,
            error,
        };
        if result.is_complete() {
            tracing::info!(completed = result.completed.len(), "migration finished");
        } else {
            tracing::error!(
                completed = result.completed.len(),
                remaining = result.remaining.len(),
                "migration aborted"
            );
        }
        result
    }
}

/// Outcome of executing one plan
#[derive(Debug)]
pub struct MigrationResult {
    completed: Vec<Mutation>,
    remaining: Vec<Mutation>,
    last_state: Option<State>,
    error: Option<MutagenError>,
}

impl MigrationResult {
    /// Result of a plan with nothing to do
    #[must_use]
    pub fn empty() -> Self {
        Self {
            completed: Vec::new(),
            remaining: Vec::new(),
            last_state: None,
            error: None,
        }
    }

    /// Mutations applied and recorded, in order
    #[inline]
    #[must_use]
    pub fn completed(&self) -> &[Mutation] {
        &self.completed
    }

    /// Mutations not applied, starting with the one that halted the run
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> &[Mutation] {
        &self.remaining
    }

    /// State of the last mutation that completed
    #[inline]
    #[must_use]
    pub fn last_state(&self) -> Option<&State> {
        self.last_state.as_ref()
    }

    /// Terminal error, if the run halted
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&MutagenError> {
        self.error.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Convert into `Err` when the run halted
    ///
    /// # Errors
    /// Returns the terminal error of a halted run.
    pub fn into_result(self) -> Result<Self, MutagenError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}
