//! Planning
//!
//! The planner turns the full discovered mutation set into the ordered list
//! of pending mutations. Every mutation is classified against the ledger as
//! one of:
//! - pending: newer than the current state
//! - verified: older, recorded, checksum unchanged
//! - invalid: older but unrecorded, drifted, or blocked by a Failed row
//!
//! Any invalid mutation aborts planning before anything executes.

use crate::coordinator::Coordinator;
use crate::error::MutagenError;
use crate::ledger::{Ledger, MutationStatus};
use crate::mutation::Mutation;
use crate::plan::Plan;
use crate::state::State;

/// Builds plans from a discovered mutation set
#[derive(Debug, Clone)]
pub struct Planner {
    mutations: Vec<Mutation>,
}

impl Planner {
    /// Planner over `mutations`; input order is irrelevant
    #[must_use]
    pub fn new(mutations: impl IntoIterator<Item = Mutation>) -> Self {
        let mut mutations: Vec<Mutation> = mutations.into_iter().collect();
        mutations.sort_by(|a, b| a.state().cmp(b.state()));
        Self { mutations }
    }

    /// All mutations, ascending by state
    #[inline]
    #[must_use]
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Fail if any two mutations share a state
    ///
    /// # Errors
    /// Returns [`MutagenError::DuplicateState`] naming every colliding state once.
    pub fn check_duplicates(&self) -> Result<(), MutagenError> {
        let mut states: Vec<State> = Vec::new();
        for pair in self.mutations.windows(2) {
            let state = pair[0].state();
            if state == pair[1].state() && states.last() != Some(state) {
                states.push(state.clone());
            }
        }

        if states.is_empty() {
            Ok(())
        } else {
            tracing::error!(?states, "mutations share a state");
            Err(MutagenError::DuplicateState { states })
        }
    }

    /// Build the plan of pending mutations
    ///
    /// # Errors
    /// Returns the first planning violation found, or a ledger error.
    pub fn plan<'a>(&self, ledger: &'a Ledger) -> Result<Plan<'a>, MutagenError> {
        self.check_duplicates()?;

        let coordinator = Coordinator::new(ledger);
        let current = coordinator.current_state()?;
        tracing::debug!(%current, "planning against current state");

        let mut pending = Vec::new();
        for mutation in &self.mutations {
            let state = mutation.state();
            let recorded = ledger.get(state)?;

            if let Some(row) = recorded.as_ref().filter(|r| r.status == MutationStatus::Failed) {
                tracing::error!(%state, resource = %row.resource_name, "failed mutation recorded in ledger");
                return Err(MutagenError::FailedPriorMutation {
                    state: state.clone(),
                    resource: mutation.resource_name().to_string(),
                });
            }

            if Coordinator::accept(&current, state) {
                tracing::debug!(%state, "accepting mutation");
                pending.push(mutation.clone());
                continue;
            }

            match recorded {
                None => {
                    return Err(MutagenError::MissingLedgerRecord {
                        state: state.clone(),
                        current,
                    });
                }
                Some(row) if row.checksum != *mutation.checksum() => {
                    return Err(MutagenError::ChecksumMismatch {
                        state: state.clone(),
                        recorded: row.checksum.to_string(),
                        actual: mutation.checksum().to_string(),
                    });
                }
                Some(_) => tracing::debug!(%state, "rejecting already applied mutation"),
            }
        }

        tracing::info!(
            pending = pending.len(),
            discovered = self.mutations.len(),
            "planned mutations"
        );
        Ok(Plan::new(pending, ledger))
    }
}
