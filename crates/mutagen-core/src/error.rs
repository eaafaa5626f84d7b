//! Error types for Mutagen
//!
//! Covers every way a migration run can stop:
//! - Configuration problems (bad tokens, bad resource names, nothing to run)
//! - Planning violations detected before anything executes
//! - Execution faults raised by a mutation
//! - Ledger backend failures

use crate::state::State;

/// Main Mutagen error type
#[derive(Debug, thiserror::Error)]
pub enum MutagenError {
    /// Malformed state token, unparsable resource name, empty discovered set
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Two or more mutations resolve to the same state
    #[error("duplicate mutation states: {}", join_states(states))]
    DuplicateState { states: Vec<State> },

    /// An older mutation was never recorded although the ledger is ahead of it
    #[error(
        "mutation {state} is older than current state {current} but was not recorded in the ledger"
    )]
    MissingLedgerRecord { state: State, current: State },

    /// An already-applied mutation changed since it ran
    #[error("checksum mismatch for applied mutation {state}: recorded {recorded}, found {actual}")]
    ChecksumMismatch {
        state: State,
        recorded: String,
        actual: String,
    },

    /// A Failed ledger row blocks planning until repaired
    #[error("mutation {resource} [state={state}] failed previously; run repair first")]
    FailedPriorMutation { state: State, resource: String },

    /// A mutation's apply step faulted
    #[error("exception executing mutation for state {state}: {cause:#}")]
    MigrationExecution {
        state: State,
        #[source]
        cause: anyhow::Error,
    },

    /// Ledger table missing/uncreatable or backend unreachable
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(#[from] LedgerError),
}

impl MutagenError {
    /// Create configuration error
    #[inline]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Errors raised while building a plan, before any mutation runs
    #[inline]
    #[must_use]
    pub fn is_planning_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateState { .. }
                | Self::MissingLedgerRecord { .. }
                | Self::ChecksumMismatch { .. }
                | Self::FailedPriorMutation { .. }
        )
    }

    /// Errors raised while a plan was executing
    #[inline]
    #[must_use]
    pub fn is_execution_error(&self) -> bool {
        matches!(self, Self::MigrationExecution { .. })
    }

    /// State the error refers to, if it names exactly one
    #[must_use]
    pub fn state(&self) -> Option<&State> {
        match self {
            Self::MissingLedgerRecord { state, .. }
            | Self::ChecksumMismatch { state, .. }
            | Self::FailedPriorMutation { state, .. }
            | Self::MigrationExecution { state, .. } => Some(state),
            _ => None,
        }
    }
}

fn join_states(states: &[State]) -> String {
    states
        .iter()
        .map(State::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Ledger backend errors
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Backend could not be reached or a statement failed
    #[error("backend error: {0}")]
    Backend(String),

    /// A stored row could not be decoded
    #[error("corrupt ledger row for {state}: {reason}")]
    CorruptRow { state: String, reason: String },

    /// Baseline requires an empty ledger
    #[error("ledger is not empty ({rows} rows); clean it before baselining")]
    NotEmpty { rows: usize },

    /// SQLite failure
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
