//! Version ledger
//!
//! The ledger is the persisted record of every attempted mutation. Rows are
//! written by the executor (`Success`/`Failed`) and by baseline
//! (`Baseline`/`BeforeBaseline`), and removed only by repair. Nothing is
//! updated in place.
//!
//! Storage is pluggable through [`LedgerBackend`]; [`Ledger`] layers the
//! queries the planner and executor need on top of the raw primitives.

use crate::checksum::Checksum;
use crate::error::LedgerError;
use crate::state::State;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Outcome recorded for a state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationStatus {
    /// Applied without error
    Success,
    /// Apply raised a fault
    Failed,
    /// The state a pre-existing system was adopted at
    Baseline,
    /// Older than the baseline; recorded but never verified
    BeforeBaseline,
}

impl MutationStatus {
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Failed => "Failed",
            Self::Baseline => "Baseline",
            Self::BeforeBaseline => "BeforeBaseline",
        }
    }

    /// Whether the row counts toward the current state
    #[inline]
    #[must_use]
    pub const fn is_applied(self) -> bool {
        !matches!(self, Self::Failed)
    }
}

impl Display for MutationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MutationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Success" => Ok(Self::Success),
            "Failed" => Ok(Self::Failed),
            "Baseline" => Ok(Self::Baseline),
            // "<Baseline" is the spelling older ledgers used
            "BeforeBaseline" | "<Baseline" => Ok(Self::BeforeBaseline),
            other => Err(format!("unknown mutation status \"{other}\"")),
        }
    }
}

/// One attempted state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub state: State,
    pub resource_name: String,
    pub checksum: Checksum,
    pub executed_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub status: MutationStatus,
}

impl LedgerRow {
    /// Row stamped with the current time
    #[must_use]
    pub fn new(
        state: State,
        resource_name: impl Into<String>,
        checksum: Checksum,
        elapsed_ms: u64,
        status: MutationStatus,
    ) -> Self {
        Self {
            state,
            resource_name: resource_name.into(),
            checksum,
            executed_at: Utc::now(),
            elapsed_ms,
            status,
        }
    }
}

/// Storage primitives over the ledger table
///
/// Implementations must make `insert` of an existing state replace the row.
/// No primitive is conditional: two processes writing the same ledger race.
pub trait LedgerBackend: Send + Sync {
    /// Create the table if it does not exist
    fn ensure_table(&self) -> Result<(), LedgerError>;

    /// Whether the table exists
    fn table_exists(&self) -> Result<bool, LedgerError>;

    /// Drop the table and everything in it
    fn drop_table(&self) -> Result<(), LedgerError>;

    /// Point lookup by state
    fn get(&self, state: &State) -> Result<Option<LedgerRow>, LedgerError>;

    /// Insert (or replace) a row
    fn insert(&self, row: &LedgerRow) -> Result<(), LedgerError>;

    /// Delete the row for a state, if any
    fn delete(&self, state: &State) -> Result<(), LedgerError>;

    /// Every row, in no particular order
    fn scan(&self) -> Result<Vec<LedgerRow>, LedgerError>;
}

/// In-process backend
///
/// `None` models a missing table so lazy creation behaves like a real store.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    table: Mutex<Option<BTreeMap<State, LedgerRow>>>,
}

impl MemoryLedger {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with the table already created and holding `rows`
    #[must_use]
    pub fn with_rows(rows: impl IntoIterator<Item = LedgerRow>) -> Self {
        let table = rows.into_iter().map(|r| (r.state.clone(), r)).collect();
        Self {
            table: Mutex::new(Some(table)),
        }
    }
}

fn missing_table() -> LedgerError {
    LedgerError::Backend("ledger table does not exist".to_string())
}

impl LedgerBackend for MemoryLedger {
    fn ensure_table(&self) -> Result<(), LedgerError> {
        self.table.lock().get_or_insert_with(BTreeMap::new);
        Ok(())
    }

    fn table_exists(&self) -> Result<bool, LedgerError> {
        Ok(self.table.lock().is_some())
    }

    fn drop_table(&self) -> Result<(), LedgerError> {
        *self.table.lock() = None;
        Ok(())
    }

    fn get(&self, state: &State) -> Result<Option<LedgerRow>, LedgerError> {
        let guard = self.table.lock();
        let table = guard.as_ref().ok_or_else(missing_table)?;
        Ok(table.get(state).cloned())
    }

    fn insert(&self, row: &LedgerRow) -> Result<(), LedgerError> {
        let mut guard = self.table.lock();
        let table = guard.as_mut().ok_or_else(missing_table)?;
        table.insert(row.state.clone(), row.clone());
        Ok(())
    }

    fn delete(&self, state: &State) -> Result<(), LedgerError> {
        let mut guard = self.table.lock();
        let table = guard.as_mut().ok_or_else(missing_table)?;
        table.remove(state);
        Ok(())
    }

    fn scan(&self) -> Result<Vec<LedgerRow>, LedgerError> {
        let guard = self.table.lock();
        let table = guard.as_ref().ok_or_else(missing_table)?;
        Ok(table.values().cloned().collect())
    }
}

impl<T: LedgerBackend + ?Sized> LedgerBackend for std::sync::Arc<T> {
    fn ensure_table(&self) -> Result<(), LedgerError> {
        (**self).ensure_table()
    }

    fn table_exists(&self) -> Result<bool, LedgerError> {
        (**self).table_exists()
    }

    fn drop_table(&self) -> Result<(), LedgerError> {
        (**self).drop_table()
    }

    fn get(&self, state: &State) -> Result<Option<LedgerRow>, LedgerError> {
        (**self).get(state)
    }

    fn insert(&self, row: &LedgerRow) -> Result<(), LedgerError> {
        (**self).insert(row)
    }

    fn delete(&self, state: &State) -> Result<(), LedgerError> {
        (**self).delete(state)
    }

    fn scan(&self) -> Result<Vec<LedgerRow>, LedgerError> {
        (**self).scan()
    }
}

/// Ledger queries shared by the planner, executor and admin operations
pub struct Ledger {
    backend: Box<dyn LedgerBackend>,
}

impl Ledger {
    #[inline]
    #[must_use]
    pub fn new(backend: impl LedgerBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Ledger over a fresh [`MemoryLedger`]
    #[inline]
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryLedger::new())
    }

    #[inline]
    #[must_use]
    pub fn backend(&self) -> &dyn LedgerBackend {
        self.backend.as_ref()
    }

    /// Highest state among non-Failed rows
    ///
    /// Creates the table when it is missing and returns [`State::initial`]
    /// for an empty ledger.
    ///
    /// # Errors
    /// Returns an error when the table cannot be read or created.
    pub fn current_state(&self) -> Result<State, LedgerError> {
        if !self.backend.table_exists()? {
            tracing::debug!("ledger table missing, creating it");
            self.backend.ensure_table()?;
            return Ok(State::initial());
        }

        let current = self
            .backend
            .scan()?
            .into_iter()
            .filter(|row| row.status.is_applied())
            .map(|row| row.state)
            .max()
            .unwrap_or_else(State::initial);
        Ok(current)
    }

    /// Point lookup
    ///
    /// # Errors
    /// Returns an error when the backend fails.
    #[inline]
    pub fn get(&self, state: &State) -> Result<Option<LedgerRow>, LedgerError> {
        self.backend.get(state)
    }

    /// Append a row
    ///
    /// # Errors
    /// Returns an error when the backend fails.
    pub fn record(&self, row: &LedgerRow) -> Result<(), LedgerError> {
        tracing::debug!(
            state = %row.state,
            resource = %row.resource_name,
            status = %row.status,
            elapsed_ms = row.elapsed_ms,
            "recording ledger row"
        );
        self.backend.insert(row)
    }

    /// All rows ordered by state; empty when the table does not exist
    ///
    /// # Errors
    /// Returns an error when the backend fails.
    pub fn rows(&self) -> Result<Vec<LedgerRow>, LedgerError> {
        if !self.backend.table_exists()? {
            return Ok(Vec::new());
        }
        let mut rows = self.backend.scan()?;
        rows.sort_by(|a, b| a.state.cmp(&b.state));
        Ok(rows)
    }

    /// Whether the ledger holds no rows
    ///
    /// # Errors
    /// Returns an error when the backend fails.
    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.rows()?.is_empty())
    }

    /// Create the table if missing
    ///
    /// # Errors
    /// Returns an error when the table cannot be created.
    #[inline]
    pub fn ensure_table(&self) -> Result<(), LedgerError> {
        self.backend.ensure_table()
    }

    /// Drop the whole ledger
    ///
    /// # Errors
    /// Returns an error when the backend fails.
    pub fn clean(&self) -> Result<(), LedgerError> {
        tracing::info!("dropping ledger table");
        self.backend.drop_table()
    }

    /// Delete every Failed row and return what was removed
    ///
    /// Side effects a failed mutation already caused on the target are not
    /// undone.
    ///
    /// # Errors
    /// Returns an error when the backend fails.
    pub fn repair(&self) -> Result<Vec<LedgerRow>, LedgerError> {
        let failed: Vec<LedgerRow> = self
            .rows()?
            .into_iter()
            .filter(|row| row.status == MutationStatus::Failed)
            .collect();

        tracing::info!("{} ledger row(s) selected for deletion", failed.len());
        for row in &failed {
            tracing::warn!(
                state = %row.state,
                resource = %row.resource_name,
                "deleting failed ledger row"
            );
            self.backend.delete(&row.state)?;
        }
        Ok(failed)
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger").finish_non_exhaustive()
    }
}
