//! Orchestrator
//!
//! [`Mutagen`] ties a ledger and a target together and serializes every
//! ledger-mutating operation behind one run lock, so at most one
//! migrate/baseline/clean/repair runs per instance at a time. Separate
//! processes sharing one database are not coordinated.

use crate::baseline::{baseline, BaselineReport};
use crate::error::MutagenError;
use crate::info::MigrationInfo;
use crate::ledger::{Ledger, LedgerRow};
use crate::mutation::Mutation;
use crate::plan::{MigrationResult, Plan};
use crate::planner::Planner;
use crate::state::State;
use crate::target::Target;
use parking_lot::Mutex;
use std::fmt::{self, Formatter};

/// Migration engine bound to one ledger and one target
pub struct Mutagen {
    ledger: Ledger,
    target: Box<dyn Target>,
    run_lock: Mutex<()>,
}

impl Mutagen {
    #[must_use]
    pub fn new(ledger: Ledger, target: impl Target + 'static) -> Self {
        Self {
            ledger,
            target: Box::new(target),
            run_lock: Mutex::new(()),
        }
    }

    /// Open the configured SQLite database as both ledger and target
    ///
    /// # Errors
    /// Returns a configuration error for invalid settings, or a ledger error
    /// when the database cannot be opened.
    #[cfg(feature = "sqlite")]
    pub fn open(config: &crate::config::MutagenConfig) -> Result<Self, MutagenError> {
        use crate::sqlite::SqliteStore;
        use std::sync::Arc;

        config.validate()?;
        tracing::debug!(database = %config.database.display(), "opening database");
        let store = Arc::new(SqliteStore::open(&config.database)?);
        Ok(Self::new(Ledger::new(Arc::clone(&store)), store))
    }

    #[inline]
    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> &dyn Target {
        self.target.as_ref()
    }

    /// Current state of the ledger
    ///
    /// # Errors
    /// Returns a ledger error when the backend fails.
    pub fn current_state(&self) -> Result<State, MutagenError> {
        Ok(self.ledger.current_state()?)
    }

    /// Compute the pending mutations without running anything
    ///
    /// # Errors
    /// Returns any planning error.
    pub fn plan(
        &self,
        mutations: impl IntoIterator<Item = Mutation>,
    ) -> Result<Plan<'_>, MutagenError> {
        Planner::new(mutations).plan(&self.ledger)
    }

    /// Plan and execute under the run lock
    ///
    /// Planning errors are returned as `Err`. Execution faults halt the run
    /// and are reported inside the returned [`MigrationResult`].
    ///
    /// # Errors
    /// Returns any planning error.
    pub fn migrate(
        &self,
        mutations: impl IntoIterator<Item = Mutation>,
    ) -> Result<MigrationResult, MutagenError> {
        let _guard = self.run_lock.lock();

        let plan = Planner::new(mutations).plan(&self.ledger)?;
        if plan.is_empty() {
            tracing::info!(
                state = %self.ledger.current_state()?,
                "ledger is up to date, nothing to migrate"
            );
            return Ok(MigrationResult::empty());
        }
        Ok(plan.execute(self.target.as_ref()))
    }

    /// Adopt the target at `version` without running anything
    ///
    /// # Errors
    /// Returns a duplicate-state error, or a ledger error when the ledger is
    /// not empty or cannot be written.
    pub fn baseline(
        &self,
        mutations: impl IntoIterator<Item = Mutation>,
        version: &State,
    ) -> Result<BaselineReport, MutagenError> {
        let _guard = self.run_lock.lock();
        baseline(&self.ledger, mutations, version)
    }

    /// Drop the ledger table
    ///
    /// # Errors
    /// Returns a ledger error when the backend fails.
    pub fn clean(&self) -> Result<(), MutagenError> {
        let _guard = self.run_lock.lock();
        Ok(self.ledger.clean()?)
    }

    /// Delete Failed rows so the failed mutations can be planned again
    ///
    /// # Errors
    /// Returns a ledger error when the backend fails.
    pub fn repair(&self) -> Result<Vec<LedgerRow>, MutagenError> {
        let _guard = self.run_lock.lock();
        Ok(self.ledger.repair()?)
    }

    /// Snapshot of the ledger
    ///
    /// # Errors
    /// Returns a ledger error when the backend fails.
    pub fn info(&self) -> Result<MigrationInfo, MutagenError> {
        Ok(MigrationInfo::new(self.ledger.rows()?))
    }
}

impl fmt::Debug for Mutagen {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutagen")
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MutationStatus;
    use std::sync::Arc;

    #[derive(Default)]
    struct Sink(Mutex<Vec<String>>);

    impl Target for Sink {
        fn execute(&self, statement: &str) -> anyhow::Result<()> {
            if statement.contains("BOOM") {
                anyhow::bail!("rejected: {statement}");
            }
            self.0.lock().push(statement.to_string());
            Ok(())
        }
    }

    fn script(token: &str, body: &str) -> Mutation {
        Mutation::script(&format!("M{token}_Test_1.sql"), body.as_bytes()).unwrap()
    }

    fn engine() -> (Mutagen, Arc<Sink>) {
        let sink = Arc::new(Sink::default());
        (Mutagen::new(Ledger::in_memory(), Arc::clone(&sink)), sink)
    }

    #[test]
    fn migrate_then_noop() {
        let (mutagen, sink) = engine();
        let set = || vec![script("201501010001", "A;"), script("201501010002", "B;")];

        let result = mutagen.migrate(set()).unwrap();
        assert!(result.is_complete());
        assert_eq!(result.completed().len(), 2);
        assert_eq!(*sink.0.lock(), vec!["A;", "B;"]);

        let again = mutagen.migrate(set()).unwrap();
        assert!(again.is_complete());
        assert!(again.completed().is_empty());
        assert_eq!(sink.0.lock().len(), 2);
    }

    #[test]
    fn failed_run_is_blocked_until_repaired() {
        let (mutagen, _sink) = engine();
        let set = |body: &str| vec![script("201501010001", "A;"), script("201501010002", body)];

        let result = mutagen.migrate(set("BOOM;")).unwrap();
        assert!(!result.is_complete());
        assert_eq!(mutagen.current_state().unwrap().as_str(), "201501010001");

        let err = mutagen.migrate(set("BOOM;")).unwrap_err();
        assert!(matches!(err, MutagenError::FailedPriorMutation { .. }));

        let removed = mutagen.repair().unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].status, MutationStatus::Failed);

        let result = mutagen.migrate(set("C;")).unwrap();
        assert!(result.is_complete());
        assert_eq!(result.completed().len(), 1);
        assert_eq!(mutagen.current_state().unwrap().as_str(), "201501010002");
    }

    #[test]
    fn clean_resets_to_sentinel() {
        let (mutagen, _sink) = engine();
        mutagen.migrate(vec![script("201501010001", "A;")]).unwrap();
        assert!(!mutagen.info().unwrap().is_empty());

        mutagen.clean().unwrap();
        assert!(mutagen.info().unwrap().is_empty());
        assert!(mutagen.current_state().unwrap().is_initial());
    }

    #[test]
    fn plan_does_not_write() {
        let (mutagen, sink) = engine();
        let plan = mutagen.plan(vec![script("201501010001", "A;")]).unwrap();
        assert_eq!(plan.mutations().len(), 1);
        assert!(sink.0.lock().is_empty());
        assert!(mutagen.ledger().rows().unwrap().is_empty());
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<Mutagen>();
    }
}
