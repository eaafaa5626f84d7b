//! Baseline
//!
//! Adopts an existing target system into the ledger at a given version
//! without running anything. Rows below the baseline are recorded as
//! `BeforeBaseline`, the baseline itself as `Baseline`; newer mutations stay
//! pending.

use crate::checksum::Checksum;
use crate::error::{LedgerError, MutagenError};
use crate::ledger::{Ledger, LedgerRow, MutationStatus};
use crate::mutation::Mutation;
use crate::planner::Planner;
use crate::state::State;
use std::cmp::Ordering;

/// Rows written by a baseline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineReport {
    pub version: State,
    pub rows: Vec<LedgerRow>,
    /// True when no discovered mutation matched `version` and a synthetic
    /// row was written for it
    pub synthetic: bool,
}

/// Record `mutations` as applied up to and including `version`
///
/// The ledger must be empty. When no mutation sits exactly at `version`, a
/// `Baseline` row with empty resource name and checksum is written so the
/// current state still resolves to `version`.
///
/// # Errors
/// Returns a configuration error for the empty-ledger sentinel, a
/// duplicate-state error, a ledger error when the ledger is not
/// empty, or a backend error.
pub fn baseline(
    ledger: &Ledger,
    mutations: impl IntoIterator<Item = Mutation>,
    version: &State,
) -> Result<BaselineReport, MutagenError> {
    if version.is_initial() {
        return Err(MutagenError::configuration(format!(
            "cannot baseline at the empty-ledger state {version}"
        )));
    }

    let planner = Planner::new(mutations);
    planner.check_duplicates()?;

    ledger.ensure_table()?;
    let existing = ledger.rows()?;
    if !existing.is_empty() {
        return Err(LedgerError::NotEmpty {
            rows: existing.len(),
        }
        .into());
    }

    tracing::info!(%version, "baselining ledger");

    let mut rows = Vec::new();
    let mut matched = false;
    for mutation in planner.mutations() {
        let status = match mutation.state().cmp(version) {
            Ordering::Less => MutationStatus::BeforeBaseline,
            Ordering::Equal => {
                matched = true;
                MutationStatus::Baseline
            }
            Ordering::Greater => continue,
        };
        rows.push(LedgerRow::new(
            mutation.state().clone(),
            mutation.resource_name(),
            mutation.checksum().clone(),
            0,
            status,
        ));
    }

    if !matched {
        tracing::debug!(%version, "no mutation at baseline version, writing synthetic row");
        rows.push(LedgerRow::new(
            version.clone(),
            "",
            Checksum::empty(),
            0,
            MutationStatus::Baseline,
        ));
    }

    for row in &rows {
        ledger.record(row)?;
    }

    Ok(BaselineReport {
        version: version.clone(),
        rows,
        synthetic: !matched,
    })
}
