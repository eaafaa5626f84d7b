//! Testing utilities for the Mutagen workspace
//!
//! Shared test helpers, fixtures, and assertions.

#![allow(missing_docs)]

use mutagen_core::{
    Checksum, Ledger, LedgerRow, MemoryLedger, Mutation, MutationContext, MutationStatus, State,
    Target,
};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// Marker that makes [`RecordingTarget`] reject a statement
pub const FAIL_MARKER: &str = "FAIL";

/// Target that records every statement it accepts
///
/// Statements containing [`FAIL_MARKER`] are rejected and not recorded.
#[derive(Debug, Default)]
pub struct RecordingTarget {
    statements: Mutex<Vec<String>>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().clone()
    }

    pub fn clear(&self) {
        self.statements.lock().clear();
    }
}

impl Target for RecordingTarget {
    fn execute(&self, statement: &str) -> anyhow::Result<()> {
        if statement.contains(FAIL_MARKER) {
            anyhow::bail!("target rejected statement: {statement}");
        }
        self.statements.lock().push(statement.to_string());
        Ok(())
    }
}

pub fn state(token: &str) -> State {
    State::parse(token).unwrap()
}

pub fn resource_name(token: &str, title: &str) -> String {
    format!("M{token}_{title}_1.sql")
}

/// Script mutation whose single statement is `STMT <token>;`
pub fn script_mutation(token: &str) -> Mutation {
    script_mutation_with_body(token, &format!("STMT {token};"))
}

pub fn script_mutation_with_body(token: &str, body: &str) -> Mutation {
    Mutation::script(&resource_name(token, "Test"), body.as_bytes()).unwrap()
}

/// Script mutation whose statement the [`RecordingTarget`] rejects
pub fn failing_mutation(token: &str) -> Mutation {
    script_mutation_with_body(token, &format!("{FAIL_MARKER} {token};"))
}

/// Programmatic mutation that executes `CALL <token>` through its context
pub fn callback_mutation(token: &str) -> Mutation {
    let statement = format!("CALL {token}");
    let source = statement.clone();
    Mutation::callback(
        &format!("M{token}_Callback_1.rs"),
        &source,
        move |ctx: &MutationContext<'_>| ctx.execute(&statement),
    )
    .unwrap()
}

pub fn scripts(tokens: &[&str]) -> Vec<Mutation> {
    tokens.iter().map(|t| script_mutation(t)).collect()
}

pub fn row(token: &str, status: MutationStatus) -> LedgerRow {
    LedgerRow::new(
        state(token),
        resource_name(token, "Test"),
        Checksum::compute(format!("STMT {token};").as_bytes()),
        1,
        status,
    )
}

/// Ledger pre-populated with a row per `(token, status)` pair
///
/// Checksums match [`script_mutation`] for the same token.
pub fn seeded_ledger(rows: &[(&str, MutationStatus)]) -> Ledger {
    Ledger::new(MemoryLedger::with_rows(
        rows.iter().map(|(token, status)| row(token, *status)),
    ))
}

pub fn ledger_statuses(ledger: &Ledger) -> Vec<(String, MutationStatus)> {
    ledger
        .rows()
        .unwrap()
        .into_iter()
        .map(|r| (r.state.to_string(), r.status))
        .collect()
}

/// Write a script file named after `token` into `dir`
pub fn write_script(dir: &Path, token: &str, title: &str, body: &str) {
    std::fs::write(dir.join(resource_name(token, title)), body).unwrap();
}
