//! Ledger reporting

use crate::ledger::{LedgerRow, MutationStatus};
use serde::Serialize;
use std::fmt::Write as _;

const VERSION_TITLE: &str = "Version";
const DATE_TITLE: &str = "Execution Date";
const FILENAME_TITLE: &str = "Filename";
const STATUS_TITLE: &str = "Status";

/// Snapshot of the ledger, ordered by state
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationInfo {
    rows: Vec<LedgerRow>,
}

impl MigrationInfo {
    #[must_use]
    pub fn new(mut rows: Vec<LedgerRow>) -> Self {
        rows.sort_by(|a, b| a.state.cmp(&b.state));
        Self { rows }
    }

    #[inline]
    #[must_use]
    pub fn all(&self) -> &[LedgerRow] {
        &self.rows
    }

    /// Most recent row
    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<&LedgerRow> {
        self.rows.last()
    }

    /// Rows that count toward the current state
    #[must_use]
    pub fn applied(&self) -> Vec<&LedgerRow> {
        self.rows.iter().filter(|r| r.status.is_applied()).collect()
    }

    /// Most recent row, if it is a failure
    #[must_use]
    pub fn failed(&self) -> Option<&LedgerRow> {
        self.current().filter(|r| r.status == MutationStatus::Failed)
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// ASCII table with one line per row
    #[must_use]
    pub fn render_table(&self) -> String {
        let dates: Vec<String> = self
            .rows
            .iter()
            .map(|r| r.executed_at.format("%Y-%m-%d %H:%M:%S").to_string())
            .collect();

        let mut widths = [
            cell_width(VERSION_TITLE),
            cell_width(DATE_TITLE),
            cell_width(FILENAME_TITLE),
            cell_width(STATUS_TITLE),
        ];
        for (row, date) in self.rows.iter().zip(&dates) {
            widths[0] = widths[0].max(cell_width(row.state.as_str()));
            widths[1] = widths[1].max(cell_width(date));
            widths[2] = widths[2].max(cell_width(&row.resource_name));
            widths[3] = widths[3].max(cell_width(row.status.as_str()));
        }

        let ruler = {
            let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            format!("+-{}-+\n", dashes.join("-+-"))
        };

        let mut table = String::new();
        table.push_str(&ruler);
        push_line(
            &mut table,
            &widths,
            [VERSION_TITLE, DATE_TITLE, FILENAME_TITLE, STATUS_TITLE],
        );
        table.push_str(&ruler);

        if self.rows.is_empty() {
            let inner = ruler.len() - 4;
            let _ = writeln!(table, "| {:<inner$}|", "No migrations found");
        } else {
            for (row, date) in self.rows.iter().zip(&dates) {
                push_line(
                    &mut table,
                    &widths,
                    [
                        row.state.as_str(),
                        date,
                        &row.resource_name,
                        row.status.as_str(),
                    ],
                );
            }
        }

        table.push_str(&ruler);
        table
    }
}

/// Width as `format!` padding counts it: in chars, not bytes
fn cell_width(text: &str) -> usize {
    text.chars().count()
}

fn push_line(table: &mut String, widths: &[usize; 4], cells: [&str; 4]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    let _ = writeln!(table, "| {} |", padded.join(" | "));
}
