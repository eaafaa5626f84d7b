//! SQLite store
//!
//! One database file holds both the ledger (`"Version"` table) and the
//! schema the mutations operate on, so [`SqliteStore`] implements
//! [`LedgerBackend`] and [`Target`].

use crate::checksum::Checksum;
use crate::error::LedgerError;
use crate::ledger::{LedgerBackend, LedgerRow, MutationStatus};
use crate::state::State;
use crate::target::Target;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS \"Version\" (
    versionid TEXT PRIMARY KEY NOT NULL,
    filename TEXT NOT NULL,
    checksum TEXT NOT NULL,
    execution_date TEXT NOT NULL,
    execution_time INTEGER NOT NULL,
    status TEXT NOT NULL
)";

const SELECT_COLUMNS: &str =
    "SELECT versionid, filename, checksum, execution_date, execution_time, status FROM \"Version\"";

type RawRow = (String, String, String, String, i64, String);

/// SQLite-backed ledger and target
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file
    ///
    /// # Errors
    /// Returns an error when the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Private in-memory database
    ///
    /// # Errors
    /// Returns an error when SQLite cannot allocate the database.
    pub fn in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run a read-only query returning one integer, for inspection
    ///
    /// # Errors
    /// Returns an error when the query fails.
    pub fn query_count(&self, sql: &str) -> Result<i64, LedgerError> {
        Ok(self.conn.lock().query_row(sql, [], |row| row.get(0))?)
    }
}

fn decode(raw: RawRow) -> Result<LedgerRow, LedgerError> {
    let (state, resource_name, checksum, executed_at, elapsed_ms, status) = raw;
    let corrupt = |reason: String| LedgerError::CorruptRow {
        state: state.clone(),
        reason,
    };

    let executed_at = DateTime::parse_from_rfc3339(&executed_at)
        .map_err(|e| corrupt(format!("execution_date: {e}")))?
        .with_timezone(&Utc);
    let status: MutationStatus = status.parse().map_err(corrupt)?;
    let elapsed_ms =
        u64::try_from(elapsed_ms).map_err(|_| corrupt(format!("execution_time {elapsed_ms}")))?;
    let parsed_state = State::parse(&state).map_err(|e| corrupt(e.to_string()))?;

    Ok(LedgerRow {
        state: parsed_state,
        resource_name,
        checksum: Checksum::from_recorded(checksum),
        executed_at,
        elapsed_ms,
        status,
    })
}

fn read_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

impl LedgerBackend for SqliteStore {
    fn ensure_table(&self) -> Result<(), LedgerError> {
        self.conn.lock().execute(CREATE_TABLE, [])?;
        Ok(())
    }

    fn table_exists(&self) -> Result<bool, LedgerError> {
        let count: i64 = self.conn.lock().query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'Version'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn drop_table(&self) -> Result<(), LedgerError> {
        self.conn.lock().execute("DROP TABLE IF EXISTS \"Version\"", [])?;
        Ok(())
    }

    fn get(&self, state: &State) -> Result<Option<LedgerRow>, LedgerError> {
        let raw = self
            .conn
            .lock()
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE versionid = ?1"),
                params![state.as_str()],
                read_raw,
            )
            .optional()?;
        raw.map(decode).transpose()
    }

    fn insert(&self, row: &LedgerRow) -> Result<(), LedgerError> {
        let elapsed = i64::try_from(row.elapsed_ms).unwrap_or(i64::MAX);
        self.conn.lock().execute(
            "INSERT OR REPLACE INTO \"Version\"
                (versionid, filename, checksum, execution_date, execution_time, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                row.state.as_str(),
                row.resource_name,
                row.checksum.as_str(),
                row.executed_at.to_rfc3339(),
                elapsed,
                row.status.as_str(),
            ],
        )?;
        Ok(())
    }

    fn delete(&self, state: &State) -> Result<(), LedgerError> {
        self.conn.lock().execute(
            "DELETE FROM \"Version\" WHERE versionid = ?1",
            params![state.as_str()],
        )?;
        Ok(())
    }

    fn scan(&self) -> Result<Vec<LedgerRow>, LedgerError> {
        let raw: Vec<RawRow> = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare(SELECT_COLUMNS)?;
            let rows = stmt.query_map([], read_raw)?;
            rows.collect::<Result<_, _>>()?
        };
        raw.into_iter().map(decode).collect()
    }
}

impl Target for SqliteStore {
    fn execute(&self, statement: &str) -> anyhow::Result<()> {
        self.conn.lock().execute_batch(statement)?;
        Ok(())
    }
}
