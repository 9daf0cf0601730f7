//! SQLite-backed quote store.

use super::{QuoteStore, RunRecord, StorageError};
use crate::domain::{DataSource, Quote, Symbol};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS quotes (
    symbol          TEXT    NOT NULL,
    observed_date   TEXT    NOT NULL,
    company_name    TEXT    NOT NULL,
    price           REAL    NOT NULL,
    volume          INTEGER NOT NULL,
    change_percent  REAL    NOT NULL,
    source          TEXT    NOT NULL,
    captured_at     TEXT    NOT NULL,
    PRIMARY KEY (symbol, observed_date)
);
CREATE INDEX IF NOT EXISTS idx_quotes_captured_at ON quotes (captured_at);
CREATE TABLE IF NOT EXISTS etl_runs (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    operation       TEXT    NOT NULL,
    provider        TEXT    NOT NULL,
    status          TEXT    NOT NULL,
    symbols         INTEGER NOT NULL,
    real_quotes     INTEGER NOT NULL,
    synthetic_quotes INTEGER NOT NULL,
    rows_written    INTEGER NOT NULL,
    storage_errors  INTEGER NOT NULL,
    elapsed_secs    REAL    NOT NULL,
    finished_at     TEXT    NOT NULL
);
";

const UPSERT: &str = "
INSERT INTO quotes
    (symbol, observed_date, company_name, price, volume, change_percent, source, captured_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
ON CONFLICT (symbol, observed_date) DO UPDATE SET
    company_name   = excluded.company_name,
    price          = excluded.price,
    volume         = excluded.volume,
    change_percent = excluded.change_percent,
    source         = excluded.source,
    captured_at    = excluded.captured_at
WHERE quotes.source = 'synthetic' OR excluded.source = 'real_provider'
";

const INSERT_RUN: &str = "
INSERT INTO etl_runs
    (operation, provider, status, symbols, real_quotes, synthetic_quotes, rows_written,
     storage_errors, elapsed_secs, finished_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
";

const COLUMNS: &str =
    "symbol, observed_date, company_name, price, volume, change_percent, source, captured_at";

/// Quote store over a single SQLite connection.
///
/// The connection sits behind a mutex, so the store can be shared across
/// threads and writes to the same key are serialized.
pub struct SqliteQuoteStore {
    conn: Mutex<Connection>,
}

impl SqliteQuoteStore {
    /// Open (or create) the database at `path`, creating its parent
    /// directory and the schema if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        tracing::info!(path = %path.display(), "opened quote store");
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl QuoteStore for SqliteQuoteStore {
    fn upsert(&self, quote: &Quote) -> Result<bool, StorageError> {
        let conn = self.lock();
        let written = write_quote(&conn, quote)?;
        if written {
            tracing::debug!(
                symbol = %quote.symbol,
                date = %quote.observed_date,
                source = %quote.source,
                "upserted quote"
            );
        } else {
            tracing::info!(
                symbol = %quote.symbol,
                date = %quote.observed_date,
                "kept stored real quote over synthetic one"
            );
        }
        Ok(written)
    }

    fn upsert_batch(&self, quotes: &[Quote]) -> Result<usize, StorageError> {
        if quotes.is_empty() {
            return Ok(0);
        }
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let mut written = 0;
        for quote in quotes {
            if write_quote(&tx, quote)? {
                written += 1;
            }
        }
        tx.commit()?;
        tracing::debug!(
            rows = quotes.len(),
            written,
            kept = quotes.len() - written,
            "upserted quote batch"
        );
        Ok(written)
    }

    fn query_latest(&self, limit: usize) -> Result<Vec<Quote>, StorageError> {
        let conn = self.lock();
        let sql = format!(
            "SELECT {COLUMNS} FROM quotes
             ORDER BY captured_at DESC, observed_date DESC, symbol ASC
             LIMIT ?1"
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit], read_row)?;
        collect_quotes(rows)
    }

    fn query_latest_per_symbol(&self) -> Result<Vec<Quote>, StorageError> {
        let conn = self.lock();
        let sql = format!(
            "SELECT {COLUMNS} FROM (
                SELECT {COLUMNS}, ROW_NUMBER() OVER (
                    PARTITION BY symbol
                    ORDER BY captured_at DESC, observed_date DESC
                ) AS rn
                FROM quotes
             )
             WHERE rn = 1
             ORDER BY change_percent DESC, symbol ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], read_row)?;
        collect_quotes(rows)
    }

    fn history(&self, symbol: &Symbol) -> Result<Vec<Quote>, StorageError> {
        let conn = self.lock();
        let sql = format!(
            "SELECT {COLUMNS} FROM quotes WHERE symbol = ?1 ORDER BY observed_date ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![symbol.as_str()], read_row)?;
        collect_quotes(rows)
    }

    fn count(&self) -> Result<u64, StorageError> {
        let conn = self.lock();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM quotes", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    fn record_run(&self, run: &RunRecord) -> Result<(), StorageError> {
        let conn = self.lock();
        conn.execute(
            INSERT_RUN,
            params![
                run.operation,
                run.provider,
                run.status(),
                to_sql_count(run.symbols),
                to_sql_count(run.real),
                to_sql_count(run.synthetic),
                to_sql_count(run.rows_written),
                to_sql_count(run.storage_errors),
                run.elapsed_secs,
                format_timestamp(&run.finished_at),
            ],
        )?;
        tracing::debug!(operation = %run.operation, status = run.status(), "recorded run");
        Ok(())
    }

    fn last_run(&self) -> Result<Option<RunRecord>, StorageError> {
        let conn = self.lock();
        let stored = conn
            .query_row(
                "SELECT operation, provider, symbols, real_quotes, synthetic_quotes, rows_written,
                        storage_errors, elapsed_secs, finished_at
                 FROM etl_runs ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok(StoredRun {
                        operation: row.get(0)?,
                        provider: row.get(1)?,
                        symbols: row.get(2)?,
                        real: row.get(3)?,
                        synthetic: row.get(4)?,
                        rows_written: row.get(5)?,
                        storage_errors: row.get(6)?,
                        elapsed_secs: row.get(7)?,
                        finished_at: row.get(8)?,
                    })
                },
            )
            .optional()?;
        stored.map(StoredRun::into_record).transpose()
    }
}

struct StoredRun {
    operation: String,
    provider: String,
    symbols: i64,
    real: i64,
    synthetic: i64,
    rows_written: i64,
    storage_errors: i64,
    elapsed_secs: f64,
    finished_at: String,
}

impl StoredRun {
    fn into_record(self) -> Result<RunRecord, StorageError> {
        Ok(RunRecord {
            finished_at: parse_timestamp(&self.finished_at)?,
            operation: self.operation,
            provider: self.provider,
            symbols: from_sql_count(self.symbols),
            real: from_sql_count(self.real),
            synthetic: from_sql_count(self.synthetic),
            rows_written: from_sql_count(self.rows_written),
            storage_errors: from_sql_count(self.storage_errors),
            elapsed_secs: self.elapsed_secs,
        })
    }
}

fn to_sql_count(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn from_sql_count(n: i64) -> u64 {
    n.max(0) as u64
}

/// Returns false when the conflict guard kept an existing real row.
fn write_quote(conn: &Connection, quote: &Quote) -> Result<bool, StorageError> {
    let volume = to_sql_count(quote.volume);
    let changed = conn.execute(
        UPSERT,
        params![
            quote.symbol.as_str(),
            quote.observed_date.to_string(),
            quote.company_name,
            quote.price,
            volume,
            quote.change_percent,
            quote.source.as_str(),
            format_timestamp(&quote.captured_at),
        ],
    )?;
    Ok(changed > 0)
}

/// Fixed-width UTC timestamps so text ordering matches time ordering.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt(format!("timestamp '{raw}': {e}")))
}

/// Column values as stored, before domain validation.
struct StoredRow {
    symbol: String,
    observed_date: String,
    company_name: String,
    price: f64,
    volume: i64,
    change_percent: f64,
    source: String,
    captured_at: String,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<StoredRow> {
    Ok(StoredRow {
        symbol: row.get(0)?,
        observed_date: row.get(1)?,
        company_name: row.get(2)?,
        price: row.get(3)?,
        volume: row.get(4)?,
        change_percent: row.get(5)?,
        source: row.get(6)?,
        captured_at: row.get(7)?,
    })
}

impl StoredRow {
    fn into_quote(self) -> Result<Quote, StorageError> {
        let row = self;
        let symbol = Symbol::parse(&row.symbol)
            .map_err(|e| StorageError::Corrupt(format!("symbol '{}': {e}", row.symbol)))?;
        let observed_date = row
            .observed_date
            .parse::<NaiveDate>()
            .map_err(|e| StorageError::Corrupt(format!("date '{}': {e}", row.observed_date)))?;
        let source = row.source.parse::<DataSource>().map_err(StorageError::Corrupt)?;
        let captured_at = parse_timestamp(&row.captured_at)?;

        Ok(Quote {
            symbol,
            company_name: row.company_name,
            price: row.price,
            volume: from_sql_count(row.volume),
            change_percent: row.change_percent,
            observed_date,
            source,
            captured_at,
        })
    }
}

fn collect_quotes(
    rows: impl Iterator<Item = rusqlite::Result<StoredRow>>,
) -> Result<Vec<Quote>, StorageError> {
    rows.map(|r| r?.into_quote()).collect()
}
