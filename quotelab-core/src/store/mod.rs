//! Persistent quote storage.
//!
//! Rows are keyed by `(symbol, observed_date)`: writing a quote for a key that
//! already exists replaces the earlier row, so re-running extraction on the
//! same day never duplicates data. A synthetic quote never replaces a real
//! one. Each processor run is also recorded as a [`RunRecord`].

pub mod sqlite;

pub use sqlite::SqliteQuoteStore;

use crate::domain::{Quote, Symbol};
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Outcome of one processor run, kept in the `etl_runs` table.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    /// `process` or `process_with_history`.
    pub operation: String,
    pub provider: String,
    pub finished_at: DateTime<Utc>,
    pub symbols: u64,
    pub real: u64,
    pub synthetic: u64,
    pub rows_written: u64,
    pub storage_errors: u64,
    pub elapsed_secs: f64,
}

impl RunRecord {
    /// `partial` when rows were lost, `degraded` when synthetic data was
    /// used, `success` otherwise.
    pub fn status(&self) -> &'static str {
        if self.storage_errors > 0 {
            "partial"
        } else if self.synthetic > 0 {
            "degraded"
        } else {
            "success"
        }
    }
}

/// Storage seam used by the portfolio processor and the CLI.
pub trait QuoteStore: Send + Sync {
    /// Insert or replace the row for `(quote.symbol, quote.observed_date)`.
    ///
    /// Returns false when the write was skipped because a synthetic quote
    /// would have replaced a real one.
    fn upsert(&self, quote: &Quote) -> Result<bool, StorageError>;

    /// Upsert every quote in one transaction; returns the rows written.
    fn upsert_batch(&self, quotes: &[Quote]) -> Result<usize, StorageError>;

    /// Most recently captured rows, newest first.
    fn query_latest(&self, limit: usize) -> Result<Vec<Quote>, StorageError>;

    /// One row per symbol (latest capture, ties broken by later observation
    /// date), ordered by `change_percent` descending.
    fn query_latest_per_symbol(&self) -> Result<Vec<Quote>, StorageError>;

    /// Every stored row for `symbol`, oldest observation first.
    fn history(&self, symbol: &Symbol) -> Result<Vec<Quote>, StorageError>;

    fn count(&self) -> Result<u64, StorageError>;

    fn record_run(&self, run: &RunRecord) -> Result<(), StorageError>;

    /// The most recently recorded run, if any.
    fn last_run(&self) -> Result<Option<RunRecord>, StorageError>;
}
