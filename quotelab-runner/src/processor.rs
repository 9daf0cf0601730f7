//! Portfolio processor: drives the extractor across a symbol list.
//!
//! Symbols are handled strictly one after another with a randomized pause
//! between them. Each quote is persisted independently; a storage failure is
//! logged and counted but never stops the run, and the quote is still
//! returned to the caller. Every run is recorded in the store.

use crate::stats::RunStats;
use chrono::Utc;
use quotelab_core::extract::{uniform_between, Extractor, Sleeper};
use quotelab_core::store::QuoteStore;
use quotelab_core::{Quote, Symbol, SymbolError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] SymbolError),
}

/// Pause inserted before every symbol except the first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingPolicy {
    pub min: Duration,
    pub max: Duration,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(2),
            max: Duration::from_secs(4),
        }
    }
}

impl PacingPolicy {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// No pause between symbols.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        uniform_between(self.min, self.max, rng)
    }
}

/// Result of a run that fetched full series per symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRun {
    /// Latest quote per symbol, in input order.
    pub quotes: Vec<Quote>,
    /// Every series point of every symbol, grouped by symbol, oldest first.
    pub history: Vec<Quote>,
    pub stats: RunStats,
}

pub struct PortfolioProcessor {
    extractor: Extractor,
    store: Arc<dyn QuoteStore>,
    sleeper: Arc<dyn Sleeper>,
    pacing: PacingPolicy,
    rng: StdRng,
    last_stats: RunStats,
}

impl PortfolioProcessor {
    pub fn new(extractor: Extractor, store: Arc<dyn QuoteStore>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            extractor,
            store,
            sleeper,
            pacing: PacingPolicy::default(),
            rng: StdRng::from_entropy(),
            last_stats: RunStats::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: PacingPolicy) -> Self {
        self.pacing = pacing;
        self
    }

    /// Fix the RNG behind pacing delays.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Counters from the most recent `process` or `process_with_history`.
    pub fn last_stats(&self) -> &RunStats {
        &self.last_stats
    }

    /// Extract and persist the latest quote of every symbol, in order.
    ///
    /// All symbols are validated before any network or storage access; one
    /// invalid symbol rejects the whole batch.
    pub fn process<S: AsRef<str>>(&mut self, symbols: &[S]) -> Result<Vec<Quote>, PipelineError> {
        let symbols = Symbol::parse_all(symbols)?;
        let started = Instant::now();
        let mut stats = RunStats::new();
        let mut quotes = Vec::with_capacity(symbols.len());

        tracing::info!(
            symbols = symbols.len(),
            provider = self.extractor.provider_name(),
            "processing portfolio"
        );

        for (i, symbol) in symbols.iter().enumerate() {
            self.pace(i, symbol);
            let quote = self.extractor.extract(symbol);
            match self.persist(symbol, std::slice::from_ref(&quote)) {
                Some(written) => stats.rows_written += written,
                None => stats.storage_errors += 1,
            }
            record_source(&mut stats, &quote);
            quotes.push(quote);
        }

        stats.elapsed = started.elapsed();
        self.finish("process", stats);
        Ok(quotes)
    }

    /// Like [`process`](Self::process) but fetches each symbol's daily
    /// series and persists every point in one transaction per symbol.
    pub fn process_with_history<S: AsRef<str>>(
        &mut self,
        symbols: &[S],
    ) -> Result<PortfolioRun, PipelineError> {
        let symbols = Symbol::parse_all(symbols)?;
        let started = Instant::now();
        let mut stats = RunStats::new();
        let mut quotes = Vec::with_capacity(symbols.len());
        let mut history = Vec::new();

        tracing::info!(
            symbols = symbols.len(),
            provider = self.extractor.provider_name(),
            "processing portfolio with history"
        );

        for (i, symbol) in symbols.iter().enumerate() {
            self.pace(i, symbol);
            let series = self.extractor.extract_series(symbol);
            match self.persist(symbol, &series) {
                Some(written) => stats.rows_written += written,
                None => stats.storage_errors += 1,
            }
            if let Some(latest) = series.last() {
                record_source(&mut stats, latest);
                quotes.push(latest.clone());
            }
            history.extend(series);
        }

        stats.elapsed = started.elapsed();
        self.finish("process_with_history", stats.clone());
        Ok(PortfolioRun {
            quotes,
            history,
            stats,
        })
    }

    fn pace(&mut self, index: usize, symbol: &Symbol) {
        if index == 0 {
            return;
        }
        let delay = self.pacing.delay(&mut self.rng);
        if delay.is_zero() {
            return;
        }
        tracing::debug!(%symbol, delay_ms = delay.as_millis() as u64, "pacing before next symbol");
        self.sleeper.sleep(delay);
    }

    /// Rows written, or `None` when the write failed; the failure is
    /// logged here.
    fn persist(&self, symbol: &Symbol, quotes: &[Quote]) -> Option<usize> {
        let result = match quotes {
            [single] => self.store.upsert(single).map(usize::from),
            many => self.store.upsert_batch(many),
        };
        match result {
            Ok(written) => Some(written),
            Err(e) => {
                tracing::error!(%symbol, rows = quotes.len(), error = %e, "failed to persist quotes");
                None
            }
        }
    }

    /// Log and record the run; a failed record is logged, never returned.
    fn finish(&mut self, operation: &str, stats: RunStats) {
        stats.log_summary(operation);
        let record = stats.to_record(operation, self.extractor.provider_name(), Utc::now());
        if let Err(e) = self.store.record_run(&record) {
            tracing::error!(operation, error = %e, "failed to record run");
        }
        self.last_stats = stats;
    }
}

fn record_source(stats: &mut RunStats, quote: &Quote) {
    stats.total += 1;
    if quote.is_synthetic() {
        stats.synthetic += 1;
    } else {
        stats.real += 1;
    }
}
