//! Per-run counters.

use chrono::{DateTime, Utc};
use quotelab_core::store::RunRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome counts for one processor run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Symbols processed.
    pub total: usize,
    /// Symbols served by the real provider.
    pub real: usize,
    /// Symbols that fell back to synthetic data.
    pub synthetic: usize,
    /// Rows written.
    pub rows_written: usize,
    /// Persist calls that failed (the quote is still returned).
    pub storage_errors: usize,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of symbols served by the real provider (%).
    pub fn real_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.real as f64 / self.total as f64) * 100.0
        }
    }

    /// Persistable form of these counters.
    pub fn to_record(
        &self,
        operation: &str,
        provider: &str,
        finished_at: DateTime<Utc>,
    ) -> RunRecord {
        RunRecord {
            operation: operation.to_string(),
            provider: provider.to_string(),
            finished_at,
            symbols: self.total as u64,
            real: self.real as u64,
            synthetic: self.synthetic as u64,
            rows_written: self.rows_written as u64,
            storage_errors: self.storage_errors as u64,
            elapsed_secs: self.elapsed.as_secs_f64(),
        }
    }

    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            real = self.real,
            synthetic = self.synthetic,
            rows_written = self.rows_written,
            storage_errors = self.storage_errors,
            real_rate = format!("{:.1}%", self.real_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "run complete"
        );
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_rate_handles_empty_run() {
        assert_eq!(RunStats::new().real_rate(), 0.0);
        let stats = RunStats {
            total: 4,
            real: 3,
            synthetic: 1,
            ..RunStats::default()
        };
        assert_eq!(stats.real_rate(), 75.0);
    }

    #[test]
    fn record_carries_counts_and_status() {
        let stats = RunStats {
            total: 3,
            real: 2,
            synthetic: 1,
            rows_written: 3,
            storage_errors: 0,
            elapsed: Duration::from_millis(250),
        };
        let at = Utc::now();
        let record = stats.to_record("process", "yahoo_finance", at);
        assert_eq!(record.symbols, 3);
        assert_eq!(record.synthetic, 1);
        assert_eq!(record.elapsed_secs, 0.25);
        assert_eq!(record.finished_at, at);
        assert_eq!(record.status(), "degraded");
    }

    #[test]
    fn elapsed_serializes_as_seconds() {
        let stats = RunStats {
            elapsed: Duration::from_millis(1500),
            ..RunStats::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["elapsed"], 1.5);
    }
}
