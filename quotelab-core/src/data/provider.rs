//! Quote provider trait and structured error types.
//!
//! The QuoteProvider trait abstracts over remote quote sources (Yahoo Finance,
//! Alpha Vantage) so the extractor can retry, fall back, and be driven by
//! scripted providers in tests.

use crate::domain::Symbol;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// One daily point of a provider's close series. Any field may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub date: Option<NaiveDate>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

/// Provider payload before normalization.
///
/// `points` are in chronological order (oldest first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    pub symbol: String,
    pub company_name: Option<String>,
    /// Provider's own "last price" field, used when the close series is empty.
    pub market_price: Option<f64>,
    pub points: Vec<RawPoint>,
}

/// Failure classes a provider can report.
///
/// Rate limiting is kept distinct from the other classes so the extractor can
/// log it separately; both are retried within the same attempt budget.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("rate limited by provider")]
    RateLimited,

    #[error("symbol not found: {symbol}")]
    NotFound { symbol: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl ProviderError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited)
    }

    /// Short tag for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::RateLimited => "rate_limited",
            ProviderError::NotFound { .. } => "not_found",
            ProviderError::Transport(_) => "transport",
            ProviderError::Malformed(_) => "malformed",
        }
    }
}

/// A remote quote source.
///
/// Implementations own their HTTP client; the extractor only sees this
/// contract. Providers do not retry on their own.
pub trait QuoteProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the recent daily series for a symbol within `timeout`.
    fn fetch(&self, symbol: &Symbol, timeout: Duration) -> Result<RawQuote, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_are_distinct() {
        let errors = [
            ProviderError::RateLimited,
            ProviderError::NotFound {
                symbol: "XYZ".into(),
            },
            ProviderError::Transport("timeout".into()),
            ProviderError::Malformed("no closes".into()),
        ];
        let kinds: Vec<_> = errors.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, ["rate_limited", "not_found", "transport", "malformed"]);
        assert!(errors[0].is_rate_limited());
        assert!(!errors[2].is_rate_limited());
    }
}
