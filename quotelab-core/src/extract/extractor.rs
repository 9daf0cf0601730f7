//! Retry/fallback extractor.
//!
//! `extract` always returns a quote. Every symbol gets the policy's full
//! attempt budget; rate limits and other failures are retried alike, and once
//! the budget is spent the extractor switches to synthetic data. Errors never
//! cross this boundary: fidelity is reported through `Quote::source`.

use super::policy::RetryPolicy;
use super::sleeper::Sleeper;
use crate::data::normalize::{normalize_latest, normalize_series};
use crate::data::provider::{ProviderError, QuoteProvider, RawQuote};
use crate::data::synthetic::{synthetic_quote, synthetic_series};
use crate::domain::{Quote, Symbol};
use chrono::{DateTime, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// Days of synthetic history produced when a series extraction falls back.
pub const DEFAULT_HISTORY_DAYS: usize = 30;

pub struct Extractor {
    provider: Option<Box<dyn QuoteProvider>>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    rng: StdRng,
    history_days: usize,
}

impl Extractor {
    pub fn new(
        provider: Box<dyn QuoteProvider>,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            provider: Some(provider),
            policy,
            sleeper,
            rng: StdRng::from_entropy(),
            history_days: DEFAULT_HISTORY_DAYS,
        }
    }

    /// Extractor with no provider: every call yields synthetic data at once.
    pub fn offline(sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            provider: None,
            policy: RetryPolicy::default(),
            sleeper,
            rng: StdRng::from_entropy(),
            history_days: DEFAULT_HISTORY_DAYS,
        }
    }

    /// Fix the RNG behind jitter and synthetic values.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_history_days(mut self, days: usize) -> Self {
        self.history_days = days.max(1);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.as_deref().map_or("offline", |p| p.name())
    }

    /// Latest quote for `symbol`. Never fails.
    pub fn extract(&mut self, symbol: &Symbol) -> Quote {
        let _span = tracing::info_span!("extract", %symbol).entered();

        if let Some(quote) = self.with_retry(symbol, normalize_latest) {
            return quote;
        }

        let (today, now) = clock();
        let quote = synthetic_quote(symbol, &mut self.rng, today, now);
        tracing::warn!(
            %symbol,
            source = %quote.source,
            price = quote.price,
            "real provider unavailable, using synthetic quote"
        );
        quote
    }

    /// Daily series for `symbol`, oldest first. Never fails and never
    /// returns an empty series; the last element is the latest quote.
    pub fn extract_series(&mut self, symbol: &Symbol) -> Vec<Quote> {
        let _span = tracing::info_span!("extract_series", %symbol).entered();

        if let Some(series) = self.with_retry(symbol, |sym, raw, today, now| {
            let series = normalize_series(sym, raw, today, now)?;
            if series.is_empty() {
                return Err(ProviderError::Malformed("empty series".into()));
            }
            Ok(series)
        }) {
            return series;
        }

        let (today, now) = clock();
        let series = synthetic_series(symbol, self.history_days, &mut self.rng, today, now);
        tracing::warn!(
            %symbol,
            days = series.len(),
            "real provider unavailable, using synthetic series"
        );
        series
    }

    /// Run the attempt loop; `None` means the budget was exhausted (or there
    /// is no provider) and the caller must fall back.
    fn with_retry<T>(
        &mut self,
        symbol: &Symbol,
        normalize: impl Fn(&Symbol, &RawQuote, NaiveDate, DateTime<Utc>) -> Result<T, ProviderError>,
    ) -> Option<T> {
        let provider = match self.provider.as_deref() {
            Some(p) => p,
            None => {
                tracing::debug!(%symbol, "offline mode, skipping provider");
                return None;
            }
        };

        let max_attempts = self.policy.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let delay = self.policy.backoff(attempt, &mut self.rng);
                tracing::info!(
                    %symbol,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "backing off before retry"
                );
                self.sleeper.sleep(delay);
            }

            let outcome = provider.fetch(symbol, self.policy.timeout).and_then(|raw| {
                let (today, now) = clock();
                normalize(symbol, &raw, today, now)
            });

            match outcome {
                Ok(value) => {
                    tracing::info!(
                        %symbol,
                        attempt,
                        provider = provider.name(),
                        outcome = "success",
                        "quote extracted"
                    );
                    return Some(value);
                }
                Err(e) if e.is_rate_limited() => {
                    tracing::warn!(
                        %symbol,
                        attempt,
                        max_attempts,
                        provider = provider.name(),
                        outcome = e.kind(),
                        "rate limited by provider"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        %symbol,
                        attempt,
                        max_attempts,
                        provider = provider.name(),
                        outcome = e.kind(),
                        error = %e,
                        "extraction attempt failed"
                    );
                }
            }
        }

        tracing::warn!(%symbol, max_attempts, "retry budget exhausted");
        None
    }
}

fn clock() -> (NaiveDate, DateTime<Utc>) {
    let now = Utc::now();
    (now.date_naive(), now)
}
