//! Integration tests for the retry/fallback extractor.
//!
//! Providers are scripted in-process; delays go through a recording sleeper so
//! nothing actually waits.

use chrono::NaiveDate;
use quotelab_core::data::{ProviderError, QuoteProvider, RawPoint, RawQuote};
use quotelab_core::extract::{Extractor, RecordingSleeper, RetryPolicy};
use quotelab_core::{DataSource, Symbol};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Test doubles ─────────────────────────────────────────────────────

struct ScriptedProvider {
    outcomes: Mutex<VecDeque<Result<RawQuote, ProviderError>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    fn new(outcomes: Vec<Result<RawQuote, ProviderError>>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: Arc::clone(&calls),
        };
        (provider, calls)
    }
}

impl QuoteProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch(&self, _symbol: &Symbol, _timeout: Duration) -> Result<RawQuote, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Transport("connection refused".into())))
    }
}

fn payload(closes: &[f64]) -> RawQuote {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    RawQuote {
        symbol: "MSFT".into(),
        company_name: None,
        market_price: None,
        points: closes
            .iter()
            .enumerate()
            .map(|(i, c)| RawPoint {
                date: start.checked_add_days(chrono::Days::new(i as u64)),
                close: Some(*c),
                volume: Some(1_000 + i as u64),
            })
            .collect(),
    }
}

fn rate_limited() -> Result<RawQuote, ProviderError> {
    Err(ProviderError::RateLimited)
}

fn msft() -> Symbol {
    Symbol::parse("msft").unwrap()
}

// ── Retry cadence ────────────────────────────────────────────────────

#[test]
fn rate_limit_twice_then_real_quote() {
    let (provider, calls) =
        ScriptedProvider::new(vec![rate_limited(), rate_limited(), Ok(payload(&[400.0, 410.0]))]);
    let sleeper = Arc::new(RecordingSleeper::new());
    let mut extractor =
        Extractor::new(Box::new(provider), RetryPolicy::default(), sleeper.clone()).with_seed(11);

    let quote = extractor.extract(&msft());

    assert_eq!(quote.source, DataSource::RealProvider);
    assert_eq!(quote.price, 410.0);
    assert_eq!(quote.change_percent, 2.5);
    assert_eq!(quote.company_name, "Microsoft Corporation");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    let delays = sleeper.delays();
    assert_eq!(delays.len(), 2);
    // 2 s * attempt plus 1..3 s of jitter.
    assert!(delays[0] >= Duration::from_secs(5) && delays[0] <= Duration::from_secs(7));
    assert!(delays[1] >= Duration::from_secs(7) && delays[1] <= Duration::from_secs(9));
}

#[test]
fn always_failing_provider_yields_synthetic() {
    for max_attempts in [1u32, 3, 5] {
        let (provider, calls) = ScriptedProvider::new(vec![]);
        let sleeper = Arc::new(RecordingSleeper::new());
        let policy = RetryPolicy {
            max_attempts,
            ..RetryPolicy::default()
        };
        let mut extractor =
            Extractor::new(Box::new(provider), policy, sleeper.clone()).with_seed(12);

        let quote = extractor.extract(&msft());

        assert_eq!(quote.source, DataSource::Synthetic);
        assert_eq!(calls.load(Ordering::SeqCst), max_attempts as usize);
        assert_eq!(sleeper.delays().len(), max_attempts as usize - 1);
        // ±5% around the MSFT base price.
        assert!(quote.price >= 323.0 && quote.price <= 357.0, "{}", quote.price);
        assert!(quote.volume >= 1_000_000 && quote.volume <= 10_000_000);
    }
}

#[test]
fn mixed_failures_are_all_retried() {
    let (provider, calls) = ScriptedProvider::new(vec![
        Err(ProviderError::NotFound {
            symbol: "MSFT".into(),
        }),
        Err(ProviderError::Malformed("truncated body".into())),
        Ok(payload(&[100.0])),
    ]);
    let mut extractor = Extractor::new(
        Box::new(provider),
        RetryPolicy::default(),
        Arc::new(RecordingSleeper::new()),
    );

    let quote = extractor.extract(&msft());
    assert_eq!(quote.source, DataSource::RealProvider);
    assert_eq!(quote.change_percent, 0.0);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

// ── Rate limits ──────────────────────────────────────────────────────

fn always_rate_limited(n: usize) -> Vec<Result<RawQuote, ProviderError>> {
    (0..n).map(|_| rate_limited()).collect()
}

#[test]
fn persistent_rate_limit_spends_whole_budget() {
    let (provider, calls) = ScriptedProvider::new(always_rate_limited(5));
    let sleeper = Arc::new(RecordingSleeper::new());
    let policy = RetryPolicy {
        max_attempts: 5,
        ..RetryPolicy::default()
    };
    let mut extractor = Extractor::new(Box::new(provider), policy, sleeper.clone()).with_seed(3);

    let quote = extractor.extract(&msft());

    assert_eq!(quote.source, DataSource::Synthetic);
    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert_eq!(sleeper.delays().len(), 4);
}

#[test]
fn every_symbol_gets_a_fresh_budget() {
    let (provider, calls) = ScriptedProvider::new(always_rate_limited(9));
    let mut extractor = Extractor::new(
        Box::new(provider),
        RetryPolicy::default(),
        Arc::new(RecordingSleeper::new()),
    );

    for (i, raw) in ["AAPL", "MSFT", "VALE3.SA"].into_iter().enumerate() {
        let quote = extractor.extract(&Symbol::parse(raw).unwrap());
        assert!(quote.is_synthetic());
        assert_eq!(calls.load(Ordering::SeqCst), 3 * (i + 1), "{raw}");
    }
}

// ── Series extraction ────────────────────────────────────────────────

#[test]
fn series_last_point_matches_latest_extraction() {
    let closes = [10.0, 11.0, 12.1, 11.5];
    let (p1, _) = ScriptedProvider::new(vec![Ok(payload(&closes))]);
    let (p2, _) = ScriptedProvider::new(vec![Ok(payload(&closes))]);
    let sleeper = Arc::new(RecordingSleeper::new());

    let series = Extractor::new(Box::new(p1), RetryPolicy::default(), sleeper.clone())
        .extract_series(&msft());
    let latest = Extractor::new(Box::new(p2), RetryPolicy::default(), sleeper).extract(&msft());

    assert_eq!(series.len(), 4);
    let last = series.last().unwrap();
    assert_eq!(last.price, latest.price);
    assert_eq!(last.change_percent, latest.change_percent);
    assert_eq!(last.observed_date, latest.observed_date);
    assert!(series.windows(2).all(|w| w[0].observed_date < w[1].observed_date));
}

#[test]
fn seeded_offline_extraction_is_reproducible() {
    let sym = msft();
    let a = Extractor::offline(Arc::new(RecordingSleeper::new()))
        .with_seed(99)
        .extract_series(&sym);
    let b = Extractor::offline(Arc::new(RecordingSleeper::new()))
        .with_seed(99)
        .extract_series(&sym);

    let prices = |qs: &[quotelab_core::Quote]| qs.iter().map(|q| q.price).collect::<Vec<_>>();
    assert_eq!(prices(&a), prices(&b));
    assert_eq!(a.len(), quotelab_core::extract::DEFAULT_HISTORY_DAYS);
}
