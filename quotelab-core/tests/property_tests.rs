//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. Symbol parsing normalizes case and whitespace
//! 2. Synthetic quotes stay within their documented bounds
//! 3. Upsert is idempotent per (symbol, date)
//! 4. Summary counts and extremes agree with the batch

use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use quotelab_core::analytics::summarize;
use quotelab_core::data::synthetic_quote;
use quotelab_core::store::{QuoteStore, SqliteQuoteStore};
use quotelab_core::{DataSource, Quote, Symbol};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_symbol() -> impl Strategy<Value = String> {
    "[A-Za-z0-9]{1,6}(\\.[A-Za-z]{1,2})?"
}

fn arb_price() -> impl Strategy<Value = f64> {
    (0.0..5000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_change() -> impl Strategy<Value = f64> {
    (-20.0..20.0_f64).prop_map(|c| (c * 100.0).round() / 100.0)
}

fn make_quote(symbol: &str, price: f64, change: f64) -> Quote {
    Quote {
        symbol: Symbol::parse(symbol).unwrap(),
        company_name: symbol.to_string(),
        price,
        volume: 1_000,
        change_percent: change,
        observed_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        source: DataSource::RealProvider,
        captured_at: Utc.with_ymd_and_hms(2024, 5, 2, 20, 0, 0).unwrap(),
    }
}

// ── 1. Symbol parsing ────────────────────────────────────────────────

proptest! {
    #[test]
    fn symbol_parse_trims_and_uppercases(raw in arb_symbol(), pad in " {0,3}") {
        let padded = format!("{pad}{raw}{pad}");
        let sym = Symbol::parse(&padded).unwrap();
        prop_assert_eq!(sym.as_str(), raw.to_uppercase());
    }

    #[test]
    fn symbol_rejects_forbidden_characters(raw in "[A-Z]{1,5}[ /;'*][A-Z]{1,3}") {
        prop_assert!(Symbol::parse(&raw).is_err());
    }
}

// ── 2. Synthetic bounds ──────────────────────────────────────────────

proptest! {
    #[test]
    fn synthetic_quote_within_bounds(raw in arb_symbol(), seed in any::<u64>()) {
        let sym = Symbol::parse(&raw).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let today = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let q = synthetic_quote(&sym, &mut rng, today, Utc::now());

        prop_assert!(q.price >= 0.0);
        prop_assert!(q.change_percent >= -5.0 && q.change_percent <= 5.0);
        prop_assert!(q.volume >= 1_000_000 && q.volume <= 10_000_000);
        prop_assert_eq!(q.source, DataSource::Synthetic);
        prop_assert_eq!(q.observed_date, today);
    }
}

// ── 3. Idempotent upsert ─────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn repeated_upserts_leave_one_row(prices in prop::collection::vec(arb_price(), 1..6)) {
        let store = SqliteQuoteStore::in_memory().unwrap();
        for p in &prices {
            store.upsert(&make_quote("AAPL", *p, 0.0)).unwrap();
        }
        prop_assert_eq!(store.count().unwrap(), 1);
        let rows = store.query_latest(10).unwrap();
        prop_assert_eq!(rows[0].price, *prices.last().unwrap());
    }
}

// ── 4. Summary consistency ───────────────────────────────────────────

proptest! {
    #[test]
    fn summary_matches_batch(changes in prop::collection::vec((arb_price(), arb_change()), 0..12)) {
        let batch: Vec<Quote> = changes
            .iter()
            .enumerate()
            .map(|(i, (p, c))| make_quote(&format!("S{i}"), *p, *c))
            .collect();
        let s = summarize(&batch);

        prop_assert_eq!(s.total_assets, batch.len());
        prop_assert_eq!(s.average_price.is_none(), batch.is_empty());
        if let (Some(best), Some(worst)) = (&s.best, &s.worst) {
            prop_assert!(batch.iter().all(|q| q.change_percent <= best.change_percent));
            prop_assert!(batch.iter().all(|q| q.change_percent >= worst.change_percent));
        }
        let expected = batch
            .iter()
            .filter(|q| q.change_percent > 2.0 || q.change_percent < -2.0)
            .count();
        prop_assert_eq!(s.recommendations.len(), expected);
    }
}
