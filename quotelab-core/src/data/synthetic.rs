//! Synthetic fallback quotes.
//!
//! Used only after every real attempt has failed. Values are random but the
//! shape is fixed: base price from the reference table perturbed by at most
//! ±5%, volume between 1M and 10M. Every quote is tagged
//! `DataSource::Synthetic`.

use super::companies;
use crate::domain::{round2, DataSource, Quote, Symbol};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::Rng;

/// Largest absolute daily perturbation, in percent.
pub const MAX_DELTA_PCT: f64 = 5.0;
pub const MIN_VOLUME: u64 = 1_000_000;
pub const MAX_VOLUME: u64 = 10_000_000;

/// One synthetic quote for `today`: `price = base * (1 + delta/100)` with
/// `change_percent = delta`.
pub fn synthetic_quote<R: Rng + ?Sized>(
    symbol: &Symbol,
    rng: &mut R,
    today: NaiveDate,
    captured_at: DateTime<Utc>,
) -> Quote {
    let base = companies::base_price(symbol.as_str());
    let delta: f64 = rng.gen_range(-MAX_DELTA_PCT..=MAX_DELTA_PCT);
    Quote {
        symbol: symbol.clone(),
        company_name: companies::display_name(symbol.as_str()),
        price: round2(base * (1.0 + delta / 100.0)),
        volume: rng.gen_range(MIN_VOLUME..=MAX_VOLUME),
        change_percent: round2(delta),
        observed_date: today,
        source: DataSource::Synthetic,
        captured_at,
    }
}

/// A random walk of `days` daily quotes ending on `today`, oldest first.
///
/// Starts from the symbol's base price; each day moves by a fresh
/// `delta` in ±5%, which is also that day's `change_percent`.
pub fn synthetic_series<R: Rng + ?Sized>(
    symbol: &Symbol,
    days: usize,
    rng: &mut R,
    today: NaiveDate,
    captured_at: DateTime<Utc>,
) -> Vec<Quote> {
    let days = days.max(1);
    let name = companies::display_name(symbol.as_str());
    let mut price = companies::base_price(symbol.as_str());

    (0..days)
        .map(|i| {
            let delta: f64 = rng.gen_range(-MAX_DELTA_PCT..=MAX_DELTA_PCT);
            price *= 1.0 + delta / 100.0;
            Quote {
                symbol: symbol.clone(),
                company_name: name.clone(),
                price: round2(price),
                volume: rng.gen_range(MIN_VOLUME..=MAX_VOLUME),
                change_percent: round2(delta),
                observed_date: today - Duration::days((days - 1 - i) as i64),
                source: DataSource::Synthetic,
                captured_at,
            }
        })
        .collect()
}
