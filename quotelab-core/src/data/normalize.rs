//! Provider payload → Quote normalization.
//!
//! Rules:
//! - Only points with a finite close count ("valid points").
//! - A point's `change_percent` is `(close - prev_close) / prev_close * 100`
//!   against the previous valid point; the first point (or a zero previous
//!   close) gets `0.0`.
//! - Points without a date are dropped, except the newest one, which is
//!   dated `today`.
//! - Two points on the same date collapse to the later one.
//! - With no valid point at all, the provider's market price becomes a single
//!   quote dated `today` with zero volume and zero change.
//! - Price and change are rounded to two decimals.

use super::companies;
use super::provider::{ProviderError, RawQuote};
use crate::domain::{round2, DataSource, Quote, Symbol};
use chrono::{DateTime, NaiveDate, Utc};

/// Normalize every valid point of the payload, oldest first.
pub fn normalize_series(
    symbol: &Symbol,
    raw: &RawQuote,
    today: NaiveDate,
    captured_at: DateTime<Utc>,
) -> Result<Vec<Quote>, ProviderError> {
    let company_name = raw
        .company_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from)
        .unwrap_or_else(|| companies::display_name(symbol.as_str()));

    let valid: Vec<_> = raw
        .points
        .iter()
        .filter(|p| p.close.is_some_and(f64::is_finite))
        .collect();

    let make = |price: f64, volume: u64, change: f64, date: NaiveDate| -> Result<Quote, ProviderError> {
        if !price.is_finite() || price < 0.0 {
            return Err(ProviderError::Malformed(format!(
                "invalid price {price} for {symbol}"
            )));
        }
        Ok(Quote {
            symbol: symbol.clone(),
            company_name: company_name.clone(),
            price: round2(price),
            volume,
            change_percent: round2(change),
            observed_date: date,
            source: DataSource::RealProvider,
            captured_at,
        })
    };

    if valid.is_empty() {
        return match raw.market_price {
            Some(price) => Ok(vec![make(price, 0, 0.0, today)?]),
            None => Err(ProviderError::Malformed(format!(
                "no close prices for {symbol}"
            ))),
        };
    }

    let last_index = valid.len() - 1;
    let mut quotes: Vec<Quote> = Vec::with_capacity(valid.len());
    let mut prev_close: Option<f64> = None;

    for (i, point) in valid.iter().enumerate() {
        let close = point.close.unwrap_or(f64::NAN);
        let change = match prev_close {
            Some(prev) if prev != 0.0 => (close - prev) / prev * 100.0,
            _ => 0.0,
        };
        prev_close = Some(close);

        let date = match point.date {
            Some(d) => d,
            None if i == last_index => today,
            None => continue,
        };

        let quote = make(close, point.volume.unwrap_or(0), change, date)?;
        match quotes.last_mut() {
            Some(last) if last.observed_date == date => *last = quote,
            _ => quotes.push(quote),
        }
    }

    Ok(quotes)
}

/// Normalize the payload's newest valid point.
pub fn normalize_latest(
    symbol: &Symbol,
    raw: &RawQuote,
    today: NaiveDate,
    captured_at: DateTime<Utc>,
) -> Result<Quote, ProviderError> {
    normalize_series(symbol, raw, today, captured_at)?
        .pop()
        .ok_or_else(|| ProviderError::Malformed(format!("no usable points for {symbol}")))
}
