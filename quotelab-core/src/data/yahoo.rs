//! Yahoo Finance quote provider.
//!
//! Fetches the recent daily series from Yahoo's v8 chart API. One call per
//! `fetch`; retrying is the extractor's job. HTTP 429 is reported as
//! `RateLimited`, any other non-200 status as `Transport`.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes; anything that does not match the expected shape is reported as
//! `Malformed`.

use super::provider::{ProviderError, QuoteProvider, RawPoint, RawQuote};
use crate::domain::Symbol;
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;

const CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Extra calendar days requested on top of the weekday span, for exchange
/// holidays.
const HOLIDAY_MARGIN_DAYS: i64 = 10;

/// Calendar days to request so the window holds at least `bars` trading days.
fn lookback_calendar_days(bars: u32) -> i64 {
    (i64::from(bars) * 7 + 4) / 5 + HOLIDAY_MARGIN_DAYS
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Yahoo Finance chart API provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    history_bars: u32,
}

impl YahooProvider {
    /// Each fetch returns at most the newest `history_bars` daily points.
    pub fn new(history_bars: u32) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            history_bars: history_bars.max(2),
        })
    }

    fn chart_url(&self, symbol: &Symbol) -> String {
        let end_ts = Utc::now().timestamp();
        let start_ts = end_ts - lookback_calendar_days(self.history_bars) * 86_400;
        format!(
            "{CHART_BASE_URL}/{symbol}?period1={start_ts}&period2={end_ts}&interval=1d&includePrePost=true"
        )
    }

    /// Convert a chart API body into a provider-neutral payload.
    fn parse_response(symbol: &Symbol, resp: ChartResponse) -> Result<RawQuote, ProviderError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => ProviderError::NotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => ProviderError::Malformed(format!("{}: {}", err.code, err.description)),
            None => ProviderError::Malformed("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Malformed("result array is empty".into()))?;

        let timestamps = data.timestamp.unwrap_or_default();
        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Malformed("no quote data".into()))?;

        let mut points = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| ProviderError::Malformed(format!("invalid timestamp: {ts}")))?;
            points.push(RawPoint {
                date: Some(date),
                close: quote.close.get(i).copied().flatten(),
                volume: quote.volume.get(i).copied().flatten(),
            });
        }

        let (company_name, market_price) = match data.meta {
            Some(meta) => (meta.long_name.or(meta.short_name), meta.regular_market_price),
            None => (None, None),
        };

        Ok(RawQuote {
            symbol: symbol.to_string(),
            company_name,
            market_price,
            points,
        })
    }
}

/// Map a non-200 status to its failure class.
fn status_error(status: reqwest::StatusCode, symbol: &Symbol) -> Option<ProviderError> {
    match status {
        s if s.is_success() => None,
        reqwest::StatusCode::TOO_MANY_REQUESTS => Some(ProviderError::RateLimited),
        reqwest::StatusCode::NOT_FOUND => Some(ProviderError::NotFound {
            symbol: symbol.to_string(),
        }),
        s => Some(ProviderError::Transport(format!("HTTP {s} for {symbol}"))),
    }
}

impl QuoteProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, symbol: &Symbol, timeout: Duration) -> Result<RawQuote, ProviderError> {
        let resp = self
            .client
            .get(self.chart_url(symbol))
            .header("Accept", "application/json")
            .timeout(timeout)
            .send()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if let Some(err) = status_error(resp.status(), symbol) {
            return Err(err);
        }

        let chart: ChartResponse = resp.json().map_err(|e| {
            ProviderError::Malformed(format!("failed to parse response for {symbol}: {e}"))
        })?;

        let mut raw = Self::parse_response(symbol, chart)?;
        let skip = raw.points.len().saturating_sub(self.history_bars as usize);
        raw.points.drain(..skip);
        Ok(raw)
    }
}
