//! Alpha Vantage quote provider (TIME_SERIES_DAILY, compact output).
//!
//! The free tier signals throttling inside a 200 response (`Note` or
//! `Information` keys) rather than with HTTP 429, so both are mapped to
//! `RateLimited`.

use super::provider::{ProviderError, QuoteProvider, RawPoint, RawQuote};
use crate::domain::Symbol;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

const BASE_URL: &str = "https://www.alphavantage.co/query";

#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    series: Option<BTreeMap<String, DailyBar>>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailyBar {
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

pub struct AlphaVantageProvider {
    client: reqwest::blocking::Client,
    api_key: String,
    history_bars: usize,
}

impl AlphaVantageProvider {
    pub fn new(
        api_key: impl Into<String>,
        history_bars: u32,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            history_bars: history_bars.max(2) as usize,
        })
    }

    fn parse_response(
        &self,
        symbol: &Symbol,
        resp: DailyResponse,
    ) -> Result<RawQuote, ProviderError> {
        if resp.note.is_some() || resp.information.is_some() {
            return Err(ProviderError::RateLimited);
        }
        if resp.error_message.is_some() {
            return Err(ProviderError::NotFound {
                symbol: symbol.to_string(),
            });
        }
        let series = resp
            .series
            .ok_or_else(|| ProviderError::Malformed("missing daily time series".into()))?;

        let points = parse_series(series, self.history_bars)?;
        Ok(RawQuote {
            symbol: symbol.to_string(),
            company_name: None,
            market_price: None,
            points,
        })
    }
}

/// Keep the newest `keep` days, oldest first.
fn parse_series(
    series: BTreeMap<String, DailyBar>,
    keep: usize,
) -> Result<Vec<RawPoint>, ProviderError> {
    let mut points = Vec::with_capacity(series.len());
    for (date, bar) in series {
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| ProviderError::Malformed(format!("bad date '{date}': {e}")))?;
        points.push(RawPoint {
            date: Some(date),
            close: bar.close.trim().parse::<f64>().ok(),
            volume: bar.volume.trim().parse::<u64>().ok(),
        });
    }
    let skip = points.len().saturating_sub(keep);
    Ok(points.split_off(skip))
}

impl QuoteProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        "alpha_vantage"
    }

    fn fetch(&self, symbol: &Symbol, timeout: Duration) -> Result<RawQuote, ProviderError> {
        let resp = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol.as_str()),
                ("outputsize", "compact"),
                ("apikey", self.api_key.as_str()),
            ])
            .timeout(timeout)
            .send()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProviderError::Transport(format!("HTTP {status} for {symbol}")));
        }

        let body: DailyResponse = resp.json().map_err(|e| {
            ProviderError::Malformed(format!("failed to parse response for {symbol}: {e}"))
        })?;
        self.parse_response(symbol, body)
    }
}
