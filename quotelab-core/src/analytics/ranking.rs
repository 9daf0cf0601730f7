//! Per-symbol dispersion and liquidity rankings, plus descriptive price
//! statistics.

use super::group_by_symbol;
use crate::domain::{Quote, Symbol};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const HIGH_RISK_STD: f64 = 3.0;
pub const MEDIUM_RISK_STD: f64 = 2.0;
pub const HIGH_LIQUIDITY_VOLUME: f64 = 2_000_000.0;
pub const MEDIUM_LIQUIDITY_VOLUME: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    High,
    Medium,
    Low,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::High => "high",
            Level::Medium => "medium",
            Level::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityEntry {
    pub symbol: Symbol,
    /// Sample standard deviation of daily change; `None` below two points.
    pub std_change: Option<f64>,
    pub risk: Level,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityEntry {
    pub symbol: Symbol,
    pub mean_volume: f64,
    pub liquidity: Level,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    pub symbol: Symbol,
    pub count: usize,
    pub mean: f64,
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
}

pub fn risk_level(std_change: Option<f64>) -> Level {
    match std_change {
        Some(s) if s > HIGH_RISK_STD => Level::High,
        Some(s) if s > MEDIUM_RISK_STD => Level::Medium,
        _ => Level::Low,
    }
}

pub fn liquidity_level(mean_volume: f64) -> Level {
    if mean_volume > HIGH_LIQUIDITY_VOLUME {
        Level::High
    } else if mean_volume > MEDIUM_LIQUIDITY_VOLUME {
        Level::Medium
    } else {
        Level::Low
    }
}

/// Symbols ordered by daily-change dispersion, most volatile first.
///
/// The sort is stable: equal deviations keep first-appearance order, and
/// symbols with an undefined deviation go last.
pub fn volatility_ranking(history: &[Quote]) -> Vec<VolatilityEntry> {
    let mut entries: Vec<VolatilityEntry> = group_by_symbol(history)
        .into_iter()
        .map(|(symbol, quotes)| {
            let changes: Vec<f64> = quotes.iter().map(|q| q.change_percent).collect();
            let std_change = sample_std(&changes);
            VolatilityEntry {
                symbol,
                std_change,
                risk: risk_level(std_change),
            }
        })
        .collect();

    entries.sort_by(|a, b| match (a.std_change, b.std_change) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    entries
}

/// Symbols ordered by mean traded volume, most liquid first (stable).
pub fn liquidity_ranking(history: &[Quote]) -> Vec<LiquidityEntry> {
    let mut entries: Vec<LiquidityEntry> = group_by_symbol(history)
        .into_iter()
        .map(|(symbol, quotes)| {
            let volumes: Vec<f64> = quotes.iter().map(|q| q.volume as f64).collect();
            let mean_volume = mean(&volumes).unwrap_or(0.0);
            LiquidityEntry {
                symbol,
                mean_volume,
                liquidity: liquidity_level(mean_volume),
            }
        })
        .collect();

    entries.sort_by(|a, b| b.mean_volume.total_cmp(&a.mean_volume));
    entries
}

/// Descriptive statistics of price per symbol, first-appearance order.
pub fn price_stats(history: &[Quote]) -> Vec<PriceStats> {
    group_by_symbol(history)
        .into_iter()
        .filter_map(|(symbol, quotes)| {
            let prices: Vec<f64> = quotes.iter().map(|q| q.price).collect();
            let mean = mean(&prices)?;
            let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
            let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            Some(PriceStats {
                symbol,
                count: prices.len(),
                mean,
                std_dev: sample_std(&prices),
                min,
                max,
            })
        })
        .collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}
