//! Portfolio-level summary of one batch of quotes.

use crate::domain::{Quote, Symbol};
use serde::{Deserialize, Serialize};

/// Daily change (percent) above which a quote is flagged as a strong uptrend.
pub const UPTREND_THRESHOLD: f64 = 2.0;
/// Daily change (percent) below which a quote is flagged as a significant drop.
pub const DROP_THRESHOLD: f64 = -2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performer {
    pub symbol: Symbol,
    pub change_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    StrongUptrend,
    SignificantDrop,
}

impl RecommendationKind {
    pub fn label(&self) -> &'static str {
        match self {
            RecommendationKind::StrongUptrend => "strong uptrend",
            RecommendationKind::SignificantDrop => "significant drop",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub symbol: Symbol,
    pub change_percent: f64,
    pub kind: RecommendationKind,
}

/// Aggregate view over a batch. Averages are `None` for an empty batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_assets: usize,
    pub average_price: Option<f64>,
    pub total_volume: u64,
    pub average_change: Option<f64>,
    /// Sum of prices (one unit of each asset).
    pub total_value: f64,
    pub best: Option<Performer>,
    pub worst: Option<Performer>,
    pub recommendations: Vec<Recommendation>,
}

pub fn summarize(batch: &[Quote]) -> Summary {
    let n = batch.len();
    let total_value: f64 = batch.iter().map(|q| q.price).sum();
    let total_change: f64 = batch.iter().map(|q| q.change_percent).sum();
    let total_volume = batch.iter().fold(0u64, |acc, q| acc.saturating_add(q.volume));

    let (average_price, average_change) = if n == 0 {
        (None, None)
    } else {
        (Some(total_value / n as f64), Some(total_change / n as f64))
    };

    // Strict comparisons keep the first occurrence on ties.
    let mut best: Option<&Quote> = None;
    let mut worst: Option<&Quote> = None;
    for q in batch {
        if best.map_or(true, |b| q.change_percent > b.change_percent) {
            best = Some(q);
        }
        if worst.map_or(true, |w| q.change_percent < w.change_percent) {
            worst = Some(q);
        }
    }

    let recommendations = batch
        .iter()
        .filter_map(|q| {
            let kind = if q.change_percent > UPTREND_THRESHOLD {
                RecommendationKind::StrongUptrend
            } else if q.change_percent < DROP_THRESHOLD {
                RecommendationKind::SignificantDrop
            } else {
                return None;
            };
            Some(Recommendation {
                symbol: q.symbol.clone(),
                change_percent: q.change_percent,
                kind,
            })
        })
        .collect();

    Summary {
        total_assets: n,
        average_price,
        total_volume,
        average_change,
        total_value,
        best: best.map(performer),
        worst: worst.map(performer),
        recommendations,
    }
}

/// Biggest gainers and losers of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopMovers {
    pub gainers: Vec<Performer>,
    pub losers: Vec<Performer>,
}

/// The `n` largest and `n` smallest daily changes. Ties keep batch order.
pub fn top_movers(batch: &[Quote], n: usize) -> TopMovers {
    let mut sorted: Vec<&Quote> = batch.iter().collect();
    sorted.sort_by(|a, b| b.change_percent.total_cmp(&a.change_percent));
    let gainers = sorted.iter().take(n).map(|q| performer(q)).collect();

    sorted.sort_by(|a, b| a.change_percent.total_cmp(&b.change_percent));
    let losers = sorted.iter().take(n).map(|q| performer(q)).collect();

    TopMovers { gainers, losers }
}

fn performer(q: &Quote) -> Performer {
    Performer {
        symbol: q.symbol.clone(),
        change_percent: q.change_percent,
    }
}
