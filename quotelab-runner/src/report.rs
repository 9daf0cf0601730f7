//! Portfolio report: everything a run produced, as plain serializable data.

use crate::processor::PortfolioRun;
use crate::stats::RunStats;
use chrono::{DateTime, Utc};
use quotelab_core::analytics::{
    detect_trends, liquidity_ranking, price_stats, summarize, top_movers, volatility_ranking,
    LiquidityEntry, PriceStats, Summary, TopMovers, TrendSignal, VolatilityEntry,
};
use quotelab_core::Quote;
use serde::{Deserialize, Serialize};

/// Bumped whenever the JSON layout changes incompatibly.
pub const SCHEMA_VERSION: u32 = 1;

/// Movers listed on each side of the report.
pub const TOP_MOVERS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    /// True when any quote in the batch is synthetic.
    pub has_synthetic: bool,
    pub stats: Option<RunStats>,
    pub summary: Summary,
    pub top_movers: TopMovers,
    pub trends: Vec<TrendSignal>,
    pub volatility: Vec<VolatilityEntry>,
    pub liquidity: Vec<LiquidityEntry>,
    pub price_stats: Vec<PriceStats>,
    pub quotes: Vec<Quote>,
}

impl PortfolioReport {
    /// Build from a latest-quote batch and (possibly empty) history.
    ///
    /// Rankings and trends use `history` when it has data and fall back to
    /// the batch itself otherwise.
    pub fn build(
        quotes: Vec<Quote>,
        history: &[Quote],
        stats: Option<RunStats>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let series: &[Quote] = if history.is_empty() { &quotes } else { history };
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at,
            has_synthetic: quotes.iter().any(Quote::is_synthetic),
            stats,
            summary: summarize(&quotes),
            top_movers: top_movers(&quotes, TOP_MOVERS),
            trends: detect_trends(series),
            volatility: volatility_ranking(series),
            liquidity: liquidity_ranking(series),
            price_stats: price_stats(series),
            quotes,
        }
    }

    pub fn from_run(run: PortfolioRun, generated_at: DateTime<Utc>) -> Self {
        let PortfolioRun {
            quotes,
            history,
            stats,
        } = run;
        Self::build(quotes, &history, Some(stats), generated_at)
    }
}
