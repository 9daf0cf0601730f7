//! Derived portfolio analytics: summary, trend signals, rankings.
//!
//! Every function is pure over a slice of quotes. Per-symbol results follow
//! the order in which symbols first appear in the input.

pub mod ranking;
pub mod sma;
pub mod summary;
pub mod trend;

pub use ranking::{
    liquidity_ranking, price_stats, volatility_ranking, Level, LiquidityEntry, PriceStats,
    VolatilityEntry,
};
pub use sma::{rolling_sma, trailing_sma, LONG_WINDOW, SHORT_WINDOW};
pub use summary::{
    summarize, top_movers, Performer, Recommendation, RecommendationKind, Summary, TopMovers,
};
pub use trend::{classify, detect_trends, Action, TrendClass, TrendSignal};

use crate::domain::{Quote, Symbol};

/// Group quotes by symbol, preserving first-appearance order of symbols and
/// input order within each group.
pub(crate) fn group_by_symbol(quotes: &[Quote]) -> Vec<(Symbol, Vec<&Quote>)> {
    let mut groups: Vec<(Symbol, Vec<&Quote>)> = Vec::new();
    for q in quotes {
        match groups.iter_mut().find(|(s, _)| *s == q.symbol) {
            Some((_, members)) => members.push(q),
            None => groups.push((q.symbol.clone(), vec![q])),
        }
    }
    groups
}
