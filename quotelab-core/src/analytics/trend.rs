//! Moving-average trend classification.

use super::group_by_symbol;
use super::sma::{trailing_sma, LONG_WINDOW, SHORT_WINDOW};
use crate::domain::{Quote, Symbol};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendClass {
    StrongUptrend,
    ModerateUptrend,
    StrongDowntrend,
    ModerateDowntrend,
    Sideways,
    InsufficientData,
}

impl TrendClass {
    pub fn label(&self) -> &'static str {
        match self {
            TrendClass::StrongUptrend => "strong uptrend",
            TrendClass::ModerateUptrend => "moderate uptrend",
            TrendClass::StrongDowntrend => "strong downtrend",
            TrendClass::ModerateDowntrend => "moderate downtrend",
            TrendClass::Sideways => "sideways",
            TrendClass::InsufficientData => "insufficient data",
        }
    }

    pub fn action(&self) -> Action {
        match self {
            TrendClass::StrongUptrend | TrendClass::ModerateUptrend => Action::Buy,
            TrendClass::StrongDowntrend | TrendClass::ModerateDowntrend => Action::Sell,
            TrendClass::Sideways | TrendClass::InsufficientData => Action::Wait,
        }
    }
}

impl fmt::Display for TrendClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Wait,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Wait => "WAIT",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSignal {
    pub symbol: Symbol,
    pub current_price: f64,
    pub short_ma: Option<f64>,
    pub long_ma: Option<f64>,
    pub classification: TrendClass,
    pub action: Action,
}

/// Classify the latest price against its short and long moving averages.
///
/// Rules are checked in order; the first match wins.
pub fn classify(price: f64, short_ma: Option<f64>, long_ma: Option<f64>) -> TrendClass {
    let (short, long) = match (short_ma, long_ma) {
        (Some(s), Some(l)) => (s, l),
        _ => return TrendClass::InsufficientData,
    };

    if price > short && short > long {
        TrendClass::StrongUptrend
    } else if price > short && short < long {
        TrendClass::ModerateUptrend
    } else if price < short && short < long {
        TrendClass::StrongDowntrend
    } else if price < short && short > long {
        TrendClass::ModerateDowntrend
    } else {
        TrendClass::Sideways
    }
}

/// One signal per symbol, in order of first appearance in `history`.
pub fn detect_trends(history: &[Quote]) -> Vec<TrendSignal> {
    group_by_symbol(history)
        .into_iter()
        .filter_map(|(symbol, mut quotes)| {
            quotes.sort_by_key(|q| q.observed_date);
            let closes: Vec<f64> = quotes.iter().map(|q| q.price).collect();
            let current_price = *closes.last()?;
            let short_ma = trailing_sma(&closes, SHORT_WINDOW);
            let long_ma = trailing_sma(&closes, LONG_WINDOW);
            let classification = classify(current_price, short_ma, long_ma);
            Some(TrendSignal {
                symbol,
                current_price,
                short_ma,
                long_ma,
                classification,
                action: classification.action(),
            })
        })
        .collect()
}
