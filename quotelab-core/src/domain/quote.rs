use super::symbol::Symbol;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a quote's numbers came from.
///
/// Downstream consumers filter or flag simulated rows with this tag, so it is
/// persisted alongside every quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    RealProvider,
    Synthetic,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::RealProvider => "real_provider",
            DataSource::Synthetic => "synthetic",
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, DataSource::Synthetic)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "real_provider" => Ok(DataSource::RealProvider),
            "synthetic" => Ok(DataSource::Synthetic),
            other => Err(format!("unknown data source '{other}'")),
        }
    }
}

/// One priced observation of one instrument on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: Symbol,
    pub company_name: String,
    pub price: f64,
    pub volume: u64,
    pub change_percent: f64,
    pub observed_date: NaiveDate,
    pub source: DataSource,
    pub captured_at: DateTime<Utc>,
}

impl Quote {
    pub fn is_synthetic(&self) -> bool {
        self.source.is_synthetic()
    }
}

/// Round to two decimals, the precision quotes are stored and reported at.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
