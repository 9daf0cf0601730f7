//! Quote sources: provider trait, HTTP providers, normalization and the
//! synthetic fallback generator.

pub mod alpha_vantage;
pub mod companies;
pub mod normalize;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageProvider;
pub use normalize::{normalize_latest, normalize_series};
pub use provider::{ProviderError, QuoteProvider, RawPoint, RawQuote};
pub use synthetic::{synthetic_quote, synthetic_series};
pub use yahoo::YahooProvider;
