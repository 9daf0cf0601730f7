//! Wiring: turns a [`PipelineConfig`] into a ready extractor and processor.
//!
//! Provider resolution:
//! 1. `offline` (or the offline override) → no provider, synthetic only
//! 2. `alpha_vantage` → requires a key from config or environment
//! 3. `yahoo` → default, no credentials

use crate::config::{ConfigError, PipelineConfig, ProviderKind};
use crate::processor::{PacingPolicy, PortfolioProcessor};
use quotelab_core::data::{AlphaVantageProvider, QuoteProvider, YahooProvider};
use quotelab_core::extract::{Extractor, Sleeper};
use quotelab_core::store::{QuoteStore, SqliteQuoteStore, StorageError};
use std::sync::Arc;

/// Build the provider named by the config, or `None` when running offline.
pub fn build_provider(
    config: &PipelineConfig,
) -> Result<Option<Box<dyn QuoteProvider>>, ConfigError> {
    let provider: Box<dyn QuoteProvider> = match config.provider {
        ProviderKind::Offline => return Ok(None),
        ProviderKind::Yahoo => Box::new(
            YahooProvider::new(config.history_days)
                .map_err(|e| ConfigError::Provider(e.to_string()))?,
        ),
        ProviderKind::AlphaVantage => {
            let key = config.resolve_api_key().ok_or(ConfigError::MissingApiKey)?;
            Box::new(
                AlphaVantageProvider::new(key, config.history_days)
                    .map_err(|e| ConfigError::Provider(e.to_string()))?,
            )
        }
    };
    Ok(Some(provider))
}

pub fn build_extractor(
    config: &PipelineConfig,
    sleeper: Arc<dyn Sleeper>,
) -> Result<Extractor, ConfigError> {
    let extractor = match build_provider(config)? {
        Some(provider) => Extractor::new(provider, config.retry_policy(), sleeper),
        None => Extractor::offline(sleeper),
    };
    let extractor = extractor.with_history_days(config.history_days as usize);
    Ok(match config.seed {
        Some(seed) => extractor.with_seed(seed),
        None => extractor,
    })
}

pub fn open_store(config: &PipelineConfig) -> Result<Arc<dyn QuoteStore>, StorageError> {
    Ok(Arc::new(SqliteQuoteStore::open(&config.database)?))
}

/// Extractor + store + pacing, all from one config.
pub fn build_processor(
    config: &PipelineConfig,
    store: Arc<dyn QuoteStore>,
    sleeper: Arc<dyn Sleeper>,
) -> Result<PortfolioProcessor, ConfigError> {
    let extractor = build_extractor(config, Arc::clone(&sleeper))?;
    let (min, max) = config.pacing_range();
    // Offline runs never touch the network, so there is nothing to pace.
    let pacing = if config.provider == ProviderKind::Offline {
        PacingPolicy::none()
    } else {
        PacingPolicy::new(min, max)
    };
    let processor = PortfolioProcessor::new(extractor, store, sleeper).with_pacing(pacing);
    Ok(match config.seed {
        Some(seed) => processor.with_seed(seed.wrapping_add(1)),
        None => processor,
    })
}
