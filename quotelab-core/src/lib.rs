//! QuoteLab Core: domain types, quote providers, extraction, storage, analytics.
//!
//! This crate contains the data path of the pipeline:
//! - Domain types (symbols, quotes, data-source tags)
//! - Quote providers (Yahoo chart API, Alpha Vantage)
//! - Payload normalization and the synthetic fallback generator
//! - Retry/fallback extractor that always yields a quote
//! - Idempotent SQLite quote store
//! - Pure analytics over quote batches

pub mod analytics;
pub mod data;
pub mod domain;
pub mod extract;
pub mod store;

pub use domain::{DataSource, Quote, Symbol, SymbolError};
pub use extract::Extractor;
pub use store::{QuoteStore, SqliteQuoteStore, StorageError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types shared with the runner are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Quote>();
        require_sync::<domain::Quote>();
        require_send::<domain::Symbol>();
        require_sync::<domain::Symbol>();

        // Providers
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::AlphaVantageProvider>();
        require_sync::<data::AlphaVantageProvider>();

        // Storage
        require_send::<store::SqliteQuoteStore>();
        require_sync::<store::SqliteQuoteStore>();

        // Extraction
        require_send::<extract::Extractor>();
        require_send::<extract::RecordingSleeper>();
        require_sync::<extract::RecordingSleeper>();

        // Analytics outputs
        require_send::<analytics::Summary>();
        require_sync::<analytics::Summary>();
        require_send::<analytics::TrendSignal>();
        require_sync::<analytics::TrendSignal>();
    }

    /// Architecture contract: the store trait is object safe, so the
    /// processor can hold any backend behind `Arc<dyn QuoteStore>`.
    #[test]
    fn quote_store_is_object_safe() {
        fn _check(store: &dyn QuoteStore) -> Result<u64, StorageError> {
            store.count()
        }
        let store = SqliteQuoteStore::in_memory().unwrap();
        assert_eq!(_check(&store).unwrap(), 0);
    }
}
