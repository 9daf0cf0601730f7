//! QuoteLab Runner: portfolio runs, configuration, reports, export.
//!
//! This crate builds on `quotelab-core` to provide:
//! - TOML pipeline configuration with validation
//! - Provider/extractor/store wiring from config
//! - Portfolio processor with pacing and best-effort persistence
//! - Run statistics and structured summary logging
//! - Portfolio reports with JSON and CSV export

pub mod config;
pub mod export;
pub mod pipeline;
pub mod processor;
pub mod report;
pub mod stats;

pub use config::{ConfigError, PacingSettings, PipelineConfig, ProviderKind, RetrySettings};
pub use export::{export_json, export_quotes_csv, import_json, load_report, save_report, ReportPaths};
pub use pipeline::{build_extractor, build_processor, build_provider, open_store};
pub use processor::{PacingPolicy, PipelineError, PortfolioProcessor, PortfolioRun};
pub use report::{PortfolioReport, SCHEMA_VERSION};
pub use stats::RunStats;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<PipelineConfig>();
        assert_sync::<PipelineConfig>();
    }

    #[test]
    fn report_is_send_sync() {
        assert_send::<PortfolioReport>();
        assert_sync::<PortfolioReport>();
        assert_send::<RunStats>();
        assert_sync::<RunStats>();
    }

    #[test]
    fn processor_is_send() {
        assert_send::<PortfolioProcessor>();
    }
}
