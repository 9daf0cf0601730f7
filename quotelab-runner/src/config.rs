//! Pipeline configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working offline-capable configuration. Durations are written in seconds
//! as floats.

use quotelab_core::extract::RetryPolicy;
use quotelab_core::{Symbol, SymbolError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable consulted when no Alpha Vantage key is configured.
pub const ALPHA_VANTAGE_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid portfolio symbol: {0}")]
    Symbol(#[from] SymbolError),

    #[error("alpha_vantage provider needs an API key (set alpha_vantage_key or {ALPHA_VANTAGE_KEY_ENV})")]
    MissingApiKey,

    #[error("provider setup failed: {0}")]
    Provider(String),
}

/// Which quote source the extractor talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Yahoo,
    AlphaVantage,
    /// No network; every quote is synthetic.
    Offline,
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "yahoo" => Ok(ProviderKind::Yahoo),
            "alpha_vantage" | "alphavantage" => Ok(ProviderKind::AlphaVantage),
            "offline" | "synthetic" => Ok(ProviderKind::Offline),
            other => Err(format!(
                "unknown provider '{other}' (expected yahoo, alpha_vantage or offline)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_secs: f64,
    pub jitter_min_secs: f64,
    pub jitter_max_secs: f64,
    pub timeout_secs: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 2.0,
            jitter_min_secs: 1.0,
            jitter_max_secs: 3.0,
            timeout_secs: 10.0,
        }
    }
}

impl RetrySettings {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: secs(self.base_delay_secs),
            jitter_min: secs(self.jitter_min_secs),
            jitter_max: secs(self.jitter_max_secs),
            timeout: secs(self.timeout_secs),
        }
    }
}

/// Delay between consecutive symbols, uniform in `[min_secs, max_secs]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingSettings {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            min_secs: 2.0,
            max_secs: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// SQLite database file; its parent directory is created on open.
    pub database: PathBuf,
    pub provider: ProviderKind,
    pub alpha_vantage_key: Option<String>,
    /// Symbols processed when none are given on the command line.
    pub portfolio: Vec<String>,
    /// Daily points (trading days) fetched, or synthesized on fallback, per symbol.
    pub history_days: u32,
    /// Fixed RNG seed for reproducible jitter and synthetic data.
    pub seed: Option<u64>,
    pub retry: RetrySettings,
    pub pacing: PacingSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("data/portfolio.db"),
            provider: ProviderKind::default(),
            alpha_vantage_key: None,
            portfolio: ["AAPL", "MSFT", "PETR4.SA", "VALE3.SA", "ITUB4.SA"]
                .into_iter()
                .map(String::from)
                .collect(),
            history_days: 30,
            seed: None,
            retry: RetrySettings::default(),
            pacing: PacingSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.retry;
        if r.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be >= 1".into()));
        }
        for (name, value) in [
            ("retry.base_delay_secs", r.base_delay_secs),
            ("retry.jitter_min_secs", r.jitter_min_secs),
            ("retry.jitter_max_secs", r.jitter_max_secs),
            ("retry.timeout_secs", r.timeout_secs),
            ("pacing.min_secs", self.pacing.min_secs),
            ("pacing.max_secs", self.pacing.max_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if r.timeout_secs == 0.0 {
            return Err(ConfigError::Invalid("retry.timeout_secs must be > 0".into()));
        }
        if r.jitter_min_secs > r.jitter_max_secs {
            return Err(ConfigError::Invalid(format!(
                "retry jitter range is inverted: {} > {}",
                r.jitter_min_secs, r.jitter_max_secs
            )));
        }
        if self.pacing.min_secs > self.pacing.max_secs {
            return Err(ConfigError::Invalid(format!(
                "pacing range is inverted: {} > {}",
                self.pacing.min_secs, self.pacing.max_secs
            )));
        }
        if self.history_days == 0 {
            return Err(ConfigError::Invalid("history_days must be >= 1".into()));
        }
        if self.database.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database path is empty".into()));
        }
        Symbol::parse_all(&self.portfolio)?;
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.to_policy()
    }

    pub fn pacing_range(&self) -> (Duration, Duration) {
        (secs(self.pacing.min_secs), secs(self.pacing.max_secs))
    }

    /// Configured key, falling back to the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.alpha_vantage_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(ALPHA_VANTAGE_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn portfolio_symbols(&self) -> Result<Vec<Symbol>, SymbolError> {
        Symbol::parse_all(&self.portfolio)
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(
            config.pacing_range(),
            (Duration::from_secs(2), Duration::from_secs(4))
        );
    }

    #[test]
    fn full_file_parses() {
        let toml_str = r#"
            database = "/tmp/q/quotes.db"
            provider = "alpha_vantage"
            alpha_vantage_key = "demo"
            portfolio = ["aapl", "VALE3.SA"]
            history_days = 60
            seed = 7

            [retry]
            max_attempts = 5
            base_delay_secs = 0.5
            jitter_min_secs = 0.0
            jitter_max_secs = 0.25

            [pacing]
            min_secs = 0.0
            max_secs = 0.0
        "#;
        let config = PipelineConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.provider, ProviderKind::AlphaVantage);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.retry.timeout_secs, 10.0);

        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        assert_eq!(policy.jitter_max, Duration::from_millis(250));

        let symbols = config.portfolio_symbols().unwrap();
        assert_eq!(symbols[0].as_str(), "AAPL");
        assert_eq!(config.resolve_api_key().as_deref(), Some("demo"));
    }

    #[test]
    fn rejects_zero_attempts() {
        let err = PipelineConfig::from_toml("[retry]\nmax_attempts = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_inverted_ranges() {
        let err = PipelineConfig::from_toml("[pacing]\nmin_secs = 5.0\nmax_secs = 1.0")
            .unwrap_err();
        assert!(err.to_string().contains("pacing range is inverted"));

        let err = PipelineConfig::from_toml(
            "[retry]\njitter_min_secs = 3.0\njitter_max_secs = 1.0",
        )
        .unwrap_err();
        assert!(err.to_string().contains("jitter"));
    }

    #[test]
    fn rejects_negative_and_bad_symbols() {
        assert!(PipelineConfig::from_toml("[retry]\nbase_delay_secs = -1.0").is_err());
        let err = PipelineConfig::from_toml("portfolio = [\"AAPL\", \"BAD TICKER\"]").unwrap_err();
        assert!(matches!(err, ConfigError::Symbol(_)));
    }

    #[test]
    fn unknown_provider_is_a_parse_error() {
        let err = PipelineConfig::from_toml("provider = \"bloomberg\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn provider_kind_from_cli_string() {
        assert_eq!("Alpha-Vantage".parse::<ProviderKind>(), Ok(ProviderKind::AlphaVantage));
        assert_eq!("offline".parse::<ProviderKind>(), Ok(ProviderKind::Offline));
        assert!("bloomberg".parse::<ProviderKind>().is_err());
    }
}
