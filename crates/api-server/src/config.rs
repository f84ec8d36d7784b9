use std::env;
use std::time::Duration;

use analysis_orchestrator::EngineConfig;
use anyhow::{Context, Result};
use market_data::DEFAULT_CHART_URL;

/// Process configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub analyzer_timeout_secs: u64,
    pub prediction_horizon_days: i64,
    /// Background batch validation period; 0 disables the job
    pub validation_interval_secs: u64,
    pub sentiment_cache_ttl_secs: i64,
    pub sentiment_cache_max_entries: usize,
    pub behavioral_service_url: Option<String>,
    pub yahoo_chart_url: String,
    /// Appended to bare tickers, e.g. `.IS`
    pub default_exchange_suffix: Option<String>,
    /// Accepted keys for `/api` routes; empty disables authentication
    pub api_keys: Vec<String>,
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// `API_KEYS` is comma separated; `SERVICE_SECRET` adds one more key.
fn api_keys() -> Vec<String> {
    let mut keys: Vec<String> = optional("API_KEYS")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect();
    if let Some(secret) = optional("SERVICE_SECRET") {
        if !keys.contains(&secret) {
            keys.push(secret);
        }
    }
    keys
}

fn parsed<T>(key: &str, default: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .with_context(|| format!("invalid value for {key}"))
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            analyzer_timeout_secs: parsed("ANALYZER_TIMEOUT_SECS", "8")?,
            prediction_horizon_days: parsed("PREDICTION_HORIZON_DAYS", "5")?,
            validation_interval_secs: parsed("VALIDATION_INTERVAL_SECS", "3600")?,
            sentiment_cache_ttl_secs: parsed("SENTIMENT_CACHE_TTL_SECS", "900")?,
            sentiment_cache_max_entries: parsed("SENTIMENT_CACHE_MAX_ENTRIES", "500")?,
            behavioral_service_url: optional("BEHAVIORAL_SERVICE_URL"),
            yahoo_chart_url: optional("YAHOO_CHART_URL").unwrap_or_else(|| DEFAULT_CHART_URL.to_string()),
            default_exchange_suffix: optional("DEFAULT_EXCHANGE_SUFFIX"),
            api_keys: api_keys(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.analyzer_timeout_secs > 0, "ANALYZER_TIMEOUT_SECS must be positive");
        anyhow::ensure!(self.prediction_horizon_days > 0, "PREDICTION_HORIZON_DAYS must be positive");
        anyhow::ensure!(self.sentiment_cache_ttl_secs > 0, "SENTIMENT_CACHE_TTL_SECS must be positive");
        anyhow::ensure!(self.sentiment_cache_max_entries > 0, "SENTIMENT_CACHE_MAX_ENTRIES must be positive");
        anyhow::ensure!(
            self.api_keys.iter().all(|k| k.len() >= 8),
            "API keys must be at least 8 characters"
        );
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            analyzer_timeout: Duration::from_secs(self.analyzer_timeout_secs),
            horizon_days: self.prediction_horizon_days,
            sentiment_cache_ttl_secs: self.sentiment_cache_ttl_secs,
            sentiment_cache_max_entries: self.sentiment_cache_max_entries,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            analyzer_timeout_secs: 8,
            prediction_horizon_days: 5,
            validation_interval_secs: 3600,
            sentiment_cache_ttl_secs: 900,
            sentiment_cache_max_entries: 500,
            behavioral_service_url: None,
            yahoo_chart_url: DEFAULT_CHART_URL.to_string(),
            default_exchange_suffix: None,
            api_keys: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        let engine = config.engine_config();
        assert_eq!(engine.analyzer_timeout, Duration::from_secs(8));
        assert_eq!(engine.horizon_days, 5);
    }

    #[test]
    fn test_short_api_key_rejected() {
        let config = ServiceConfig {
            api_keys: vec!["abc".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let config = ServiceConfig {
            prediction_horizon_days: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
