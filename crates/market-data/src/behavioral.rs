use std::time::Duration;

use analysis_core::{AnalysisError, BehavioralProvider, BehavioralSnapshot};
use anyhow::{Context, Result};
use async_trait::async_trait;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Behavioral indicators served as JSON by an external social-data service
/// at `GET {base_url}/behavioral/{symbol}`.
#[derive(Clone)]
pub struct HttpBehavioralProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBehavioralProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build behavioral HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, symbol: &str) -> String {
        format!("{}/behavioral/{}", self.base_url, symbol.trim().to_uppercase())
    }
}

fn request_error(err: reqwest::Error) -> AnalysisError {
    if err.is_connect() {
        AnalysisError::ProviderUnavailable(err.to_string())
    } else if err.is_timeout() {
        AnalysisError::ProviderUnavailable(format!("behavioral service timed out: {err}"))
    } else {
        AnalysisError::ApiError(err.to_string())
    }
}

#[async_trait]
impl BehavioralProvider for HttpBehavioralProvider {
    async fn fetch_behavioral(&self, symbol: &str) -> Result<BehavioralSnapshot, AnalysisError> {
        let url = self.url(symbol);
        tracing::debug!("Fetching behavioral snapshot from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(request_error)?;

        // Unknown symbol: no evidence rather than a failure
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(BehavioralSnapshot::default());
        }

        response
            .error_for_status()
            .map_err(request_error)?
            .json::<BehavioralSnapshot>()
            .await
            .map_err(|e| AnalysisError::InvalidData(format!("behavioral payload for {symbol}: {e}")))
    }
}
