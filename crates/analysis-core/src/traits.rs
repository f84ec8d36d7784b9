use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    AnalysisError, Bar, BehavioralSnapshot, EconomicSnapshot, HardDataSnapshot, Layer,
    LayerOutcome, TechnicalSnapshot,
};

/// Order-flow / options / dark-pool / price data source
#[async_trait]
pub trait HardDataProvider: Send + Sync {
    async fn fetch_hard_data(&self, symbol: &str) -> Result<HardDataSnapshot, AnalysisError>;
}

/// Market-structure indicator source. `Ok(None)` means the provider answered
/// but has nothing for this symbol.
#[async_trait]
pub trait TechnicalProvider: Send + Sync {
    async fn fetch_technical(&self, symbol: &str) -> Result<Option<TechnicalSnapshot>, AnalysisError>;
}

/// Social / behavioral indicator source
#[async_trait]
pub trait BehavioralProvider: Send + Sync {
    async fn fetch_behavioral(&self, symbol: &str) -> Result<BehavioralSnapshot, AnalysisError>;
}

/// Macro indicator source (not symbol specific)
#[async_trait]
pub trait EconomicProvider: Send + Sync {
    async fn fetch_economic(&self) -> Result<EconomicSnapshot, AnalysisError>;
}

/// Historical daily bars, used by the validation tracker and the bar-derived technical provider
#[async_trait]
pub trait BarSource: Send + Sync {
    async fn daily_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, AnalysisError>;
}

/// One independent layer of the fusion. `analyze` never fails: any upstream
/// problem comes back as [`LayerOutcome::Degraded`].
#[async_trait]
pub trait LayerAnalyzer: Send + Sync {
    fn layer(&self) -> Layer;

    async fn analyze(&self, symbol: &str) -> LayerOutcome;
}
