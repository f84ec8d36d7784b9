//! Market-structure snapshot derived from daily bars.

use std::sync::Arc;

use analysis_core::{AnalysisError, Bar, BarSource, TechnicalProvider, TechnicalSnapshot};
use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::indicators::{average_range, latest_rsi, normalized_slope};

pub const MIN_BARS: usize = 30;
const RSI_PERIOD: usize = 14;
const STRUCTURE_LOOKBACK: usize = 20;
/// Normalised daily slope of 2% maps to full trend strength
const TREND_SCALE: f64 = 50.0;
const VOID_RANGE_MULTIPLE: f64 = 2.0;
const DEFAULT_LOOKBACK_DAYS: i64 = 120;

/// Build a snapshot from bars, or `None` with fewer than [`MIN_BARS`] bars.
pub fn derive_snapshot(bars: &[Bar]) -> Option<TechnicalSnapshot> {
    if bars.len() < MIN_BARS {
        return None;
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let trend_strength = (normalized_slope(&closes, STRUCTURE_LOOKBACK) * TREND_SCALE).clamp(-1.0, 1.0);
    let rsi = latest_rsi(&closes, RSI_PERIOD);

    let (last, prior) = bars.split_last()?;
    let window = &prior[prior.len() - STRUCTURE_LOOKBACK..];

    let prior_high = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let prior_low = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let mss_signal = if last.close > prior_high {
        1
    } else if last.close < prior_low {
        -1
    } else {
        0
    };

    let start = bars.len() - STRUCTURE_LOOKBACK;
    let mut fvg_net_direction = 0;
    for i in start.max(2)..bars.len() {
        if bars[i].low > bars[i - 2].high {
            fvg_net_direction += 1;
        } else if bars[i].high < bars[i - 2].low {
            fvg_net_direction -= 1;
        }
    }

    let liquidity_void_nearby = average_range(prior, STRUCTURE_LOOKBACK)
        .map(|avg| avg > 0.0 && (last.high - last.low) > avg * VOID_RANGE_MULTIPLE)
        .unwrap_or(false);

    Some(TechnicalSnapshot {
        trend_strength,
        rsi,
        mss_signal,
        fvg_net_direction,
        liquidity_void_nearby,
    })
}

/// Technical provider computing structure indicators from a bar source
pub struct BarTechnicalProvider {
    source: Arc<dyn BarSource>,
    lookback_days: i64,
}

impl BarTechnicalProvider {
    pub fn new(source: Arc<dyn BarSource>) -> Self {
        Self { source, lookback_days: DEFAULT_LOOKBACK_DAYS }
    }

    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days;
        self
    }
}

#[async_trait]
impl TechnicalProvider for BarTechnicalProvider {
    async fn fetch_technical(&self, symbol: &str) -> Result<Option<TechnicalSnapshot>, AnalysisError> {
        let end = Utc::now();
        let start = end - Duration::days(self.lookback_days);
        let bars = self.source.daily_bars(symbol, start, end).await?;
        tracing::debug!("Deriving technical snapshot for {} from {} bars", symbol, bars.len());
        Ok(derive_snapshot(&bars))
    }
}
