use std::sync::Arc;
use std::time::Duration;

use analysis_core::{
    with_timeout, EvidenceAccumulator, Layer, LayerAnalyzer, LayerOutcome, LayerScore,
    TechnicalProvider, TechnicalSnapshot,
};
use async_trait::async_trait;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

mod trend {
    pub const MIN_STRENGTH: f64 = 0.1;
    pub const SCORE_SCALE: f64 = 30.0;
    pub const CONFIDENCE_SCALE: f64 = 20.0;
}

mod rsi_levels {
    pub const EXTREME_OVERSOLD: f64 = 20.0;
    pub const OVERSOLD: f64 = 30.0;
    pub const OVERBOUGHT: f64 = 70.0;
    pub const EXTREME_OVERBOUGHT: f64 = 80.0;
    pub const EXTREME_SCORE: f64 = 30.0;
    pub const EXTREME_CONFIDENCE: f64 = 20.0;
    pub const SCORE: f64 = 20.0;
    pub const CONFIDENCE: f64 = 15.0;
}

/// Market structure shift
mod mss {
    pub const SCORE: f64 = 25.0;
    pub const CONFIDENCE: f64 = 20.0;
}

/// Fair value gaps, scored per net gap
mod fvg {
    pub const SCORE_PER_GAP: f64 = 5.0;
    pub const MAX_SCORE: f64 = 15.0;
    pub const CONFIDENCE_PER_GAP: f64 = 3.0;
    pub const MAX_CONFIDENCE: f64 = 10.0;
}

pub const LIQUIDITY_VOID_SIGNAL: &str = "Liquidity void nearby - volatility risk";

/// Scores trend, momentum and market structure
pub struct TechnicalAnalyzer {
    provider: Option<Arc<dyn TechnicalProvider>>,
    timeout: Duration,
}

impl TechnicalAnalyzer {
    pub fn new(provider: Option<Arc<dyn TechnicalProvider>>) -> Self {
        Self { provider, timeout: DEFAULT_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn score_snapshot(snapshot: &TechnicalSnapshot) -> LayerScore {
        let mut acc = EvidenceAccumulator::new();

        let strength = snapshot.trend_strength;
        if strength.is_finite() && strength.abs() >= trend::MIN_STRENGTH {
            let label = if strength > 0.0 { "Uptrend" } else { "Downtrend" };
            acc.add(
                strength * trend::SCORE_SCALE,
                strength.abs() * trend::CONFIDENCE_SCALE,
                format!("{label} (strength {strength:.2})"),
            );
        }

        let rsi = snapshot.rsi;
        if (0.0..=100.0).contains(&rsi) {
            use rsi_levels::*;
            if rsi < EXTREME_OVERSOLD {
                acc.add(EXTREME_SCORE, EXTREME_CONFIDENCE, format!("RSI deeply oversold ({rsi:.1})"));
            } else if rsi < OVERSOLD {
                acc.add(SCORE, CONFIDENCE, format!("RSI oversold ({rsi:.1})"));
            } else if rsi > EXTREME_OVERBOUGHT {
                acc.add(-EXTREME_SCORE, EXTREME_CONFIDENCE, format!("RSI deeply overbought ({rsi:.1})"));
            } else if rsi > OVERBOUGHT {
                acc.add(-SCORE, CONFIDENCE, format!("RSI overbought ({rsi:.1})"));
            }
        } else {
            acc.note("RSI unavailable");
        }

        match snapshot.mss_signal {
            s if s > 0 => acc.add(mss::SCORE, mss::CONFIDENCE, "Bullish market structure shift"),
            s if s < 0 => acc.add(-mss::SCORE, mss::CONFIDENCE, "Bearish market structure shift"),
            _ => {}
        }

        let gaps = snapshot.fvg_net_direction;
        if gaps != 0 {
            let score = (gaps as f64 * fvg::SCORE_PER_GAP).clamp(-fvg::MAX_SCORE, fvg::MAX_SCORE);
            let confidence = (gaps.unsigned_abs() as f64 * fvg::CONFIDENCE_PER_GAP).min(fvg::MAX_CONFIDENCE);
            let side = if gaps > 0 { "bullish" } else { "bearish" };
            acc.add(score, confidence, format!("{} net {side} fair value gap(s)", gaps.abs()));
        }

        if snapshot.liquidity_void_nearby {
            acc.note(LIQUIDITY_VOID_SIGNAL);
        }

        acc.finish()
    }
}

#[async_trait]
impl LayerAnalyzer for TechnicalAnalyzer {
    fn layer(&self) -> Layer {
        Layer::Technical
    }

    async fn analyze(&self, symbol: &str) -> LayerOutcome {
        let provider = match &self.provider {
            Some(p) => p,
            None => return LayerOutcome::degraded("Technical provider not configured"),
        };

        match with_timeout(self.timeout, provider.fetch_technical(symbol)).await {
            Ok(Some(snapshot)) => {
                let score = Self::score_snapshot(&snapshot);
                tracing::debug!(
                    "Technical layer for {}: score {:.1}, confidence {:.1}",
                    symbol,
                    score.score,
                    score.confidence
                );
                LayerOutcome::Ok(score)
            }
            Ok(None) => {
                tracing::warn!("Not enough price history for {}", symbol);
                LayerOutcome::degraded("Insufficient price history for technical analysis")
            }
            Err(e) => {
                tracing::warn!("Technical provider failed for {}: {}", symbol, e);
                LayerOutcome::from_error(&e)
            }
        }
    }
}
