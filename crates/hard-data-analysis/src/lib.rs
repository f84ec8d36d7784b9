use std::sync::Arc;
use std::time::Duration;

use analysis_core::{
    with_timeout, EvidenceAccumulator, HardDataProvider, HardDataSnapshot, Layer, LayerAnalyzer,
    LayerOutcome, LayerScore, PARTIAL_DATA_SIGNAL,
};
use async_trait::async_trait;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Options premium skew (call share of total premium)
mod options_skew {
    pub const STRONG_CALL_SHARE: f64 = 0.65;
    pub const MILD_CALL_SHARE: f64 = 0.55;
    pub const MILD_PUT_SHARE: f64 = 0.45;
    pub const STRONG_PUT_SHARE: f64 = 0.35;
    pub const STRONG_SCORE: f64 = 25.0;
    pub const STRONG_CONFIDENCE: f64 = 20.0;
    pub const MILD_SCORE: f64 = 10.0;
    pub const MILD_CONFIDENCE: f64 = 10.0;
    pub const BALANCED_CONFIDENCE: f64 = 5.0;
}

/// Unusual options activity (net unusual call contracts minus puts)
mod unusual_activity {
    pub const NET_THRESHOLD: i64 = 3;
    pub const SCORE: f64 = 10.0;
    pub const CONFIDENCE: f64 = 10.0;
}

/// Dark pool buy share
mod dark_pool {
    pub const ACCUMULATION_SHARE: f64 = 0.60;
    pub const DISTRIBUTION_SHARE: f64 = 0.40;
    pub const SCORE: f64 = 20.0;
    pub const CONFIDENCE: f64 = 15.0;
    pub const BALANCED_CONFIDENCE: f64 = 5.0;
}

/// Lit order-flow imbalance, (buy - sell) / (buy + sell)
mod order_flow {
    pub const IMBALANCE: f64 = 0.20;
    pub const SCORE: f64 = 15.0;
    pub const CONFIDENCE: f64 = 15.0;
    pub const BALANCED_CONFIDENCE: f64 = 5.0;
}

/// Price snapshot momentum and volume
mod price_action {
    pub const MOMENTUM_PCT: f64 = 2.0;
    pub const SCORE: f64 = 10.0;
    pub const CONFIDENCE: f64 = 10.0;
    pub const VOLUME_SPIKE_RATIO: f64 = 1.5;
    pub const VOLUME_SPIKE_CONFIDENCE: f64 = 10.0;
}

/// Turns order-flow / options / dark-pool / price records into a layer score
pub struct HardDataAnalyzer {
    provider: Option<Arc<dyn HardDataProvider>>,
    timeout: Duration,
}

impl HardDataAnalyzer {
    pub fn new(provider: Option<Arc<dyn HardDataProvider>>) -> Self {
        Self { provider, timeout: DEFAULT_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Score a snapshot. Pure; missing records contribute nothing.
    pub fn score_snapshot(snapshot: &HardDataSnapshot) -> LayerScore {
        let mut acc = EvidenceAccumulator::new();

        if let Some(options) = &snapshot.options_flow {
            use options_skew::*;
            let total = options.call_premium + options.put_premium;
            if total > 0.0 {
                let call_share = options.call_premium / total;
                let pct = call_share * 100.0;
                if call_share >= STRONG_CALL_SHARE {
                    acc.add(STRONG_SCORE, STRONG_CONFIDENCE, format!("Options premium skewed to calls ({pct:.0}% call premium)"));
                } else if call_share <= STRONG_PUT_SHARE {
                    acc.add(-STRONG_SCORE, STRONG_CONFIDENCE, format!("Options premium skewed to puts ({pct:.0}% call premium)"));
                } else if call_share >= MILD_CALL_SHARE {
                    acc.add(MILD_SCORE, MILD_CONFIDENCE, format!("Mild call premium bias ({pct:.0}%)"));
                } else if call_share <= MILD_PUT_SHARE {
                    acc.add(-MILD_SCORE, MILD_CONFIDENCE, format!("Mild put premium bias ({pct:.0}% call premium)"));
                } else {
                    acc.add_confidence(BALANCED_CONFIDENCE);
                }
            }

            let net_unusual = options.unusual_calls as i64 - options.unusual_puts as i64;
            if net_unusual >= unusual_activity::NET_THRESHOLD {
                acc.add(unusual_activity::SCORE, unusual_activity::CONFIDENCE, format!("Unusual call activity (+{net_unusual} net contracts)"));
            } else if net_unusual <= -unusual_activity::NET_THRESHOLD {
                acc.add(-unusual_activity::SCORE, unusual_activity::CONFIDENCE, format!("Unusual put activity ({net_unusual} net contracts)"));
            }
        }

        if let Some(pool) = &snapshot.dark_pool {
            use dark_pool::*;
            let total = pool.buy_volume + pool.sell_volume;
            if total > 0.0 {
                let buy_share = pool.buy_volume / total;
                if buy_share >= ACCUMULATION_SHARE {
                    acc.add(SCORE, CONFIDENCE, format!("Dark pool accumulation ({:.0}% buys)", buy_share * 100.0));
                } else if buy_share <= DISTRIBUTION_SHARE {
                    acc.add(-SCORE, CONFIDENCE, format!("Dark pool distribution ({:.0}% buys)", buy_share * 100.0));
                } else {
                    acc.add_confidence(BALANCED_CONFIDENCE);
                }
            }
        }

        if let Some(flow) = &snapshot.order_flow {
            use order_flow::*;
            let total = flow.buy_volume + flow.sell_volume;
            if total > 0.0 {
                let imbalance = (flow.buy_volume - flow.sell_volume) / total;
                if imbalance >= IMBALANCE {
                    acc.add(SCORE, CONFIDENCE, format!("Order flow buy imbalance ({:+.0}%)", imbalance * 100.0));
                } else if imbalance <= -IMBALANCE {
                    acc.add(-SCORE, CONFIDENCE, format!("Order flow sell imbalance ({:+.0}%)", imbalance * 100.0));
                } else {
                    acc.add_confidence(BALANCED_CONFIDENCE);
                }
            }
        }

        if let Some(price) = &snapshot.price {
            use price_action::*;
            if price.change_percent >= MOMENTUM_PCT {
                acc.add(SCORE, CONFIDENCE, format!("Price momentum {:+.1}%", price.change_percent));
            } else if price.change_percent <= -MOMENTUM_PCT {
                acc.add(-SCORE, CONFIDENCE, format!("Price weakness {:+.1}%", price.change_percent));
            }

            if let Some(avg) = price.average_volume.filter(|v| *v > 0.0) {
                let ratio = price.volume / avg;
                if ratio >= VOLUME_SPIKE_RATIO {
                    acc.add(0.0, VOLUME_SPIKE_CONFIDENCE, format!("Volume spike {ratio:.1}x average - elevated volatility"));
                }
            }
        }

        if !snapshot.is_empty() && snapshot.available_sources() < 4 {
            acc.note(PARTIAL_DATA_SIGNAL);
        }

        acc.finish()
    }
}

#[async_trait]
impl LayerAnalyzer for HardDataAnalyzer {
    fn layer(&self) -> Layer {
        Layer::HardData
    }

    async fn analyze(&self, symbol: &str) -> LayerOutcome {
        let provider = match &self.provider {
            Some(p) => p,
            None => return LayerOutcome::degraded("Hard-data provider not configured"),
        };

        match with_timeout(self.timeout, provider.fetch_hard_data(symbol)).await {
            Ok(snapshot) if snapshot.is_empty() => {
                tracing::warn!("No hard data available for {}", symbol);
                LayerOutcome::degraded("No hard data available - all APIs unavailable")
            }
            Ok(snapshot) => {
                let score = Self::score_snapshot(&snapshot);
                tracing::debug!(
                    "Hard-data layer for {}: score {:.1}, confidence {:.1} ({} sources)",
                    symbol,
                    score.score,
                    score.confidence,
                    snapshot.available_sources()
                );
                LayerOutcome::Ok(score)
            }
            Err(e) => {
                tracing::warn!("Hard-data provider failed for {}: {}", symbol, e);
                LayerOutcome::from_error(&e)
            }
        }
    }
}
