use std::sync::Arc;
use std::time::Duration;

use analysis_core::{
    BehavioralProvider, Direction, EconomicProvider, HardDataProvider, Layer, LayerAnalyzer,
    LayerOutcome, LayerScores, TechnicalProvider,
};
use chrono::{DateTime, Utc};
use economic_analysis::EconomicAnalyzer;
use hard_data_analysis::HardDataAnalyzer;
use market_regime_detector::{detect_regime, MarketRegime};
use sentiment_analysis::{BehavioralAnalyzer, SentimentCache};
use serde::Serialize;
use session_clock::{SessionClock, TradingSession};
use technical_analysis::TechnicalAnalyzer;
use validation::{PredictionRecord, ValidationTracker};

pub mod accuracy;
pub mod fusion;
pub mod session_gate;
pub mod weights;

#[cfg(test)]
mod tests;

pub use accuracy::{estimate_win_rate, WinRateEstimate};
pub use fusion::{apply_weights, classify_factors, fuse, Factors};
pub use session_gate::{adjust, build_action, SessionDecision, TradeAction};
pub use weights::{compute_weights, AdaptiveWeights};

/// Engine tunables. Thresholds are constants in their modules, not config.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub analyzer_timeout: Duration,
    pub horizon_days: i64,
    pub sentiment_cache_ttl_secs: i64,
    pub sentiment_cache_max_entries: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            analyzer_timeout: Duration::from_secs(8),
            horizon_days: 5,
            sentiment_cache_ttl_secs: sentiment_analysis::cache::DEFAULT_TTL_SECS,
            sentiment_cache_max_entries: sentiment_analysis::cache::DEFAULT_MAX_ENTRIES,
        }
    }
}

/// Provider capabilities, resolved once at startup. `None` means the layer
/// has no provider and will always report degraded.
#[derive(Clone, Default)]
pub struct Providers {
    pub hard_data: Option<Arc<dyn HardDataProvider>>,
    pub technical: Option<Arc<dyn TechnicalProvider>>,
    pub behavioral: Option<Arc<dyn BehavioralProvider>>,
    pub economic: Option<Arc<dyn EconomicProvider>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub current: TradingSession,
    pub name: &'static str,
    pub is_optimal: bool,
    pub multiplier: f64,
    pub adjusted_confidence: f64,
}

/// Terminal output of one fusion call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedSignal {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    pub score: f64,
    pub confidence: f64,
    /// Percent, capped at 95
    pub expected_accuracy: f64,
    pub layers: LayerScores,
    pub weights: AdaptiveWeights,
    pub regime: MarketRegime,
    pub session: SessionInfo,
    pub action: TradeAction,
    pub win_rate: WinRateEstimate,
    pub bullish_factors: Vec<String>,
    pub bearish_factors: Vec<String>,
    pub risk_factors: Vec<String>,
    pub degraded_layers: Vec<Layer>,
    pub prediction_id: Option<String>,
}

pub struct FusionEngine {
    hard_data: Box<dyn LayerAnalyzer>,
    technical: Box<dyn LayerAnalyzer>,
    sam: Box<dyn LayerAnalyzer>,
    economic: Box<dyn LayerAnalyzer>,
    clock: SessionClock,
    tracker: Option<Arc<ValidationTracker>>,
    config: EngineConfig,
}

impl FusionEngine {
    pub fn new(
        hard_data: Box<dyn LayerAnalyzer>,
        technical: Box<dyn LayerAnalyzer>,
        sam: Box<dyn LayerAnalyzer>,
        economic: Box<dyn LayerAnalyzer>,
    ) -> Self {
        Self {
            hard_data,
            technical,
            sam,
            economic,
            clock: SessionClock::new(),
            tracker: None,
            config: EngineConfig::default(),
        }
    }

    /// Build the four standard analyzers around the given providers.
    pub fn from_providers(providers: Providers, config: EngineConfig) -> Self {
        let timeout = config.analyzer_timeout;
        let cache = SentimentCache::new(config.sentiment_cache_ttl_secs, config.sentiment_cache_max_entries);

        let mut engine = Self::new(
            Box::new(HardDataAnalyzer::new(providers.hard_data).with_timeout(timeout)),
            Box::new(TechnicalAnalyzer::new(providers.technical).with_timeout(timeout)),
            Box::new(
                BehavioralAnalyzer::new(providers.behavioral)
                    .with_cache(cache)
                    .with_timeout(timeout),
            ),
            Box::new(EconomicAnalyzer::new(providers.economic).with_timeout(timeout)),
        );
        engine.config = config;
        engine
    }

    pub fn with_tracker(mut self, tracker: Arc<ValidationTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn tracker(&self) -> Option<&Arc<ValidationTracker>> {
        self.tracker.as_ref()
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub async fn generate_signal(&self, symbol: &str) -> CombinedSignal {
        self.generate_signal_at(symbol, Utc::now()).await
    }

    /// Run the full pipeline as of `now`. Never fails: unavailable layers
    /// are folded in as degraded scores.
    pub async fn generate_signal_at(&self, symbol: &str, now: DateTime<Utc>) -> CombinedSignal {
        tracing::info!("Generating fused signal for {}", symbol);

        let (hard_data, technical, sam, economic) = tokio::join!(
            self.hard_data.analyze(symbol),
            self.technical.analyze(symbol),
            self.sam.analyze(symbol),
            self.economic.analyze(symbol),
        );

        let mut degraded_layers = Vec::new();
        for (analyzer, outcome) in [
            (&self.hard_data, &hard_data),
            (&self.technical, &technical),
            (&self.sam, &sam),
            (&self.economic, &economic),
        ] {
            if let LayerOutcome::Degraded { reason, .. } = outcome {
                tracing::warn!("{} layer degraded for {}: {}", analyzer.layer().label(), symbol, reason);
                degraded_layers.push(analyzer.layer());
            }
        }

        let mut layers = LayerScores {
            hard_data: hard_data.into_score(),
            technical: technical.into_score(),
            sam: sam.into_score(),
            economic: economic.into_score(),
        };

        let profile = self.clock.profile_at(now);
        let regime = detect_regime(layers.hard_data.score, profile.volatility);
        let weights = compute_weights(layers.confidences(), &regime, layers.scores());
        apply_weights(&mut layers, &weights);

        let (score, confidence) = fuse(&layers, &weights);
        let direction = Direction::from_score(score);

        let decision = adjust(confidence, direction, &profile);
        let next_optimal = self.clock.next_optimal_session(profile.session);
        let action = build_action(&decision, &profile, &regime, next_optimal);
        let win_rate = estimate_win_rate(&profile, &layers, direction, &regime);
        let Factors { bullish_factors, bearish_factors, risk_factors } = classify_factors(&layers);

        tracing::info!(
            "{} {}: score {:.1}, confidence {:.1} (session {}, adjusted {:.1}), trade: {} [{}]",
            symbol,
            direction.to_label(),
            score,
            confidence,
            profile.name,
            decision.adjusted_confidence,
            decision.should_trade,
            weights.adjustment_reason()
        );

        let prediction_id = match &self.tracker {
            Some(tracker) => {
                let record = PredictionRecord::new(symbol, direction, confidence, self.config.horizon_days, now, &layers);
                Some(tracker.register(record).await)
            }
            None => None,
        };

        CombinedSignal {
            symbol: symbol.to_string(),
            timestamp: now,
            direction,
            score,
            confidence,
            expected_accuracy: win_rate.total_rate * 100.0,
            layers,
            weights,
            regime,
            session: SessionInfo {
                current: profile.session,
                name: profile.name,
                is_optimal: profile.is_optimal,
                multiplier: profile.confidence_multiplier,
                adjusted_confidence: decision.adjusted_confidence,
            },
            action,
            win_rate,
            bullish_factors,
            bearish_factors,
            risk_factors,
            degraded_layers,
            prediction_id,
        }
    }
}
