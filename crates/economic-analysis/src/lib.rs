use std::sync::Arc;
use std::time::Duration;

use analysis_core::{
    with_timeout, EconomicProvider, EconomicSnapshot, EvidenceAccumulator, Layer, LayerAnalyzer,
    LayerOutcome, LayerScore, PARTIAL_DATA_SIGNAL,
};
use async_trait::async_trait;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

mod vix {
    pub const PANIC: f64 = 30.0;
    pub const ELEVATED: f64 = 20.0;
    pub const CALM: f64 = 15.0;
    pub const PANIC_SCORE: f64 = 25.0;
    pub const PANIC_CONFIDENCE: f64 = 20.0;
    pub const SCORE: f64 = 10.0;
    pub const CONFIDENCE: f64 = 10.0;
}

/// Long minus short yield spread, percentage points
mod yield_curve {
    pub const INVERTED: f64 = 0.0;
    pub const STEEP: f64 = 1.0;
    pub const INVERTED_SCORE: f64 = 15.0;
    pub const INVERTED_CONFIDENCE: f64 = 15.0;
    pub const STEEP_SCORE: f64 = 10.0;
    pub const STEEP_CONFIDENCE: f64 = 10.0;
}

mod consumer {
    pub const STRONG: f64 = 90.0;
    pub const WEAK: f64 = 60.0;
    pub const SCORE: f64 = 10.0;
    pub const CONFIDENCE: f64 = 10.0;
}

/// Read contrarian, same as the behavioral fear/hope index
mod fear_greed {
    pub const EXTREME_FEAR: f64 = 25.0;
    pub const EXTREME_GREED: f64 = 75.0;
    pub const SCORE: f64 = 10.0;
    pub const CONFIDENCE: f64 = 10.0;
}

mod recession {
    pub const PROBABILITY: f64 = 0.5;
    pub const SCORE: f64 = 20.0;
    pub const CONFIDENCE: f64 = 15.0;
}

/// Macro backdrop shared by every symbol
pub struct EconomicAnalyzer {
    provider: Option<Arc<dyn EconomicProvider>>,
    timeout: Duration,
}

impl EconomicAnalyzer {
    pub fn new(provider: Option<Arc<dyn EconomicProvider>>) -> Self {
        Self { provider, timeout: DEFAULT_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn score_snapshot(snapshot: &EconomicSnapshot) -> LayerScore {
        let mut acc = EvidenceAccumulator::new();
        let mut present = 0;

        if let Some(level) = snapshot.vix {
            use vix::*;
            present += 1;
            if level > PANIC {
                acc.add(-PANIC_SCORE, PANIC_CONFIDENCE, format!("VIX elevated at {level:.1} - high volatility warning"));
            } else if level > ELEVATED {
                acc.add(-SCORE, CONFIDENCE, format!("VIX above normal ({level:.1})"));
            } else if level < CALM {
                acc.add(SCORE, CONFIDENCE, format!("VIX calm ({level:.1})"));
            }
        }

        if let Some(spread) = snapshot.yield_curve {
            use yield_curve::*;
            present += 1;
            if spread < INVERTED {
                acc.add(-INVERTED_SCORE, INVERTED_CONFIDENCE, format!("Yield curve inverted ({spread:+.2}) - recession risk"));
            } else if spread > STEEP {
                acc.add(STEEP_SCORE, STEEP_CONFIDENCE, format!("Healthy yield curve ({spread:+.2})"));
            }
        }

        if let Some(level) = snapshot.consumer_sentiment {
            use consumer::*;
            present += 1;
            if level > STRONG {
                acc.add(SCORE, CONFIDENCE, format!("Strong consumer sentiment ({level:.1})"));
            } else if level < WEAK {
                acc.add(-SCORE, CONFIDENCE, format!("Weak consumer sentiment ({level:.1})"));
            }
        }

        if let Some(level) = snapshot.fear_greed_signal {
            use fear_greed::*;
            present += 1;
            if level < EXTREME_FEAR {
                acc.add(SCORE, CONFIDENCE, format!("Market fear ({level:.0}) - contrarian bullish"));
            } else if level > EXTREME_GREED {
                acc.add(-SCORE, CONFIDENCE, format!("Market greed ({level:.0}) - contrarian bearish"));
            }
        }

        if let Some(probability) = snapshot.recession_risk {
            present += 1;
            if probability > recession::PROBABILITY {
                acc.add(
                    -recession::SCORE,
                    recession::CONFIDENCE,
                    format!("Recession risk {:.0}%", probability * 100.0),
                );
            }
        }

        if present > 0 && present < 5 {
            acc.note(PARTIAL_DATA_SIGNAL);
        }

        acc.finish()
    }
}

#[async_trait]
impl LayerAnalyzer for EconomicAnalyzer {
    fn layer(&self) -> Layer {
        Layer::Economic
    }

    async fn analyze(&self, _symbol: &str) -> LayerOutcome {
        let provider = match &self.provider {
            Some(p) => p,
            None => return LayerOutcome::degraded("Economic provider not configured"),
        };

        match with_timeout(self.timeout, provider.fetch_economic()).await {
            Ok(snapshot) if snapshot.is_empty() => {
                tracing::warn!("Economic provider returned no indicators");
                LayerOutcome::degraded("No economic indicators available")
            }
            Ok(snapshot) => {
                let score = Self::score_snapshot(&snapshot);
                tracing::debug!("Economic layer: score {:.1}, confidence {:.1}", score.score, score.confidence);
                LayerOutcome::Ok(score)
            }
            Err(e) => {
                tracing::warn!("Economic provider failed: {}", e);
                LayerOutcome::from_error(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::AnalysisError;

    struct FixedProvider(Result<EconomicSnapshot, AnalysisError>);

    #[async_trait]
    impl EconomicProvider for FixedProvider {
        async fn fetch_economic(&self) -> Result<EconomicSnapshot, AnalysisError> {
            self.0.clone()
        }
    }

    #[test]
    fn test_stress_backdrop() {
        let snap = EconomicSnapshot {
            vix: Some(34.0),
            yield_curve: Some(-0.4),
            consumer_sentiment: Some(55.0),
            fear_greed_signal: Some(50.0),
            recession_risk: Some(0.65),
        };
        let score = EconomicAnalyzer::score_snapshot(&snap);
        // -25 - 15 - 10 - 20
        assert_eq!(score.score, -70.0);
        assert_eq!(score.confidence, 60.0);
        assert!(score.signals.iter().any(|s| s.contains("warning")));
        assert!(!score.signals.iter().any(|s| s == PARTIAL_DATA_SIGNAL));
    }

    #[test]
    fn test_calm_backdrop_partial() {
        let snap = EconomicSnapshot {
            vix: Some(12.5),
            yield_curve: Some(1.6),
            ..Default::default()
        };
        let score = EconomicAnalyzer::score_snapshot(&snap);
        assert_eq!(score.score, 20.0);
        assert!(score.signals.iter().any(|s| s == PARTIAL_DATA_SIGNAL));
    }

    #[test]
    fn test_vix_bands() {
        let at = |level| {
            EconomicAnalyzer::score_snapshot(&EconomicSnapshot { vix: Some(level), ..Default::default() }).score
        };
        assert_eq!(at(30.0), -10.0);
        assert_eq!(at(30.1), -25.0);
        assert_eq!(at(18.0), 0.0);
        assert_eq!(at(14.9), 10.0);
    }

    #[tokio::test]
    async fn test_empty_snapshot_degrades() {
        let provider = FixedProvider(Ok(EconomicSnapshot::default()));
        let outcome = EconomicAnalyzer::new(Some(Arc::new(provider))).analyze("SPY").await;
        assert!(outcome.is_degraded());
    }

    #[tokio::test]
    async fn test_error_degrades() {
        let provider = FixedProvider(Err(AnalysisError::ApiError("FRED down".into())));
        let outcome = EconomicAnalyzer::new(Some(Arc::new(provider))).analyze("SPY").await;
        assert!(outcome.is_degraded());
        assert_eq!(outcome.score().score, 0.0);
    }

    #[tokio::test]
    async fn test_indicators_scored() {
        let provider = FixedProvider(Ok(EconomicSnapshot { vix: Some(13.0), ..Default::default() }));
        let outcome = EconomicAnalyzer::new(Some(Arc::new(provider))).analyze("SPY").await;
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.score().score, 10.0);
    }
}
