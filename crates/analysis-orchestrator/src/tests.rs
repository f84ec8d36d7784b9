use std::collections::HashMap;

use analysis_core::{AnalysisError, Bar, BarSource, HardDataSnapshot, LayerScore, VolatilityClass};
use async_trait::async_trait;
use chrono::TimeZone;
use validation::{MoveDirection, Outcome};

use super::*;

struct FixedAnalyzer {
    layer: Layer,
    outcome: LayerOutcome,
}

#[async_trait]
impl LayerAnalyzer for FixedAnalyzer {
    fn layer(&self) -> Layer {
        self.layer
    }

    async fn analyze(&self, _symbol: &str) -> LayerOutcome {
        self.outcome.clone()
    }
}

fn fixed(layer: Layer, score: f64, confidence: f64, signals: &[&str]) -> Box<dyn LayerAnalyzer> {
    let signals = signals.iter().map(|s| s.to_string()).collect();
    Box::new(FixedAnalyzer {
        layer,
        outcome: LayerOutcome::Ok(LayerScore::new(score, confidence, signals)),
    })
}

fn engine_with_scores(scores: [f64; 4], confidence: f64) -> FusionEngine {
    FusionEngine::new(
        fixed(Layer::HardData, scores[0], confidence, &["Dark pool accumulation (65% buys)"]),
        fixed(Layer::Technical, scores[1], confidence, &["Uptrend (strength 0.50)"]),
        fixed(Layer::Sam, scores[2], confidence, &["Panic warning - indicator at 80%"]),
        fixed(Layer::Economic, scores[3], confidence, &[]),
    )
}

struct FailingHardData;

#[async_trait]
impl HardDataProvider for FailingHardData {
    async fn fetch_hard_data(&self, _symbol: &str) -> Result<HardDataSnapshot, AnalysisError> {
        Err(AnalysisError::ApiError("connection reset by peer".into()))
    }
}

struct DailyCloses(HashMap<u32, f64>);

#[async_trait]
impl BarSource for DailyCloses {
    async fn daily_bars(
        &self,
        _symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, AnalysisError> {
        Ok(self
            .0
            .iter()
            .map(|(&day, &close)| Bar {
                timestamp: Utc.with_ymd_and_hms(2026, 1, day, 21, 0, 0).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1.0,
            })
            .filter(|b| b.timestamp >= start && b.timestamp <= end)
            .collect())
    }
}

/// Tuesday 2026-01-13, 14:00 US/Eastern: NY PM session, medium volatility
fn pm_session() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 13, 19, 0, 0).unwrap()
}

#[test]
fn scenario_a_equal_weights_fuse_to_buy() {
    let layers = LayerScores {
        hard_data: LayerScore::new(40.0, 70.0, vec![]),
        technical: LayerScore::new(30.0, 70.0, vec![]),
        sam: LayerScore::new(20.0, 70.0, vec![]),
        economic: LayerScore::new(10.0, 70.0, vec![]),
    };
    let (score, confidence) = fuse(&layers, &AdaptiveWeights::equal());
    assert!((score - 25.0).abs() < 1e-9);
    assert!((confidence - 70.0).abs() < 1e-9);
    assert_eq!(Direction::from_score(score), Direction::Buy);
}

#[tokio::test]
async fn scenario_a_through_engine() {
    let engine = engine_with_scores([40.0, 30.0, 20.0, 10.0], 70.0);
    let signal = engine.generate_signal_at("AAPL", pm_session()).await;

    // equal confidence and full agreement leave the default allocation in place
    assert!((signal.score - 26.5).abs() < 1e-9);
    assert_eq!(signal.direction, Direction::Buy);
    assert!(signal.degraded_layers.is_empty());
    assert_eq!(signal.session.current, TradingSession::NyPmSession);
    let weight_sum: f64 = signal.weights.as_array().iter().sum();
    assert!((weight_sum - 1.0).abs() < 1e-9);
    assert_eq!(signal.layers.hard_data.weight, signal.weights.get(Layer::HardData));
}

#[tokio::test]
async fn scenario_b_and_c_predictions_resolve() {
    // signal at 14:00 ET on Jan 13, so entry is the Jan 12 close and the
    // later Jan 13 close is ignored; Jan 18 is a Sunday so exits come from Monday Jan 19
    let bullish_bars = DailyCloses(HashMap::from([(12, 100.0), (13, 104.0), (19, 101.2)]));
    let flat_bars = DailyCloses(HashMap::from([(12, 100.0), (13, 104.0), (19, 100.2)]));

    for (bars, expected_actual, expected_outcome) in [
        (bullish_bars, MoveDirection::Bullish, Outcome::Correct),
        (flat_bars, MoveDirection::Neutral, Outcome::Neutral),
    ] {
        let tracker = Arc::new(ValidationTracker::new(Arc::new(bars)));
        let engine = engine_with_scores([60.0, 50.0, 40.0, 30.0], 80.0).with_tracker(tracker.clone());

        let signal = engine.generate_signal_at("AAPL", pm_session()).await;
        assert!(signal.direction.is_directional());
        let id = signal.prediction_id.expect("prediction registered");

        let before_horizon = tracker.run_batch_validation_at(pm_session() + chrono::Duration::days(2)).await;
        assert_eq!(before_horizon.validated, 0);

        let after = pm_session() + chrono::Duration::days(7);
        let report = tracker.run_batch_validation_at(after).await;
        assert_eq!(report.validated, 1);

        let result = tracker.result(&id).await.unwrap();
        assert_eq!(result.entry_price, 100.0);
        assert_eq!(result.actual_direction, expected_actual);
        assert_eq!(result.outcome, expected_outcome);

        let summary = tracker.rolling_accuracy_at(Some("AAPL"), after).await;
        match expected_outcome {
            Outcome::Neutral => assert_eq!(summary.last_30_days.accuracy, None),
            _ => assert_eq!(summary.last_30_days.accuracy, Some(1.0)),
        }

        let again = tracker.run_batch_validation_at(after).await;
        assert_eq!(again.validated, 0);
    }
}

#[tokio::test]
async fn scenario_d_failing_provider_degrades_and_fusion_completes() {
    let providers = Providers {
        hard_data: Some(Arc::new(FailingHardData)),
        ..Default::default()
    };
    let engine = FusionEngine::from_providers(providers, EngineConfig::default());
    let signal = engine.generate_signal_at("AAPL", pm_session()).await;

    assert_eq!(signal.layers.hard_data.score, 0.0);
    assert!(signal.layers.hard_data.confidence <= 10.0);
    assert!(signal.layers.hard_data.signals[0].contains("connection reset"));
    assert!(signal.degraded_layers.contains(&Layer::HardData));
    // no other provider is configured either
    assert_eq!(signal.degraded_layers.len(), 4);
    assert_eq!(signal.direction, Direction::Neutral);
    assert!(!signal.action.should_trade);
    assert_eq!(signal.action.position_size_multiplier, 0.0);
}

#[tokio::test]
async fn closed_session_never_trades() {
    let engine = engine_with_scores([90.0, 90.0, 90.0, 90.0], 100.0);
    // Saturday
    let saturday = Utc.with_ymd_and_hms(2026, 1, 17, 16, 0, 0).unwrap();
    let signal = engine.generate_signal_at("AAPL", saturday).await;
    assert_eq!(signal.direction, Direction::StrongBuy);
    assert_eq!(signal.session.current, TradingSession::Closed);
    assert!(!signal.action.should_trade);
    assert!(signal.action.entry_timing.starts_with("wait"));
}

#[tokio::test]
async fn power_hour_strong_signal_trades() {
    let engine = engine_with_scores([70.0, 60.0, 55.0, 50.0], 90.0);
    // 15:30 ET
    let power_hour = Utc.with_ymd_and_hms(2026, 1, 13, 20, 30, 0).unwrap();
    let signal = engine.generate_signal_at("NVDA", power_hour).await;

    assert_eq!(signal.session.current, TradingSession::NyPmPowerHour);
    assert_eq!(signal.regime.volatility, VolatilityClass::Extreme);
    assert!(signal.action.should_trade);
    // risk-off halves the size
    assert_eq!(signal.action.position_size_multiplier, 0.5);
    assert_eq!((signal.action.stop_loss_percent, signal.action.take_profit_percent), (3.0, 6.0));
    assert!(signal.expected_accuracy <= 95.0);
    assert!(signal.expected_accuracy > signal.win_rate.base_session_rate * 100.0);
}

#[tokio::test]
async fn factors_are_bucketed() {
    let engine = engine_with_scores([40.0, -30.0, -20.0, 10.0], 60.0);
    let signal = engine.generate_signal_at("AAPL", pm_session()).await;
    assert_eq!(signal.bullish_factors, vec!["Dark pool accumulation (65% buys)".to_string()]);
    assert_eq!(signal.bearish_factors, vec!["Uptrend (strength 0.50)".to_string()]);
    assert_eq!(signal.risk_factors, vec!["Panic warning - indicator at 80%".to_string()]);
}

#[tokio::test]
async fn combined_signal_json_contract() {
    let engine = engine_with_scores([40.0, 30.0, 20.0, 10.0], 70.0);
    let signal = engine.generate_signal_at("AAPL", pm_session()).await;
    let json = serde_json::to_value(&signal).unwrap();

    assert_eq!(json["direction"], "BUY");
    assert!(json["expectedAccuracy"].is_number());
    assert!(json["layers"]["hardData"]["score"].is_number());
    assert!(json["layers"]["sam"]["weight"].is_number());
    assert!(json["weights"]["adjustmentReason"].is_string());
    assert_eq!(json["session"]["current"], "ny_pm_session");
    assert!(json["session"]["adjustedConfidence"].is_number());
    assert!(json["action"]["positionSizeMultiplier"].is_number());
    assert!(json["action"]["shouldTrade"].is_boolean());
    assert!(json["bullishFactors"].is_array());
    assert!(json["degradedLayers"].as_array().unwrap().is_empty());
    assert_eq!(json["regime"]["regime"], "neutral");
}
