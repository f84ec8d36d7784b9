//! Signal fuser and factor classification.

use analysis_core::{clamp_confidence, clamp_score, Direction, LayerScores};
use serde::Serialize;

use crate::weights::AdaptiveWeights;

/// Signals mentioning any of these are risk factors, whatever their layer says
const RISK_KEYWORDS: &[&str] = &["warning", "risk", "volatil"];

/// Attach the adaptive weights to each layer score.
pub fn apply_weights(layers: &mut LayerScores, weights: &AdaptiveWeights) {
    for layer in analysis_core::Layer::ALL {
        let score = layers.get_mut(layer);
        score.weight = weights.get(layer);
    }
}

/// Weighted composite `(total_score, overall_confidence)`.
pub fn fuse(layers: &LayerScores, weights: &AdaptiveWeights) -> (f64, f64) {
    let (score, confidence) = layers.iter().fold((0.0, 0.0), |(s, c), (layer, layer_score)| {
        let w = weights.get(layer);
        (s + layer_score.score * w, c + layer_score.confidence * w)
    });
    (clamp_score(score), clamp_confidence(confidence))
}

pub fn direction_for(score: f64) -> Direction {
    Direction::from_score(score)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Factors {
    pub bullish_factors: Vec<String>,
    pub bearish_factors: Vec<String>,
    pub risk_factors: Vec<String>,
}

/// Bucket every layer signal. Risk keywords win; otherwise the owning
/// layer's score sign decides (positive is bullish, anything else bearish).
pub fn classify_factors(layers: &LayerScores) -> Factors {
    let mut factors = Factors::default();
    for (_, score) in layers.iter() {
        for signal in &score.signals {
            let text = signal.clone();
            let lower = signal.to_lowercase();
            if RISK_KEYWORDS.iter().any(|k| lower.contains(k)) {
                factors.risk_factors.push(text);
            } else if score.score > 0.0 {
                factors.bullish_factors.push(text);
            } else {
                factors.bearish_factors.push(text);
            }
        }
    }
    factors
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{Layer, LayerScore};

    fn layers(scores: [f64; 4], confidence: f64) -> LayerScores {
        let make = |s: f64| LayerScore::new(s, confidence, vec![]);
        LayerScores {
            hard_data: make(scores[0]),
            technical: make(scores[1]),
            sam: make(scores[2]),
            economic: make(scores[3]),
        }
    }

    #[test]
    fn test_equal_weights_average() {
        let (score, confidence) = fuse(&layers([40.0, 30.0, 20.0, 10.0], 70.0), &AdaptiveWeights::equal());
        assert!((score - 25.0).abs() < 1e-9);
        assert!((confidence - 70.0).abs() < 1e-9);
        assert_eq!(direction_for(score), Direction::Buy);
    }

    #[test]
    fn test_weighted_fuse() {
        let w = AdaptiveWeights::new(0.4, 0.3, 0.2, 0.1, "test").unwrap();
        let (score, confidence) = fuse(&layers([100.0, -100.0, 0.0, 50.0], 50.0), &w);
        assert!((score - 15.0).abs() < 1e-9);
        assert!((confidence - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_apply_weights() {
        let mut l = layers([0.0; 4], 0.0);
        apply_weights(&mut l, &AdaptiveWeights::default_allocation());
        assert_eq!(l.get(Layer::HardData).weight, 0.30);
        assert_eq!(l.get(Layer::Economic).weight, 0.20);
    }

    #[test]
    fn test_classification_by_owning_layer_sign() {
        let scores = LayerScores {
            hard_data: LayerScore::new(20.0, 50.0, vec![
                "Dark pool distribution (30% buys)".into(),
                "Volume spike 2.0x average - elevated volatility".into(),
            ]),
            technical: LayerScore::new(-10.0, 50.0, vec!["Bullish market structure shift".into()]),
            sam: LayerScore::new(0.0, 10.0, vec!["Data unavailable".into()]),
            economic: LayerScore::new(-30.0, 40.0, vec!["Yield curve inverted (-0.40) - recession RISK".into()]),
        };
        let f = classify_factors(&scores);
        // text says bearish but its layer is net positive
        assert_eq!(f.bullish_factors, vec!["Dark pool distribution (30% buys)".to_string()]);
        assert_eq!(f.bearish_factors.len(), 2);
        assert_eq!(f.bearish_factors[0], "Bullish market structure shift");
        assert_eq!(f.risk_factors.len(), 2);
    }
}
