//! Weight adapter: per-layer fusion weights from confidence, agreement and regime.

use analysis_core::{AnalysisError, Layer};
use market_regime_detector::{MarketRegime, RegimeKind};
use serde::Serialize;

const LAYERS: usize = 4;

/// Hard-Data, Technical, Behavioral, Economic
pub const DEFAULT_ALLOCATION: [f64; LAYERS] = [0.30, 0.25, 0.25, 0.20];

const WEIGHT_FLOOR: f64 = 0.05;
const WEIGHT_CAP: f64 = 0.40;
const SUM_TOLERANCE: f64 = 1e-6;

/// Confidence relative to the mean maps into [MIN, MAX]
mod confidence {
    pub const MIN_FACTOR: f64 = 0.5;
    pub const MAX_FACTOR: f64 = 1.5;
}

mod agreement {
    /// Scores within +-DEADBAND carry no direction
    pub const DEADBAND: f64 = 5.0;
    pub const AGREE_FACTOR: f64 = 1.15;
    pub const OUTLIER_FACTOR: f64 = 0.7;
}

mod regime_override {
    pub const RISK_OFF_SAM_FACTOR: f64 = 1.4;
    pub const RISK_OFF_SAM_CAP: f64 = 0.45;
    pub const RISK_OFF_TECHNICAL_FACTOR: f64 = 0.85;
    pub const RISK_ON_HARD_DATA_FACTOR: f64 = 1.15;
    pub const RISK_ON_TECHNICAL_FACTOR: f64 = 1.1;
}

/// Factors smaller than this (in log terms) are not worth reporting
const SIGNIFICANT_ADJUSTMENT: f64 = 0.01;
/// Final weights within this of the default allocation count as unchanged
const SIGNIFICANT_SHIFT: f64 = 0.01;
const DEFAULT_REASON: &str = "Default allocation - no significant adjustment";

/// Per-layer fusion weights summing to 1.0. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveWeights {
    hard_data: f64,
    technical: f64,
    sam: f64,
    economic: f64,
    adjustment_reason: String,
}

impl AdaptiveWeights {
    /// Validated constructor: weights must be non-negative and sum to 1.0.
    pub fn new(
        hard_data: f64,
        technical: f64,
        sam: f64,
        economic: f64,
        adjustment_reason: impl Into<String>,
    ) -> Result<Self, AnalysisError> {
        let all = [hard_data, technical, sam, economic];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(AnalysisError::InvalidConfiguration(format!("negative or non-finite weight in {all:?}")));
        }
        let sum: f64 = all.iter().sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(AnalysisError::InvalidConfiguration(format!("weights sum to {sum:.6}, expected 1.0")));
        }
        Ok(Self {
            hard_data,
            technical,
            sam,
            economic,
            adjustment_reason: adjustment_reason.into(),
        })
    }

    pub fn default_allocation() -> Self {
        let [h, t, s, e] = DEFAULT_ALLOCATION;
        Self {
            hard_data: h,
            technical: t,
            sam: s,
            economic: e,
            adjustment_reason: "Default allocation".to_string(),
        }
    }

    pub fn equal() -> Self {
        Self {
            hard_data: 0.25,
            technical: 0.25,
            sam: 0.25,
            economic: 0.25,
            adjustment_reason: "Equal weights".to_string(),
        }
    }

    pub fn get(&self, layer: Layer) -> f64 {
        match layer {
            Layer::HardData => self.hard_data,
            Layer::Technical => self.technical,
            Layer::Sam => self.sam,
            Layer::Economic => self.economic,
        }
    }

    pub fn as_array(&self) -> [f64; LAYERS] {
        [self.hard_data, self.technical, self.sam, self.economic]
    }

    pub fn adjustment_reason(&self) -> &str {
        &self.adjustment_reason
    }
}

impl Default for AdaptiveWeights {
    fn default() -> Self {
        Self::default_allocation()
    }
}

/// A stage that scaled one or more raw weights
#[derive(Debug, Clone, Copy)]
enum Adjustment {
    Confidence { layer: Layer, boosted: bool },
    Agreement { layer: Layer, boosted: bool },
    Regime(RegimeKind),
}

impl Adjustment {
    /// Layers this stage pushed, with the direction it pushed them
    fn pushes(&self) -> Vec<(Layer, bool)> {
        match *self {
            Adjustment::Confidence { layer, boosted } | Adjustment::Agreement { layer, boosted } => {
                vec![(layer, boosted)]
            }
            Adjustment::Regime(RegimeKind::RiskOff) => vec![(Layer::Sam, true), (Layer::Technical, false)],
            Adjustment::Regime(RegimeKind::RiskOn) => vec![(Layer::HardData, true), (Layer::Technical, true)],
            Adjustment::Regime(RegimeKind::Neutral) => Vec::new(),
        }
    }

    /// Largest final shift, in the pushed direction, among the layers this stage touched
    fn realised(&self, shift: &[f64; LAYERS]) -> f64 {
        self.pushes()
            .into_iter()
            .map(|(layer, boosted)| {
                let moved = shift[layer.index()];
                if (moved > 0.0) == boosted {
                    moved.abs()
                } else {
                    0.0
                }
            })
            .fold(0.0, f64::max)
    }

    fn describe(&self) -> String {
        match *self {
            Adjustment::Confidence { layer, boosted: true } => {
                format!("Confidence-weighted: {} most confident, weight raised", layer.label())
            }
            Adjustment::Confidence { layer, boosted: false } => {
                format!("Confidence-weighted: {} least confident, weight reduced", layer.label())
            }
            Adjustment::Agreement { layer, boosted: false } => {
                format!("Disagreement: {} discounted as outlier", layer.label())
            }
            Adjustment::Agreement { layer, boosted: true } => {
                format!("Agreement: {} aligned with the majority, weight raised", layer.label())
            }
            Adjustment::Regime(RegimeKind::RiskOff) => {
                "Risk-off regime: behavioral weight raised (cap 45%), technical reduced".to_string()
            }
            Adjustment::Regime(_) => "Risk-on regime: hard-data and technical weights raised".to_string(),
        }
    }
}

/// Explain the final weights by the stage whose push survived renormalisation
/// the most. Ties go to the stronger raw factor.
fn explain_adjustment(final_weights: &[f64; LAYERS], candidates: &[(f64, Adjustment)]) -> String {
    let shift: [f64; LAYERS] = std::array::from_fn(|i| final_weights[i] - DEFAULT_ALLOCATION[i]);
    let Some(largest) = Layer::ALL
        .into_iter()
        .max_by(|a, b| shift[a.index()].abs().total_cmp(&shift[b.index()].abs()))
    else {
        return DEFAULT_REASON.to_string();
    };
    let largest_shift = shift[largest.index()];
    if largest_shift.abs() < SIGNIFICANT_SHIFT {
        return DEFAULT_REASON.to_string();
    }

    candidates
        .iter()
        .map(|(magnitude, adjustment)| (adjustment.realised(&shift), *magnitude, adjustment))
        .filter(|(realised, _, _)| *realised >= SIGNIFICANT_SHIFT)
        .max_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)))
        .map(|(_, _, adjustment)| adjustment.describe())
        .unwrap_or_else(|| {
            let verb = if largest_shift > 0.0 { "raised" } else { "reduced" };
            format!("Renormalised: {} weight {} by bounds", largest.label(), verb)
        })
}

/// Compute adaptive weights. Inputs are indexed in [`Layer::ALL`] order.
///
/// Starts from [`DEFAULT_ALLOCATION`], scales each layer by its confidence
/// relative to the mean, rewards layers agreeing with the majority of the
/// other layers, discounts outliers, then applies regime overrides. The result
/// is renormalised within a 5% floor and a 40% cap (45% for the behavioral
/// layer in risk-off).
pub fn compute_weights(
    confidences: [f64; LAYERS],
    regime: &MarketRegime,
    scores: [f64; LAYERS],
) -> AdaptiveWeights {
    let mut raw = DEFAULT_ALLOCATION;
    let mut candidates: Vec<(f64, Adjustment)> = Vec::new();
    let mut consider = |magnitude: f64, adjustment: Adjustment| {
        if magnitude >= SIGNIFICANT_ADJUSTMENT {
            candidates.push((magnitude, adjustment));
        }
    };

    let confidences = confidences.map(|c| if c.is_finite() { c.clamp(0.0, 100.0) } else { 0.0 });
    let mean_confidence = confidences.iter().sum::<f64>() / LAYERS as f64;
    if mean_confidence > 0.0 {
        for layer in Layer::ALL {
            let i = layer.index();
            let factor = (0.5 + 0.5 * confidences[i] / mean_confidence)
                .clamp(confidence::MIN_FACTOR, confidence::MAX_FACTOR);
            raw[i] *= factor;
            consider(factor.ln().abs(), Adjustment::Confidence { layer, boosted: factor > 1.0 });
        }
    }

    let signs = scores.map(|s| {
        if s > agreement::DEADBAND {
            1i32
        } else if s < -agreement::DEADBAND {
            -1
        } else {
            0
        }
    });
    for layer in Layer::ALL {
        let i = layer.index();
        if signs[i] == 0 {
            continue;
        }
        let others: i32 = (0..LAYERS).filter(|j| *j != i).map(|j| signs[j]).sum();
        if others == 0 {
            continue;
        }
        let factor = if signs[i] == others.signum() {
            agreement::AGREE_FACTOR
        } else {
            agreement::OUTLIER_FACTOR
        };
        raw[i] *= factor;
        consider(factor.ln().abs(), Adjustment::Agreement { layer, boosted: factor > 1.0 });
    }

    let mut caps = [WEIGHT_CAP; LAYERS];
    match regime.regime {
        RegimeKind::RiskOff => {
            use regime_override::*;
            raw[Layer::Sam.index()] *= RISK_OFF_SAM_FACTOR;
            raw[Layer::Technical.index()] *= RISK_OFF_TECHNICAL_FACTOR;
            caps[Layer::Sam.index()] = RISK_OFF_SAM_CAP;
            consider(RISK_OFF_SAM_FACTOR.ln(), Adjustment::Regime(RegimeKind::RiskOff));
        }
        RegimeKind::RiskOn => {
            use regime_override::*;
            raw[Layer::HardData.index()] *= RISK_ON_HARD_DATA_FACTOR;
            raw[Layer::Technical.index()] *= RISK_ON_TECHNICAL_FACTOR;
            consider(RISK_ON_HARD_DATA_FACTOR.ln(), Adjustment::Regime(RegimeKind::RiskOn));
        }
        RegimeKind::Neutral => {}
    }

    let bounded = normalize_bounded(raw, caps);
    let adjustment_reason = explain_adjustment(&bounded, &candidates);
    let [hard_data, technical, sam, economic] = bounded;

    AdaptiveWeights { hard_data, technical, sam, economic, adjustment_reason }
}

/// Rescale to sum 1.0 while keeping every weight within [floor, cap].
fn normalize_bounded(raw: [f64; LAYERS], caps: [f64; LAYERS]) -> [f64; LAYERS] {
    let total: f64 = raw.iter().sum();
    let mut w = if total > 0.0 && total.is_finite() {
        raw.map(|r| r / total)
    } else {
        DEFAULT_ALLOCATION
    };

    for _ in 0..32 {
        for i in 0..LAYERS {
            w[i] = w[i].clamp(WEIGHT_FLOOR, caps[i]);
        }
        let diff = 1.0 - w.iter().sum::<f64>();
        if diff.abs() < 1e-12 {
            break;
        }
        let adjustable: Vec<usize> = (0..LAYERS)
            .filter(|&i| if diff > 0.0 { w[i] < caps[i] } else { w[i] > WEIGHT_FLOOR })
            .collect();
        let pool: f64 = adjustable.iter().map(|&i| w[i]).sum();
        if pool <= 0.0 {
            break;
        }
        for &i in &adjustable {
            w[i] += diff * w[i] / pool;
        }
    }

    // Put any floating-point residue on the layer with the most room
    let residue = 1.0 - w.iter().sum::<f64>();
    if residue != 0.0 {
        let room = |i: usize| if residue > 0.0 { caps[i] - w[i] } else { w[i] - WEIGHT_FLOOR };
        if let Some(i) = (0..LAYERS).max_by(|a, b| room(*a).total_cmp(&room(*b))) {
            w[i] += residue;
        }
    }
    w
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::VolatilityClass;
    use market_regime_detector::detect_regime;

    fn neutral() -> MarketRegime {
        detect_regime(0.0, VolatilityClass::Medium)
    }

    fn risk_off() -> MarketRegime {
        detect_regime(0.0, VolatilityClass::Extreme)
    }

    fn sum(w: &AdaptiveWeights) -> f64 {
        w.as_array().iter().sum()
    }

    #[test]
    fn test_default_allocation_is_valid() {
        let w = AdaptiveWeights::default_allocation();
        assert!((sum(&w) - 1.0).abs() < 1e-12);
        assert_eq!(w.get(Layer::HardData), 0.30);
        assert_eq!(w.get(Layer::Economic), 0.20);
    }

    #[test]
    fn test_new_rejects_bad_sum() {
        assert!(matches!(
            AdaptiveWeights::new(0.5, 0.5, 0.5, 0.5, "x"),
            Err(AnalysisError::InvalidConfiguration(_))
        ));
        assert!(AdaptiveWeights::new(0.6, 0.5, -0.1, 0.0, "x").is_err());
        assert!(AdaptiveWeights::new(0.25, 0.25, 0.25, 0.25, "x").is_ok());
    }

    #[test]
    fn test_equal_inputs_keep_default() {
        let w = compute_weights([50.0; 4], &neutral(), [0.0; 4]);
        for (a, b) in w.as_array().iter().zip(DEFAULT_ALLOCATION.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
        assert!(w.adjustment_reason().starts_with("Default allocation"));
    }

    #[test]
    fn test_unanimous_agreement_reports_default() {
        // every layer gets the same agreement factor, which renormalisation cancels
        let w = compute_weights([70.0; 4], &neutral(), [40.0, 30.0, 20.0, 10.0]);
        for (a, b) in w.as_array().iter().zip(DEFAULT_ALLOCATION.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
        assert_eq!(w.adjustment_reason(), DEFAULT_REASON);
    }

    #[test]
    fn test_reason_names_layer_that_moved() {
        let w = compute_weights([90.0, 30.0, 30.0, 30.0], &neutral(), [40.0, 30.0, 20.0, 10.0]);
        assert!(w.get(Layer::HardData) > 0.31);
        assert!(w.adjustment_reason().starts_with("Confidence-weighted: Hard-Data"));
    }

    #[test]
    fn test_confident_layer_gains_weight() {
        let w = compute_weights([90.0, 30.0, 30.0, 30.0], &neutral(), [0.0; 4]);
        assert!(w.get(Layer::HardData) > 0.30);
        assert!(w.get(Layer::Technical) < 0.25);
        assert!((sum(&w) - 1.0).abs() < 1e-9);
        assert!(w.get(Layer::HardData) <= WEIGHT_CAP + 1e-12);
    }

    #[test]
    fn test_outlier_is_discounted() {
        let w = compute_weights([60.0; 4], &neutral(), [40.0, 35.0, 30.0, -50.0]);
        assert!(w.get(Layer::Economic) < 0.20);
        assert!(w.adjustment_reason().contains("Economic"));
    }

    #[test]
    fn test_risk_off_raises_behavioral_above_normal_cap() {
        let w = compute_weights([20.0, 20.0, 95.0, 20.0], &risk_off(), [10.0, 10.0, 60.0, 10.0]);
        assert!(w.get(Layer::Sam) > WEIGHT_CAP);
        assert!(w.get(Layer::Sam) <= 0.45 + 1e-12);
        assert!((sum(&w) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounds_and_sum_hold_for_extremes() {
        let regimes = [neutral(), risk_off(), detect_regime(50.0, VolatilityClass::High)];
        let confidence_sets = [[0.0; 4], [100.0, 0.0, 0.0, 0.0], [100.0, 100.0, 0.0, 100.0], [f64::NAN, 10.0, 20.0, 30.0]];
        let score_sets = [[100.0, -100.0, 100.0, -100.0], [100.0; 4], [0.0, 0.0, 0.0, 90.0]];
        for regime in &regimes {
            for c in &confidence_sets {
                for s in &score_sets {
                    let w = compute_weights(*c, regime, *s);
                    assert!((sum(&w) - 1.0).abs() < 1e-9, "sum {} for {c:?} {s:?}", sum(&w));
                    for v in w.as_array() {
                        assert!(v >= WEIGHT_FLOOR - 1e-9 && v <= 0.45 + 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn test_pure_function() {
        let a = compute_weights([70.0, 40.0, 55.0, 20.0], &risk_off(), [30.0, -10.0, 45.0, 5.0]);
        let b = compute_weights([70.0, 40.0, 55.0, 20.0], &risk_off(), [30.0, -10.0, 45.0, 5.0]);
        assert_eq!(a, b);
    }
}
