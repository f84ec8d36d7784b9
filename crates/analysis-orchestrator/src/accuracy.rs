//! Expected win rate: session base rate plus behavioral-strength and
//! layer-agreement bonuses, hard-capped at 95%.

use analysis_core::{Direction, LayerScores};
use market_regime_detector::MarketRegime;
use serde::Serialize;
use session_clock::SessionProfile;

pub const MAX_WIN_RATE: f64 = 0.95;

mod sam_strength {
    /// Bonus at 100% behavioral confidence
    pub const MAX_BONUS: f64 = 0.08;
    pub const RISK_OFF_FACTOR: f64 = 1.25;
}

/// Bonus by number of layers agreeing with the fused direction
const AGREEMENT_BONUS: [(usize, f64); 3] = [(4, 0.10), (3, 0.05), (2, 0.02)];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinRateEstimate {
    pub base_session_rate: f64,
    pub sam_strength_bonus: f64,
    pub layer_agreement_bonus: f64,
    pub total_rate: f64,
}

pub fn estimate_win_rate(
    profile: &SessionProfile,
    layers: &LayerScores,
    direction: Direction,
    regime: &MarketRegime,
) -> WinRateEstimate {
    let base_session_rate = profile.base_win_rate;
    let fused_sign = direction.sign();

    let sam_strength_bonus = if fused_sign != 0 && layers.sam.sign() == fused_sign {
        let mut bonus = sam_strength::MAX_BONUS * layers.sam.confidence / 100.0;
        if regime.is_risk_off() {
            bonus *= sam_strength::RISK_OFF_FACTOR;
        }
        bonus
    } else {
        0.0
    };

    let agreeing = if fused_sign == 0 {
        0
    } else {
        layers.iter().filter(|(_, s)| s.sign() == fused_sign).count()
    };
    let layer_agreement_bonus = AGREEMENT_BONUS
        .iter()
        .find(|(count, _)| agreeing >= *count)
        .map(|(_, bonus)| *bonus)
        .unwrap_or(0.0);

    let total_rate = (base_session_rate + sam_strength_bonus + layer_agreement_bonus).min(MAX_WIN_RATE);

    WinRateEstimate {
        base_session_rate,
        sam_strength_bonus,
        layer_agreement_bonus,
        total_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{LayerScore, VolatilityClass};
    use market_regime_detector::detect_regime;
    use session_clock::TradingSession;

    fn layers(scores: [f64; 4], sam_confidence: f64) -> LayerScores {
        LayerScores {
            hard_data: LayerScore::new(scores[0], 60.0, vec![]),
            technical: LayerScore::new(scores[1], 60.0, vec![]),
            sam: LayerScore::new(scores[2], sam_confidence, vec![]),
            economic: LayerScore::new(scores[3], 60.0, vec![]),
        }
    }

    #[test]
    fn test_full_agreement_bonus() {
        let profile = TradingSession::NyAmPowerHour.profile();
        let regime = detect_regime(40.0, VolatilityClass::High);
        let est = estimate_win_rate(&profile, &layers([40.0, 30.0, 20.0, 10.0], 50.0), Direction::Buy, &regime);
        assert_eq!(est.base_session_rate, 0.68);
        assert!((est.sam_strength_bonus - 0.04).abs() < 1e-12);
        assert_eq!(est.layer_agreement_bonus, 0.10);
        assert!((est.total_rate - 0.82).abs() < 1e-12);
    }

    #[test]
    fn test_misaligned_behavioral_layer_gets_no_bonus() {
        let profile = TradingSession::NyPmSession.profile();
        let regime = detect_regime(0.0, VolatilityClass::Medium);
        let est = estimate_win_rate(&profile, &layers([40.0, 30.0, -20.0, 0.0], 90.0), Direction::Buy, &regime);
        assert_eq!(est.sam_strength_bonus, 0.0);
        assert_eq!(est.layer_agreement_bonus, 0.02);
    }

    #[test]
    fn test_risk_off_amplifies_behavioral_bonus() {
        let profile = TradingSession::NyPmPowerHour.profile();
        let regime = detect_regime(-40.0, VolatilityClass::Extreme);
        let est = estimate_win_rate(&profile, &layers([-40.0, 10.0, -60.0, 5.0], 100.0), Direction::Sell, &regime);
        assert!((est.sam_strength_bonus - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_neutral_direction_has_no_bonuses() {
        let profile = TradingSession::NyOpen.profile();
        let regime = detect_regime(0.0, VolatilityClass::High);
        let est = estimate_win_rate(&profile, &layers([10.0, 10.0, 10.0, 10.0], 100.0), Direction::Neutral, &regime);
        assert_eq!(est.total_rate, profile.base_win_rate);
    }

    #[test]
    fn test_total_never_exceeds_cap() {
        let regime = detect_regime(80.0, VolatilityClass::Extreme);
        for session in TradingSession::INTRADAY {
            let profile = session.profile();
            for direction in [Direction::StrongBuy, Direction::StrongSell] {
                let s = direction.sign() as f64 * 90.0;
                let est = estimate_win_rate(&profile, &layers([s, s, s, s], 100.0), direction, &regime);
                assert!(est.total_rate <= MAX_WIN_RATE);
            }
        }
    }

    #[test]
    fn test_cap_applies_to_strong_base_rate() {
        let profile = SessionProfile {
            base_win_rate: 0.90,
            ..TradingSession::NyAmPowerHour.profile()
        };
        let regime = detect_regime(0.0, VolatilityClass::Extreme);
        let est = estimate_win_rate(&profile, &layers([50.0; 4], 100.0), Direction::StrongBuy, &regime);
        assert_eq!(est.total_rate, MAX_WIN_RATE);
        assert!(est.base_session_rate + est.sam_strength_bonus + est.layer_agreement_bonus > MAX_WIN_RATE);
    }
}
