use analysis_core::VolatilityClass;
use serde::{Deserialize, Serialize};

/// Hard-data score beyond which the trend is called directional
pub const TREND_THRESHOLD: f64 = 20.0;

/// Coarse market-stress classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeKind {
    RiskOn,
    RiskOff,
    Neutral,
}

impl RegimeKind {
    pub fn name(&self) -> &'static str {
        match self {
            RegimeKind::RiskOn => "Risk On",
            RegimeKind::RiskOff => "Risk Off",
            RegimeKind::Neutral => "Neutral",
        }
    }

    /// Position-size multiplier for this regime (1.0 = normal risk)
    pub fn risk_multiplier(&self) -> f64 {
        match self {
            RegimeKind::RiskOn | RegimeKind::Neutral => 1.0,
            RegimeKind::RiskOff => 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendLabel {
    Bullish,
    Bearish,
    Sideways,
}

/// Regime for one fusion cycle. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketRegime {
    pub regime: RegimeKind,
    pub volatility: VolatilityClass,
    pub trend: TrendLabel,
}

impl MarketRegime {
    pub fn risk_multiplier(&self) -> f64 {
        self.regime.risk_multiplier()
    }

    pub fn is_risk_off(&self) -> bool {
        self.regime == RegimeKind::RiskOff
    }
}

/// Derive the regime from the hard-data score and the session volatility class.
pub fn detect_regime(hard_data_score: f64, volatility: VolatilityClass) -> MarketRegime {
    let trend = if hard_data_score > TREND_THRESHOLD {
        TrendLabel::Bullish
    } else if hard_data_score < -TREND_THRESHOLD {
        TrendLabel::Bearish
    } else {
        TrendLabel::Sideways
    };

    let regime = match volatility {
        VolatilityClass::Extreme => RegimeKind::RiskOff,
        VolatilityClass::High => RegimeKind::RiskOn,
        VolatilityClass::Medium | VolatilityClass::Low => RegimeKind::Neutral,
    };

    MarketRegime { regime, volatility, trend }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volatility_drives_regime() {
        assert_eq!(detect_regime(0.0, VolatilityClass::Extreme).regime, RegimeKind::RiskOff);
        assert_eq!(detect_regime(0.0, VolatilityClass::High).regime, RegimeKind::RiskOn);
        assert_eq!(detect_regime(0.0, VolatilityClass::Medium).regime, RegimeKind::Neutral);
        assert_eq!(detect_regime(0.0, VolatilityClass::Low).regime, RegimeKind::Neutral);
    }

    #[test]
    fn test_trend_thresholds_are_exclusive() {
        assert_eq!(detect_regime(20.0, VolatilityClass::Low).trend, TrendLabel::Sideways);
        assert_eq!(detect_regime(20.5, VolatilityClass::Low).trend, TrendLabel::Bullish);
        assert_eq!(detect_regime(-20.0, VolatilityClass::Low).trend, TrendLabel::Sideways);
        assert_eq!(detect_regime(-20.5, VolatilityClass::Low).trend, TrendLabel::Bearish);
    }

    #[test]
    fn test_volatility_passes_through() {
        let regime = detect_regime(55.0, VolatilityClass::High);
        assert_eq!(regime.volatility, VolatilityClass::High);
        assert_eq!(regime.risk_multiplier(), 1.0);
        assert!(detect_regime(0.0, VolatilityClass::Extreme).is_risk_off());
        assert_eq!(detect_regime(0.0, VolatilityClass::Extreme).risk_multiplier(), 0.5);
    }

    #[test]
    fn test_serializes_snake_case() {
        let json = serde_json::to_value(detect_regime(-40.0, VolatilityClass::Extreme)).unwrap();
        assert_eq!(json["regime"], "risk_off");
        assert_eq!(json["trend"], "bearish");
        assert_eq!(json["volatility"], "extreme");
    }
}
