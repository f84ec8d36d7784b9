//! Session adjuster: session confidence multiplier, trade gating and the
//! resulting trade action.

use analysis_core::{Direction, VolatilityClass};
use market_regime_detector::MarketRegime;
use serde::Serialize;
use session_clock::{SessionProfile, SessionRecommendation, TradingSession};

pub const OPTIMAL_MIN_CONFIDENCE: f64 = 60.0;
pub const OVERRIDE_MIN_CONFIDENCE: f64 = 70.0;
pub const REDUCED_SIZE_MIN_CONFIDENCE: f64 = 55.0;
pub const REDUCED_SIZE_FACTOR: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDecision {
    pub adjusted_confidence: f64,
    pub should_trade: bool,
    pub reduced_size: bool,
    pub reason: String,
}

/// Apply the session multiplier and walk the gating rules in order; the
/// first rule that matches decides.
pub fn adjust(base_confidence: f64, direction: Direction, profile: &SessionProfile) -> SessionDecision {
    let base = if base_confidence.is_finite() { base_confidence.max(0.0) } else { 0.0 };
    let adjusted = (base * profile.confidence_multiplier).min(100.0);
    let label = direction.to_label();

    let decision = |should_trade: bool, reduced_size: bool, reason: String| SessionDecision {
        adjusted_confidence: adjusted,
        should_trade,
        reduced_size,
        reason,
    };

    if profile.session == TradingSession::Closed {
        return decision(false, false, "Market closed - no trading".to_string());
    }

    if profile.session == TradingSession::Midday {
        return decision(
            false,
            false,
            format!("{} - low-quality session, no trading regardless of confidence", profile.name),
        );
    }

    if profile.is_optimal && adjusted >= OPTIMAL_MIN_CONFIDENCE {
        return decision(
            true,
            false,
            format!("{label} in optimal session {} with {adjusted:.0}% confidence", profile.name),
        );
    }

    if adjusted >= OVERRIDE_MIN_CONFIDENCE {
        return decision(
            true,
            false,
            format!("{label} on high-confidence override ({adjusted:.0}% in {})", profile.name),
        );
    }

    if profile.recommendation == SessionRecommendation::ReduceSize && adjusted >= REDUCED_SIZE_MIN_CONFIDENCE {
        return decision(
            true,
            true,
            format!("{label} at reduced size in {} ({adjusted:.0}% confidence)", profile.name),
        );
    }

    let required = if profile.is_optimal {
        OPTIMAL_MIN_CONFIDENCE
    } else if profile.recommendation == SessionRecommendation::ReduceSize {
        REDUCED_SIZE_MIN_CONFIDENCE
    } else {
        OVERRIDE_MIN_CONFIDENCE
    };
    decision(
        false,
        false,
        format!(
            "Confidence {adjusted:.0}% is {:.0} points below the {required:.0}% needed in {}",
            required - adjusted,
            profile.name
        ),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeAction {
    pub should_trade: bool,
    pub position_size_multiplier: f64,
    pub entry_timing: String,
    pub stop_loss_percent: f64,
    pub take_profit_percent: f64,
    pub reason: String,
}

/// Stop-loss and take-profit distance (percent) for a volatility class
pub fn risk_bands(volatility: VolatilityClass) -> (f64, f64) {
    match volatility {
        VolatilityClass::Low => (1.0, 2.0),
        VolatilityClass::Medium => (1.5, 3.0),
        VolatilityClass::High => (2.0, 4.0),
        VolatilityClass::Extreme => (3.0, 6.0),
    }
}

pub fn build_action(
    decision: &SessionDecision,
    profile: &SessionProfile,
    regime: &MarketRegime,
    next_optimal: TradingSession,
) -> TradeAction {
    let (stop_loss_percent, take_profit_percent) = risk_bands(profile.volatility);

    let (position_size_multiplier, entry_timing) = if !decision.should_trade {
        (0.0, format!("wait ({})", next_optimal.name()))
    } else if decision.reduced_size {
        (regime.risk_multiplier() * REDUCED_SIZE_FACTOR, "scale_in".to_string())
    } else {
        (regime.risk_multiplier(), "immediate".to_string())
    };

    TradeAction {
        should_trade: decision.should_trade,
        position_size_multiplier,
        entry_timing,
        stop_loss_percent,
        take_profit_percent,
        reason: decision.reason.clone(),
    }
}
