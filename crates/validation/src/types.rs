use analysis_core::{Direction, Layer, LayerScores};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Realized moves within +-0.5% count as neutral
pub const DEAD_ZONE_PCT: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Bullish,
    Bearish,
    Neutral,
}

impl MoveDirection {
    pub fn from_signal(direction: Direction) -> Self {
        match direction.sign() {
            1 => MoveDirection::Bullish,
            -1 => MoveDirection::Bearish,
            _ => MoveDirection::Neutral,
        }
    }

    /// Classify a realized return (in percent) using the dead zone
    pub fn from_return(return_pct: f64) -> Self {
        if return_pct > DEAD_ZONE_PCT {
            MoveDirection::Bullish
        } else if return_pct < -DEAD_ZONE_PCT {
            MoveDirection::Bearish
        } else {
            MoveDirection::Neutral
        }
    }

    pub fn sign(&self) -> i8 {
        match self {
            MoveDirection::Bullish => 1,
            MoveDirection::Bearish => -1,
            MoveDirection::Neutral => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Incorrect,
    Neutral,
    Pending,
}

impl Outcome {
    pub fn classify(expected: MoveDirection, actual: MoveDirection) -> Self {
        match (expected, actual) {
            (MoveDirection::Neutral, _) | (_, MoveDirection::Neutral) => Outcome::Neutral,
            (e, a) if e == a => Outcome::Correct,
            _ => Outcome::Incorrect,
        }
    }
}

/// Per-layer state captured when the prediction was emitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerContribution {
    pub layer: Layer,
    pub score: f64,
    pub confidence: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRecord {
    pub id: String,
    pub symbol: String,
    pub prediction_timestamp: DateTime<Utc>,
    pub horizon_days: i64,
    pub signal: Direction,
    pub expected_direction: MoveDirection,
    pub expected_confidence: f64,
    pub layers: Vec<LayerContribution>,
    #[serde(default)]
    pub entry_price: Option<f64>,
}

impl PredictionRecord {
    pub fn new(
        symbol: impl Into<String>,
        signal: Direction,
        confidence: f64,
        horizon_days: i64,
        at: DateTime<Utc>,
        layers: &LayerScores,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.into().trim().to_uppercase(),
            prediction_timestamp: at,
            horizon_days: horizon_days.max(1),
            signal,
            expected_direction: MoveDirection::from_signal(signal),
            expected_confidence: confidence,
            layers: layers
                .iter()
                .map(|(layer, s)| LayerContribution {
                    layer,
                    score: s.score,
                    confidence: s.confidence,
                    weight: s.weight,
                })
                .collect(),
            entry_price: None,
        }
    }

    pub fn with_entry_price(mut self, price: f64) -> Self {
        self.entry_price = Some(price);
        self
    }

    pub fn target_date(&self) -> DateTime<Utc> {
        self.prediction_timestamp + Duration::days(self.horizon_days)
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.target_date()
    }
}

/// Created once per prediction, never modified afterwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub prediction_id: String,
    pub symbol: String,
    pub outcome: Outcome,
    pub expected_direction: MoveDirection,
    pub actual_direction: MoveDirection,
    pub actual_return_pct: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub validated_at: DateTime<Utc>,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchValidationReport {
    pub checked: usize,
    pub validated: usize,
    pub failed: usize,
    pub still_pending: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowAccuracy {
    /// `None` for all-time
    pub window_days: Option<i64>,
    pub correct: usize,
    pub incorrect: usize,
    pub neutral: usize,
    /// correct / (correct + incorrect); `None` when nothing directional resolved
    pub accuracy: Option<f64>,
    pub average_return_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingAccuracy {
    pub symbol: Option<String>,
    pub last_7_days: WindowAccuracy,
    pub last_30_days: WindowAccuracy,
    pub last_90_days: WindowAccuracy,
    pub all_time: WindowAccuracy,
    pub pending: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerAccuracy {
    pub layer: Layer,
    pub correct: usize,
    pub incorrect: usize,
    pub accuracy: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dead_zone() {
        assert_eq!(MoveDirection::from_return(1.2), MoveDirection::Bullish);
        assert_eq!(MoveDirection::from_return(0.5), MoveDirection::Neutral);
        assert_eq!(MoveDirection::from_return(0.2), MoveDirection::Neutral);
        assert_eq!(MoveDirection::from_return(-0.5), MoveDirection::Neutral);
        assert_eq!(MoveDirection::from_return(-0.51), MoveDirection::Bearish);
    }

    #[test]
    fn test_outcome_rules() {
        use MoveDirection::*;
        assert_eq!(Outcome::classify(Bullish, Bullish), Outcome::Correct);
        assert_eq!(Outcome::classify(Bearish, Bearish), Outcome::Correct);
        assert_eq!(Outcome::classify(Bullish, Bearish), Outcome::Incorrect);
        assert_eq!(Outcome::classify(Bullish, Neutral), Outcome::Neutral);
        assert_eq!(Outcome::classify(Neutral, Bearish), Outcome::Neutral);
        assert_eq!(Outcome::classify(Neutral, Neutral), Outcome::Neutral);
    }

    #[test]
    fn test_signal_mapping() {
        assert_eq!(MoveDirection::from_signal(Direction::StrongBuy), MoveDirection::Bullish);
        assert_eq!(MoveDirection::from_signal(Direction::Sell), MoveDirection::Bearish);
        assert_eq!(MoveDirection::from_signal(Direction::Neutral), MoveDirection::Neutral);
    }

    #[test]
    fn test_prediction_record_json() {
        use analysis_core::LayerScore;
        use chrono::TimeZone;

        let layers = LayerScores {
            hard_data: LayerScore::new(40.0, 70.0, vec![]).with_weight(0.3),
            technical: LayerScore::new(30.0, 60.0, vec![]).with_weight(0.25),
            sam: LayerScore::new(-20.0, 50.0, vec![]).with_weight(0.25),
            economic: LayerScore::neutral().with_weight(0.2),
        };
        let at = Utc.with_ymd_and_hms(2026, 1, 13, 15, 0, 0).unwrap();
        let record = PredictionRecord::new(" aapl ", Direction::Buy, 72.0, 5, at, &layers);

        assert_eq!(record.symbol, "AAPL");
        assert_eq!(record.target_date(), Utc.with_ymd_and_hms(2026, 1, 18, 15, 0, 0).unwrap());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["expectedDirection"], "bullish");
        assert_eq!(json["signal"], "BUY");
        assert_eq!(json["horizonDays"], 5);
        assert_eq!(json["layers"].as_array().unwrap().len(), 4);
        assert_eq!(json["layers"][0]["layer"], "hard_data");
        assert_eq!(json["layers"][0]["weight"], 0.3);
    }
}
