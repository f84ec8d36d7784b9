use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SCORE_MIN: f64 = -100.0;
pub const SCORE_MAX: f64 = 100.0;
pub const CONFIDENCE_MIN: f64 = 0.0;
pub const CONFIDENCE_MAX: f64 = 100.0;

/// OHLCV bar data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// One of the four independent evidence sources feeding the fusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    HardData,
    Technical,
    Sam,
    Economic,
}

impl Layer {
    pub const ALL: [Layer; 4] = [Layer::HardData, Layer::Technical, Layer::Sam, Layer::Economic];

    /// Human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            Layer::HardData => "Hard-Data",
            Layer::Technical => "Technical",
            Layer::Sam => "Behavioral (SAM)",
            Layer::Economic => "Economic",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Layer::HardData => 0,
            Layer::Technical => 1,
            Layer::Sam => 2,
            Layer::Economic => 3,
        }
    }
}

/// Volatility class of a trading session, also reused as the regime volatility label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityClass {
    Low,
    Medium,
    High,
    Extreme,
}

/// Per-layer output: score in [-100, 100], confidence in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerScore {
    pub score: f64,
    pub confidence: f64,
    pub signals: Vec<String>,
    /// Fusion weight, filled in by the fuser (0.0 until then)
    pub weight: f64,
}

impl LayerScore {
    /// Build a score, clamping score and confidence into range.
    pub fn new(score: f64, confidence: f64, signals: Vec<String>) -> Self {
        Self {
            score: clamp_score(score),
            confidence: clamp_confidence(confidence),
            signals,
            weight: 0.0,
        }
    }

    pub fn neutral() -> Self {
        Self::new(0.0, 0.0, Vec::new())
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight.clamp(0.0, 1.0);
        self
    }

    /// -1, 0 or +1 depending on the score direction
    pub fn sign(&self) -> i8 {
        if self.score > 0.0 {
            1
        } else if self.score < 0.0 {
            -1
        } else {
            0
        }
    }
}

/// One score per layer, serialized as `{hardData, technical, sam, economic}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerScores {
    pub hard_data: LayerScore,
    pub technical: LayerScore,
    pub sam: LayerScore,
    pub economic: LayerScore,
}

impl LayerScores {
    pub fn get(&self, layer: Layer) -> &LayerScore {
        match layer {
            Layer::HardData => &self.hard_data,
            Layer::Technical => &self.technical,
            Layer::Sam => &self.sam,
            Layer::Economic => &self.economic,
        }
    }

    pub fn get_mut(&mut self, layer: Layer) -> &mut LayerScore {
        match layer {
            Layer::HardData => &mut self.hard_data,
            Layer::Technical => &mut self.technical,
            Layer::Sam => &mut self.sam,
            Layer::Economic => &mut self.economic,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Layer, &LayerScore)> {
        Layer::ALL.into_iter().map(move |layer| (layer, self.get(layer)))
    }

    /// Scores in [`Layer::ALL`] order
    pub fn scores(&self) -> [f64; 4] {
        Layer::ALL.map(|layer| self.get(layer).score)
    }

    /// Confidences in [`Layer::ALL`] order
    pub fn confidences(&self) -> [f64; 4] {
        Layer::ALL.map(|layer| self.get(layer).confidence)
    }
}

/// NaN collapses to 0 so a broken upstream value can never escape the bounds.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(SCORE_MIN, SCORE_MAX)
}

pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        return 0.0;
    }
    confidence.clamp(CONFIDENCE_MIN, CONFIDENCE_MAX)
}

/// Discrete direction of the fused signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    StrongSell,
}

impl Direction {
    /// Map a composite score to a direction.
    ///
    /// `> 50` strong buy, `(20, 50]` buy, `[-20, 20]` neutral,
    /// `[-50, -20)` sell, `< -50` strong sell.
    pub fn from_score(score: f64) -> Self {
        if score > 50.0 {
            Direction::StrongBuy
        } else if score > 20.0 {
            Direction::Buy
        } else if score >= -20.0 {
            Direction::Neutral
        } else if score >= -50.0 {
            Direction::Sell
        } else {
            Direction::StrongSell
        }
    }

    pub fn sign(&self) -> i8 {
        match self {
            Direction::StrongBuy | Direction::Buy => 1,
            Direction::Neutral => 0,
            Direction::Sell | Direction::StrongSell => -1,
        }
    }

    pub fn is_directional(&self) -> bool {
        self.sign() != 0
    }

    /// Human-readable label for the signal
    pub fn to_label(&self) -> &'static str {
        match self {
            Direction::StrongBuy => "Strong Buy",
            Direction::Buy => "Buy",
            Direction::Neutral => "Neutral",
            Direction::Sell => "Sell",
            Direction::StrongSell => "Strong Sell",
        }
    }
}
