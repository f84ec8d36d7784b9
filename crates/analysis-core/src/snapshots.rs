//! Shapes returned by the external data collaborators.
//!
//! Every field that a provider might not have is optional; analyzers must
//! treat absence as "no evidence", never as an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Institutional / order-flow data for a symbol
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardDataSnapshot {
    #[serde(default)]
    pub order_flow: Option<OrderFlow>,
    #[serde(default)]
    pub options_flow: Option<OptionsFlow>,
    #[serde(default)]
    pub dark_pool: Option<DarkPoolActivity>,
    #[serde(default)]
    pub price: Option<PriceSnapshot>,
}

impl HardDataSnapshot {
    pub fn is_empty(&self) -> bool {
        self.order_flow.is_none()
            && self.options_flow.is_none()
            && self.dark_pool.is_none()
            && self.price.is_none()
    }

    /// Number of the four record kinds that are present
    pub fn available_sources(&self) -> usize {
        [
            self.order_flow.is_some(),
            self.options_flow.is_some(),
            self.dark_pool.is_some(),
            self.price.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFlow {
    pub buy_volume: f64,
    pub sell_volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsFlow {
    pub call_premium: f64,
    pub put_premium: f64,
    #[serde(default)]
    pub unusual_calls: u32,
    #[serde(default)]
    pub unusual_puts: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DarkPoolActivity {
    pub buy_volume: f64,
    pub sell_volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    pub price: f64,
    pub change_percent: f64,
    pub volume: f64,
    #[serde(default)]
    pub average_volume: Option<f64>,
}

/// Market-structure indicators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalSnapshot {
    /// -1.0 (strong downtrend) to 1.0 (strong uptrend)
    pub trend_strength: f64,
    pub rsi: f64,
    /// Market structure shift: -1, 0 or 1
    pub mss_signal: i8,
    /// Bullish minus bearish fair value gaps
    pub fvg_net_direction: i32,
    pub liquidity_void_nearby: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmartMoneyFlow {
    Accumulation,
    Distribution,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialPost {
    pub text: String,
    pub posted_at: DateTime<Utc>,
}

/// Behavioral (SAM) indicators. Sentiments are in [-1, 1], the panic
/// indicator in [0, 1] and the fear/hope index in [0, 100] (0 = fear).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehavioralSnapshot {
    #[serde(default)]
    pub night_activity_ratio: Option<f64>,
    #[serde(default)]
    pub day_sentiment: Option<f64>,
    #[serde(default)]
    pub night_sentiment: Option<f64>,
    #[serde(default)]
    pub panic_indicator: Option<f64>,
    #[serde(default)]
    pub fear_hope_index: Option<f64>,
    #[serde(default)]
    pub smart_money: Option<SmartMoneyFlow>,
    #[serde(default)]
    pub posts: Vec<SocialPost>,
}

/// Macro indicators, all nullable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomicSnapshot {
    #[serde(default)]
    pub vix: Option<f64>,
    /// Long minus short yield, in percentage points
    #[serde(default)]
    pub yield_curve: Option<f64>,
    #[serde(default)]
    pub consumer_sentiment: Option<f64>,
    /// 0 (extreme fear) to 100 (extreme greed)
    #[serde(default)]
    pub fear_greed_signal: Option<f64>,
    /// Probability in [0, 1]
    #[serde(default)]
    pub recession_risk: Option<f64>,
}

impl EconomicSnapshot {
    pub fn is_empty(&self) -> bool {
        self.vix.is_none()
            && self.yield_curve.is_none()
            && self.consumer_sentiment.is_none()
            && self.fear_greed_signal.is_none()
            && self.recession_risk.is_none()
    }
}
