//! Behavioral (SAM) layer: night-time activity, day/night sentiment, panic,
//! fear/hope and smart-money positioning.

use std::sync::Arc;
use std::time::Duration;

use analysis_core::{
    with_timeout, BehavioralProvider, BehavioralSnapshot, EvidenceAccumulator, Layer,
    LayerAnalyzer, LayerOutcome, LayerScore, SmartMoneyFlow, SocialPost,
};
use async_trait::async_trait;
use chrono::{Timelike, Utc};

pub mod cache;
pub mod lexicon;

pub use cache::SentimentCache;
pub use lexicon::LexiconScorer;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

// US/Eastern hours counted as night-time posting
const NIGHT_START_HOUR: u32 = 22;
const NIGHT_END_HOUR: u32 = 6;

mod night_activity {
    pub const RATIO: f64 = 0.4;
    pub const SCORE: f64 = 10.0;
    pub const CONFIDENCE: f64 = 10.0;
}

mod sentiment {
    pub const NIGHT_PANIC: f64 = -0.3;
    pub const NIGHT_PANIC_SCORE: f64 = 20.0;
    pub const NIGHT_PANIC_CONFIDENCE: f64 = 15.0;
    pub const DAY_POSITIVE: f64 = 0.3;
    pub const DAY_NEGATIVE: f64 = -0.3;
    pub const DAY_SCORE: f64 = 15.0;
    pub const DAY_CONFIDENCE: f64 = 10.0;
}

mod panic_level {
    pub const THRESHOLD: f64 = 0.7;
    pub const SCORE: f64 = 25.0;
    pub const CONFIDENCE: f64 = 20.0;
}

/// Fear/hope index is read contrarian: extreme fear is a buy
mod fear_hope {
    pub const EXTREME_FEAR: f64 = 25.0;
    pub const EXTREME_HOPE: f64 = 75.0;
    pub const SCORE: f64 = 15.0;
    pub const CONFIDENCE: f64 = 15.0;
}

mod smart_money {
    pub const SCORE: f64 = 25.0;
    pub const CONFIDENCE: f64 = 20.0;
    pub const NEUTRAL_CONFIDENCE: f64 = 5.0;
}

pub struct BehavioralAnalyzer {
    provider: Option<Arc<dyn BehavioralProvider>>,
    scorer: LexiconScorer,
    cache: SentimentCache,
    timeout: Duration,
}

impl BehavioralAnalyzer {
    pub fn new(provider: Option<Arc<dyn BehavioralProvider>>) -> Self {
        Self {
            provider,
            scorer: LexiconScorer::new(),
            cache: SentimentCache::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_cache(mut self, cache: SentimentCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache(&self) -> &SentimentCache {
        &self.cache
    }

    /// Fill night ratio and day/night sentiment from raw posts where the
    /// provider left them empty.
    pub fn enrich(&self, mut snapshot: BehavioralSnapshot) -> BehavioralSnapshot {
        if snapshot.posts.is_empty() {
            return snapshot;
        }

        let now = Utc::now();
        let mut day_scores = Vec::new();
        let mut night_scores = Vec::new();

        for post in &snapshot.posts {
            let score = self
                .cache
                .get_or_insert_with(&post.text, now, || self.scorer.score(&post.text));
            if is_night_post(post) {
                night_scores.push(score);
            } else {
                day_scores.push(score);
            }
        }

        let total = (day_scores.len() + night_scores.len()) as f64;
        if snapshot.night_activity_ratio.is_none() {
            snapshot.night_activity_ratio = Some(night_scores.len() as f64 / total);
        }
        if snapshot.day_sentiment.is_none() {
            snapshot.day_sentiment = mean(&day_scores);
        }
        if snapshot.night_sentiment.is_none() {
            snapshot.night_sentiment = mean(&night_scores);
        }
        snapshot
    }

    /// Score the numeric indicators of a snapshot. Raw posts are ignored
    /// here; see [`BehavioralAnalyzer::enrich`].
    pub fn score_snapshot(snapshot: &BehavioralSnapshot) -> LayerScore {
        let mut acc = EvidenceAccumulator::new();

        if let Some(ratio) = snapshot.night_activity_ratio {
            if ratio > night_activity::RATIO {
                acc.add(
                    -night_activity::SCORE,
                    night_activity::CONFIDENCE,
                    format!("Elevated night-time activity ({:.0}% of posts) - fear signal", ratio * 100.0),
                );
            }
        }

        if let Some(night) = snapshot.night_sentiment {
            use sentiment::*;
            if night < NIGHT_PANIC {
                acc.add(-NIGHT_PANIC_SCORE, NIGHT_PANIC_CONFIDENCE, format!("Night-time sentiment panic ({night:+.2})"));
            }
        }

        if let Some(day) = snapshot.day_sentiment {
            use sentiment::*;
            if day > DAY_POSITIVE {
                acc.add(DAY_SCORE, DAY_CONFIDENCE, format!("Positive daytime sentiment ({day:+.2})"));
            } else if day < DAY_NEGATIVE {
                acc.add(-DAY_SCORE, DAY_CONFIDENCE, format!("Negative daytime sentiment ({day:+.2})"));
            }
        }

        if let Some(panic) = snapshot.panic_indicator {
            if panic > panic_level::THRESHOLD {
                acc.add(
                    -panic_level::SCORE,
                    panic_level::CONFIDENCE,
                    format!("Panic warning - indicator at {:.0}%", panic * 100.0),
                );
            }
        }

        if let Some(index) = snapshot.fear_hope_index {
            use fear_hope::*;
            if index < EXTREME_FEAR {
                acc.add(SCORE, CONFIDENCE, format!("Extreme fear (index {index:.0}) - contrarian buy"));
            } else if index > EXTREME_HOPE {
                acc.add(-SCORE, CONFIDENCE, format!("Extreme hope (index {index:.0}) - contrarian sell"));
            }
        }

        match snapshot.smart_money {
            Some(SmartMoneyFlow::Accumulation) => {
                acc.add(smart_money::SCORE, smart_money::CONFIDENCE, "Smart money accumulation")
            }
            Some(SmartMoneyFlow::Distribution) => {
                acc.add(-smart_money::SCORE, smart_money::CONFIDENCE, "Smart money distribution")
            }
            Some(SmartMoneyFlow::Neutral) => acc.add_confidence(smart_money::NEUTRAL_CONFIDENCE),
            None => {}
        }

        acc.finish()
    }
}

fn has_indicators(snapshot: &BehavioralSnapshot) -> bool {
    snapshot.night_activity_ratio.is_some()
        || snapshot.day_sentiment.is_some()
        || snapshot.night_sentiment.is_some()
        || snapshot.panic_indicator.is_some()
        || snapshot.fear_hope_index.is_some()
        || snapshot.smart_money.is_some()
}

fn is_night_post(post: &SocialPost) -> bool {
    let hour = post.posted_at.with_timezone(&chrono_tz::US::Eastern).hour();
    hour >= NIGHT_START_HOUR || hour < NIGHT_END_HOUR
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[async_trait]
impl LayerAnalyzer for BehavioralAnalyzer {
    fn layer(&self) -> Layer {
        Layer::Sam
    }

    async fn analyze(&self, symbol: &str) -> LayerOutcome {
        let provider = match &self.provider {
            Some(p) => p,
            None => return LayerOutcome::degraded("Behavioral provider not configured"),
        };

        match with_timeout(self.timeout, provider.fetch_behavioral(symbol)).await {
            Ok(snapshot) => {
                let snapshot = self.enrich(snapshot);
                if !has_indicators(&snapshot) {
                    tracing::warn!("No behavioral data for {}", symbol);
                    return LayerOutcome::degraded("No behavioral data available");
                }
                let score = Self::score_snapshot(&snapshot);
                tracing::debug!(
                    "Behavioral layer for {}: score {:.1}, confidence {:.1} ({} posts)",
                    symbol,
                    score.score,
                    score.confidence,
                    snapshot.posts.len()
                );
                LayerOutcome::Ok(score)
            }
            Err(e) => {
                tracing::warn!("Behavioral provider failed for {}: {}", symbol, e);
                LayerOutcome::from_error(&e)
            }
        }
    }
}
