//! Evidence accumulator shared by all layer analyzers.
//!
//! Each independent evidence item adds a fixed score and a fixed confidence
//! contribution. Totals are only clamped once, in [`EvidenceAccumulator::finish`],
//! so a single strong factor is never averaged away and extra corroborating
//! evidence can only push the result towards the bounds.

use crate::types::LayerScore;

#[derive(Debug, Default, Clone)]
pub struct EvidenceAccumulator {
    score: f64,
    confidence: f64,
    signals: Vec<String>,
    items: usize,
}

impl EvidenceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one evidence item.
    pub fn add(&mut self, score: f64, confidence: f64, signal: impl Into<String>) {
        self.score += score;
        self.confidence += confidence;
        self.signals.push(signal.into());
        self.items += 1;
    }

    /// Confidence-only contribution (data present but directionless).
    pub fn add_confidence(&mut self, confidence: f64) {
        self.confidence += confidence;
    }

    /// Attach an explanatory signal without touching the totals.
    pub fn note(&mut self, signal: impl Into<String>) {
        self.signals.push(signal.into());
    }

    pub fn items(&self) -> usize {
        self.items
    }

    pub fn raw_score(&self) -> f64 {
        self.score
    }

    pub fn raw_confidence(&self) -> f64 {
        self.confidence
    }

    pub fn finish(self) -> LayerScore {
        LayerScore::new(self.score, self.confidence, self.signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_then_clamps() {
        let mut acc = EvidenceAccumulator::new();
        acc.add(60.0, 40.0, "a");
        acc.add(70.0, 50.0, "b");
        acc.add(10.0, 30.0, "c");
        assert_eq!(acc.items(), 3);
        assert_eq!(acc.raw_score(), 140.0);

        let score = acc.finish();
        assert_eq!(score.score, 100.0);
        assert_eq!(score.confidence, 100.0);
        assert_eq!(score.signals, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_strong_single_factor_survives() {
        let mut acc = EvidenceAccumulator::new();
        acc.add(-45.0, 25.0, "panic");
        acc.add_confidence(5.0);
        acc.note("context only");
        let score = acc.finish();
        assert_eq!(score.score, -45.0);
        assert_eq!(score.confidence, 30.0);
        assert_eq!(score.signals.len(), 2);
    }

    #[test]
    fn test_empty_accumulator_is_neutral() {
        let score = EvidenceAccumulator::new().finish();
        assert_eq!(score.score, 0.0);
        assert_eq!(score.confidence, 0.0);
        assert!(score.signals.is_empty());
    }
}
