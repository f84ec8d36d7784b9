//! Accuracy aggregates. Windowed figures are recomputed from retained
//! results; all-time and per-layer figures are running tallies so they
//! survive pruning.

use std::collections::HashMap;

use analysis_core::Layer;
use chrono::{DateTime, Duration, Utc};

use crate::types::{
    LayerAccuracy, MoveDirection, Outcome, PredictionRecord, ValidationResult, WindowAccuracy,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutcomeTally {
    pub correct: usize,
    pub incorrect: usize,
    pub neutral: usize,
    return_sum: f64,
}

impl OutcomeTally {
    pub fn record(&mut self, result: &ValidationResult) {
        match result.outcome {
            Outcome::Correct => self.correct += 1,
            Outcome::Incorrect => self.incorrect += 1,
            Outcome::Neutral => self.neutral += 1,
            Outcome::Pending => return,
        }
        self.return_sum += result.actual_return_pct;
    }

    pub fn merge(&mut self, other: &OutcomeTally) {
        self.correct += other.correct;
        self.incorrect += other.incorrect;
        self.neutral += other.neutral;
        self.return_sum += other.return_sum;
    }

    pub fn to_window(&self, window_days: Option<i64>) -> WindowAccuracy {
        let decided = self.correct + self.incorrect;
        let total = decided + self.neutral;

        WindowAccuracy {
            window_days,
            correct: self.correct,
            incorrect: self.incorrect,
            neutral: self.neutral,
            accuracy: (decided > 0).then(|| self.correct as f64 / decided as f64),
            average_return_pct: (total > 0).then(|| self.return_sum / total as f64),
        }
    }
}

/// Hit rate over results validated within `window_days` of `now` (all when `None`).
pub fn window_accuracy<'a>(
    results: impl Iterator<Item = &'a ValidationResult>,
    window_days: Option<i64>,
    now: DateTime<Utc>,
) -> WindowAccuracy {
    let cutoff = window_days.map(|days| now - Duration::days(days));

    let mut tally = OutcomeTally::default();
    for result in results {
        if cutoff.is_some_and(|c| result.validated_at < c) {
            continue;
        }
        tally.record(result);
    }
    tally.to_window(window_days)
}

/// Per-layer hit counts. A layer is right when the sign of its captured
/// score matches the realized direction. Neutral moves and zero scores are
/// skipped.
#[derive(Debug, Clone, Default)]
pub struct LayerTally {
    counts: HashMap<Layer, (usize, usize)>,
}

impl LayerTally {
    pub fn record(&mut self, record: &PredictionRecord, result: &ValidationResult) {
        if result.actual_direction == MoveDirection::Neutral {
            return;
        }
        for contribution in &record.layers {
            let sign = if contribution.score > 0.0 {
                1
            } else if contribution.score < 0.0 {
                -1
            } else {
                continue;
            };
            let entry = self.counts.entry(contribution.layer).or_insert((0, 0));
            if sign == result.actual_direction.sign() {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }
    }

    pub fn accuracy(&self) -> Vec<LayerAccuracy> {
        Layer::ALL
            .iter()
            .map(|layer| {
                let (correct, incorrect) = self.counts.get(layer).copied().unwrap_or((0, 0));
                let decided = correct + incorrect;
                LayerAccuracy {
                    layer: *layer,
                    correct,
                    incorrect,
                    accuracy: (decided > 0).then(|| correct as f64 / decided as f64),
                }
            })
            .collect()
    }
}
