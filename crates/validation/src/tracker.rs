use std::collections::HashMap;
use std::sync::Arc;

use analysis_core::{AnalysisError, Bar, BarSource};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use session_clock::SessionClock;
use tokio::sync::RwLock;

use crate::metrics::{self, LayerTally, OutcomeTally};
use crate::types::{
    BatchValidationReport, LayerAccuracy, MoveDirection, Outcome, PredictionRecord,
    RollingAccuracy, ValidationResult,
};

/// Calendar days searched before the prediction for an entry close
const ENTRY_LOOKBACK_DAYS: i64 = 7;
/// Calendar days after the target date in which an exit bar must exist
const EXIT_WINDOW_DAYS: i64 = 5;
/// Individual results older than the widest rolling window are dropped
const RESULT_RETENTION_DAYS: i64 = 90;
/// Hard cap on retained results; the oldest go first
const MAX_RETAINED_RESULTS: usize = 10_000;

#[derive(Default)]
struct TrackerState {
    pending: HashMap<String, PredictionRecord>,
    /// Recent results, bounded by age and count
    results: HashMap<String, ValidationResult>,
    /// All-time outcomes per symbol
    all_time: HashMap<String, OutcomeTally>,
    layers: LayerTally,
}

impl TrackerState {
    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::days(RESULT_RETENTION_DAYS);
        self.results.retain(|_, r| r.validated_at >= cutoff);

        if self.results.len() > MAX_RETAINED_RESULTS {
            let mut by_age: Vec<(DateTime<Utc>, String)> = self
                .results
                .values()
                .map(|r| (r.validated_at, r.prediction_id.clone()))
                .collect();
            by_age.sort();
            let excess = self.results.len() - MAX_RETAINED_RESULTS;
            for (_, id) in by_age.into_iter().take(excess) {
                self.results.remove(&id);
            }
        }
    }
}

/// Owns the prediction -> validation lifecycle.
///
/// Predictions stay pending until their horizon elapses and a batch run finds
/// market data for them. Failed resolutions are left pending and retried on
/// the next batch. A resolved prediction is folded into the accuracy tallies
/// and dropped; its result is kept for the rolling windows only.
pub struct ValidationTracker {
    bars: Arc<dyn BarSource>,
    clock: SessionClock,
    state: RwLock<TrackerState>,
}

impl ValidationTracker {
    pub fn new(bars: Arc<dyn BarSource>) -> Self {
        Self {
            bars,
            clock: SessionClock::new(),
            state: RwLock::new(TrackerState::default()),
        }
    }

    pub async fn register(&self, record: PredictionRecord) -> String {
        let id = record.id.clone();
        tracing::info!(
            "Registered prediction {} for {}: {:?} ({:.0}% confidence, {}d horizon)",
            id,
            record.symbol,
            record.expected_direction,
            record.expected_confidence,
            record.horizon_days
        );
        self.state.write().await.pending.insert(id.clone(), record);
        id
    }

    /// Remove a prediction that has not been validated yet.
    pub async fn discard_prediction(&self, id: &str) -> bool {
        self.state.write().await.pending.remove(id).is_some()
    }

    /// A prediction that is still pending
    pub async fn prediction(&self, id: &str) -> Option<PredictionRecord> {
        self.state.read().await.pending.get(id).cloned()
    }

    /// A result still inside the retention window
    pub async fn result(&self, id: &str) -> Option<ValidationResult> {
        self.state.read().await.results.get(id).cloned()
    }

    pub async fn pending_predictions(&self) -> Vec<PredictionRecord> {
        let mut pending: Vec<PredictionRecord> = self.state.read().await.pending.values().cloned().collect();
        pending.sort_by_key(|p| p.prediction_timestamp);
        pending
    }

    pub async fn run_batch_validation(&self) -> BatchValidationReport {
        self.run_batch_validation_at(Utc::now()).await
    }

    /// Resolve every pending prediction whose horizon has elapsed by `now`.
    /// Re-running with nothing newly due validates nothing.
    pub async fn run_batch_validation_at(&self, now: DateTime<Utc>) -> BatchValidationReport {
        let pending = self.pending_predictions().await;
        let (due, not_due): (Vec<_>, Vec<_>) = pending.into_iter().partition(|p| p.is_due(now));

        let mut report = BatchValidationReport {
            checked: due.len(),
            still_pending: not_due.len(),
            ..Default::default()
        };

        for record in &due {
            match self.resolve(record, now).await {
                Ok(result) => {
                    let mut state = self.state.write().await;
                    // discarded or resolved by a concurrent run meanwhile
                    let Some(record) = state.pending.remove(&record.id) else {
                        continue;
                    };
                    tracing::info!(
                        "Validated {} ({}): {:?}, return {:+.2}%",
                        record.id,
                        record.symbol,
                        result.outcome,
                        result.actual_return_pct
                    );
                    state.all_time.entry(record.symbol.clone()).or_default().record(&result);
                    state.layers.record(&record, &result);
                    state.results.insert(record.id, result);
                    report.validated += 1;
                }
                Err(e) => {
                    tracing::warn!("Could not validate {} ({}): {}", record.id, record.symbol, e);
                    report.failed += 1;
                    report.still_pending += 1;
                }
            }
        }

        self.state.write().await.prune(now);

        tracing::info!(
            "Batch validation: {} checked, {} validated, {} failed, {} pending",
            report.checked,
            report.validated,
            report.failed,
            report.still_pending
        );
        report
    }

    async fn resolve(&self, record: &PredictionRecord, now: DateTime<Utc>) -> Result<ValidationResult, AnalysisError> {
        let target = record.target_date();
        let start = record.prediction_timestamp - Duration::days(ENTRY_LOOKBACK_DAYS);
        let end = target + Duration::days(EXIT_WINDOW_DAYS);
        let bars = self.bars.daily_bars(&record.symbol, start, end).await?;

        let entry_price = match record.entry_price {
            Some(price) => price,
            None => {
                let settled = self.clock.last_settled_date(record.prediction_timestamp);
                self.entry_close(&bars, settled).ok_or_else(|| {
                    AnalysisError::MissingMarketData(format!("no close settled by {settled}"))
                })?
            }
        };
        if entry_price <= 0.0 || !entry_price.is_finite() {
            return Err(AnalysisError::InvalidData(format!("entry price {entry_price}")));
        }

        let exit_bar = exit_bar(&bars, target).ok_or_else(|| {
            AnalysisError::MissingMarketData(format!("no bar within {EXIT_WINDOW_DAYS} days of {}", target.date_naive()))
        })?;

        let actual_return_pct = (exit_bar.close - entry_price) / entry_price * 100.0;
        let actual_direction = MoveDirection::from_return(actual_return_pct);
        let outcome = Outcome::classify(record.expected_direction, actual_direction);

        Ok(ValidationResult {
            prediction_id: record.id.clone(),
            symbol: record.symbol.clone(),
            outcome,
            expected_direction: record.expected_direction,
            actual_direction,
            actual_return_pct,
            entry_price,
            exit_price: exit_bar.close,
            validated_at: now,
            notes: format!(
                "Exit on {} ({}d horizon)",
                exit_bar.timestamp.date_naive(),
                record.horizon_days
            ),
        })
    }

    /// Last close whose session had ended by `settled`; a bar from the
    /// prediction's own session is never used while that session is open.
    fn entry_close(&self, bars: &[Bar], settled: NaiveDate) -> Option<f64> {
        bars.iter()
            .filter(|b| self.clock.local_date(b.timestamp) <= settled)
            .max_by_key(|b| b.timestamp)
            .map(|b| b.close)
    }

    pub async fn rolling_accuracy(&self, symbol: Option<&str>) -> RollingAccuracy {
        self.rolling_accuracy_at(symbol, Utc::now()).await
    }

    pub async fn rolling_accuracy_at(&self, symbol: Option<&str>, now: DateTime<Utc>) -> RollingAccuracy {
        let symbol = symbol.map(|s| s.trim().to_uppercase());
        let matches = |s: &str| symbol.as_deref().map_or(true, |wanted| s == wanted);

        let state = self.state.read().await;
        let recent: Vec<&ValidationResult> = state.results.values().filter(|r| matches(r.symbol.as_str())).collect();
        let window = |days| metrics::window_accuracy(recent.iter().copied(), Some(days), now);

        let mut all_time = OutcomeTally::default();
        for (_, tally) in state.all_time.iter().filter(|(s, _)| matches(s.as_str())) {
            all_time.merge(tally);
        }

        RollingAccuracy {
            symbol: symbol.clone(),
            last_7_days: window(7),
            last_30_days: window(30),
            last_90_days: window(90),
            all_time: all_time.to_window(None),
            pending: state.pending.values().filter(|p| matches(p.symbol.as_str())).count(),
        }
    }

    pub async fn layer_accuracy(&self) -> Vec<LayerAccuracy> {
        self.state.read().await.layers.accuracy()
    }

    /// Pending predictions and retained results currently held in memory
    pub async fn held(&self) -> (usize, usize) {
        let state = self.state.read().await;
        (state.pending.len(), state.results.len())
    }
}

fn exit_bar(bars: &[Bar], target: DateTime<Utc>) -> Option<&Bar> {
    let first = target.date_naive();
    let last = (target + Duration::days(EXIT_WINDOW_DAYS)).date_naive();
    bars.iter()
        .filter(|b| {
            let day = b.timestamp.date_naive();
            day >= first && day <= last
        })
        .min_by_key(|b| b.timestamp)
}
