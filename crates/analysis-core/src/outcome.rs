use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::types::LayerScore;

/// Confidence assigned to a layer that produced no real evidence.
pub const DEGRADED_CONFIDENCE: f64 = 10.0;

pub const PARTIAL_DATA_SIGNAL: &str = "Partial data - some APIs unavailable";

/// Result of one layer analysis.
///
/// `Degraded` carries a neutral, low-confidence score so the fuser can keep
/// going, while still telling "no data at all" apart from a real weak signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LayerOutcome {
    Ok(LayerScore),
    Degraded { score: LayerScore, reason: String },
}

impl LayerOutcome {
    pub fn degraded(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        LayerOutcome::Degraded {
            score: LayerScore::new(0.0, DEGRADED_CONFIDENCE, vec![reason.clone()]),
            reason,
        }
    }

    pub fn from_error(err: &AnalysisError) -> Self {
        Self::degraded(format!("Data unavailable ({err})"))
    }

    pub fn score(&self) -> &LayerScore {
        match self {
            LayerOutcome::Ok(score) => score,
            LayerOutcome::Degraded { score, .. } => score,
        }
    }

    pub fn into_score(self) -> LayerScore {
        match self {
            LayerOutcome::Ok(score) => score,
            LayerOutcome::Degraded { score, .. } => score,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, LayerOutcome::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            LayerOutcome::Ok(_) => None,
            LayerOutcome::Degraded { reason, .. } => Some(reason),
        }
    }
}

/// Run a provider call with a deadline, folding elapsed time into `AnalysisError::Timeout`.
pub async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, AnalysisError>
where
    F: Future<Output = Result<T, AnalysisError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(AnalysisError::Timeout(timeout.as_secs())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_outcome_is_low_confidence_neutral() {
        let outcome = LayerOutcome::degraded("provider offline");
        assert!(outcome.is_degraded());
        assert_eq!(outcome.reason(), Some("provider offline"));
        let score = outcome.score();
        assert_eq!(score.score, 0.0);
        assert_eq!(score.confidence, DEGRADED_CONFIDENCE);
        assert_eq!(score.signals, vec!["provider offline".to_string()]);
    }

    #[test]
    fn test_from_error_keeps_message() {
        let outcome = LayerOutcome::from_error(&AnalysisError::ApiError("502".into()));
        assert!(outcome.reason().unwrap().contains("502"));
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result: Result<(), AnalysisError> = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(AnalysisError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let result = with_timeout(Duration::from_secs(1), async { Ok::<_, AnalysisError>(7) }).await;
        assert_eq!(result, Ok(7));
    }
}
