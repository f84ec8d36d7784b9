//! Validation Routes
//!
//! Rolling accuracy, per-layer attribution, pending predictions and manual
//! batch validation.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use market_data::normalize_symbol;
use serde::Deserialize;
use validation::{BatchValidationReport, LayerAccuracy, PredictionRecord, RollingAccuracy};

use crate::signal_routes::is_valid_symbol;
use crate::{ApiResponse, AppError, AppState};

#[derive(Deserialize)]
pub struct AccuracyQuery {
    /// Restrict to one symbol; all symbols when absent
    #[serde(default)]
    pub symbol: Option<String>,
}

pub fn validation_routes() -> Router<AppState> {
    Router::new()
        .route("/api/accuracy", get(get_accuracy))
        .route("/api/accuracy/layers", get(get_layer_accuracy))
        .route("/api/predictions/pending", get(get_pending_predictions))
        .route("/api/predictions/:id", delete(discard_prediction))
        .route("/api/validation/run", post(run_validation))
}

async fn get_accuracy(
    State(state): State<AppState>,
    Query(query): Query<AccuracyQuery>,
) -> Result<Json<ApiResponse<RollingAccuracy>>, AppError> {
    let symbol = query
        .symbol
        .filter(|s| !s.trim().is_empty())
        .map(|s| normalize_symbol(&s, state.config.default_exchange_suffix.as_deref()));
    if let Some(symbol) = &symbol {
        if !is_valid_symbol(symbol) {
            return Err(AppError::bad_request(format!("Invalid symbol '{symbol}'")));
        }
    }

    let summary = state.tracker.rolling_accuracy(symbol.as_deref()).await;
    Ok(Json(ApiResponse::ok(summary)))
}

async fn get_layer_accuracy(State(state): State<AppState>) -> Json<ApiResponse<Vec<LayerAccuracy>>> {
    Json(ApiResponse::ok(state.tracker.layer_accuracy().await))
}

async fn get_pending_predictions(State(state): State<AppState>) -> Json<ApiResponse<Vec<PredictionRecord>>> {
    Json(ApiResponse::ok(state.tracker.pending_predictions().await))
}

async fn discard_prediction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<String>>, AppError> {
    if state.tracker.discard_prediction(&id).await {
        tracing::info!("Discarded prediction {}", id);
        Ok(Json(ApiResponse::ok(id)))
    } else {
        Err(AppError::with_status(
            StatusCode::NOT_FOUND,
            anyhow::anyhow!("No pending prediction {id}"),
        ))
    }
}

async fn run_validation(State(state): State<AppState>) -> Json<ApiResponse<BatchValidationReport>> {
    Json(ApiResponse::ok(state.tracker.run_batch_validation().await))
}
