//! Signal Routes
//!
//! Fused signal generation. Every call also registers a prediction with the
//! validation tracker.

use analysis_orchestrator::CombinedSignal;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use market_data::normalize_symbol;

use crate::{ApiResponse, AppError, AppState};

const MAX_SYMBOL_LEN: usize = 15;

pub fn signal_routes() -> Router<AppState> {
    Router::new().route("/api/signal/:symbol", get(get_signal))
}

pub(crate) fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol.len() <= MAX_SYMBOL_LEN
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
}

async fn get_signal(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<CombinedSignal>>, AppError> {
    let symbol = normalize_symbol(&symbol, state.config.default_exchange_suffix.as_deref());
    if !is_valid_symbol(&symbol) {
        return Err(AppError::bad_request(format!("Invalid symbol '{symbol}'")));
    }

    let signal = state.engine.generate_signal(&symbol).await;
    Ok(Json(ApiResponse::ok(signal)))
}
