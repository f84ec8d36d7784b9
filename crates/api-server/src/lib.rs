use std::sync::Arc;
use std::time::Duration;

use analysis_core::{BarSource, BehavioralProvider, EconomicProvider, HardDataProvider, TechnicalProvider};
use analysis_orchestrator::{FusionEngine, Providers};
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use market_data::{HttpBehavioralProvider, YahooFinanceClient};
use serde::Serialize;
use technical_analysis::BarTechnicalProvider;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use validation::ValidationTracker;

pub mod auth;
pub mod config;
mod signal_routes;
mod validation_routes;

pub use config::ServiceConfig;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<FusionEngine>,
    pub tracker: Arc<ValidationTracker>,
    pub config: Arc<ServiceConfig>,
}

/// Envelope for every JSON response
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Handler error carrying its HTTP status; defaults to 500.
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, anyhow::anyhow!(message.into()))
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.error);
        } else {
            tracing::debug!("Request rejected ({}): {:#}", self.status, self.error);
        }
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(format!("{:#}", self.error)),
        };
        (self.status, Json(body)).into_response()
    }
}

/// Wire providers, tracker and engine from configuration.
pub fn build_state(config: ServiceConfig) -> anyhow::Result<AppState> {
    let yahoo = Arc::new(
        YahooFinanceClient::new(config.yahoo_chart_url.clone())?
            .with_exchange_suffix(config.default_exchange_suffix.clone()),
    );
    let bars: Arc<dyn BarSource> = yahoo.clone();

    let behavioral: Option<Arc<dyn BehavioralProvider>> = match &config.behavioral_service_url {
        Some(url) => {
            tracing::info!("Behavioral provider: {}", url);
            Some(Arc::new(HttpBehavioralProvider::new(url.clone())?) as Arc<dyn BehavioralProvider>)
        }
        None => {
            tracing::warn!("BEHAVIORAL_SERVICE_URL not set - behavioral layer will report degraded");
            None
        }
    };

    let hard_data: Arc<dyn HardDataProvider> = yahoo.clone();
    let economic: Arc<dyn EconomicProvider> = yahoo;
    let technical: Arc<dyn TechnicalProvider> = Arc::new(BarTechnicalProvider::new(bars.clone()));
    let providers = Providers {
        hard_data: Some(hard_data),
        technical: Some(technical),
        behavioral,
        economic: Some(economic),
    };

    if config.api_keys.is_empty() {
        tracing::warn!("API_KEYS / SERVICE_SECRET not set - /api routes are unauthenticated");
    }

    let tracker = Arc::new(ValidationTracker::new(bars));
    let engine = FusionEngine::from_providers(providers, config.engine_config()).with_tracker(tracker.clone());

    Ok(AppState {
        engine: Arc::new(engine),
        tracker,
        config: Arc::new(config),
    })
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let (pending, retained_results) = state.tracker.held().await;
    Json(serde_json::json!({
        "status": "ok",
        "service": "fusion-signal-engine",
        "timestamp": chrono::Utc::now(),
        "pendingPredictions": pending,
        "retainedResults": retained_results,
    }))
}

pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(signal_routes::signal_routes())
        .merge(validation_routes::validation_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::auth_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Periodically resolve due predictions until the process exits.
pub fn spawn_validation_job(tracker: Arc<ValidationTracker>, interval_secs: u64) {
    if interval_secs == 0 {
        tracing::info!("Background validation disabled");
        return;
    }

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // the first tick fires immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let report = tracker.run_batch_validation().await;
            if report.checked > 0 {
                tracing::info!(
                    "Scheduled validation: {} validated, {} failed, {} pending",
                    report.validated,
                    report.failed,
                    report.still_pending
                );
            }
        }
    });
}

pub async fn run_server(config: ServiceConfig) -> anyhow::Result<()> {
    let bind_addr = config.bind_addr.clone();
    let interval_secs = config.validation_interval_secs;

    let state = build_state(config)?;
    spawn_validation_job(state.tracker.clone(), interval_secs);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Fusion signal API listening on {}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
