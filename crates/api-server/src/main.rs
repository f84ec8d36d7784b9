use api_server::ServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));

    tracing::info!("Starting fusion signal API");

    let config = ServiceConfig::from_env()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Analyzer timeout: {}s", config.analyzer_timeout_secs);
    tracing::info!("  Prediction horizon: {} days", config.prediction_horizon_days);
    tracing::info!("  Validation interval: {}s", config.validation_interval_secs);
    if let Some(suffix) = &config.default_exchange_suffix {
        tracing::info!("  Exchange suffix: {}", suffix);
    }
    tracing::info!("  API keys configured: {}", config.api_keys.len());

    api_server::run_server(config).await
}
