use gha_monitor::config::AppConfig;
use gha_monitor::infrastructures::adapters::primary::web::{AppState, create_router};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::env;
use std::sync::Arc;
use tracing::{info, info_span};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// User-Agent sent to the GitHub API
const USER_AGENT: &str = "gha-monitor-rust-app";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing. Spans are exported over OTLP only when a collector is configured.
    let provider = if env::var_os("OTEL_EXPORTER_OTLP_ENDPOINT").is_some() {
        let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create OTLP exporter: {}", e))?;
        Some(
            SdkTracerProvider::builder()
                .with_batch_exporter(otlp_exporter)
                .build(),
        )
    } else {
        None
    };
    let telemetry = provider
        .as_ref()
        .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer("gha-monitor")));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(telemetry)
        .with(fmt_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let initialize_span = info_span!("initialize");
    let (app_state, addr) = {
        let _enter = initialize_span.enter();
        info!("Application starting");

        let config = AppConfig::from_env()?;
        if config.default_credential.is_none() {
            info!("GITHUB_TOKEN is not set, requests without a bearer token are anonymous");
        }

        // Build dependencies
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        (
            Arc::new(AppState {
                http,
                github_api_url: config.github_api_url,
                default_credential: config.default_credential,
            }),
            config.listen_addr,
        )
    };

    // Create router
    let app = create_router(app_state);

    // Start server
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    if let Some(provider) = provider {
        provider
            .shutdown()
            .map_err(|e| anyhow::anyhow!("Failed to shut down tracer provider: {}", e))?;
    }

    Ok(())
}
