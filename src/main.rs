use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use selfservice::{api, cli, config, AppState};

fn init_tracing() -> anyhow::Result<()> {
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    // OTLP export only when a collector is configured
    let telemetry_layer = if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", "pay-selfservice"),
            ])))
            .install_batch(opentelemetry_sdk::runtime::Tokio)?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "selfservice=debug,tower_http=debug".into()),
    );
    let json = std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter).with(telemetry_layer);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let port = match args.command {
        Some(cli::Commands::Serve { port }) => port.unwrap_or(cfg.port),
        None => cfg.port,
    };

    let result = run_server(cfg, port).await;
    if let Err(ref e) = result {
        tracing::error!("fatal: {:#}", e);
    }
    opentelemetry::global::shutdown_tracer_provider();
    result
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    tracing::info!(
        connector = %cfg.connector_url,
        ledger = %cfg.ledger_url,
        adminusers = %cfg.adminusers_url,
        "starting selfservice"
    );

    let state = Arc::new(AppState::from_config(cfg)?);
    let app = api::app_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("selfservice listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
