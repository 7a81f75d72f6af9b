//! `sensorflow-server`: HTTP service for training and prediction.

use anyhow::Context;
use clap::Parser;
use sensorflow::api::{router, AppState};
use sensorflow::config::AppConfig;
use sensorflow::observability::{init_tracing, LogFormat};
use sensorflow::pipeline::TrainPipeline;
use sensorflow::store;

#[derive(Debug, Parser)]
#[command(name = "sensorflow-server")]
#[command(about = "Sensor fault detection training and prediction service")]
#[command(version)]
struct Cli {
    /// Bind address (overrides SENSOR_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides SENSOR_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log output format: pretty or json
    #[arg(long, env = "SENSOR_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Run the training pipeline once and exit instead of serving
    #[arg(long)]
    train_once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    let mut config = AppConfig::from_env().context("loading configuration")?;
    if let Some(host) = cli.host {
        config = config.with_host(host);
    }
    if let Some(port) = cli.port {
        config = config.with_port(port);
    }

    let store = store::connect(&config.store)
        .with_context(|| format!("opening document store '{}'", config.store.url))?;
    let state = AppState::new(config.pipeline.clone(), store);

    if cli.train_once {
        let summary = TrainPipeline::new(state.settings.clone(), state.store.clone(), state.guard.clone())
            .run_pipeline()
            .await
            .context("training run failed")?;
        tracing::info!(
            run_id = %summary.run_id,
            artifact_dir = %summary.artifact_dir.display(),
            duration_ms = summary.total_duration_ms(),
            "Training run finished"
        );
        return Ok(());
    }

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    tracing::info!(%address, backend = %state.store.describe(), "Serving");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
