mod exposition;
mod handlers;
mod router;

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use stashex_collector::build_http_client;
use stashex_common::ExporterConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::router::{ExporterState, exporter_router};

#[derive(Parser)]
#[command(name = "stashex", about = "Prometheus exporter for Logstash node monitoring APIs")]
struct Cli {
    #[arg(long = "config.file", value_name = "PATH")]
    config_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::from_default_env().add_directive("stashex=info".parse()?);
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let config = ExporterConfig::load(&cli.config_file)?;
    let http = build_http_client(config.http_timeout())?;

    let state = ExporterState::new(&config, http)?;
    if state.aggregates.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "none of the configured endpoints is usable",
        )
        .into());
    }

    let telemetry_path = state.telemetry_path.clone();
    let app = exporter_router(Arc::new(state));

    let addr = config.web.bind_address()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, %telemetry_path, "stashex listening");
    axum::serve(listener, app).await?;

    Ok(())
}
