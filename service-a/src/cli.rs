use anyhow::Context;
use clap::Parser;
use std::{path::PathBuf, sync::Arc};

use weather_core::{
    CepValidator, GatewayConfig, UpstreamWeatherClient,
    api::gateway::{self, GatewayState},
    metrics::{self, Metrics},
    server, telemetry,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "service-a", version, about = "Postal-code gateway")]
pub struct Cli {
    /// TOML config file; defaults to the platform config directory.
    #[arg(long, env = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Listen address, overrides config and `HTTP_PORT`.
    #[arg(long)]
    pub listen: Option<String>,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        telemetry::init_logging();

        let mut cfg = GatewayConfig::load(self.config.as_deref())?;
        if let Some(listen) = self.listen {
            cfg.listen_addr = listen;
        }

        let guard = telemetry::init_tracing(&cfg.telemetry, "service-a")?;
        let telemetry = guard.telemetry();

        let upstream = UpstreamWeatherClient::new(
            cfg.weather_service_url.clone(),
            cfg.request_timeout(),
            telemetry.clone(),
        )
        .context("Failed to build weather service client")?;

        let state = GatewayState::new(Arc::new(CepValidator), Arc::new(upstream), telemetry);
        let metrics = Metrics::new("service-a").context("Failed to register metrics")?;
        let app = metrics::instrument(gateway::router(state), metrics);

        tracing::info!(weather_service = %cfg.weather_service_url, "service-a initialized");
        server::serve(&cfg.listen_addr, app).await
    }
}
