use anyhow::Context;
use clap::Parser;
use std::{path::PathBuf, sync::Arc};

use weather_core::{
    CepValidator, ViaCepClient, WeatherApiClient, WeatherMode, WeatherOrchestrator,
    WeatherServiceConfig,
    api::weather::{self, WeatherState},
    metrics::{self, Metrics},
    server, telemetry,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "service-b", version, about = "Postal-code weather service")]
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

        let mut cfg = WeatherServiceConfig::load(self.config.as_deref())?;
        if let Some(listen) = self.listen {
            cfg.listen_addr = listen;
        }

        let guard = telemetry::init_tracing(&cfg.telemetry, "service-b")?;
        let telemetry = guard.telemetry();

        let addresses = ViaCepClient::new(
            cfg.viacep_base_url.clone(),
            cfg.geocoding_timeout(),
            telemetry.clone(),
        )
        .context("Failed to build ViaCEP client")?;

        let use_mock_weather = cfg.use_mock_weather();
        let weather_api = WeatherApiClient::new(
            cfg.weather_api_base_url.clone(),
            WeatherMode::from_api_key(cfg.api_key()),
            cfg.weather_timeout(),
            telemetry.clone(),
        )
        .context("Failed to build WeatherAPI client")?;

        let orchestrator = WeatherOrchestrator::new(
            Arc::new(CepValidator),
            Arc::new(addresses),
            Arc::new(weather_api),
            telemetry.clone(),
        )
        .with_mock_weather(use_mock_weather);

        let state = WeatherState::new(Arc::new(orchestrator), telemetry);
        let metrics = Metrics::new("service-b").context("Failed to register metrics")?;
        let app = metrics::instrument(weather::router(state), metrics);

        if use_mock_weather {
            tracing::warn!("no WeatherAPI key configured, serving the fixed mock reading");
        }
        tracing::info!(
            viacep = %cfg.viacep_base_url,
            weather_api = %cfg.weather_api_base_url,
            "service-b initialized"
        );
        server::serve(&cfg.listen_addr, app).await
    }
}
