use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Tracing settings shared by both services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Falls back to the binary's own name when unset.
    pub service_name: Option<String>,
    /// OTLP/gRPC collector, e.g. `otel-collector:4317`. Spans are not
    /// exported when unset.
    pub otlp_endpoint: Option<String>,
}

impl TelemetryConfig {
    fn named(service_name: &str) -> Self {
        Self {
            service_name: Some(service_name.to_string()),
            otlp_endpoint: None,
        }
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) {
        if let Some(name) = env("OTEL_SERVICE_NAME") {
            self.service_name = Some(name);
        }
        if let Some(endpoint) = env("OTEL_EXPORTER_OTLP_ENDPOINT") {
            self.otlp_endpoint = Some(endpoint);
        }
    }
}

/// Service-A settings.
///
/// Example TOML:
/// ```toml
/// listen_addr = "0.0.0.0:8080"
/// weather_service_url = "http://service-b:8181"
///
/// [telemetry]
/// otlp_endpoint = "otel-collector:4317"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub listen_addr: String,
    pub weather_service_url: String,
    pub request_timeout_secs: u64,
    pub telemetry: TelemetryConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            weather_service_url: "http://service-b:8181".to_string(),
            request_timeout_secs: 30,
            telemetry: TelemetryConfig::named("service-a"),
        }
    }
}

impl GatewayConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Load from `path` (or the platform config file), then apply overrides
    /// from the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg: Self = read_toml(path, config_file_path("service-a"))?;
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = env("HTTP_PORT").as_deref().and_then(listen_addr) {
            self.listen_addr = addr;
        }
        if let Some(url) = env("SERVICE_B_URL") {
            self.weather_service_url = url;
        }
        self.telemetry.apply_env(&env);
    }
}

/// Service-B settings.
///
/// Example TOML:
/// ```toml
/// listen_addr = "0.0.0.0:8181"
/// weather_api_key = "..."
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherServiceConfig {
    pub listen_addr: String,
    pub viacep_base_url: String,
    pub weather_api_base_url: String,
    pub weather_api_key: Option<String>,
    pub geocoding_timeout_secs: u64,
    pub weather_timeout_secs: u64,
    pub telemetry: TelemetryConfig,
}

impl Default for WeatherServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8181".to_string(),
            viacep_base_url: "https://viacep.com.br/ws".to_string(),
            weather_api_base_url: "https://api.weatherapi.com/v1".to_string(),
            weather_api_key: None,
            geocoding_timeout_secs: 10,
            weather_timeout_secs: 10,
            telemetry: TelemetryConfig::named("service-b"),
        }
    }
}

impl WeatherServiceConfig {
    /// No usable API key means the fixed mock reading is served.
    pub fn use_mock_weather(&self) -> bool {
        self.api_key().is_none()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.weather_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn geocoding_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoding_timeout_secs)
    }

    pub fn weather_timeout(&self) -> Duration {
        Duration::from_secs(self.weather_timeout_secs)
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg: Self = read_toml(path, config_file_path("service-b"))?;
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = env("HTTP_PORT").as_deref().and_then(listen_addr) {
            self.listen_addr = addr;
        }
        if let Some(url) = env("VIACEP_BASE_URL") {
            self.viacep_base_url = url;
        }
        if let Some(url) = env("WEATHER_API_BASE_URL") {
            self.weather_api_base_url = url;
        }
        if let Some(key) = env("WEATHER_API") {
            self.weather_api_key = Some(key);
        }
        self.telemetry.apply_env(&env);
    }
}

/// Path to the config file of `app` in the platform config directory, or
/// `None` when no home directory can be resolved.
pub fn config_file_path(app: &str) -> Option<PathBuf> {
    ProjectDirs::from("dev", "cep-weather", app).map(|dirs| dirs.config_dir().join("config.toml"))
}

/// An explicit path must exist; the default path is optional.
fn read_toml<T>(path: Option<&Path>, default_path: Option<PathBuf>) -> Result<T>
where
    T: Default + for<'de> Deserialize<'de>,
{
    let path = match (path, default_path) {
        (Some(p), _) => p.to_path_buf(),
        (None, Some(p)) if p.exists() => p,
        (None, _) => return Ok(T::default()),
    };

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// `":8080"` binds every interface; anything else is taken as a full address.
/// A blank value is no override.
fn listen_addr(port: &str) -> Option<String> {
    let port = port.trim();
    if port.is_empty() {
        return None;
    }

    Some(match port.strip_prefix(':') {
        Some(p) => format!("0.0.0.0:{p}"),
        None if port.chars().all(|c| c.is_ascii_digit()) => format!("0.0.0.0:{port}"),
        None => port.to_string(),
    })
}
