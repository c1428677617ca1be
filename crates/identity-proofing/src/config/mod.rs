use std::collections::BTreeMap;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::proofing::stage::Stage;
use crate::proofing::topology::{ExecutionTopology, UnknownTopology};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub proofing: ProofingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            proofing: ProofingConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Vendor selection, execution topology and retention for the proofing core.
#[derive(Debug, Clone)]
pub struct ProofingConfig {
    pub execution: ExecutionTopology,
    pub vendors: BTreeMap<Stage, String>,
    pub callback_token: Option<String>,
    pub vendor_timeout: Duration,
    pub result_ttl: Duration,
    pub result_dir: Option<std::path::PathBuf>,
    pub poll_ceiling: Duration,
}

pub const MOCK_VENDOR: &str = "mock";

impl Default for ProofingConfig {
    fn default() -> Self {
        Self {
            execution: ExecutionTopology::InProcess,
            vendors: Stage::ALL
                .iter()
                .map(|stage| (*stage, MOCK_VENDOR.to_string()))
                .collect(),
            callback_token: None,
            vendor_timeout: Duration::from_millis(15_000),
            result_ttl: Duration::from_secs(900),
            result_dir: None,
            poll_ceiling: Duration::from_secs(60),
        }
    }
}

impl ProofingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let execution = match env::var("PROOFING_EXECUTION") {
            Ok(raw) => raw.parse::<ExecutionTopology>()?,
            Err(_) => defaults.execution,
        };

        let mut vendors = defaults.vendors;
        for stage in Stage::ALL {
            let key = format!("PROOFING_{}_VENDOR", stage.label().to_ascii_uppercase());
            if let Ok(vendor) = env::var(&key) {
                let vendor = vendor.trim().to_string();
                if vendor.is_empty() {
                    return Err(ConfigError::BlankVendor(key));
                }
                vendors.insert(stage, vendor);
            }
        }

        let callback_token = env::var("PROOFING_CALLBACK_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        if execution == ExecutionTopology::Delegated && callback_token.is_none() {
            return Err(ConfigError::MissingCallbackToken);
        }

        Ok(Self {
            execution,
            vendors,
            callback_token,
            vendor_timeout: duration_var(
                "PROOFING_VENDOR_TIMEOUT_MS",
                defaults.vendor_timeout,
                Duration::from_millis,
            )?,
            result_ttl: duration_var(
                "PROOFING_RESULT_TTL_SECS",
                defaults.result_ttl,
                Duration::from_secs,
            )?,
            result_dir: env::var("PROOFING_RESULT_DIR").ok().map(Into::into),
            poll_ceiling: duration_var(
                "PROOFING_POLL_CEILING_SECS",
                defaults.poll_ceiling,
                Duration::from_secs,
            )?,
        })
    }

    pub fn vendor_for(&self, stage: Stage) -> &str {
        self.vendors
            .get(&stage)
            .map(String::as_str)
            .unwrap_or(MOCK_VENDOR)
    }
}

fn duration_var(
    key: &'static str,
    default: Duration,
    unit: fn(u64) -> Duration,
) -> Result<Duration, ConfigError> {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(value) if value > 0 => Ok(unit(value)),
            _ => Err(ConfigError::InvalidDuration { key }),
        },
        Err(_) => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost { source: std::net::AddrParseError },
    #[error("PROOFING_EXECUTION must be 'in_process' or 'delegated': {0}")]
    InvalidExecution(#[from] UnknownTopology),
    #[error("{0} must name a vendor")]
    BlankVendor(String),
    #[error("PROOFING_CALLBACK_TOKEN is required for delegated execution")]
    MissingCallbackToken,
    #[error("{key} must be a positive integer")]
    InvalidDuration { key: &'static str },
}
