use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::dss::FailurePolicy;

const DEFAULT_POPULATION_CONCURRENCY: usize = 4;
const MAX_POPULATION_CONCURRENCY: usize = 64;
const DEFAULT_ITEM_TIMEOUT_MS: u64 = 2_000;

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
    pub dss: DssConfig,
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
            dss: DssConfig::from_env()?,
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Knobs for rule evaluation and population batches.
#[derive(Debug, Clone, PartialEq)]
pub struct DssConfig {
    pub failure_policy: FailurePolicy,
    pub population_concurrency: usize,
    pub item_timeout: Option<Duration>,
    /// Evaluate one individual's flag groups as concurrent tasks on single-record requests.
    pub concurrent_groups: bool,
}

impl DssConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let fail_open = match env::var("DSS_FAIL_OPEN") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFailOpen(raw))?,
            Err(_) => true,
        };

        let concurrent_groups = match env::var("DSS_CONCURRENT_GROUPS") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidConcurrentGroups(raw))?,
            Err(_) => false,
        };

        let population_concurrency = match env::var("DSS_POPULATION_CONCURRENCY") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|value| (1..=MAX_POPULATION_CONCURRENCY).contains(value))
                .ok_or(ConfigError::InvalidConcurrency(raw))?,
            Err(_) => DEFAULT_POPULATION_CONCURRENCY,
        };

        let timeout_ms = match env::var("DSS_ITEM_TIMEOUT_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(raw))?,
            Err(_) => DEFAULT_ITEM_TIMEOUT_MS,
        };

        Ok(Self {
            failure_policy: if fail_open {
                FailurePolicy::FailOpen
            } else {
                FailurePolicy::FailFast
            },
            population_concurrency,
            item_timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
            concurrent_groups,
        })
    }
}

impl Default for DssConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::FailOpen,
            population_concurrency: DEFAULT_POPULATION_CONCURRENCY,
            item_timeout: Some(Duration::from_millis(DEFAULT_ITEM_TIMEOUT_MS)),
            concurrent_groups: false,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFailOpen(String),
    InvalidConcurrentGroups(String),
    InvalidConcurrency(String),
    InvalidTimeout(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFailOpen(value) => {
                write!(f, "DSS_FAIL_OPEN must be a boolean flag, found '{value}'")
            }
            ConfigError::InvalidConcurrentGroups(value) => {
                write!(f, "DSS_CONCURRENT_GROUPS must be a boolean flag, found '{value}'")
            }
            ConfigError::InvalidConcurrency(value) => write!(
                f,
                "DSS_POPULATION_CONCURRENCY must be between 1 and {MAX_POPULATION_CONCURRENCY}, found '{value}'"
            ),
            ConfigError::InvalidTimeout(value) => {
                write!(f, "DSS_ITEM_TIMEOUT_MS must be a whole number of milliseconds, found '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidFailOpen(_)
            | ConfigError::InvalidConcurrentGroups(_)
            | ConfigError::InvalidConcurrency(_)
            | ConfigError::InvalidTimeout(_) => None,
        }
    }
}
