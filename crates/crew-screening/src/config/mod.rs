use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

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
    pub screening: ScreeningSettings,
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
        let log_format = match env::var("APP_LOG_FORMAT") {
            Ok(raw) => LogFormat::parse(&raw).ok_or(ConfigError::InvalidSetting {
                key: "APP_LOG_FORMAT",
                value: raw,
            })?,
            Err(_) if environment == AppEnvironment::Production => LogFormat::Full,
            Err(_) => LogFormat::Compact,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            screening: ScreeningSettings::from_env()?,
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
    pub log_format: LogFormat,
}

/// Line layout for the fmt subscriber. `Full` keeps targets and span context for audits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Full,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(Self::Compact),
            "full" => Some(Self::Full),
            _ => None,
        }
    }
}

/// Feature toggles and runtime dials for the scoring engines and the job queue.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningSettings {
    pub competency_enabled: bool,
    pub predictive_enabled: bool,
    pub verification_enabled: bool,
    /// Answers shorter than this many characters are treated as non-substantive.
    pub min_answer_length: usize,
    pub job_max_attempts: u32,
    pub job_backoff: Duration,
    pub provider_timeout: Duration,
}

impl Default for ScreeningSettings {
    fn default() -> Self {
        Self {
            competency_enabled: true,
            predictive_enabled: true,
            verification_enabled: true,
            min_answer_length: 40,
            job_max_attempts: 3,
            job_backoff: Duration::from_millis(250),
            provider_timeout: Duration::from_millis(5_000),
        }
    }
}

impl ScreeningSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            competency_enabled: env_flag(
                "SCREENING_COMPETENCY_ENABLED",
                defaults.competency_enabled,
            )?,
            predictive_enabled: env_flag(
                "SCREENING_PREDICTIVE_ENABLED",
                defaults.predictive_enabled,
            )?,
            verification_enabled: env_flag(
                "SCREENING_VERIFICATION_ENABLED",
                defaults.verification_enabled,
            )?,
            min_answer_length: env_number(
                "SCREENING_MIN_ANSWER_LENGTH",
                defaults.min_answer_length as u64,
            )? as usize,
            job_max_attempts: env_number(
                "SCREENING_JOB_MAX_ATTEMPTS",
                defaults.job_max_attempts as u64,
            )?
            .clamp(1, 10) as u32,
            job_backoff: Duration::from_millis(env_number(
                "SCREENING_JOB_BACKOFF_MS",
                defaults.job_backoff.as_millis() as u64,
            )?),
            provider_timeout: Duration::from_millis(env_number(
                "SCREENING_PROVIDER_TIMEOUT_MS",
                defaults.provider_timeout.as_millis() as u64,
            )?),
        })
    }
}

fn env_flag(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidSetting { key, value: raw }),
        },
    }
}

fn env_number(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidSetting { key, value: raw }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSetting { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSetting { key, value } => {
                write!(f, "{key} has an unsupported value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidSetting { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
