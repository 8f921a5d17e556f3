use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::survey::pacing::{Pacing, DEFAULT_PACING_JITTER_MS, DEFAULT_PACING_MIN_MS};

pub const DEFAULT_EMAIL_ENDPOINT: &str = "https://emailreputation.abstractapi.com/v1/";
pub const DEFAULT_EMAIL_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_ARCHIVE_CAPACITY: usize = 256;

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
    pub survey: SurveyConfig,
    pub email: EmailValidationConfig,
    pub storage: StorageConfig,
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

        let survey = SurveyConfig {
            pacing_min_ms: numeric_var("SURVEY_PACING_MIN_MS", DEFAULT_PACING_MIN_MS)?,
            pacing_jitter_ms: numeric_var("SURVEY_PACING_JITTER_MS", DEFAULT_PACING_JITTER_MS)?,
        };

        let email = EmailValidationConfig {
            api_key: env::var("EMAIL_VALIDATION_API_KEY")
                .ok()
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            endpoint: env::var("EMAIL_VALIDATION_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_EMAIL_ENDPOINT.to_string()),
            timeout_secs: numeric_var(
                "EMAIL_VALIDATION_TIMEOUT_SECS",
                DEFAULT_EMAIL_TIMEOUT_SECS,
            )?,
        };

        let archive_capacity =
            numeric_var("SESSION_ARCHIVE_CAPACITY", DEFAULT_ARCHIVE_CAPACITY as u64)?;
        let storage = StorageConfig {
            submissions_path: env::var("SUBMISSIONS_PATH")
                .ok()
                .map(|path| path.trim().to_string())
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            archive_capacity: usize::try_from(archive_capacity).map_err(|_| {
                ConfigError::InvalidNumber {
                    key: "SESSION_ARCHIVE_CAPACITY",
                }
            })?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            survey,
            email,
            storage,
        })
    }
}

fn numeric_var(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
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

/// Presentation pacing between committed answers and the next prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurveyConfig {
    pub pacing_min_ms: u64,
    pub pacing_jitter_ms: u64,
}

impl SurveyConfig {
    pub fn pacing(&self) -> Pacing {
        Pacing::from_millis(self.pacing_min_ms, self.pacing_jitter_ms)
    }
}

/// Email reputation service settings. Without an API key only a local syntax check runs.
#[derive(Debug, Clone)]
pub struct EmailValidationConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl EmailValidationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Where finalized sessions and their records go once the survey completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// JSON-lines file receiving every submission record; unset means records are only logged.
    pub submissions_path: Option<PathBuf>,
    /// Finalized sessions kept readable after delivery; oldest are evicted first.
    pub archive_capacity: usize,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "SURVEY_PACING_MIN_MS",
            "SURVEY_PACING_JITTER_MS",
            "EMAIL_VALIDATION_API_KEY",
            "EMAIL_VALIDATION_ENDPOINT",
            "EMAIL_VALIDATION_TIMEOUT_SECS",
            "SUBMISSIONS_PATH",
            "SESSION_ARCHIVE_CAPACITY",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.survey.pacing(), Pacing::default());
        assert_eq!(config.email.api_key, None);
        assert_eq!(config.email.endpoint, DEFAULT_EMAIL_ENDPOINT);
        assert_eq!(config.email.timeout(), Duration::from_secs(10));
        assert_eq!(config.storage.submissions_path, None);
        assert_eq!(config.storage.archive_capacity, DEFAULT_ARCHIVE_CAPACITY);
    }

    #[test]
    fn reads_storage_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SUBMISSIONS_PATH", "/var/lib/esg/submissions.jsonl");
        env::set_var("SESSION_ARCHIVE_CAPACITY", "16");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.storage.submissions_path,
            Some(PathBuf::from("/var/lib/esg/submissions.jsonl"))
        );
        assert_eq!(config.storage.archive_capacity, 16);
        reset_env();
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn zero_pacing_disables_delay() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SURVEY_PACING_MIN_MS", "0");
        env::set_var("SURVEY_PACING_JITTER_MS", "0");
        let config = AppConfig::load().expect("config loads");
        assert!(config.survey.pacing().is_disabled());
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_timeouts() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("EMAIL_VALIDATION_TIMEOUT_SECS", "soon");
        match AppConfig::load() {
            Err(ConfigError::InvalidNumber { key }) => {
                assert_eq!(key, "EMAIL_VALIDATION_TIMEOUT_SECS")
            }
            other => panic!("expected invalid number error, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn blank_api_key_is_treated_as_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("EMAIL_VALIDATION_API_KEY", "   ");
        let config = AppConfig::load().expect("config loads");
        assert!(config.email.api_key.is_none());
        reset_env();
    }
}
