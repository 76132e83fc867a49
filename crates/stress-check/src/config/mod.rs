use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
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
    pub scorer: ScorerConfig,
    pub export: ExportSettings,
    pub sessions: SessionSettings,
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

        let base_url = env::var("SCORER_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5000".to_string())
            .trim_end_matches('/')
            .to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidScorerUrl(base_url));
        }

        let timeout_secs: u64 = parse_var("SCORER_TIMEOUT_SECS", 30)?;
        let poll_interval_ms: u64 = parse_var("READINESS_POLL_INTERVAL_MS", 2_000)?;
        let max_attempts: u32 = parse_var("READINESS_MAX_ATTEMPTS", 30)?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidNumber {
                variable: "READINESS_MAX_ATTEMPTS",
            });
        }

        let questions_path = env::var("QUESTIONS_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let scale: f32 = parse_var("EXPORT_SCALE", 2.0)?;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ConfigError::InvalidNumber {
                variable: "EXPORT_SCALE",
            });
        }

        let idle_ttl_secs: u64 = parse_var("SESSION_IDLE_TTL_SECS", 1_800)?;
        if idle_ttl_secs == 0 {
            return Err(ConfigError::InvalidNumber {
                variable: "SESSION_IDLE_TTL_SECS",
            });
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            scorer: ScorerConfig {
                base_url,
                timeout: Duration::from_secs(timeout_secs),
                readiness: ReadinessConfig {
                    poll_interval: Duration::from_millis(poll_interval_ms),
                    max_attempts,
                },
                questions_path,
            },
            export: ExportSettings { scale },
            sessions: SessionSettings {
                idle_ttl: Duration::from_secs(idle_ttl_secs),
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(variable: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { variable }),
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

/// Where the external scorer lives and how patiently we wait for it.
#[derive(Debug, Clone)]
pub struct ScorerConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub readiness: ReadinessConfig,
    /// Local question file; when unset questions come from the scorer.
    pub questions_path: Option<PathBuf>,
}

/// Bounded polling of the scorer health check, used to ride out cold starts.
#[derive(Debug, Clone, Copy)]
pub struct ReadinessConfig {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct ExportSettings {
    pub scale: f32,
}

/// Sessions untouched for `idle_ttl` are swept from the registry.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub idle_ttl: Duration,
}

impl SessionSettings {
    pub fn sweep_period(&self) -> Duration {
        (self.idle_ttl / 2).max(Duration::from_secs(1))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidScorerUrl(String),
    InvalidNumber { variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidScorerUrl(url) => {
                write!(f, "SCORER_BASE_URL must be an http(s) URL, got '{}'", url)
            }
            ConfigError::InvalidNumber { variable } => {
                write!(f, "{} must be a positive number", variable)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidScorerUrl(_)
            | ConfigError::InvalidNumber { .. } => None,
        }
    }
}
