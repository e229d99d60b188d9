use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

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
    pub personalization: PersonalizationConfig,
    pub digest: DigestConfig,
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

        let defaults = PersonalizationConfig::default();
        let personalization = PersonalizationConfig {
            default_limit: env_number("GENIE_DEFAULT_LIMIT", defaults.default_limit)?,
            max_limit: env_number("GENIE_MAX_LIMIT", defaults.max_limit)?,
            activity_window: env_number("GENIE_ACTIVITY_WINDOW", defaults.activity_window)?,
            candidate_page_size: env_number("GENIE_CANDIDATE_PAGE", defaults.candidate_page_size)?,
        };
        if personalization.max_limit == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "GENIE_MAX_LIMIT",
            });
        }

        let digest_defaults = DigestConfig::default();
        let digest = DigestConfig {
            picks_per_email: env_number("GENIE_DIGEST_PICKS", digest_defaults.picks_per_email)?,
            shared_secret: env::var("GENIE_DIGEST_SECRET")
                .ok()
                .filter(|value| !value.trim().is_empty()),
            sender: env::var("GENIE_DIGEST_SENDER").unwrap_or(digest_defaults.sender),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            personalization,
            digest,
        })
    }
}

fn env_number<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Knobs for the recommendation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalizationConfig {
    /// Result count used when the caller does not pass `limit`.
    pub default_limit: usize,
    /// Upper bound applied to caller supplied limits.
    pub max_limit: usize,
    /// Number of most recent activity records read per scoring pass.
    pub activity_window: usize,
    /// Candidate rows requested from the catalog per pass.
    pub candidate_page_size: usize,
}

impl Default for PersonalizationConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            max_limit: 20,
            activity_window: 100,
            candidate_page_size: 30,
        }
    }
}

/// Weekly genie-picks digest settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestConfig {
    pub picks_per_email: usize,
    /// Bearer token required to trigger the batch over HTTP, when set.
    pub shared_secret: Option<String>,
    pub sender: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            picks_per_email: 5,
            shared_secret: None,
            sender: "Deal Genie <picks@dealgenie.app>".to_string(),
        }
    }
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
                write!(f, "{key} must be a positive integer")
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
