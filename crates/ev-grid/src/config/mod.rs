use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

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
    pub matching: MatchingConfig,
    pub catalog: CatalogConfig,
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

        let default_radius_km = match env::var("APP_DEFAULT_RADIUS_KM") {
            Ok(raw) => parse_radius(&raw)?,
            Err(_) => MatchingConfig::DEFAULT_RADIUS_KM,
        };
        let unmatched = match env::var("APP_UNMATCHED_POLICY") {
            Ok(raw) => UnmatchedPolicy::parse(&raw)
                .ok_or(ConfigError::InvalidUnmatchedPolicy { value: raw })?,
            Err(_) => UnmatchedPolicy::default(),
        };

        let seed_dir = env::var("APP_SEED_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            matching: MatchingConfig {
                default_radius_km,
                unmatched,
            },
            catalog: CatalogConfig { seed_dir },
        })
    }
}

fn parse_radius(raw: &str) -> Result<f64, ConfigError> {
    let invalid = || ConfigError::InvalidRadius {
        value: raw.to_string(),
    };
    let radius = raw.trim().parse::<f64>().map_err(|_| invalid())?;
    if radius.is_finite() && radius > 0.0 {
        Ok(radius)
    } else {
        Err(invalid())
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

/// Station matching defaults applied when a request does not name a radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchingConfig {
    pub default_radius_km: f64,
    pub unmatched: UnmatchedPolicy,
}

impl MatchingConfig {
    pub const DEFAULT_RADIUS_KM: f64 = 10.0;
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            default_radius_km: Self::DEFAULT_RADIUS_KM,
            unmatched: UnmatchedPolicy::default(),
        }
    }
}

/// What approval does when no station lies within the radius.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnmatchedPolicy {
    /// Admit the household without a station.
    #[default]
    ApproveUnassigned,
    /// Refuse the approval and leave the application pending.
    KeepPending,
}

impl UnmatchedPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "approve_unassigned" | "approve" => Some(Self::ApproveUnassigned),
            "keep_pending" | "hold" => Some(Self::KeepPending),
            _ => None,
        }
    }
}

/// Where the catalog is bootstrapped from.
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    pub seed_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidRadius { value: String },
    InvalidUnmatchedPolicy { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidRadius { value } => write!(
                f,
                "APP_DEFAULT_RADIUS_KM must be a positive number of kilometres, got '{}'",
                value
            ),
            ConfigError::InvalidUnmatchedPolicy { value } => write!(
                f,
                "APP_UNMATCHED_POLICY must be 'approve_unassigned' or 'keep_pending', got '{}'",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidRadius { .. }
            | ConfigError::InvalidUnmatchedPolicy { .. } => None,
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
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_DEFAULT_RADIUS_KM");
        env::remove_var("APP_UNMATCHED_POLICY");
        env::remove_var("APP_SEED_DIR");
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
        assert_eq!(config.matching, MatchingConfig::default());
        assert!(config.catalog.seed_dir.is_none());
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
    fn reads_matching_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_DEFAULT_RADIUS_KM", "25.5");
        env::set_var("APP_UNMATCHED_POLICY", "keep_pending");
        env::set_var("APP_SEED_DIR", "seed");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.matching.default_radius_km, 25.5);
        assert_eq!(config.matching.unmatched, UnmatchedPolicy::KeepPending);
        assert_eq!(config.catalog.seed_dir, Some(PathBuf::from("seed")));
        reset_env();
    }

    #[test]
    fn rejects_non_positive_radius() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_DEFAULT_RADIUS_KM", "0");
        match AppConfig::load() {
            Err(ConfigError::InvalidRadius { value }) => assert_eq!(value, "0"),
            other => panic!("expected invalid radius, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_unknown_policy() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_UNMATCHED_POLICY", "sometimes");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidUnmatchedPolicy { .. })
        ));
        reset_env();
    }
}
