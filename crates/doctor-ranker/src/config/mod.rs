use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::scoring::{Normalization, ScoringPolicy, ThresholdError, TierThresholds};

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
    pub ranking: RankingConfig,
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
            ranking: RankingConfig::from_env()?,
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

/// Scoring and import tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingConfig {
    pub thresholds: TierThresholds,
    pub normalization: Normalization,
    /// Batches larger than this are scored on the rayon pool.
    pub parallel_threshold: usize,
    pub import_batch_size: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            thresholds: TierThresholds::default(),
            normalization: Normalization::default(),
            parallel_threshold: 64,
            import_batch_size: 10,
        }
    }
}

impl RankingConfig {
    pub fn policy(&self) -> ScoringPolicy {
        ScoringPolicy {
            normalization: self.normalization,
            thresholds: self.thresholds,
        }
    }

    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let priority = parse_var("RANK_TIER_PRIORITY", defaults.thresholds.priority())?;
        let moderate = parse_var("RANK_TIER_MODERATE", defaults.thresholds.moderate())?;
        let thresholds =
            TierThresholds::new(priority, moderate).map_err(ConfigError::InvalidThresholds)?;

        let normalization = match env::var("RANK_NORMALIZATION") {
            Ok(value) => Normalization::parse(&value)
                .ok_or(ConfigError::InvalidNormalization { value })?,
            Err(_) => defaults.normalization,
        };

        let parallel_threshold =
            parse_var("RANK_PARALLEL_THRESHOLD", defaults.parallel_threshold)?;

        let import_batch_size = parse_var("IMPORT_BATCH_SIZE", defaults.import_batch_size)?;
        if import_batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }

        Ok(Self {
            thresholds,
            normalization,
            parallel_threshold,
            import_batch_size,
        })
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { var }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { var: &'static str },
    InvalidThresholds(ThresholdError),
    InvalidNormalization { value: String },
    InvalidBatchSize,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { var } => write!(f, "{var} must be numeric"),
            ConfigError::InvalidThresholds(err) => write!(f, "tier thresholds rejected: {err}"),
            ConfigError::InvalidNormalization { value } => write!(
                f,
                "RANK_NORMALIZATION must be 'linear' or 'min_max', got '{value}'"
            ),
            ConfigError::InvalidBatchSize => write!(f, "IMPORT_BATCH_SIZE must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidThresholds(err) => Some(err),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidNormalization { .. }
            | ConfigError::InvalidBatchSize => None,
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
        for var in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "RANK_TIER_PRIORITY",
            "RANK_TIER_MODERATE",
            "RANK_NORMALIZATION",
            "RANK_PARALLEL_THRESHOLD",
            "IMPORT_BATCH_SIZE",
        ] {
            env::remove_var(var);
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
        assert_eq!(config.ranking, RankingConfig::default());
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
    fn ranking_overrides_are_applied() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RANK_TIER_PRIORITY", "75");
        env::set_var("RANK_TIER_MODERATE", "50");
        env::set_var("RANK_NORMALIZATION", "min_max");
        env::set_var("IMPORT_BATCH_SIZE", "25");
        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.ranking.thresholds.priority(), 75.0);
        assert_eq!(config.ranking.thresholds.moderate(), 50.0);
        assert_eq!(config.ranking.normalization, Normalization::MinMax);
        assert_eq!(config.ranking.import_batch_size, 25);
        assert_eq!(config.ranking.parallel_threshold, 64);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RANK_TIER_PRIORITY", "40");
        env::set_var("RANK_TIER_MODERATE", "60");
        let result = AppConfig::load();
        reset_env();

        assert!(matches!(result, Err(ConfigError::InvalidThresholds(_))));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("IMPORT_BATCH_SIZE", "0");
        let result = AppConfig::load();
        reset_env();

        assert!(matches!(result, Err(ConfigError::InvalidBatchSize)));
    }

    #[test]
    fn unknown_normalization_is_rejected() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RANK_NORMALIZATION", "zscore");
        let result = AppConfig::load();
        reset_env();

        assert!(matches!(
            result,
            Err(ConfigError::InvalidNormalization { value }) if value == "zscore"
        ));
    }
}
