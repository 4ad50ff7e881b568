//! Process configuration
//!
//! Everything is read from environment variables (after `dotenvy` has loaded
//! any `.env` file). Unset variables fall back to documented defaults;
//! malformed values are rejected instead of being silently replaced.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::visualization::VisualizationConfig;

pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost:5432/galileo";
pub const DEFAULT_FIXTURES_DIR: &str = "fixtures";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_POOL_SIZE: u32 = 10;
pub const DEFAULT_REDIRECT_DELAY_MS: u64 = 5000;

/// Top-level configuration for the server and CLI commands
#[derive(Debug, Clone)]
pub struct GalileoConfig {
    pub database_url: String,
    pub database_pool_size: u32,
    /// Directory holding the three fixture files
    pub fixtures_dir: PathBuf,
    /// Reseed all collections before the listener is bound
    pub seed_on_startup: bool,
    pub visualization: VisualizationConfig,
    /// Delay the questions page waits before navigating to the results
    pub redirect_delay_ms: u64,
    pub port: u16,
}

impl Default for GalileoConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            database_pool_size: DEFAULT_POOL_SIZE,
            fixtures_dir: PathBuf::from(DEFAULT_FIXTURES_DIR),
            seed_on_startup: true,
            visualization: VisualizationConfig::default(),
            redirect_delay_ms: DEFAULT_REDIRECT_DELAY_MS,
            port: DEFAULT_PORT,
        }
    }
}

impl GalileoConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let mut visualization = defaults.visualization.clone();
        visualization.script_path = get("GALILEO_SCRIPT_PATH").map(PathBuf::from);
        visualization.interpreter = get("GALILEO_INTERPRETER");
        if let Some(secs) = get("GALILEO_SCRIPT_TIMEOUT_SECS") {
            let secs: u64 = parse_number("GALILEO_SCRIPT_TIMEOUT_SECS", &secs)?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    var: "GALILEO_SCRIPT_TIMEOUT_SECS",
                    value: secs.to_string(),
                    reason: "timeout must be at least one second".to_string(),
                });
            }
            visualization.timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            database_pool_size: match get("DATABASE_POOL_SIZE") {
                Some(v) => parse_number("DATABASE_POOL_SIZE", &v)?,
                None => defaults.database_pool_size,
            },
            fixtures_dir: get("GALILEO_FIXTURES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.fixtures_dir),
            seed_on_startup: match get("GALILEO_SEED_ON_STARTUP") {
                Some(v) => parse_bool("GALILEO_SEED_ON_STARTUP", &v)?,
                None => defaults.seed_on_startup,
            },
            visualization,
            redirect_delay_ms: match get("GALILEO_REDIRECT_DELAY_MS") {
                Some(v) => parse_number("GALILEO_REDIRECT_DELAY_MS", &v)?,
                None => defaults.redirect_delay_ms,
            },
            port: match get("SERVER_PORT") {
                Some(v) => parse_number("SERVER_PORT", &v)?,
                None => defaults.port,
            },
        })
    }
}

fn parse_number<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
