//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TRIVIA_BACK_CONFIG_PATH";

const DEFAULT_HOST_TIMEOUT_SECS: u64 = 5;
const DEFAULT_JOIN_CODE_ATTEMPTS: u32 = 10;
const DEFAULT_EVENTS_CAPACITY: usize = 32;
const DEFAULT_TV_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Host silence window before a game is auto-paused.
    pub host_timeout: Duration,
    /// How often the presence supervisor scans active games.
    pub presence_scan_interval: Duration,
    /// How many fresh join codes to try when a collision is reported.
    pub join_code_attempts: u32,
    /// Capacity of each per-game events broadcast channel.
    pub events_capacity: usize,
    /// Capacity of each per-game TV broadcast channel.
    pub tv_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host_timeout: Duration::from_secs(DEFAULT_HOST_TIMEOUT_SECS),
            presence_scan_interval: Duration::from_secs(1),
            join_code_attempts: DEFAULT_JOIN_CODE_ATTEMPTS,
            events_capacity: DEFAULT_EVENTS_CAPACITY,
            tv_capacity: DEFAULT_TV_CAPACITY,
        }
    }
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// built-in defaults when the file is absent or unparsable.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration from file");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

fn resolve_config_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    host_timeout_secs: Option<u64>,
    presence_scan_interval_ms: Option<u64>,
    join_code_attempts: Option<u32>,
    events_capacity: Option<usize>,
    tv_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            host_timeout: raw
                .host_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.host_timeout),
            presence_scan_interval: raw
                .presence_scan_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.presence_scan_interval),
            join_code_attempts: raw.join_code_attempts.unwrap_or(defaults.join_code_attempts),
            events_capacity: raw.events_capacity.unwrap_or(defaults.events_capacity),
            tv_capacity: raw.tv_capacity.unwrap_or(defaults.tv_capacity),
        }
    }
}
