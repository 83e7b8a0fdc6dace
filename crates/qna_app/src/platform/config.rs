use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use qna_engine::{default_data_dir, BackendSettings};
use qna_logging::qna_info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cli::Cli;
use super::logging::LogDestination;

pub const DEFAULT_CONFIG_FILENAME: &str = "qna_chat.ron";
/// Lower bound for the status poll delay while the backend initializes.
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("{field} must be at least {minimum}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        minimum: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub api_prefix: String,
    pub poll_interval_ms: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub data_dir: Option<PathBuf>,
    pub log: LogDestination,
}

impl Default for AppConfig {
    fn default() -> Self {
        let backend = BackendSettings::default();
        Self {
            base_url: backend.base_url,
            api_prefix: backend.api_prefix,
            poll_interval_ms: backend.poll_interval.as_millis() as u64,
            connect_timeout_secs: backend.connect_timeout.as_secs(),
            request_timeout_secs: backend.request_timeout.as_secs(),
            data_dir: None,
            log: LogDestination::default(),
        }
    }
}

impl AppConfig {
    /// Command-line values win over the config file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(base_url) = &cli.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(api_prefix) = &cli.api_prefix {
            self.api_prefix = api_prefix.clone();
        }
        if let Some(poll_interval_ms) = cli.poll_interval_ms {
            self.poll_interval_ms = poll_interval_ms;
        }
        if let Some(data_dir) = &cli.data_dir {
            self.data_dir = Some(data_dir.clone());
        }
        if let Some(log) = cli.log {
            self.log = log;
        }
    }

    /// Rejects values that would make the client spin or time out instantly.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = [
            ("poll_interval_ms", self.poll_interval_ms, MIN_POLL_INTERVAL_MS),
            ("connect_timeout_secs", self.connect_timeout_secs, 1),
            ("request_timeout_secs", self.request_timeout_secs, 1),
        ];
        for (field, value, minimum) in limits {
            if value < minimum {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    minimum,
                });
            }
        }
        Ok(())
    }

    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            base_url: self.base_url.clone(),
            api_prefix: self.api_prefix.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }
}

/// Loads the config file. An explicit path must exist; the default one is optional.
pub fn load(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME));
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if explicit.is_none() && err.kind() == io::ErrorKind::NotFound => {
            return Ok(AppConfig::default());
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };

    let config: AppConfig = ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    qna_info!("Loaded config from {:?}", path);
    Ok(config)
}
