//! # Relay Configuration
//!
//! One TOML file, every key optional:
//!
//! ```toml
//! log_level = "info"
//!
//! [region]
//! segment_name = "MateFacePointsMemory"
//! shm_dir = "/dev/shm"
//!
//! [remote]
//! url = "ws://localhost:8081/model/gui"
//! frame = "binary"        # or "text"
//! queue_depth = 16
//! read_poll_ms = 10
//! connect_timeout_ms = 2000
//!
//! [poll]
//! rate_hz = 15
//! start_streaming = false
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use meshrelay_ipc::RegionConfig;
use meshrelay_networking::RemoteConfig;
use meshrelay_shared::POLL_RATE_HZ;
use serde::Deserialize;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for `RelayConfig`.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config value `{key}`: {reason}")]
    Invalid {
        /// Dotted key.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Streaming timer settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Cycles per second while streaming.
    pub rate_hz: u32,
    /// Start streaming immediately instead of waiting for a toggle.
    pub start_streaming: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            rate_hz: POLL_RATE_HZ,
            start_streaming: false,
        }
    }
}

impl PollConfig {
    /// Interval between firings, `1000 / rate_hz` ms truncated.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.rate_hz.max(1)))
    }
}

/// Whole relay configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Shared segment location.
    pub region: RegionConfig,
    /// Remote endpoint.
    pub remote: RemoteConfig,
    /// Streaming timer.
    pub poll: PollConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            region: RegionConfig::default(),
            remote: RemoteConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// `Parse` for malformed TOML, `Invalid` for out-of-range values.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// `Invalid` naming the first bad key.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.poll.rate_hz == 0 || self.poll.rate_hz > 1000 {
            return Err(ConfigError::Invalid {
                key: "poll.rate_hz",
                reason: format!("{} is outside 1..=1000", self.poll.rate_hz),
            });
        }
        if self.remote.queue_depth == 0 {
            return Err(ConfigError::Invalid {
                key: "remote.queue_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.remote.url.starts_with("ws://") && !self.remote.url.starts_with("wss://") {
            return Err(ConfigError::Invalid {
                key: "remote.url",
                reason: format!("`{}` is not a ws:// or wss:// URL", self.remote.url),
            });
        }
        if self.region.segment_name.is_empty() {
            return Err(ConfigError::Invalid {
                key: "region.segment_name",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
