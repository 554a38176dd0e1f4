// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: runtime paths plus optional `garagekeeper.toml`

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Wake-up schedule used when the config file does not provide one:
/// once after 15 minutes, eight times every 6 hours, then daily five times.
pub const DEFAULT_WAKEUP_POLICY: &[&str] = &["15m,1", "6h,8", "1d,5"];

const SETTINGS_FILE: &str = "garagekeeper.toml";

/// Tunables loaded from `garagekeeper.toml`
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Wake-up policy rows, each `"<interval>,<times>"` (e.g. `"6h,8"`)
    pub wakeup_policy: Vec<String>,
    /// Unix socket of the job scheduler backend
    pub backend_socket: PathBuf,
    /// Unix socket the mode signals are broadcast to
    pub signal_socket: PathBuf,
    /// How long a control-socket client may take to send its request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wakeup_policy: DEFAULT_WAKEUP_POLICY
                .iter()
                .map(|s| s.to_string())
                .collect(),
            backend_socket: PathBuf::from("/run/gk/jobscheduler.sock"),
            signal_socket: PathBuf::from("/run/gk/signals.sock"),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// State directory the daemon runs out of
    pub root: PathBuf,
    /// Path to the control socket
    pub socket_path: PathBuf,
    /// Path to the lock/PID file
    pub lock_path: PathBuf,
    /// Path to the daemon log file
    pub log_path: PathBuf,
    /// Loaded settings
    pub settings: Settings,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("state directory not found at {0}: {1}")]
    RootNotFound(PathBuf, std::io::Error),

    #[error("failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("failed to parse {0}: {1}")]
    Parse(PathBuf, toml::de::Error),
}

impl Config {
    /// Build the config for a state directory, reading `garagekeeper.toml`
    /// from it when present
    pub fn for_root(root: &Path) -> Result<Self, ConfigError> {
        let canonical = root
            .canonicalize()
            .map_err(|e| ConfigError::RootNotFound(root.to_path_buf(), e))?;

        let settings_path = canonical.join(SETTINGS_FILE);
        let settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)
                .map_err(|e| ConfigError::Read(settings_path.clone(), e))?;
            toml::from_str(&content).map_err(|e| ConfigError::Parse(settings_path.clone(), e))?
        } else {
            Settings::default()
        };

        Ok(Self {
            socket_path: canonical.join("gkd.sock"),
            lock_path: canonical.join("gkd.pid"),
            log_path: canonical.join("gkd.log"),
            root: canonical,
            settings,
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
