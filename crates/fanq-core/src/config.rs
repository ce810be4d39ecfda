use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Destination for run-log entries while the queue is running. The full log
/// is accumulated and returned by the scheduler regardless of target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Print each entry to stdout as it is appended.
    #[default]
    Stream,
    /// Accumulate only; no live output.
    Silent,
    /// Report each entry through the error channel (`tracing::error!`).
    #[serde(rename = "error-channel")]
    ErrorChannel,
}

/// Global configuration loaded from `~/.config/fanq/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Host the job URLs are served from.
    #[serde(default = "default_server_host")]
    pub server_host: String,
    /// Port the job URLs are served from.
    #[serde(default = "default_server_port")]
    pub server_port: u16,
    /// Maximum number of jobs running at once (slot budget ceiling).
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,
    /// Load-average ceiling: a new job is admitted only while the one-minute
    /// load average is strictly below this value.
    #[serde(default = "default_min_load")]
    pub min_load: f64,
    /// Global run timeout in seconds; 0 waits until every job finishes.
    #[serde(default)]
    pub timeout_secs: u64,
    /// Run-log destination: "stream", "silent", or "error-channel".
    #[serde(default)]
    pub log_target: LogTarget,
}

fn default_server_host() -> String {
    "localhost".to_string()
}

fn default_server_port() -> u16 {
    80
}

fn default_max_jobs() -> usize {
    5
}

fn default_min_load() -> f64 {
    20.0
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            server_host: default_server_host(),
            server_port: default_server_port(),
            max_jobs: default_max_jobs(),
            min_load: default_min_load(),
            timeout_secs: 0,
            log_target: LogTarget::default(),
        }
    }
}

impl QueueConfig {
    /// Run timeout as a duration; `None` means unbounded.
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fanq")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<QueueConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = QueueConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: QueueConfig = toml::from_str(&data)?;
    Ok(cfg)
}
