use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file used when `CONFIG_FILE` is not set.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Application configuration loaded from config.yaml
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Image job settings
    #[serde(default)]
    pub jobs: JobConfig,

    /// Reminder scheduler settings
    #[serde(default)]
    pub reminders: ReminderConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address to listen on (overridden by `BIND_ADDR`)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Largest accepted request body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_max_body_bytes() -> usize {
    32 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Encoding of job results
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JobConfig {
    /// Jobs running at the same time; further jobs wait for a slot
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Largest accepted encoded input image in bytes
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,

    /// JPEG quality (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    #[serde(default)]
    pub output_format: OutputFormat,
}

fn default_max_concurrent() -> usize {
    4
}

fn default_max_image_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_jpeg_quality() -> u8 {
    85
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            max_image_bytes: default_max_image_bytes(),
            jpeg_quality: default_jpeg_quality(),
            output_format: OutputFormat::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReminderConfig {
    /// Run the background scheduler under `serve`
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between due-reminder polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Local time zone of reminder times, as a fixed offset from UTC
    #[serde(default)]
    pub utc_offset_hours: i32,

    /// Notifications older than this many days are deleted by cleanup
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    300 // 5 minutes
}

fn default_retention_days() -> i64 {
    30
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: default_poll_interval(),
            utc_offset_hours: 0,
            retention_days: default_retention_days(),
        }
    }
}

impl ReminderConfig {
    /// The configured offset, or UTC if it is out of range.
    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                tracing::warn!(
                    utc_offset_hours = self.utc_offset_hours,
                    "Invalid UTC offset, using UTC"
                );
                Utc.fix()
            })
    }
}

impl AppConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Load configuration from a file, falling back to defaults if the file
    /// is missing or invalid.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_yaml(&content) {
                Ok(config) => {
                    tracing::info!(
                        path = %path.display(),
                        max_concurrent = config.jobs.max_concurrent,
                        output_format = ?config.jobs.output_format,
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(%e, path = %path.display(), "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, path = %path.display(), "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Load configuration the way the binary does: `CONFIG_FILE` (or
    /// `config.yaml`), then `BIND_ADDR` on top.
    pub fn from_env() -> Self {
        let path = config_path();
        let mut config = if path.exists() || std::env::var("CONFIG_FILE").is_ok() {
            Self::load(&path)
        } else {
            Self::default()
        };

        if let Ok(bind_addr) = std::env::var("BIND_ADDR") {
            config.server.bind_addr = bind_addr;
        }

        config
    }
}

/// Path of the config file named by `CONFIG_FILE`, or the default.
pub fn config_path() -> PathBuf {
    std::env::var("CONFIG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
}
