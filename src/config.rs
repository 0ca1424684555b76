//! Configuration types for feishu-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Feishu Open API credentials and endpoint
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeishuConfig {
    /// App ID for the Open API
    #[serde(default)]
    pub app_id: String,

    /// App secret for the Open API
    #[serde(default)]
    pub app_secret: String,

    /// API base URL (default: "https://open.feishu.cn")
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for FeishuConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_secret: String::new(),
            base_url: default_base_url(),
        }
    }
}

/// Output behavior configuration (asset handling, concurrency)
///
/// Groups settings related to how exported Markdown and its assets are
/// written. Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Subdirectory for downloaded assets, relative to each document's
    /// output directory (default: "static")
    #[serde(default = "default_image_dir")]
    pub image_dir: String,

    /// Skip downloading embedded assets, leaving placeholder tokens in place
    #[serde(default)]
    pub skip_image_download: bool,

    /// Maximum concurrent document downloads per batch (default: 10).
    /// `0` disables the cap entirely.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            image_dir: default_image_dir(),
            skip_image_download: false,
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// Retry behavior for transient API failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Main configuration for feishu-dl
///
/// Fields are organized into logical sub-configs:
/// - [`feishu`](FeishuConfig) — API credentials and endpoint
/// - [`output`](OutputConfig) — asset handling and batch concurrency
/// - [`retry`](RetryConfig) — transient-failure retry behavior
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// API credentials and endpoint
    #[serde(default)]
    pub feishu: FeishuConfig,

    /// Output behavior
    #[serde(default)]
    pub output: OutputConfig,

    /// Retry behavior
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Platform config file path: `<config-dir>/feishu-dl/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or_else(|| Error::Config {
            message: "cannot determine platform config directory".to_string(),
            key: None,
        })?;
        Ok(base.join("feishu-dl").join("config.json"))
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&data)?;
        Ok(config)
    }

    /// Load from the default path, falling back to defaults if the file
    /// does not exist yet
    pub fn load_or_default() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Persist configuration as pretty-printed JSON, creating parent
    /// directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Validate that API credentials are present
    pub fn require_credentials(&self) -> Result<()> {
        if self.feishu.app_id.is_empty() {
            return Err(Error::Config {
                message: "app_id is not set; run `feishu-dl config --app-id <id>`".to_string(),
                key: Some("feishu.app_id".to_string()),
            });
        }
        if self.feishu.app_secret.is_empty() {
            return Err(Error::Config {
                message: "app_secret is not set; run `feishu-dl config --app-secret <secret>`"
                    .to_string(),
                key: Some("feishu.app_secret".to_string()),
            });
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://open.feishu.cn".to_string()
}

fn default_image_dir() -> String {
    "static".to_string()
}

fn default_max_concurrent() -> usize {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_has_sensible_values() {
        let config = Config::default();
        assert_eq!(config.feishu.base_url, "https://open.feishu.cn");
        assert_eq!(config.output.image_dir, "static");
        assert_eq!(config.output.max_concurrent, 10);
        assert!(!config.output.skip_image_download);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"feishu":{"app_id":"cli_a1","app_secret":"s3cret"}}"#)
                .unwrap();
        assert_eq!(config.feishu.app_id, "cli_a1");
        assert_eq!(config.output.max_concurrent, 10);
        assert_eq!(config.retry.initial_delay, Duration::from_secs(1));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.feishu.app_id = "cli_a2".to_string();
        config.output.max_concurrent = 4;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.feishu.app_id, "cli_a2");
        assert_eq!(loaded.output.max_concurrent, 4);
    }

    #[test]
    fn require_credentials_reports_missing_key() {
        let config = Config::default();
        let err = config.require_credentials().unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("feishu.app_id")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn require_credentials_passes_when_set() {
        let mut config = Config::default();
        config.feishu.app_id = "cli_a3".to_string();
        config.feishu.app_secret = "s".to_string();
        assert!(config.require_credentials().is_ok());
    }
}
