//! Client configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/minesduel/config.toml`
//! - Windows: `%APPDATA%/minesduel/config.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use minesduel_sync::{PipelineConfig, SessionConfig};

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root URL of the document store (e.g. `https://example.firebaseio.com`).
    #[serde(default)]
    pub store_url: String,

    /// Prefix of every session key in the store.
    #[serde(default = "default_game_name")]
    pub game_name: String,

    /// Per-call timeout for store requests, in milliseconds.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    /// How often the local board is pushed and the opponent's polled.
    #[serde(default = "default_interval_ms")]
    pub sync_interval_ms: u64,

    /// How often finished store calls are drained.
    #[serde(default = "default_interval_ms")]
    pub drain_interval_ms: u64,

    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_game_name() -> String {
    minesduel_sync::keys::DEFAULT_GAME_NAME.into()
}

fn default_call_timeout_ms() -> u64 {
    5000
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_log_filter() -> String {
    "info".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_url: String::new(),
            game_name: default_game_name(),
            call_timeout_ms: default_call_timeout_ms(),
            sync_interval_ms: default_interval_ms(),
            drain_interval_ms: default_interval_ms(),
            log_filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the platform path, or creates a default if
    /// not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Loads configuration from `path`, writing a default there if the file
    /// does not exist yet.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = AppConfig::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Session timing derived from this configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            game_name: self.game_name.clone(),
            sync_interval: Duration::from_millis(self.sync_interval_ms.max(1)),
            pipeline: PipelineConfig {
                drain_interval: Duration::from_millis(self.drain_interval_ms.max(1)),
            },
        }
    }
}

/// Returns the platform-specific configuration file path.
pub fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("minesduel")
            .join("config.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("minesduel").join("config.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/minesduel/config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = AppConfig::default();
        assert!(config.store_url.is_empty());
        assert_eq!(config.game_name, "OOPGame");
        assert_eq!(config.call_timeout(), Duration::from_secs(5));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn config_partial_toml() {
        let toml_str = r#"
            store_url = "https://duel.example.com"
            sync_interval_ms = 250
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.store_url, "https://duel.example.com");
        assert_eq!(config.sync_interval_ms, 250);
        assert_eq!(config.drain_interval_ms, 1000);
        assert_eq!(config.game_name, "OOPGame");
    }

    #[test]
    fn session_config_uses_intervals() {
        let config = AppConfig {
            game_name: "Duel".into(),
            sync_interval_ms: 500,
            drain_interval_ms: 0,
            ..AppConfig::default()
        };
        let session = config.session_config();
        assert_eq!(session.game_name, "Duel");
        assert_eq!(session.sync_interval, Duration::from_millis(500));
        assert_eq!(session.pipeline.drain_interval, Duration::from_millis(1));
    }

    #[test]
    fn load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = AppConfig {
            store_url: "http://127.0.0.1:9000".into(),
            call_timeout_ms: 1500,
            ..AppConfig::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "call_timeout_ms = \"soon\"").unwrap();

        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn config_path_not_empty() {
        let path = config_path().unwrap();
        assert!(path.to_string_lossy().contains("minesduel"));
    }
}
