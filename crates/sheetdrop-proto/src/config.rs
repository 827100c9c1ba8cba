use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    /// Per-metric card decoration overrides, layered over the built-in table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cards: Vec<CardEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the processing service; endpoint paths are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Reveal timings, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Delay between consecutive card entrances.
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
    /// Pause between a card appearing and its count-up starting.
    #[serde(default = "default_count_delay_ms")]
    pub count_delay_ms: u64,
    #[serde(default = "default_count_duration_ms")]
    pub count_duration_ms: u64,
    /// Fade-out of the upload section before it is hidden. 0 hides it at once.
    #[serde(default = "default_exit_transition_ms")]
    pub exit_transition_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory processed artifacts are saved into.
    #[serde(default = "platform::default_downloads_dir")]
    pub downloads_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardEntry {
    pub metric: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub emphasize: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            stagger_ms: default_stagger_ms(),
            count_delay_ms: default_count_delay_ms(),
            count_duration_ms: default_count_duration_ms(),
            exit_transition_ms: default_exit_transition_ms(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            downloads_dir: platform::default_downloads_dir(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_stagger_ms() -> u64 {
    80
}

fn default_count_delay_ms() -> u64 {
    200
}

fn default_count_duration_ms() -> u64 {
    900
}

fn default_exit_transition_ms() -> u64 {
    300
}

impl Config {
    /// Load the config from its default location, writing defaults on first run.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.animation.stagger_ms, 80);
        assert_eq!(config.animation.count_delay_ms, 200);
        assert_eq!(config.animation.count_duration_ms, 900);
        assert_eq!(config.animation.exit_transition_ms, 300);
        assert!(config.cards.is_empty());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            base_url = "https://sheets.example.org"

            [animation]
            stagger_ms = 40

            [[cards]]
            metric = "Final"
            icon = "*"
            emphasize = true
            "#,
        )
        .unwrap();
        assert_eq!(config.server.base_url, "https://sheets.example.org");
        assert_eq!(config.animation.stagger_ms, 40);
        assert_eq!(config.animation.count_duration_ms, 900);
        assert_eq!(
            config.cards,
            vec![CardEntry {
                metric: "Final".to_string(),
                icon: "*".to_string(),
                emphasize: true,
            }]
        );
    }

    #[test]
    fn test_load_writes_defaults_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.animation.stagger_ms, 80);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.server.base_url, config.server.base_url);
    }
}
