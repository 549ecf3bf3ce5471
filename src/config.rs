// Global configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::engine::{AudioMode, OutputTarget, SpeedPreset};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub startup: StartupConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartupConfig {
    /// Directory the input browser opens in; falls back to the home dir.
    #[serde(default)]
    pub last_input_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Speed preset preselected for new jobs
    #[serde(default)]
    pub preset: SpeedPreset,

    /// Output container preselected for new jobs
    #[serde(default)]
    pub target: OutputTarget,

    /// Audio handling preselected for new jobs
    #[serde(default)]
    pub audio_mode: AudioMode,

    /// Encoder threads; 0 means "pick from the core count"
    #[serde(default)]
    pub threads: u32,

    /// Whether starting over an existing output is allowed without asking
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            preset: SpeedPreset::default(),
            target: OutputTarget::default(),
            audio_mode: AudioMode::default(),
            threads: 0,
            overwrite: false,
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config")
                .join("ffturn")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("ffturn")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from disk, or fall back to defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path).with_context(|| {
                format!("Failed to read config file: {}", config_path.display())
            })?;

            let config: Config = toml::from_str(&contents).with_context(|| {
                format!("Failed to parse config file: {}", config_path.display())
            })?;

            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Check if config file exists
    pub fn exists() -> bool {
        Self::config_path().map(|p| p.exists()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.defaults.preset, SpeedPreset::Medium);
        assert_eq!(config.defaults.target, OutputTarget::Mp4);
        assert_eq!(config.defaults.audio_mode, AudioMode::Copy);
        assert_eq!(config.defaults.threads, 0);
        assert!(!config.defaults.overwrite);
        assert_eq!(config.startup.last_input_dir, None);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = Config::default();
        config.defaults.preset = SpeedPreset::Faster;
        config.defaults.target = OutputTarget::Mkv;
        config.defaults.threads = 4;
        config.startup.last_input_dir = Some(PathBuf::from("/videos"));

        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(deserialized.defaults.preset, SpeedPreset::Faster);
        assert_eq!(deserialized.defaults.target, OutputTarget::Mkv);
        assert_eq!(deserialized.defaults.threads, 4);
        assert_eq!(
            deserialized.startup.last_input_dir,
            Some(PathBuf::from("/videos"))
        );
    }

    #[test]
    fn test_preset_serializes_as_ffmpeg_name() {
        let mut config = Config::default();
        config.defaults.preset = SpeedPreset::VerySlow;
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("veryslow"));
    }
}
