//! Per-channel player configuration persistence.
//!
//! Each channel stores its last-used clip, loop window and loop flag so a
//! performer's setup survives process restarts. Records live in a single
//! toml file under the user's config directory (typically
//! ~/.config/abit/players.toml) with an `XDG_CONFIG_HOME` override for
//! testing. Absence of a record is a valid state: a fresh channel defaults
//! to the full range with looping enabled.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::CONFIG_FILE_NAME;
use crate::engine::{AudioChannel, PositionRange};

/// A channel's persisted playback configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Stable library path of the loaded clip, if any.
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub position_range: PositionRange,
    #[serde(default = "default_loop")]
    pub loop_enabled: bool,
}

fn default_loop() -> bool {
    true
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            file: None,
            position_range: PositionRange::full(),
            loop_enabled: true,
        }
    }
}

/// Storage for per-channel configuration records, keyed by channel.
pub trait ConfigStore {
    fn load(&self, channel: AudioChannel) -> Option<ChannelConfig>;
    fn save(&self, channel: AudioChannel, config: &ChannelConfig) -> Result<(), Box<dyn Error>>;
    fn clear(&self, channel: AudioChannel) -> Result<(), Box<dyn Error>>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    channels: HashMap<String, ChannelConfig>,
}

/// `ConfigStore` backed by a toml file in the user config directory.
#[derive(Debug, Default)]
pub struct TomlConfigStore;

impl TomlConfigStore {
    pub fn new() -> Self {
        Self
    }

    pub fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
        // Check for XDG_CONFIG_HOME first (useful for testing)
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join("abit")
        } else {
            dirs::config_dir()
                .ok_or("Unable to find config directory")?
                .join("abit")
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    pub fn exists() -> Result<bool, Box<dyn Error>> {
        Ok(Self::config_path()?.exists())
    }

    fn read() -> Result<ConfigFile, Box<dyn Error>> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(ConfigFile::default());
        }
        let contents = fs::read_to_string(&path)?;
        Ok(toml::from_str(&contents)?)
    }

    fn write(file: &ConfigFile) -> Result<(), Box<dyn Error>> {
        let dir = Self::config_dir()?;
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        let toml_string = toml::to_string_pretty(file)?;
        fs::write(Self::config_path()?, toml_string)?;
        Ok(())
    }

    /// Remove all persisted channel records.
    pub fn clear_all(&self) -> Result<(), Box<dyn Error>> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

impl ConfigStore for TomlConfigStore {
    fn load(&self, channel: AudioChannel) -> Option<ChannelConfig> {
        let mut file = Self::read().ok()?;
        file.channels.remove(channel.key())
    }

    fn save(&self, channel: AudioChannel, config: &ChannelConfig) -> Result<(), Box<dyn Error>> {
        let mut file = Self::read()?;
        file.channels.insert(channel.key().to_string(), config.clone());
        Self::write(&file)
    }

    fn clear(&self, channel: AudioChannel) -> Result<(), Box<dyn Error>> {
        let mut file = Self::read()?;
        if file.channels.remove(channel.key()).is_some() {
            Self::write(&file)?;
        }
        Ok(())
    }
}

/// In-memory `ConfigStore` for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    records: RefCell<HashMap<AudioChannel, ChannelConfig>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self, channel: AudioChannel) -> Option<ChannelConfig> {
        self.records.borrow().get(&channel).cloned()
    }

    fn save(&self, channel: AudioChannel, config: &ChannelConfig) -> Result<(), Box<dyn Error>> {
        self.records.borrow_mut().insert(channel, config.clone());
        Ok(())
    }

    fn clear(&self, channel: AudioChannel) -> Result<(), Box<dyn Error>> {
        self.records.borrow_mut().remove(&channel);
        Ok(())
    }
}

/// Pretty description of a record for CLI display.
pub fn describe(channel: AudioChannel, config: Option<&ChannelConfig>) -> String {
    match config {
        Some(config) => format!(
            "{}: file={} range={:.3}..{:.3} loop={}",
            channel,
            config
                .file
                .as_deref()
                .map(Path::display)
                .map(|d| d.to_string())
                .unwrap_or_else(|| "<none>".into()),
            config.position_range.lower(),
            config.position_range.upper(),
            config.loop_enabled
        ),
        None => format!("{channel}: <not configured>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_config_defaults() {
        let config = ChannelConfig::default();
        assert!(config.file.is_none());
        assert!(config.position_range.is_full());
        assert!(config.loop_enabled);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryConfigStore::new();
        assert!(store.load(AudioChannel::A).is_none());

        let config = ChannelConfig {
            file: Some(PathBuf::from("clip.wav")),
            position_range: PositionRange::new(0.1, 0.9),
            loop_enabled: false,
        };
        store.save(AudioChannel::A, &config).unwrap();

        assert_eq!(store.load(AudioChannel::A), Some(config));
        assert!(store.load(AudioChannel::B).is_none());

        store.clear(AudioChannel::A).unwrap();
        assert!(store.load(AudioChannel::A).is_none());
    }

    #[test]
    fn test_config_file_toml_round_trip() {
        let mut file = ConfigFile::default();
        file.channels.insert(
            "a".to_string(),
            ChannelConfig {
                file: Some(PathBuf::from("/tmp/clip.wav")),
                position_range: PositionRange::new(0.25, 0.75),
                loop_enabled: true,
            },
        );

        let toml_string = toml::to_string_pretty(&file).unwrap();
        let parsed: ConfigFile = toml::from_str(&toml_string).unwrap();
        assert_eq!(parsed.channels, file.channels);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let parsed: ConfigFile = toml::from_str("[channels.b]\n").unwrap();
        let config = &parsed.channels["b"];
        assert!(config.file.is_none());
        assert!(config.position_range.is_full());
        assert!(config.loop_enabled);
    }
}
