use std::path::PathBuf;

use tempfile::TempDir;

use abit::config::{ChannelConfig, ConfigStore, TomlConfigStore};
use abit::engine::{AudioChannel, PositionRange};

#[test]
fn test_config_lifecycle() {
    // Create a temporary directory for test config
    let temp_dir = TempDir::new().unwrap();

    // Override the config path for testing
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    // Test that config doesn't exist initially
    assert!(!TomlConfigStore::exists().unwrap());

    let store = TomlConfigStore::new();
    assert!(store.load(AudioChannel::A).is_none());
    assert!(store.load(AudioChannel::B).is_none());

    // Save a record for channel A
    let config = ChannelConfig {
        file: Some(PathBuf::from("/tmp/clip.wav")),
        position_range: PositionRange::new(0.25, 0.75),
        loop_enabled: false,
    };
    store.save(AudioChannel::A, &config).unwrap();
    assert!(TomlConfigStore::exists().unwrap());

    // Load and verify values
    let loaded = store.load(AudioChannel::A).unwrap();
    assert_eq!(loaded, config);
    assert!(store.load(AudioChannel::B).is_none());

    // A second record must not disturb the first
    let config_b = ChannelConfig {
        file: None,
        position_range: PositionRange::full(),
        loop_enabled: true,
    };
    store.save(AudioChannel::B, &config_b).unwrap();
    assert_eq!(store.load(AudioChannel::A), Some(config.clone()));
    assert_eq!(store.load(AudioChannel::B), Some(config_b));

    // Clearing one channel leaves the other in place
    store.clear(AudioChannel::B).unwrap();
    assert!(store.load(AudioChannel::B).is_none());
    assert_eq!(store.load(AudioChannel::A), Some(config));

    // clear_all removes the file entirely
    store.clear_all().unwrap();
    assert!(!TomlConfigStore::exists().unwrap());
    assert!(store.load(AudioChannel::A).is_none());
}
