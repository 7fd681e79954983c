//! Evaluation configuration.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! The CLI loads an optional TOML file and overlays command-line flags.

mod settings;

pub use settings::{
    MetricSettings, ModelSettings, OutputSettings, Settings, SyncSettings, VideoSettings,
};

use std::path::Path;

/// Error loading or saving a settings file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write the settings file.
    #[error("I/O error on settings file: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid TOML.
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// The settings could not be serialized.
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Load settings from a TOML file. Missing fields take their defaults.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&text)?)
}

/// Save settings to a TOML file.
pub fn save_settings(settings: &Settings, path: &Path) -> Result<(), ConfigError> {
    let text = toml::to_string_pretty(settings)?;
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let settings = Settings::default();
        save_settings(&settings, &path).unwrap();

        let loaded = load_settings(&path).unwrap();
        assert_eq!(loaded.video.num_frames, settings.video.num_frames);
        assert_eq!(loaded.output.output_dir, settings.output.output_dir);
    }

    #[test]
    fn load_missing_file_is_error() {
        let result = load_settings(Path::new("/nonexistent/settings.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
