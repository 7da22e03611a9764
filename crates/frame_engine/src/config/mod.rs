//! Configuration system
//!
//! Settings structs are plain serde types; [`Config`] adds file loading and
//! saving in TOML or RON, picked by file extension.

mod settings;

use std::path::Path;

pub use serde::{Deserialize, Serialize};
pub use settings::{AppConfig, RendererConfig, ShaderConfig, WindowConfig};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match Format::of(path)? {
            Format::Toml => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Format::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_from_file(path)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match Format::of(path)? {
            Format::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Format::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

enum Format {
    Toml,
    Ron,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value failed validation
    #[error("Invalid value: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("frame_engine_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_toml_round_trip_keeps_overrides() {
        let path = scratch_path("app.toml");
        let mut config = AppConfig::default();
        config.window.width = 1280;
        config.renderer.max_frames_in_flight = 3;

        config.save_to_file(&path).unwrap();
        let loaded = AppConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.window.width, 1280);
        assert_eq!(loaded.renderer.max_frames_in_flight, 3);
    }

    #[test]
    fn test_ron_file_is_supported() {
        let path = scratch_path("app.ron");
        AppConfig::default().save_to_file(&path).unwrap();
        let loaded = AppConfig::load_from_file(&path);
        std::fs::remove_file(&path).ok();

        assert!(loaded.is_ok());
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = AppConfig::default().save_to_file(scratch_path("app.yaml"));
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_or_default(scratch_path("missing.toml")).unwrap();
        assert_eq!(config.window.width, 800);
    }

    #[test]
    fn test_partial_toml_fills_in_defaults() {
        let config: AppConfig = toml::from_str("[window]\ntitle = \"Resized\"\n").unwrap();
        assert_eq!(config.window.title, "Resized");
        assert_eq!(config.window.height, 600);
        assert_eq!(config.renderer.max_frames_in_flight, 2);
    }
}
