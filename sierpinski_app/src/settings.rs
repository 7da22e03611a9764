//! Scene settings read from the same file as the engine configuration

use frame_engine::config::{Config, ConfigError};
use serde::{Deserialize, Serialize};

/// Configuration file looked up in the working directory
pub const CONFIG_PATH: &str = "sierpinski.toml";

const MAX_DEPTH: u32 = 12;

/// `[scene]` table of the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Subdivision depth of the triangle
    pub depth: u32,
}

impl SceneConfig {
    /// Reject depths that would produce unreasonably large vertex buffers
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depth > MAX_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "Scene depth {} exceeds the maximum of {}",
                self.depth, MAX_DEPTH
            )));
        }
        Ok(())
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self { depth: 8 }
    }
}

/// Wrapper that picks the `[scene]` table out of the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Scene section
    pub scene: SceneConfig,
}

impl Config for SceneSettings {}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_engine::config::AppConfig;

    #[test]
    fn test_default_depth_is_eight() {
        assert_eq!(SceneConfig::default().depth, 8);
        assert!(SceneConfig::default().validate().is_ok());
    }

    #[test]
    fn test_excessive_depth_is_rejected() {
        assert!(SceneConfig { depth: 13 }.validate().is_err());
    }

    #[test]
    fn test_one_file_feeds_engine_and_scene() {
        let path = std::env::temp_dir().join(format!("sierpinski_{}.toml", std::process::id()));
        std::fs::write(&path, "[window]\ntitle = \"Triangle\"\n\n[scene]\ndepth = 3\n").unwrap();

        let engine = AppConfig::load_from_file(&path).unwrap();
        let scene = SceneSettings::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(engine.window.title, "Triangle");
        assert_eq!(scene.scene.depth, 3);
    }
}
