//! Configuration management for tessera.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section is optional in the file.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use crate::types::Color;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure for tessera.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Processing settings
    pub processing: ProcessingConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Encoder settings
    pub encode: EncodeConfig,

    /// Watermark settings
    pub overlay: OverlayConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.tessera.tessera/config.toml
    /// - Linux: ~/.config/tessera/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\tessera\tessera\config\config.toml
    ///
    /// Falls back to ~/.tessera/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "tessera", "tessera")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".tessera").join("config.toml")
            })
    }

    /// Resolved overlay font path (with ~ expansion).
    pub fn font_path(&self) -> Option<PathBuf> {
        self.overlay.font_path.as_ref().map(|path| {
            let path_str = path.to_string_lossy();
            PathBuf::from(shellexpand::tilde(&path_str).into_owned())
        })
    }

    /// Bound on the multi-frame join.
    pub fn sequence_timeout(&self) -> Duration {
        Duration::from_secs(self.processing.sequence_timeout_secs)
    }

    /// Flattening color for formats without alpha.
    ///
    /// Falls back to white if the configured value does not parse; a loaded
    /// config has already been validated.
    pub fn background_color(&self) -> Color {
        self.encode
            .background_color
            .parse()
            .unwrap_or(Color::WHITE)
    }

    /// Text overlay color, with the same fallback as [`Config::background_color`].
    pub fn overlay_color(&self) -> Color {
        self.overlay.color.parse().unwrap_or(Color::WHITE)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::ScaleFilter;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.processing.parallel_workers >= 1);
        assert_eq!(config.processing.sequence_timeout_secs, 300);
        assert_eq!(config.processing.downscale_filter, ScaleFilter::Lanczos3);
        assert_eq!(config.encode.jpeg_quality, 80);
        assert_eq!(config.limits.max_output_pixels, 0);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[processing]"));
        assert!(toml.contains("[limits]"));
        assert!(toml.contains("downscale_filter = \"lanczos3\""));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[processing]\nsequence_timeout_secs = 10\nupscale_filter = \"nearest\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.sequence_timeout(), Duration::from_secs(10));
        assert_eq!(config.processing.upscale_filter, ScaleFilter::Nearest);
        assert_eq!(config.encode.jpeg_quality, 80);
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[encode]\njpeg_quality = 0\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("jpeg_quality"));
    }

    #[test]
    fn test_font_path_expands_tilde() {
        let mut config = Config::default();
        assert!(config.font_path().is_none());
        config.overlay.font_path = Some(PathBuf::from("~/fonts/mark.ttf"));
        let resolved = config.font_path().unwrap();
        assert!(!resolved.to_string_lossy().starts_with('~'));
    }
}
