//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::types::Color;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel_workers must be > 0".into(),
            ));
        }
        if self.processing.sequence_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "processing.sequence_timeout_secs must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        if !(self.limits.max_scale > 0.0) {
            return Err(ConfigError::ValidationError(
                "limits.max_scale must be > 0".into(),
            ));
        }
        if !(1..=100).contains(&self.encode.jpeg_quality) {
            return Err(ConfigError::ValidationError(
                "encode.jpeg_quality must be between 1 and 100".into(),
            ));
        }
        if self.encode.background_color.parse::<Color>().is_err() {
            return Err(ConfigError::ValidationError(format!(
                "encode.background_color must be #RRGGBB, got {:?}",
                self.encode.background_color
            )));
        }
        if !(self.overlay.font_size > 0.0) {
            return Err(ConfigError::ValidationError(
                "overlay.font_size must be > 0".into(),
            ));
        }
        if self.overlay.color.parse::<Color>().is_err() {
            return Err(ConfigError::ValidationError(format!(
                "overlay.color must be #RRGGBB, got {:?}",
                self.overlay.color
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_parallel_workers() {
        let mut config = Config::default();
        config.processing.parallel_workers = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("parallel_workers"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.processing.sequence_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sequence_timeout_secs"));
    }

    #[test]
    fn test_validate_rejects_bad_scale_limit() {
        let mut config = Config::default();
        config.limits.max_scale = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_scale"));

        config.limits.max_scale = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_colors() {
        let mut config = Config::default();
        config.encode.background_color = "white".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("background_color"));

        let mut config = Config::default();
        config.overlay.color = "#12".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("overlay.color"));
    }
}
