//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::operation::ScaleFilter;

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Upper bound on worker tasks per multi-frame request
    pub parallel_workers: usize,

    /// How long a multi-frame request may run before it is failed
    pub sequence_timeout_secs: u64,

    /// Resampling filter used when shrinking
    pub downscale_filter: ScaleFilter,

    /// Resampling filter used when enlarging
    pub upscale_filter: ScaleFilter,

    /// Largest decode-time reduction factor (a 1/2^n downscale)
    pub max_reduction_factor: u8,

    /// Let the decoder shrink the source before the pipeline runs
    pub decode_reduction: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            sequence_timeout_secs: 300,
            downscale_filter: ScaleFilter::Lanczos3,
            upscale_filter: ScaleFilter::CatmullRom,
            max_reduction_factor: 5,
            decode_reduction: true,
        }
    }
}

/// Resource limits to protect against problematic inputs and requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum source dimension (width or height) the decoder accepts
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,

    /// Maximum output pixel count (0 = unlimited)
    pub max_output_pixels: u64,

    /// Largest output scale relative to the full source
    pub max_scale: f64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_image_dimension: 20000,
            decode_timeout_ms: 30000,
            max_output_pixels: 0,
            max_scale: 1.0,
        }
    }
}

/// Encoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,

    /// Color alpha is flattened onto for formats without alpha
    pub background_color: String,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 80,
            background_color: "#FFFFFF".to_string(),
        }
    }
}

/// Watermark settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// TrueType/OpenType font for text overlays
    pub font_path: Option<PathBuf>,

    /// Text size in pixels
    pub font_size: f32,

    /// Distance from the anchored edges in pixels
    pub inset: u32,

    /// Text color
    pub color: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            font_size: 24.0,
            inset: 10,
            color: "#FFFFFF".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
