//! CLI enum types for the process command.

use clap::ValueEnum;
use tessera_core::operation::ColorTransform;

/// Color reduction applied after the geometric operations.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ColorArg {
    /// Grayscale
    Gray,
    /// Black and white, thresholded at mid-gray
    Bitonal,
}

impl From<ColorArg> for ColorTransform {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Gray => ColorTransform::Gray,
            ColorArg::Bitonal => ColorTransform::Bitonal,
        }
    }
}

impl std::fmt::Display for ColorArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorArg::Gray => write!(f, "gray"),
            ColorArg::Bitonal => write!(f, "bitonal"),
        }
    }
}
