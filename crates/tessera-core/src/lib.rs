//! Tessera Core - raster post-processing for an image-delivery server.
//!
//! Tessera sits between a decoder and an encoder. It takes decoded frames
//! plus a client-requested [`OperationList`] and produces the encoded
//! derivative image, written to a sink the caller owns.
//!
//! # Architecture
//!
//! ```text
//! Frame → 8-bit → Orientation → Crop → Redaction → (Orientation) → Transforms → Encode
//! ```
//!
//! Multi-frame sources run every frame through the same per-frame pipeline
//! on blocking worker tasks; the whole sequence fails if any frame does.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tessera_core::operation::{Crop, Encode, OperationList, OutputFormat, Scale};
//! use tessera_core::{Config, PostProcessor};
//!
//! #[tokio::main]
//! async fn main() -> tessera_core::Result<()> {
//!     let config = Config::load()?;
//!     let processor = PostProcessor::new(&config);
//!
//!     let ops = OperationList::default()
//!         .with(Crop::square())
//!         .with(Scale::percent(0.5))
//!         .with(Encode::new(OutputFormat::Jpeg));
//!     let mut out = std::fs::File::create("thumb.jpg")?;
//!     let stats = processor.process_file("./image.jpg".as_ref(), &ops, &mut out).await?;
//!     println!("{}x{}", stats.output_width, stats.output_height);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod operation;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, PipelineError, PipelineResult, Result, TesseraError};
pub use operation::{Operation, OperationList};
pub use pipeline::{FrameSequence, PostProcessor, SourceContext};
pub use types::{Dimensions, Info, Orientation, ProcessingStats, ReaderHint, ReaderHints};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_config_builds_processor() {
        let config = Config::default();
        assert!(config.processing.parallel_workers > 0);
        let _processor = PostProcessor::new(&config);
    }
}
