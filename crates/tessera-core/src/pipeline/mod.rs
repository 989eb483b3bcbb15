//! Raster post-processing pipeline components.
//!
//! Stages, in the order a frame passes through them:
//! - **frame**: Frames, sequences and 8-bit normalisation
//! - **orientation**: When to correct embedded orientation
//! - **crop**: Crop and redaction
//! - **transform**: Scale, transpose, rotate, color, sharpen, overlay
//! - **sequence**: Fan multi-frame sources out across workers
//! - **encode**: Encoder dispatch and metadata embedding
//!
//! Around them:
//! - **decode**: Reference decoder producing frames, `Info` and metadata
//! - **metadata**: EXIF/XMP extraction and embedding
//! - **validate**: Request validation before any frame is touched
//! - **processor**: Orchestrates the full pipeline

pub mod crop;
pub mod decode;
pub mod encode;
pub mod frame;
pub mod metadata;
pub mod orientation;
pub mod processor;
pub mod sequence;
pub mod transform;
pub mod validate;

// Re-exports for convenient access
pub use crop::{apply_crop, apply_redactions, CropReference};
pub use decode::{DecodedSource, ImageDecoder};
pub use encode::ImageWriter;
pub use frame::{Frame, FrameSequence};
pub use metadata::{MetadataExtractor, SourceMetadata};
pub use orientation::{transform_region, OrientationPlan};
pub use processor::{FramePipeline, PostProcessor, SourceContext};
pub use sequence::{plan_partitions, run_partitioned, Parallelized};
pub use transform::{apply_transforms, TransformSettings};
pub use validate::Validator;
