//! Pipeline orchestration - wires the per-frame stages, the sequence
//! parallelizer and encoder dispatch together.

use image::DynamicImage;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::operation::{OperationList, ReductionFactor};
use crate::types::{Info, Orientation, ProcessingStats, ReaderHints};

use super::crop::{apply_crop, apply_redactions};
use super::decode::{DecodedSource, ImageDecoder};
use super::encode::ImageWriter;
use super::frame::{normalize_to_8bit, Frame, FrameSequence};
use super::metadata::SourceMetadata;
use super::orientation::{apply_orientation, OrientationPlan};
use super::sequence::run_partitioned;
use super::transform::{apply_transforms, TransformSettings};
use super::validate::Validator;

/// What the decode layer knows about the frames it handed over.
#[derive(Debug, Clone, Default)]
pub struct SourceContext {
    /// Full source size and embedded orientation
    pub info: Info,
    /// Decode-time reduction already applied to every frame
    pub reduction_factor: ReductionFactor,
    /// Shortcuts the decoder took
    pub hints: ReaderHints,
    /// Embedded metadata, for `MetadataCopy`
    pub metadata: SourceMetadata,
}

impl SourceContext {
    pub fn new(info: Info) -> Self {
        Self {
            info,
            ..Self::default()
        }
    }

    pub fn with_reduction_factor(mut self, rf: ReductionFactor) -> Self {
        self.reduction_factor = rf;
        self
    }

    pub fn with_hints(mut self, hints: ReaderHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn with_metadata(mut self, metadata: SourceMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

impl DecodedSource {
    /// Split into the frames and the context the pipeline needs for them.
    pub fn into_parts(self) -> (FrameSequence, SourceContext) {
        let context = SourceContext::new(self.info)
            .with_reduction_factor(self.reduction_factor)
            .with_metadata(self.metadata);
        (self.frames, context)
    }
}

/// The per-frame pipeline: orientation, crop, redaction and transforms.
///
/// Everything it holds is read-only, so one instance is shared by every
/// worker of a sequence.
#[derive(Debug, Clone)]
pub struct FramePipeline {
    ops: Arc<OperationList>,
    info: Info,
    rf: ReductionFactor,
    hints: ReaderHints,
    settings: TransformSettings,
    plan: OrientationPlan,
}

impl FramePipeline {
    pub fn new(
        ops: Arc<OperationList>,
        context: &SourceContext,
        settings: TransformSettings,
    ) -> Self {
        let plan = OrientationPlan::decide(context.info.orientation, &ops);
        Self {
            ops,
            info: context.info,
            rf: context.reduction_factor,
            hints: context.hints.clone(),
            settings,
            plan,
        }
    }

    pub fn orientation_plan(&self) -> OrientationPlan {
        self.plan
    }

    /// Run one raster through every stage.
    pub fn process(&self, image: DynamicImage) -> PipelineResult<DynamicImage> {
        let full = self.info.size;
        let orientation = self.info.orientation;
        let mut image = normalize_to_8bit(image);

        let pre_rotation = if self.plan == OrientationPlan::BeforeCrop {
            image = apply_orientation(image, orientation);
            orientation
        } else {
            Orientation::Rotate0
        };

        let (mut image, crop) = apply_crop(image, &self.ops, full, self.rf, &self.hints)?;
        let redactions = self
            .ops
            .redactions()
            .filter(|redaction| redaction.has_effect(full, &self.ops));
        apply_redactions(&mut image, redactions, crop, full, self.rf, pre_rotation);

        if self.plan == OrientationPlan::AfterCrop {
            image = apply_orientation(image, orientation);
        }

        apply_transforms(image, &self.ops, full, self.rf, &self.settings)
    }
}

/// Post-processes decoded rasters and writes the encoded result.
pub struct PostProcessor {
    decoder: ImageDecoder,
    validator: Validator,
    settings: TransformSettings,
    workers: usize,
    sequence_timeout: Duration,
}

impl PostProcessor {
    /// Create a new post-processor with the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            decoder: ImageDecoder::new(config.limits.clone(), config.processing.clone()),
            validator: Validator::new(config.limits.clone()),
            settings: TransformSettings::from_config(config),
            workers: config.processing.parallel_workers,
            sequence_timeout: config.sequence_timeout(),
        }
    }

    /// Process a single raster on the calling task and write it to `sink`.
    pub fn process_image<W: Write>(
        &self,
        image: DynamicImage,
        ops: &OperationList,
        context: &SourceContext,
        sink: &mut W,
    ) -> PipelineResult<ProcessingStats> {
        let start = Instant::now();
        self.validator.validate(ops, &context.info, 1)?;
        let writer = ImageWriter::for_operations(ops, &context.metadata)?;

        let pipeline = FramePipeline::new(Arc::new(ops.clone()), context, self.settings.clone());
        let image = pipeline.process(image)?;
        let transform_time = start.elapsed();
        tracing::trace!("  Transform: {:?}", transform_time);

        let bytes_written = writer.write(&image, sink)?;
        tracing::trace!("  Encode: {:?}", start.elapsed() - transform_time);

        let stats = ProcessingStats {
            frames: 1,
            workers: 0,
            output_width: image.width(),
            output_height: image.height(),
            format: writer.format().to_string(),
            bytes_written,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        tracing::debug!(
            "Processed {}x{} -> {}x{} {} in {}ms",
            context.info.size.width,
            context.info.size.height,
            stats.output_width,
            stats.output_height,
            stats.format,
            stats.elapsed_ms
        );
        Ok(stats)
    }

    /// Process every frame of a sequence and write them to `sink`.
    ///
    /// A one-frame sequence runs on the calling task; longer ones are
    /// partitioned across blocking workers and joined under the configured
    /// sequence timeout. Any frame failing fails the whole request.
    pub async fn process_sequence<W: Write>(
        &self,
        frames: FrameSequence,
        ops: &OperationList,
        context: &SourceContext,
        sink: &mut W,
    ) -> PipelineResult<ProcessingStats> {
        let start = Instant::now();
        if frames.is_empty() {
            return Err(PipelineError::InvalidInput("Empty sequence".to_string()));
        }
        let total = frames.len();
        self.validator.validate(ops, &context.info, total)?;
        let writer = ImageWriter::for_operations(ops, &context.metadata)?;

        let pipeline = FramePipeline::new(Arc::new(ops.clone()), context, self.settings.clone());
        let done = run_partitioned(
            frames.into_frames(),
            self.workers,
            self.sequence_timeout,
            move |_, frame: Frame| {
                let image = pipeline.process(frame.image)?;
                Ok(Frame::with_delay(image, frame.delay))
            },
        )
        .await?;
        let transform_time = start.elapsed();
        tracing::trace!("  Transform {} frame(s): {:?}", total, transform_time);

        let frames = FrameSequence::new(done.items);
        let bytes_written = writer.write_sequence(&frames, sink)?;
        tracing::trace!("  Encode: {:?}", start.elapsed() - transform_time);

        let output = frames
            .first()
            .map(Frame::dimensions)
            .unwrap_or_default();
        let stats = ProcessingStats {
            frames: total,
            workers: done.workers,
            output_width: output.width,
            output_height: output.height,
            format: writer.format().to_string(),
            bytes_written,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        tracing::debug!(
            "Processed {} frame(s) on {} worker(s) -> {}x{} {} in {}ms",
            stats.frames,
            stats.workers,
            stats.output_width,
            stats.output_height,
            stats.format,
            stats.elapsed_ms
        );
        Ok(stats)
    }

    /// Process whatever the reference decoder produced.
    pub async fn process_decoded<W: Write>(
        &self,
        decoded: DecodedSource,
        ops: &OperationList,
        sink: &mut W,
    ) -> PipelineResult<ProcessingStats> {
        let (frames, context) = decoded.into_parts();
        if frames.len() == 1 {
            let frame = frames
                .into_frames()
                .into_iter()
                .next()
                .ok_or_else(|| PipelineError::InvalidInput("Empty sequence".to_string()))?;
            self.process_image(frame.image, ops, &context, sink)
        } else {
            self.process_sequence(frames, ops, &context, sink).await
        }
    }

    /// Decode `path`, process it and write the encoded output to `sink`.
    pub async fn process_file<W: Write>(
        &self,
        path: &Path,
        ops: &OperationList,
        sink: &mut W,
    ) -> PipelineResult<ProcessingStats> {
        tracing::debug!("Processing: {:?}", path);
        let decode_start = Instant::now();
        let decoded = self.decoder.decode(path, ops).await?;
        tracing::trace!("  Decode: {:?}", decode_start.elapsed());
        self.process_decoded(decoded, ops, sink).await
    }
}
