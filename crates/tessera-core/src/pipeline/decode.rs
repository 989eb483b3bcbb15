//! Reference decode collaborator: encoded bytes to frames, source info and
//! metadata, with optional decode-time reduction and a timeout.

use image::codecs::gif::GifDecoder;
use image::imageops::FilterType;
use image::{AnimationDecoder, DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::{LimitsConfig, ProcessingConfig};
use crate::error::PipelineError;
use crate::operation::{OperationList, ReductionFactor};
use crate::types::{Dimensions, Info};

use super::frame::{Frame, FrameSequence};
use super::metadata::{MetadataExtractor, SourceMetadata};
use super::orientation::transform_region;

/// Image decoder with configurable limits, reduction and timeout.
pub struct ImageDecoder {
    limits: LimitsConfig,
    processing: ProcessingConfig,
}

/// Result of decoding a source.
#[derive(Debug)]
pub struct DecodedSource {
    /// Decoded frames; one for still images
    pub frames: FrameSequence,
    /// Full source size and embedded orientation
    pub info: Info,
    /// Raw EXIF/XMP for metadata copy
    pub metadata: SourceMetadata,
    /// Reduction already applied to the frames
    pub reduction_factor: ReductionFactor,
    /// Detected source format
    pub format: ImageFormat,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig, processing: ProcessingConfig) -> Self {
        Self { limits, processing }
    }

    /// Decode an image file.
    ///
    /// `ops` lets the decoder pick a reduction factor: a still source is
    /// shrunk by the largest power of two the requested output still
    /// allows. Animated sources are never reduced.
    pub async fn decode(
        &self,
        path: &Path,
        ops: &OperationList,
    ) -> Result<DecodedSource, PipelineError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            PipelineError::CodecFailure(format!("Cannot read {}: {}", path.display(), e))
        })?;
        self.decode_from_bytes(bytes, path, ops).await
    }

    /// Decode an image from an in-memory byte buffer with validation and timeout.
    pub async fn decode_from_bytes(
        &self,
        bytes: Vec<u8>,
        path: &Path,
        ops: &OperationList,
    ) -> Result<DecodedSource, PipelineError> {
        let path_owned = path.to_path_buf();
        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);
        let max_factor = if self.processing.decode_reduction {
            self.processing.max_reduction_factor
        } else {
            0
        };
        let ops = ops.clone();

        let decode_result = timeout(timeout_duration, async {
            tokio::task::spawn_blocking(move || {
                Self::decode_bytes_sync(bytes, &path_owned, &ops, max_factor)
            })
            .await
        })
        .await;

        match decode_result {
            Ok(Ok(Ok(decoded))) => {
                let size = decoded.info.size;
                if size.width > self.limits.max_image_dimension
                    || size.height > self.limits.max_image_dimension
                {
                    return Err(PipelineError::InvalidInput(format!(
                        "{} is {size}, larger than the {} pixel limit",
                        path.display(),
                        self.limits.max_image_dimension
                    )));
                }
                Ok(decoded)
            }
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(e)) => Err(PipelineError::CodecFailure(format!(
                "Task join error: {}",
                e
            ))),
            Err(_) => Err(PipelineError::CodecFailure(format!(
                "Decoding {} timed out after {}ms",
                path.display(),
                self.limits.decode_timeout_ms
            ))),
        }
    }

    /// Source size and orientation without decoding any pixels.
    ///
    /// Lets a caller holding upright coordinates re-express them against
    /// the raw source before building its operation list.
    pub fn probe(bytes: &[u8]) -> Result<Info, PipelineError> {
        let size = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| {
                PipelineError::CodecFailure(format!("Cannot detect image format: {}", e))
            })?
            .into_dimensions()?;
        let orientation = MetadataExtractor::extract(bytes).orientation();
        Ok(Info::new(Dimensions::new(size.0, size.1)).with_orientation(orientation))
    }

    /// Synchronous decode from bytes (runs in spawn_blocking).
    fn decode_bytes_sync(
        bytes: Vec<u8>,
        path: &Path,
        ops: &OperationList,
        max_factor: u8,
    ) -> Result<DecodedSource, PipelineError> {
        let metadata = MetadataExtractor::extract(&bytes);
        let reader = image::ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| {
                PipelineError::CodecFailure(format!("Cannot detect image format: {}", e))
            })?;
        let format = match reader.format() {
            Some(f) => f,
            None => ImageFormat::from_path(path).map_err(|_| {
                PipelineError::UnsupportedOperation(format!(
                    "Unrecognized image format: {}",
                    path.display()
                ))
            })?,
        };

        let frames = if format == ImageFormat::Gif {
            Self::decode_gif(&bytes)?
        } else {
            FrameSequence::single(reader.decode()?)
        };
        let first = frames
            .first()
            .ok_or_else(|| PipelineError::CodecFailure("Source has no frames".to_string()))?;
        let size = first.dimensions();
        let info = Info::new(size).with_orientation(metadata.orientation());

        let (frames, reduction_factor) = if frames.len() == 1 && max_factor > 0 {
            let rf = Self::reduction_for(ops, info, max_factor);
            (Self::reduce(frames, rf), rf)
        } else {
            (frames, ReductionFactor::default())
        };
        tracing::trace!(
            "Decoded {} frame(s) of {} {:?} (reduction factor {})",
            frames.len(),
            size,
            format,
            reduction_factor.factor()
        );

        Ok(DecodedSource {
            frames,
            info,
            metadata,
            reduction_factor,
            format,
        })
    }

    fn decode_gif(bytes: &[u8]) -> Result<FrameSequence, PipelineError> {
        let decoder = GifDecoder::new(Cursor::new(bytes))?;
        let frames = decoder
            .into_frames()
            .collect_frames()?
            .into_iter()
            .map(|frame| {
                let delay = frame.delay();
                Frame::with_delay(DynamicImage::ImageRgba8(frame.into_buffer()), delay)
            })
            .collect::<Vec<_>>();
        Ok(FrameSequence::new(frames))
    }

    /// Largest reduction the requested output tolerates.
    ///
    /// The scale is measured against the region the transform stage will
    /// resample, which is upright whenever orientation correction runs.
    pub fn reduction_for(ops: &OperationList, info: Info, max_factor: u8) -> ReductionFactor {
        let sc = ops.scale_constraint();
        let scale = match ops.scale() {
            Some(scale) => {
                scale.resulting_scale(transform_region(info.orientation, ops, info.size), sc)
            }
            None => sc.ratio(),
        };
        ReductionFactor::for_scale(scale, max_factor)
    }

    fn reduce(frames: FrameSequence, rf: ReductionFactor) -> FrameSequence {
        if rf.factor() == 0 {
            return frames;
        }
        frames
            .into_iter()
            .map(|frame| {
                let width = rf.reduce_length(frame.image.width());
                let height = rf.reduce_length(frame.image.height());
                let image = frame.image.resize_exact(width, height, FilterType::Triangle);
                Frame::with_delay(image, frame.delay)
            })
            .collect::<Vec<_>>()
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{Crop, Scale, ScaleMode};
    use crate::types::Orientation;
    use image::codecs::gif::{GifEncoder, Repeat};
    use image::{Delay, RgbImage, Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn decoder() -> ImageDecoder {
        ImageDecoder::new(LimitsConfig::default(), ProcessingConfig::default())
    }

    #[test]
    fn test_probe_reads_size_without_decoding() {
        let info = ImageDecoder::probe(&png_bytes(30, 12)).unwrap();
        assert_eq!(info.size, Dimensions::new(30, 12));
        assert_eq!(info.orientation, Orientation::Rotate0);
        assert!(ImageDecoder::probe(b"nope").is_err());
    }

    #[test]
    fn test_reduction_for_scale_request() {
        let full = Info::new(Dimensions::new(1000, 1000));
        let half = OperationList::default().with(Scale::percent(0.5));
        assert_eq!(ImageDecoder::reduction_for(&half, full, 5).factor(), 1);

        // A small crop shown at full size allows no reduction
        let cropped = OperationList::default()
            .with(Crop::pixels(0.0, 0.0, 100.0, 100.0))
            .with(Scale::new(ScaleMode::ByWidth(100)));
        assert_eq!(ImageDecoder::reduction_for(&cropped, full, 5).factor(), 0);

        assert_eq!(ImageDecoder::reduction_for(&half, full, 0).factor(), 0);
    }

    #[test]
    fn test_reduction_for_rotated_source_uses_upright_width() {
        // 1000x500 raw is 500 wide once turned upright
        let info = Info::new(Dimensions::new(1000, 500)).with_orientation(Orientation::Rotate90);
        let full_width = OperationList::default().with(Scale::new(ScaleMode::ByWidth(500)));
        assert_eq!(ImageDecoder::reduction_for(&full_width, info, 5).factor(), 0);

        let quarter = OperationList::default().with(Scale::new(ScaleMode::ByWidth(125)));
        assert_eq!(ImageDecoder::reduction_for(&quarter, info, 5).factor(), 2);

        // Without the embedded turn the same request is half of the raw width
        let upright = Info::new(Dimensions::new(1000, 500));
        assert_eq!(ImageDecoder::reduction_for(&full_width, upright, 5).factor(), 1);
    }

    #[tokio::test]
    async fn test_decode_reduces_still_image() {
        let ops = OperationList::default().with(Scale::percent(0.5));
        let decoded = decoder()
            .decode_from_bytes(png_bytes(64, 40), Path::new("source.png"), &ops)
            .await
            .unwrap();
        assert_eq!(decoded.info.size, Dimensions::new(64, 40));
        assert_eq!(decoded.reduction_factor.factor(), 1);
        assert_eq!(decoded.frames.first().unwrap().dimensions(), Dimensions::new(32, 20));
        assert_eq!(decoded.format, ImageFormat::Png);
    }

    #[tokio::test]
    async fn test_decode_without_reduction() {
        let processing = ProcessingConfig {
            decode_reduction: false,
            ..ProcessingConfig::default()
        };
        let ops = OperationList::default().with(Scale::percent(0.5));
        let decoded = ImageDecoder::new(LimitsConfig::default(), processing)
            .decode_from_bytes(png_bytes(64, 40), Path::new("source.png"), &ops)
            .await
            .unwrap();
        assert_eq!(decoded.reduction_factor.factor(), 0);
        assert_eq!(decoded.frames.first().unwrap().dimensions(), Dimensions::new(64, 40));
    }

    #[tokio::test]
    async fn test_decode_gif_frames_with_delays() {
        let mut buf = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut buf);
            encoder.set_repeat(Repeat::Infinite).unwrap();
            let frames = (0..3).map(|i| {
                image::Frame::from_parts(
                    RgbaImage::from_pixel(8, 6, Rgba([i * 50, 0, 0, 255])),
                    0,
                    0,
                    Delay::from_numer_denom_ms(100, 1),
                )
            });
            encoder.encode_frames(frames).unwrap();
        }

        let decoded = decoder()
            .decode_from_bytes(buf, Path::new("anim.gif"), &OperationList::default())
            .await
            .unwrap();
        assert_eq!(decoded.frames.len(), 3);
        assert_eq!(decoded.info.size, Dimensions::new(8, 6));
        assert_eq!(
            decoded.frames.get(1).unwrap().delay.numer_denom_ms(),
            (100, 1)
        );
    }

    #[tokio::test]
    async fn test_oversized_source_rejected() {
        let limits = LimitsConfig {
            max_image_dimension: 16,
            ..LimitsConfig::default()
        };
        let result = ImageDecoder::new(limits, ProcessingConfig::default())
            .decode_from_bytes(png_bytes(32, 8), Path::new("big.png"), &OperationList::default())
            .await;
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_garbage_is_codec_failure() {
        let result = decoder()
            .decode_from_bytes(vec![0u8; 32], Path::new("noise.png"), &OperationList::default())
            .await;
        assert!(matches!(result, Err(PipelineError::CodecFailure(_))));
    }
}
