//! Encoder dispatch: pick an encoder from the list's Encode operation and
//! write finished frames to the caller's sink.

use image::codecs::gif::{GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::{Cursor, Write};

use crate::error::{PipelineError, PipelineResult};
use crate::operation::{Encode, OperationList, OutputFormat};
use crate::types::Color;

use super::frame::FrameSequence;
use super::metadata::{embed_in_jpeg, embed_in_png, SourceMetadata};

/// Writes encoded output for one request.
///
/// Output is fully encoded in memory and handed to the sink with a single
/// `write_all`. The sink's lifecycle belongs to the caller: it is never
/// flushed or closed here.
#[derive(Debug, Clone)]
pub struct ImageWriter {
    encode: Encode,
    metadata: Option<SourceMetadata>,
}

impl ImageWriter {
    pub fn new(encode: Encode) -> Self {
        Self {
            encode,
            metadata: None,
        }
    }

    /// Writer for the list's first Encode operation, carrying `metadata`
    /// when the list asks for a metadata copy.
    pub fn for_operations(ops: &OperationList, metadata: &SourceMetadata) -> PipelineResult<Self> {
        let encode = ops.encode().ok_or_else(|| {
            PipelineError::InvalidInput("Operation list has no Encode operation".to_string())
        })?;
        let writer = Self::new(*encode);
        Ok(if ops.metadata_copy().is_some() {
            writer.with_metadata(metadata)
        } else {
            writer
        })
    }

    /// Embed `metadata` in the output. Its orientation is reset, since the
    /// frames have already been turned upright.
    pub fn with_metadata(mut self, metadata: &SourceMetadata) -> Self {
        if !metadata.is_empty() {
            self.metadata = Some(metadata.normalized());
        }
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.encode.format
    }

    /// Encode a single raster and write it to `sink`. Returns bytes written.
    pub fn write<W: Write>(&self, image: &DynamicImage, sink: &mut W) -> PipelineResult<u64> {
        let bytes = self.encode_image(image)?;
        self.finish(bytes, sink)
    }

    /// Encode a frame sequence and write it to `sink`. Returns bytes written.
    pub fn write_sequence<W: Write>(
        &self,
        frames: &FrameSequence,
        sink: &mut W,
    ) -> PipelineResult<u64> {
        let bytes = match frames.len() {
            0 => return Err(PipelineError::InvalidInput("Empty sequence".to_string())),
            1 => match frames.first() {
                Some(frame) if self.encode.format != OutputFormat::Gif => {
                    self.encode_image(&frame.image)?
                }
                _ => self.encode_gif(frames)?,
            },
            n if !self.encode.format.supports_animation() => {
                return Err(PipelineError::UnsupportedOperation(format!(
                    "{} cannot hold {} frames",
                    self.encode.format, n
                )))
            }
            _ => self.encode_gif(frames)?,
        };
        self.finish(bytes, sink)
    }

    fn finish<W: Write>(&self, bytes: Vec<u8>, sink: &mut W) -> PipelineResult<u64> {
        let bytes = self.embed_metadata(bytes);
        sink.write_all(&bytes)?;
        Ok(bytes.len() as u64)
    }

    fn embed_metadata(&self, bytes: Vec<u8>) -> Vec<u8> {
        let Some(metadata) = &self.metadata else {
            return bytes;
        };
        match self.encode.format {
            OutputFormat::Jpeg => embed_in_jpeg(bytes, metadata),
            OutputFormat::Png => embed_in_png(bytes, metadata),
            other => {
                tracing::warn!("Metadata copy is not supported for {}, writing without it", other);
                bytes
            }
        }
    }

    /// Encode one raster in the configured format.
    pub fn encode_image(&self, image: &DynamicImage) -> PipelineResult<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        match self.encode.format {
            OutputFormat::Jpeg => {
                let flat = flatten(image, self.encode.background);
                JpegEncoder::new_with_quality(&mut buf, self.encode.quality).encode_image(&flat)?;
            }
            OutputFormat::Png => image.write_to(&mut buf, ImageFormat::Png)?,
            OutputFormat::Gif => return self.encode_gif(&FrameSequence::single(image.clone())),
            OutputFormat::Webp | OutputFormat::Tiff => {
                let converted = if image.color().has_alpha() {
                    DynamicImage::ImageRgba8(image.to_rgba8())
                } else {
                    DynamicImage::ImageRgb8(image.to_rgb8())
                };
                converted.write_to(&mut buf, self.encode.format.image_format())?;
            }
        }
        Ok(buf.into_inner())
    }

    fn encode_gif(&self, frames: &FrameSequence) -> PipelineResult<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut buf);
            if frames.len() > 1 {
                encoder.set_repeat(Repeat::Infinite)?;
            }
            let frames = frames
                .iter()
                .map(|frame| image::Frame::from_parts(frame.image.to_rgba8(), 0, 0, frame.delay));
            encoder.encode_frames(frames)?;
        }
        Ok(buf)
    }
}

/// Composite any alpha onto `background`, producing an opaque raster. Gray
/// rasters without alpha pass through as gray.
fn flatten(image: &DynamicImage, background: Color) -> DynamicImage {
    if !image.color().has_alpha() {
        return match image {
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => image.clone(),
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        };
    }
    let rgba = image.to_rgba8();
    let bg = [background.r as u32, background.g as u32, background.b as u32];
    let flat = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = a as u32;
        let mix = |c: u8, bg: u32| ((c as u32 * a + bg * (255 - a) + 127) / 255) as u8;
        image::Rgb([mix(r, bg[0]), mix(g, bg[1]), mix(b, bg[2])])
    });
    DynamicImage::ImageRgb8(flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::MetadataCopy;
    use crate::pipeline::frame::Frame;
    use crate::pipeline::metadata::{tests::exif_with_orientation, MetadataExtractor};
    use crate::types::Orientation;
    use image::{Delay, GenericImageView, Rgba, RgbaImage};
    use std::io;

    fn rgba(width: u32, height: u32, pixel: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(pixel)))
    }

    /// Sink that records how it was used.
    #[derive(Default)]
    struct RecordingSink {
        data: Vec<u8>,
        flushes: usize,
    }

    impl Write for RecordingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_every_format_round_trips() {
        let image = rgba(6, 4, [10, 200, 30, 255]);
        for format in [
            OutputFormat::Jpeg,
            OutputFormat::Png,
            OutputFormat::Gif,
            OutputFormat::Webp,
            OutputFormat::Tiff,
        ] {
            let bytes = ImageWriter::new(Encode::new(format)).encode_image(&image).unwrap();
            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!(decoded.dimensions(), (6, 4), "{format}");
        }
    }

    #[test]
    fn test_jpeg_flattens_onto_background() {
        let encode = Encode::new(OutputFormat::Jpeg)
            .with_quality(100)
            .with_background(Color::new(255, 0, 0));
        let bytes = ImageWriter::new(encode)
            .encode_image(&rgba(8, 8, [0, 0, 0, 0]))
            .unwrap();
        let pixel = image::load_from_memory(&bytes).unwrap().to_rgb8().get_pixel(4, 4).0;
        assert!(pixel[0] > 240 && pixel[1] < 20 && pixel[2] < 20, "{pixel:?}");
    }

    #[test]
    fn test_write_does_not_flush_sink() {
        let mut sink = RecordingSink::default();
        let written = ImageWriter::new(Encode::new(OutputFormat::Png))
            .write(&rgba(2, 2, [1, 2, 3, 255]), &mut sink)
            .unwrap();
        assert_eq!(written as usize, sink.data.len());
        assert_eq!(sink.flushes, 0);
    }

    #[test]
    fn test_sink_failure_is_codec_failure() {
        let err = ImageWriter::new(Encode::new(OutputFormat::Png))
            .write(&rgba(2, 2, [1, 2, 3, 255]), &mut BrokenSink)
            .unwrap_err();
        assert!(matches!(err, PipelineError::CodecFailure(_)));
    }

    #[test]
    fn test_animated_gif_keeps_frames() {
        let frames = FrameSequence::new(
            (0..4)
                .map(|i| {
                    Frame::with_delay(
                        rgba(5, 5, [i * 60, 0, 0, 255]),
                        Delay::from_numer_denom_ms(80, 1),
                    )
                })
                .collect(),
        );
        let mut sink = Vec::new();
        ImageWriter::new(Encode::new(OutputFormat::Gif))
            .write_sequence(&frames, &mut sink)
            .unwrap();

        let decoder = image::codecs::gif::GifDecoder::new(Cursor::new(sink)).unwrap();
        use image::AnimationDecoder;
        let decoded = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(decoded.len(), 4);
    }

    #[test]
    fn test_sequence_into_still_format_is_unsupported() {
        let frames = FrameSequence::new(vec![
            Frame::new(rgba(2, 2, [0, 0, 0, 255])),
            Frame::new(rgba(2, 2, [0, 0, 0, 255])),
        ]);
        let err = ImageWriter::new(Encode::new(OutputFormat::Png))
            .write_sequence(&frames, &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedOperation(_)));
    }

    #[test]
    fn test_metadata_only_with_metadata_copy() {
        let metadata = SourceMetadata {
            exif: Some(exif_with_orientation(6)),
            xmp: None,
        };
        let image = rgba(4, 4, [9, 9, 9, 255]);

        let plain = OperationList::default().with(Encode::new(OutputFormat::Jpeg));
        let mut out = Vec::new();
        ImageWriter::for_operations(&plain, &metadata)
            .unwrap()
            .write(&image, &mut out)
            .unwrap();
        assert!(MetadataExtractor::extract(&out).exif.is_none());

        let copying = plain.clone().with(MetadataCopy);
        let mut out = Vec::new();
        ImageWriter::for_operations(&copying, &metadata)
            .unwrap()
            .write(&image, &mut out)
            .unwrap();
        let carried = MetadataExtractor::extract(&out);
        assert!(carried.exif.is_some());
        assert_eq!(carried.orientation(), Orientation::Rotate0);
    }
}
