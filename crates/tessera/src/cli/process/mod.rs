//! The `tessera process` command: decode a file, build an operation list
//! from flags, run the pipeline and write the encoded derivative.

mod parse;
pub mod types;

pub use types::ColorArg;

use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tessera_core::operation::{
    load_font, ColorTransform, Crop, Encode, MetadataCopy, OperationList, OutputFormat, Overlay,
    Position, Redaction, Rotate, Scale, ScaleConstraint, ScaleMode, Sharpen, TextOverlay,
    Transpose,
};
use tessera_core::pipeline::ImageDecoder;
use tessera_core::types::Rect;
use tessera_core::{Config, Info, PostProcessor};

use parse::{parse_rect, parse_region, parse_scale_constraint, parse_size};

/// Arguments for the `process` command.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Source image file
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output file; its extension picks the format unless --format is given
    #[arg(short, long)]
    pub output: PathBuf,

    /// Region in upright coordinates: full, square, x,y,w,h or pct:x,y,w,h
    #[arg(long, value_parser = parse_region)]
    pub region: Option<Crop>,

    /// Output size: full, max, w, | ,h | pct:n | w,h | !w,h
    #[arg(long, value_parser = parse_size)]
    pub size: Option<ScaleMode>,

    /// Clockwise rotation in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub rotate: Option<f64>,

    /// Mirror left to right
    #[arg(long)]
    pub mirror: bool,

    /// Flip top to bottom
    #[arg(long)]
    pub flip: bool,

    /// Color reduction
    #[arg(long, value_enum)]
    pub color: Option<ColorArg>,

    /// Unsharp mask strength (blur sigma)
    #[arg(long)]
    pub sharpen: Option<f64>,

    /// Black out x,y,w,h in source pixels (repeatable)
    #[arg(long = "redact", value_parser = parse_rect)]
    pub redactions: Vec<Rect>,

    /// Image to composite as a watermark
    #[arg(long)]
    pub watermark: Option<PathBuf>,

    /// Text to draw as a watermark
    #[arg(long)]
    pub watermark_text: Option<String>,

    /// Font for --watermark-text (overrides the configured font)
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Watermark anchor (top-left ... bottom-right, center, repeat)
    #[arg(long, default_value = "bottom-right")]
    pub position: Position,

    /// Carry EXIF/XMP over into the output
    #[arg(long)]
    pub copy_metadata: bool,

    /// Output format: jpg, png, gif, webp, tif
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// JPEG quality
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Maximum output scale as n:d (e.g. 1:2)
    #[arg(long, value_parser = parse_scale_constraint)]
    pub scale_constraint: Option<ScaleConstraint>,

    /// Number of parallel workers for animated sources
    #[arg(short, long)]
    pub parallel: Option<usize>,
}

/// Execute the process command.
pub async fn execute(args: ProcessArgs) -> anyhow::Result<()> {
    if !args.input.is_file() {
        anyhow::bail!(
            "Input file does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            args.input
        );
    }

    let mut config = Config::load()?;
    if let Some(parallel) = args.parallel {
        if parallel == 0 {
            anyhow::bail!("--parallel must be at least 1");
        }
        config.processing.parallel_workers = parallel;
    }

    let bytes = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("Cannot read {:?}", args.input))?;
    let info = ImageDecoder::probe(&bytes)?;
    let ops = build_operations(&args, &config, info)?;
    tracing::debug!("Operation list: {:?}", ops);

    let decoder = ImageDecoder::new(config.limits.clone(), config.processing.clone());
    let decoded = decoder.decode_from_bytes(bytes, &args.input, &ops).await?;

    // Encode into memory first so a failed request leaves no partial file.
    let mut encoded = Vec::new();
    let stats = PostProcessor::new(&config)
        .process_decoded(decoded, &ops, &mut encoded)
        .await?;
    std::fs::write(&args.output, &encoded)
        .with_context(|| format!("Cannot write {:?}", args.output))?;

    tracing::info!(
        "Wrote {} ({}x{}, {} bytes) in {}ms",
        args.output.display(),
        stats.output_width,
        stats.output_height,
        stats.bytes_written,
        stats.elapsed_ms
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

/// Turn flags into an operation list for a source described by `info`.
///
/// The region is given in upright coordinates and re-expressed against the
/// raw source, which is what the crop stage expects.
fn build_operations(args: &ProcessArgs, config: &Config, info: Info) -> anyhow::Result<OperationList> {
    let format = match args.format {
        Some(format) => format,
        None => args
            .output
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(OutputFormat::from_extension)
            .with_context(|| {
                format!(
                    "Cannot tell the output format from {:?}; pass --format",
                    args.output
                )
            })?,
    };

    let sc = args.scale_constraint.unwrap_or_default();
    let mut ops = OperationList::default().with_scale_constraint(sc);

    if let Some(region) = args.region {
        ops = ops.with(region.oriented_to_source(info.orientation, info.size, sc));
    }
    for rect in &args.redactions {
        ops = ops.with(Redaction::new(rect.x, rect.y, rect.width, rect.height));
    }
    if let Some(mode) = args.size {
        ops = ops.with(Scale::new(mode));
    }
    if args.mirror {
        ops = ops.with(Transpose::Horizontal);
    }
    if args.flip {
        ops = ops.with(Transpose::Vertical);
    }
    if let Some(degrees) = args.rotate {
        ops = ops.with(Rotate::new(degrees));
    }
    if let Some(color) = args.color {
        ops = ops.with(ColorTransform::from(color));
    }
    if let Some(amount) = args.sharpen {
        ops = ops.with(Sharpen::new(amount));
    }
    if let Some(path) = &args.watermark {
        let path = expand(path);
        let mark = image::open(&path)
            .with_context(|| format!("Cannot load watermark {:?}", path))?
            .to_rgba8();
        ops = ops.with(Overlay::image(Arc::new(mark), args.position, config.overlay.inset));
    }
    if let Some(text) = &args.watermark_text {
        let font = match args.font.as_deref().map(expand).or_else(|| config.font_path()) {
            Some(path) => Some(load_font(&path)?),
            None => None,
        };
        let overlay = TextOverlay {
            text: text.clone(),
            font,
            size: config.overlay.font_size,
            color: config.overlay_color(),
            background: None,
        };
        ops = ops.with(Overlay::text(overlay, args.position, config.overlay.inset));
    }
    if args.copy_metadata {
        ops = ops.with(MetadataCopy);
    }

    let quality = args.quality.unwrap_or(config.encode.jpeg_quality);
    Ok(ops.with(
        Encode::new(format)
            .with_quality(quality)
            .with_background(config.background_color()),
    ))
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&path_str).into_owned())
}
