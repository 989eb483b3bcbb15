//! Benchmarks for the tessera post-processing pipeline.
//!
//! Run with: cargo bench -p tessera-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, Rgb, RgbImage};
use std::sync::Arc;
use tessera_core::operation::{
    Crop, Encode, OperationList, OutputFormat, Redaction, Rotate, Scale, ScaleMode,
};
use tessera_core::pipeline::{Frame, FramePipeline, FrameSequence, TransformSettings};
use tessera_core::{Config, Dimensions, Info, PostProcessor, SourceContext};

fn photo(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
}

fn thumbnail_ops() -> OperationList {
    OperationList::default()
        .with(Crop::pixels(200.0, 100.0, 1200.0, 900.0))
        .with(Redaction::new(300.0, 200.0, 100.0, 100.0))
        .with(Scale::new(ScaleMode::AspectFitInside {
            width: 400,
            height: 400,
        }))
        .with(Encode::new(OutputFormat::Jpeg))
}

fn benchmark_frame_pipeline(c: &mut Criterion) {
    let img = photo(1920, 1080);
    let context = SourceContext::new(Info::new(Dimensions::new(1920, 1080)));
    let pipeline = FramePipeline::new(
        Arc::new(thumbnail_ops()),
        &context,
        TransformSettings::default(),
    );

    c.bench_function("frame_crop_redact_scale", |b| {
        b.iter(|| {
            let _ = pipeline.process(black_box(img.clone()));
        })
    });
}

fn benchmark_arbitrary_rotate(c: &mut Criterion) {
    let img = photo(512, 512);
    let context = SourceContext::new(Info::new(Dimensions::new(512, 512)));
    let ops = OperationList::default()
        .with(Rotate::new(30.0))
        .with(Encode::new(OutputFormat::Png));
    let pipeline = FramePipeline::new(Arc::new(ops), &context, TransformSettings::default());

    c.bench_function("rotate_30_degrees", |b| {
        b.iter(|| {
            let _ = pipeline.process(black_box(img.clone()));
        })
    });
}

fn benchmark_single_image(c: &mut Criterion) {
    let img = photo(1920, 1080);
    let processor = PostProcessor::new(&Config::default());
    let ops = thumbnail_ops();
    let context = SourceContext::new(Info::new(Dimensions::new(1920, 1080)));

    c.bench_function("process_image_jpeg", |b| {
        b.iter(|| {
            let mut sink = std::io::sink();
            let _ = processor.process_image(black_box(img.clone()), &ops, &context, &mut sink);
        })
    });
}

fn benchmark_sequence(c: &mut Criterion) {
    let frames = FrameSequence::new((0..12).map(|_| Frame::new(photo(320, 240))).collect());
    let processor = PostProcessor::new(&Config::default());
    let ops = OperationList::default()
        .with(Scale::percent(0.5))
        .with(Encode::new(OutputFormat::Gif));
    let context = SourceContext::new(Info::new(Dimensions::new(320, 240)));
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("process_sequence_12_frames", |b| {
        b.iter(|| {
            let mut sink = std::io::sink();
            let _ = rt.block_on(processor.process_sequence(
                black_box(frames.clone()),
                &ops,
                &context,
                &mut sink,
            ));
        })
    });
}

criterion_group!(
    benches,
    benchmark_frame_pipeline,
    benchmark_arbitrary_rotate,
    benchmark_single_image,
    benchmark_sequence,
);
criterion_main!(benches);
