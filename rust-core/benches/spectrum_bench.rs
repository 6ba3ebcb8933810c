//! Performance benchmarks for the analysis hot path

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use live_spectrum::spectrum::{Analyzer, FftEngine, Window};
use live_spectrum::RollingBuffer;

fn tone(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / 48000.0).sin() * 0.5)
        .collect()
}

fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");
    for size in [512usize, 2048, 8192] {
        let frame = tone(size);
        let mut engine = FftEngine::new(size, 48000.0, Window::Hanning);
        group.bench_with_input(BenchmarkId::from_parameter(size), &frame, |b, frame| {
            b.iter(|| {
                let _ = engine.transform(black_box(frame)).nyquist;
            });
        });
    }
    group.finish();
}

fn bench_descriptors(c: &mut Criterion) {
    let frame = tone(2048);
    let mut analyzer = Analyzer::new(2048, 48000.0, Window::Hanning);
    analyzer.process(&frame);

    c.bench_function("descriptors_2048", |b| {
        b.iter(|| black_box(analyzer.descriptors()));
    });
}

fn bench_rolling_add(c: &mut Criterion) {
    let samples = tone(48000);
    let mut buffer = RollingBuffer::new(1000, true);

    c.bench_function("rolling_add_1s", |b| {
        b.iter(|| buffer.extend_from_slice(black_box(&samples)));
    });
}

criterion_group!(benches, bench_transform, bench_descriptors, bench_rolling_add);
criterion_main!(benches);
