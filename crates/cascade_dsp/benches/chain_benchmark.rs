//! Performance benchmarks for the DSP module
//!
//! Run with: cargo bench -p cascade_dsp

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use cascade_dsp::{AudioEffect, DeEsser, Limiter, NoiseGate, ThreeBandEQ};

const SAMPLE_RATE: f32 = 48000.0;

fn test_signal(len: usize) -> Vec<f32> {
    (0..len).map(|i| (i as f32 * 0.001).sin() * 0.5).collect()
}

fn benchmark_noise_gate(c: &mut Criterion) {
    let mut group = c.benchmark_group("noise_gate");

    for size in [256, 1024, 2048] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("process_{}_samples", size), |b| {
            let mut gate = NoiseGate::new(SAMPLE_RATE, 1024, 0.05, 5.0, 50.0);
            gate.params().set_enabled(true);
            let input = test_signal(size);
            let mut output = vec![0.0; size];

            b.iter(|| {
                gate.process(black_box(&input), black_box(&mut output));
            });
        });
    }

    group.finish();
}

fn benchmark_eq(c: &mut Criterion) {
    let mut group = c.benchmark_group("three_band_eq");

    for hop in [256, 512, 1024] {
        group.throughput(Throughput::Elements(hop as u64));
        group.bench_function(format!("process_{}_hop", hop), |b| {
            let mut eq = ThreeBandEQ::new(SAMPLE_RATE, hop);
            eq.params().set_enabled(true);
            eq.params().set_band_gain(0, 1.5).unwrap();
            eq.params().set_band_gain(2, 0.8).unwrap();
            let input = test_signal(hop);
            let mut output = vec![0.0; hop];

            b.iter(|| {
                eq.process(black_box(&input), black_box(&mut output));
            });
        });
    }

    group.finish();
}

fn benchmark_de_esser(c: &mut Criterion) {
    c.bench_function("de_esser_one_block", |b| {
        let mut de_esser = DeEsser::new(SAMPLE_RATE);
        de_esser.params().set_enabled(true);
        let input = test_signal(cascade_dsp::DE_ESSER_FRAME_SIZE);
        let mut output = vec![0.0; input.len()];

        b.iter(|| {
            de_esser.process(black_box(&input), black_box(&mut output));
        });
    });
}

fn benchmark_limiter(c: &mut Criterion) {
    c.bench_function("limiter_1024_samples", |b| {
        let mut limiter = Limiter::new(SAMPLE_RATE, 0.5, 5.0, 100.0);
        limiter.params().set_enabled(true);
        let input = test_signal(1024);
        let mut output = vec![0.0; 1024];

        b.iter(|| {
            limiter.process(black_box(&input), black_box(&mut output));
        });
    });
}

fn benchmark_parameter_update(c: &mut Criterion) {
    c.bench_function("gate_set_attack_ms", |b| {
        let gate = NoiseGate::with_defaults(SAMPLE_RATE);
        let params = gate.params();
        let mut ms = 1.0_f32;

        b.iter(|| {
            // Simulate dragging a slider: coefficient re-derivation included
            params.set_attack_ms(black_box(ms));
            ms = (ms + 0.5) % 100.0;
        });
    });
}

criterion_group!(
    benches,
    benchmark_noise_gate,
    benchmark_eq,
    benchmark_de_esser,
    benchmark_limiter,
    benchmark_parameter_update
);
criterion_main!(benches);
