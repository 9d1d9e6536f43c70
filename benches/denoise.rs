//! Benchmarks for the denoising pipeline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use denoise_rs::audio::resample;
use denoise_rs::{overlay, AudioBlock, DenoiseSession, SpectralSubtractor, Stft, SubtractionParams};

fn generate_audio(sample_rate: u32, duration_secs: f32) -> Vec<f32> {
    let num_samples = (sample_rate as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            // Mix of frequencies to simulate speech
            0.3 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
                + 0.2 * (2.0 * std::f32::consts::PI * 880.0 * t).sin()
                + 0.1 * (2.0 * std::f32::consts::PI * 1760.0 * t).sin()
        })
        .collect()
}

fn bench_stft(c: &mut Criterion) {
    let mut group = c.benchmark_group("stft");

    for n_fft in [512, 1024, 2048] {
        let stft = Stft::new(n_fft, n_fft / 4).unwrap();
        let frame = generate_audio(16000, n_fft as f32 / 16000.0);

        group.bench_with_input(BenchmarkId::new("forward_inverse", n_fft), &frame, |b, frame| {
            b.iter(|| {
                let spec = stft.forward(black_box(frame));
                black_box(stft.inverse(&spec, None).unwrap())
            })
        });
    }

    group.finish();
}

fn bench_subtractor(c: &mut Criterion) {
    let mut group = c.benchmark_group("spectral_subtraction");

    let subtractor = SpectralSubtractor::new(SubtractionParams::default()).unwrap();
    let frame = generate_audio(16000, 2048.0 / 16000.0);

    group.bench_function("frame_2048", |b| {
        b.iter(|| black_box(subtractor.process(black_box(&frame)).unwrap()))
    });

    group.finish();
}

fn bench_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");

    let audio = generate_audio(16000, 1.0);
    let blocks: Vec<AudioBlock> = audio
        .chunks(1024)
        .enumerate()
        .map(|(i, chunk)| AudioBlock::new(i as u64, chunk.to_vec()))
        .collect();

    group.bench_function("one_second_16k", |b| {
        b.iter_with_setup(
            || {
                let mut session = DenoiseSession::new(SubtractionParams::default(), 16000).unwrap();
                session.start().unwrap();
                session
            },
            |mut session| {
                for block in &blocks {
                    black_box(session.process_block(block).unwrap());
                }
                session
            },
        )
    });

    group.finish();
}

fn bench_overlay(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlay");

    let clean = generate_audio(16000, 5.0);
    let noise = generate_audio(16000, 2.0);

    group.bench_function("5s_clean_2s_noise", |b| {
        b.iter(|| black_box(overlay(&clean, &noise, 10.0).unwrap()))
    });

    let noise_44k = generate_audio(44100, 2.0);
    group.bench_function("resample_noise_44k_to_16k", |b| {
        b.iter(|| black_box(resample(&noise_44k, 44100, 16000).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_stft, bench_subtractor, bench_session, bench_overlay);
criterion_main!(benches);
