use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rvc_audio::AudioBuffer;
use rvc_pitch::{F0Config, PitchNormalization, align_and_quantize, extract_f0};

fn vowel(seconds: f32) -> AudioBuffer {
    let n = (seconds * 16000.0) as usize;
    let samples = (0..n)
        .map(|i| {
            let t = i as f32 / 16000.0;
            let f0 = 140.0 + 20.0 * (2.0 * std::f32::consts::PI * 0.5 * t).sin();
            (1..=4)
                .map(|h| 0.2 / h as f32 * (2.0 * std::f32::consts::PI * f0 * h as f32 * t).sin())
                .sum()
        })
        .collect();
    AudioBuffer::mono(samples, 16000).unwrap()
}

fn bench_extract_f0(c: &mut Criterion) {
    let audio = vowel(3.0);
    let cfg = F0Config::default();
    c.bench_function("pitch_extract_f0_3s", |b| {
        b.iter(|| black_box(extract_f0(black_box(&audio), &cfg)));
    });

    let raw = F0Config {
        refine: false,
        ..Default::default()
    };
    c.bench_function("pitch_extract_f0_3s_unrefined", |b| {
        b.iter(|| black_box(extract_f0(black_box(&audio), &raw)));
    });
}

fn bench_align_and_quantize(c: &mut Criterion) {
    let contour = extract_f0(&vowel(3.0), &F0Config::default());
    c.bench_function("pitch_align_and_quantize_300", |b| {
        b.iter(|| {
            black_box(align_and_quantize(
                black_box(&contour),
                300,
                4.0,
                PitchNormalization::PerUtterance,
            ))
        });
    });
}

criterion_group!(benches, bench_extract_f0, bench_align_and_quantize);
criterion_main!(benches);
