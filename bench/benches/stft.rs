use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use fft_analysis::{StftConfig, StftProcessor, WindowType};
use fft_analysis_bench::{chord, STFT_SHAPES};

fn bench_stft(c: &mut Criterion) {
    let signal = chord(2.0);
    let mut group = c.benchmark_group("stft");
    for (window, hop) in STFT_SHAPES {
        let processor =
            StftProcessor::new(StftConfig::new(window, hop, WindowType::Hann)).unwrap();
        let spectrum = processor.stft(&signal).unwrap();
        let id = format!("{}x{}", window, hop);

        group.bench_with_input(BenchmarkId::new("forward", &id), &signal, |b, s| {
            b.iter(|| processor.stft(s).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("inverse", &id), &spectrum, |b, m| {
            b.iter(|| processor.istft(m).unwrap())
        });

        #[cfg(feature = "parallel")]
        {
            group.bench_with_input(BenchmarkId::new("forward_parallel", &id), &signal, |b, s| {
                b.iter(|| processor.stft_parallel(s).unwrap())
            });
            group.bench_with_input(
                BenchmarkId::new("inverse_parallel", &id),
                &spectrum,
                |b, m| b.iter(|| processor.istft_parallel(m).unwrap()),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_stft);
criterion_main!(benches);
