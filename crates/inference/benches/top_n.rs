use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use inference::{ClassScore, select_top_n_into, softmax};

/// Deterministic pseudo-probabilities so runs are comparable
fn create_probs(len: usize) -> Vec<f32> {
    let mut probs: Vec<f32> = (0..len)
        .map(|i| ((i * 7919) % 1000) as f32 / 1000.0)
        .collect();
    softmax(&mut probs);
    probs
}

fn benchmark_top_n(c: &mut Criterion) {
    let mut group = c.benchmark_group("top_n");

    // ImageNet with and without the background class
    for classes in [1000usize, 1001] {
        let probs = create_probs(classes);

        for n in [1usize, 5, 20] {
            let mut out = vec![ClassScore::UNSET; n];
            group.bench_with_input(
                BenchmarkId::new(format!("classes_{classes}"), n),
                &probs,
                |b, probs| {
                    b.iter(|| select_top_n_into(black_box(probs), &mut out).unwrap());
                },
            );
        }
    }

    group.finish();
}

fn benchmark_softmax(c: &mut Criterion) {
    let logits = create_probs(1000);

    c.bench_function("softmax_1000", |b| {
        b.iter(|| {
            let mut values = logits.clone();
            softmax(black_box(&mut values));
            values
        });
    });
}

criterion_group!(benches, benchmark_top_n, benchmark_softmax);
criterion_main!(benches);
