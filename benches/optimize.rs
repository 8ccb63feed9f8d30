use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use dcegen::prelude::*;

fn config(levels: &[&str], tasks: usize) -> DesignConfig {
    DesignBuilder::new()
        .attribute("price", levels)
        .attribute("brand", levels)
        .attribute("delivery", levels)
        .alternatives(2)
        .tasks(tasks)
        .seed(42)
        .build()
        .unwrap()
}

fn bench_generate_by_tasks(c: &mut Criterion) {
    let mut group = c.benchmark_group("Generate_3x3x3");
    group.sample_size(10);

    for tasks in [4, 8, 12] {
        group.bench_with_input(BenchmarkId::from_parameter(tasks), &tasks, |b, &tasks| {
            let cfg = config(&["a", "b", "c"], tasks);
            b.iter(|| generate(&cfg).unwrap());
        });
    }
    group.finish();
}

fn bench_generate_by_levels(c: &mut Criterion) {
    let mut group = c.benchmark_group("Generate_6_tasks");
    group.sample_size(10);

    for levels in [2usize, 3, 4] {
        group.bench_with_input(BenchmarkId::from_parameter(levels), &levels, |b, &levels| {
            let labels: Vec<String> = (0..levels).map(|l| l.to_string()).collect();
            let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
            let cfg = config(&refs, 6);
            b.iter(|| generate(&cfg).unwrap());
        });
    }
    group.finish();
}

fn bench_mixed_logit(c: &mut Criterion) {
    let mut group = c.benchmark_group("MixedLogit_draws");
    group.sample_size(10);

    for draws in [50, 200] {
        group.bench_with_input(BenchmarkId::from_parameter(draws), &draws, |b, &draws| {
            let cfg = DesignBuilder::new()
                .attribute("price", &["low", "high"])
                .attribute("brand", &["a", "b"])
                .tasks(4)
                .model(ModelType::MixedLogit)
                .prior(
                    "price",
                    Prior::Normal {
                        mean: -0.5,
                        std_dev: 0.25,
                    },
                )
                .draw_count(draws)
                .seed(7)
                .build()
                .unwrap();
            b.iter(|| generate(&cfg).unwrap());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_generate_by_tasks,
    bench_generate_by_levels,
    bench_mixed_logit
);
criterion_main!(benches);
