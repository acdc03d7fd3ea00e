use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use retrovote_engine::distribution::distribute;
use retrovote_types::Project;

fn distribute_bench(c: &mut Criterion) {
    let projects: Vec<Project> = (0..1000)
        .map(|i| Project::new(format!("p{i}"), format!("Project {i}")))
        .collect();
    let mut rng = StdRng::seed_from_u64(7);

    c.bench_function("distribute_10k_over_1000", |b| {
        b.iter(|| distribute(black_box(10_000), &projects, &mut rng))
    });

    let few: Vec<Project> = projects[..3].to_vec();
    c.bench_function("distribute_7_over_3", |b| {
        b.iter(|| distribute(black_box(7), &few, &mut rng))
    });
}

criterion_group!(benches, distribute_bench);
criterion_main!(benches);
