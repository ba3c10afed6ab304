use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera_core::Graph;
use tessera_runtime::{HostGrid, KernelRuntime, OutputShape};

fn build_graph(runtime: KernelRuntime, side: usize) -> (Graph, tessera_core::LayerId) {
    let shape = OutputShape::new(side, side);
    let data_a: Vec<f32> = (0..shape.elements()).map(|i| i as f32).collect();
    let data_b: Vec<f32> = (0..shape.elements()).map(|i| (i as f32) * 0.5).collect();

    let mut graph = Graph::new(runtime);
    let a = graph.input(side, side).unwrap();
    let b = graph.input(side, side).unwrap();
    let out = graph.multiply(a, b).unwrap();
    graph.setup_kernels(true).unwrap();
    graph.feed(a, &HostGrid::from_vec(shape, data_a).unwrap()).unwrap();
    graph.feed(b, &HostGrid::from_vec(shape, data_b).unwrap()).unwrap();
    (graph, out)
}

fn benchmark_multiply_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("multiply_predict");

    for side in [16, 64, 256, 1024].iter() {
        group.bench_with_input(BenchmarkId::new("device", side), side, |b, &n| {
            let (mut graph, out) = build_graph(KernelRuntime::device(), n);
            b.iter(|| {
                graph.predict().unwrap();
                black_box(graph.layer(out).unwrap().width());
            });
        });
        group.bench_with_input(BenchmarkId::new("simulated", side), side, |b, &n| {
            let (mut graph, out) = build_graph(KernelRuntime::simulated(), n);
            b.iter(|| {
                graph.predict().unwrap();
                black_box(graph.layer(out).unwrap().width());
            });
        });
    }

    group.finish();
}

fn benchmark_multiply_training_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("multiply_training_step");

    for side in [16, 256].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(side), side, |b, &n| {
            let (mut graph, out) = build_graph(KernelRuntime::device(), n);
            let ones = HostGrid::from_vec(OutputShape::new(n, n), vec![1.0; n * n]).unwrap();
            b.iter(|| {
                graph.predict().unwrap();
                graph.inject_deltas(out, &ones).unwrap();
                graph.compare().unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_multiply_predict, benchmark_multiply_training_step);
criterion_main!(benches);
