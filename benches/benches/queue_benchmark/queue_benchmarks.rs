use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::{Builder, Runtime};
use zumic_mq::Queue;

fn runtime() -> Runtime {
    Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("runtime")
}

/// Все push, затем все poll: рост внутреннего буфера.
fn bench_push_then_poll(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("queue_push_then_poll");

    for size in [100u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                rt.block_on(async {
                    let queue = Queue::new();
                    for i in 0..size {
                        queue.push(i).await.unwrap();
                    }
                    queue.close(None);
                    while let Some(v) = queue.poll().await {
                        black_box(v);
                    }
                })
            });
        });
    }

    group.finish();
}

/// Производитель и потребитель в разных задачах.
fn bench_concurrent_handoff(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("queue_concurrent_handoff");
    let size = 10_000u64;
    group.throughput(Throughput::Elements(size));

    group.bench_function("1p_1c", |b| {
        b.iter(|| {
            rt.block_on(async {
                let queue = Queue::new();
                let poller = queue.poller();
                let consumer = tokio::spawn(async move {
                    let mut n = 0u64;
                    while poller.poll().await.is_some() {
                        n += 1;
                    }
                    n
                });

                for i in 0..size {
                    queue.push(i).await.unwrap();
                }
                queue.close(None);
                black_box(consumer.await.unwrap())
            })
        });
    });

    group.finish();
}

criterion_group!(benches, bench_push_then_poll, bench_concurrent_handoff);
criterion_main!(benches);
