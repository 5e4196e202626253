use std::{hint::black_box, time::Duration};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use tokio::runtime::{Builder, Runtime};
use zumic_mq::{Broker, BrokerConfig, GlobMatcher, Poller, RegexMatcher};

fn runtime() -> Runtime {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
}

/// Брокер с `subs` подписками: чётные принимают `bench.topic`.
fn setup(
    rt: &Runtime,
    match_cache: bool,
    subs: usize,
) -> (Broker<u64>, Vec<Poller<u64>>) {
    let _guard = rt.enter();
    let broker = Broker::with_config(BrokerConfig {
        match_cache,
        ..Default::default()
    });
    let pollers = (0..subs)
        .map(|i| {
            let subscribed = if i % 2 == 0 {
                broker.subscribe(GlobMatcher::new("bench.*").unwrap())
            } else {
                broker.subscribe(RegexMatcher::new(&format!(r"^other\.{i}$")).unwrap())
            };
            subscribed.unwrap()
        })
        .collect();
    (broker, pollers)
}

/// Публикация с кэшем и без: разница в стоимости матчинга.
fn bench_publish_match_cache(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("broker_publish");

    for subs in [1usize, 10, 100] {
        for match_cache in [true, false] {
            let (broker, pollers) = setup(&rt, match_cache, subs);
            let label = if match_cache { "cached" } else { "uncached" };

            group.bench_with_input(BenchmarkId::new(label, subs), &subs, |b, _| {
                b.iter(|| {
                    rt.block_on(async {
                        black_box(broker.publish("bench.topic", 1).await);
                        for poller in pollers.iter().step_by(2) {
                            black_box(poller.poll().await);
                        }
                    })
                });
            });

            broker.close(Some(Duration::ZERO));
        }
    }

    group.finish();
}

/// Публикация в топик без подписчиков: только проверка кэша.
fn bench_publish_no_match(c: &mut Criterion) {
    let rt = runtime();
    let (broker, _pollers) = setup(&rt, true, 50);

    c.bench_function("broker_publish_no_match", |b| {
        b.iter(|| rt.block_on(async { black_box(broker.publish("nobody", 1).await) }));
    });
}

/// Подписка и удаление подписки: сброс кэша на каждом шаге.
fn bench_subscribe_close_topic(c: &mut Criterion) {
    let rt = runtime();
    let (broker, _pollers) = setup(&rt, true, 10);
    let matcher = GlobMatcher::new("churn.*").unwrap();

    c.bench_function("broker_subscribe_close_topic", |b| {
        b.iter(|| {
            rt.block_on(async {
                let poller = broker.subscribe(matcher.clone()).unwrap();
                black_box(broker.close_topic(&matcher, Some(Duration::ZERO)));
                black_box(poller.poll().await);
            })
        });
    });
}

criterion_group!(
    benches,
    bench_publish_match_cache,
    bench_publish_no_match,
    bench_subscribe_close_topic
);
criterion_main!(benches);
