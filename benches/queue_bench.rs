use cookiescope::engine::queue::SerializedQueue;
use criterion::{criterion_group, criterion_main, Criterion};
use tokio::runtime::Runtime;

fn benchmark_queue_throughput(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let queue = {
        let _guard = rt.enter();
        SerializedQueue::new()
    };

    let mut group = c.benchmark_group("queue");

    group.bench_function("submit_and_wait_100", |b| {
        b.to_async(&rt).iter(|| async {
            for _ in 0..100 {
                let _ = queue.submit("noop", async { Ok(()) });
            }
            queue.wait_idle().await;
        });
    });

    group.bench_function("submit_then_drain_100", |b| {
        b.iter(|| {
            for _ in 0..100 {
                let _ = queue.submit("noop", async { Ok(()) });
            }
            queue.drain_and_reset()
        });
    });
    group.finish();
}

criterion_group!(benches, benchmark_queue_throughput);
criterion_main!(benches);
