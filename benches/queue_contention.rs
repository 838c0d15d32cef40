//! Benchmarks for the bounded priority queue

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use job_runner::{BoundedPriorityQueue, Payload, Priority};
use rand::Rng;
use std::sync::Arc;
use std::thread;

fn bench_single_thread_put_get(c: &mut Criterion) {
    c.bench_function("single_thread_put_get", |b| {
        let queue = BoundedPriorityQueue::new(10_000);
        let mut rng = rand::thread_rng();
        b.iter(|| {
            for i in 0..1_000u32 {
                queue.put(Payload::Work(i), Priority(rng.gen_range(0..16)));
            }
            while let Some(item) = queue.try_get() {
                black_box(item);
                queue.mark_done().unwrap();
            }
        });
    });
}

fn bench_contended_drain(c: &mut Criterion) {
    c.bench_function("contended_drain_4_threads", |b| {
        b.iter(|| {
            let queue = Arc::new(BoundedPriorityQueue::new(10_000));
            for i in 0..10_000u32 {
                queue.put(Payload::Work(i), Priority::DEFAULT);
            }

            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let queue = queue.clone();
                    thread::spawn(move || {
                        while let Some(item) = queue.try_get() {
                            black_box(item);
                            queue.mark_done().unwrap();
                        }
                    })
                })
                .collect();

            for h in handles {
                h.join().unwrap();
            }
            queue.wait_done();
        });
    });
}

criterion_group!(benches, bench_single_thread_put_get, bench_contended_drain);
criterion_main!(benches);
