//! Stress tests for the job runner

use job_runner::prelude::*;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
#[ignore] // Run with --ignored flag
fn stress_test_many_small_jobs() {
    for _ in 0..20 {
        let mut runner = JobRunner::new(0u64..20_000, |x: u64, _: &PrintSink| {
            Ok::<_, String>(Some(x))
        })
        .unwrap();
        runner.start().unwrap();
        runner.join().unwrap();

        let sum: u64 = runner.output().drain().into_iter().sum();
        assert_eq!(sum, 19_999 * 20_000 / 2);
    }
}

#[test]
#[ignore]
fn stress_test_random_failures() {
    let failures = Arc::new(AtomicUsize::new(0));
    let counted = failures.clone();

    let mut runner = JobRunner::new(0u32..10_000, move |x: u32, _: &PrintSink| {
        if rand::thread_rng().gen_bool(0.1) {
            counted.fetch_add(1, Ordering::SeqCst);
            return Err(format!("random failure on {x}"));
        }
        Ok(Some(x))
    })
    .unwrap();
    runner.start().unwrap();

    let expected = match runner.join() {
        Ok(()) => 0,
        Err(err) => err.as_job_failure().unwrap().len(),
    };
    assert_eq!(expected, failures.load(Ordering::SeqCst));
    assert_eq!(runner.unfinished(), 0);
}

#[test]
#[ignore]
fn stress_test_repeated_kills() {
    for i in 0..20 {
        let mut runner = JobRunner::new(0u32..5_000, |x: u32, _: &PrintSink| {
            thread::sleep(Duration::from_micros(200));
            Ok::<_, String>(Some(x))
        })
        .unwrap();
        runner.start().unwrap();

        thread::sleep(Duration::from_millis(rand::thread_rng().gen_range(0..20)));
        runner.kill(i % 2 == 0);
        runner.kill(true);
        runner.join().unwrap();

        let stats = runner.stats();
        assert_eq!(stats.processed + stats.cancelled, 5_000, "iteration {}", i);
        assert_eq!(runner.unfinished(), 0);
    }
}

#[test]
#[ignore]
fn stress_test_high_contention_sinks() {
    let output: Sink<u32> = Sink::bounded(8);
    let consumer = {
        let output = output.clone();
        thread::spawn(move || {
            let mut seen = 0;
            while seen < 100_000 {
                if output.take_timeout(Duration::from_secs(5)).is_some() {
                    seen += 1;
                }
            }
            seen
        })
    };

    let mut runner = JobRunner::builder(0u32..100_000, |x: u32, _: &PrintSink| {
        Ok::<_, String>(Some(x))
    })
    .output_sink(output)
    .build()
    .unwrap();
    runner.start().unwrap();
    runner.join().unwrap();

    assert_eq!(consumer.join().unwrap(), 100_000);
}
