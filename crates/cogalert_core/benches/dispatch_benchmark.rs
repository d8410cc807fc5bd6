//! Dispatch queue throughput benchmarks.

use cogalert_core::{AlertPayload, DispatchQueue, DisplayError, PendingAction, QueueConfig};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_enqueue_drain(c: &mut Criterion) {
    let queue = DispatchQueue::shared(QueueConfig::default());
    let mut consumer = queue.attach_consumer().expect("fresh queue");
    let mut sink = |payload: &AlertPayload| -> Result<(), DisplayError> {
        black_box(payload);
        Ok(())
    };

    c.bench_function("enqueue_drain_64", |b| {
        b.iter(|| {
            for _ in 0..64 {
                let _ = queue.enqueue(PendingAction::show("HIGH"));
            }
            black_box(consumer.drain_and_run(&mut sink))
        });
    });

    c.bench_function("empty_drain", |b| {
        b.iter(|| black_box(consumer.drain_and_run(&mut sink)));
    });
}

criterion_group!(benches, bench_enqueue_drain);
criterion_main!(benches);
