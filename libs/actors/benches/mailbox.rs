//! Mailbox enqueue/dequeue throughput

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use parley_actors::{mailbox, Actor, Message, MessageTag};

const BATCH: u64 = 1024;

fn mailbox_throughput(c: &mut Criterion) {
    let (server, _stats) = Actor::server();
    let reply_to = server.handle();

    let mut group = c.benchmark_group("mailbox");
    group.throughput(Throughput::Elements(BATCH));

    group.bench_function("enqueue_dequeue_1024", |b| {
        b.iter_batched(
            || mailbox::channel("bench"),
            |(tx, mut rx)| {
                for _ in 0..BATCH {
                    tx.enqueue(Message::new(MessageTag::CallbackInvoked, reply_to.clone()))
                        .unwrap();
                }
                while rx.dequeue().is_some() {}
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, mailbox_throughput);
criterion_main!(benches);
