use criterion::{Criterion, criterion_group, criterion_main};
use vplat::ids::EventId;
use vplat::sched::time_engine::TimeEngine;
use vplat::sched::ClockEngine;

fn clock_domain_merge(c: &mut Criterion) {
    c.bench_function("time_engine_merge_10k_events", |b| {
        b.iter(|| {
            let mut engine = TimeEngine::new();
            let clock = engine.register_clock(ClockEngine::new(1_000_000_000));
            for i in 0..10_000u64 {
                engine.clock_mut(clock).enqueue(EventId::new(i), i);
            }
            let mut fired = 0usize;
            while let Some((_clock, ids)) = engine.step() {
                fired += ids.len();
            }
            std::hint::black_box(fired)
        });
    });
}

criterion_group!(benches, clock_domain_merge);
criterion_main!(benches);
