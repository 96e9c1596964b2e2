use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serial_links::receive::PortionTracker;
use serial_links::ReceiveMode;
use std::hint::black_box;
use std::time::Duration;

/// A burst of `len` bytes followed by enough silence to close the portion.
fn feed_portion(tracker: &mut PortionTracker, payload: &[u8], threshold: u32) {
    for &byte in payload {
        black_box(tracker.on_byte(byte));
    }
    for _ in 0..=threshold {
        black_box(tracker.on_silence());
    }
}

pub fn bench_segmentation(c: &mut Criterion) {
    let mut group = c.benchmark_group("portion_tracker");
    for len in [16usize, 256, 4096] {
        let payload: Vec<u8> = (0..len).map(|i| i as u8).collect();
        group.throughput(Throughput::Bytes(len as u64));

        group.bench_with_input(BenchmarkId::new("portion", len), &payload, |b, payload| {
            let mut tracker = PortionTracker::new(ReceiveMode::Portion, 5);
            b.iter(|| feed_portion(&mut tracker, payload, 5));
        });
        group.bench_with_input(BenchmarkId::new("cumulative", len), &payload, |b, payload| {
            b.iter(|| {
                let mut tracker = PortionTracker::new(ReceiveMode::Cumulative, 5);
                feed_portion(&mut tracker, payload, 5);
            });
        });
    }
    group.finish();
}

criterion_group!{
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(300))
        .measurement_time(Duration::from_secs(2));
    targets = bench_segmentation
}
criterion_main!(benches);
