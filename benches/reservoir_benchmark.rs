//! Benchmark tests for the bit reservoir
//!
//! These benchmarks measure the per-frame cost of the reservoir calls and of
//! the stuffing distribution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use l3_reservoir::{distribute_stuffing, BitReservoir, EncodingParams, FrameBudget, SideInfo};

fn benchmark_frame_cycle(c: &mut Criterion) {
    c.bench_function("frame_cycle", |b| {
        let mut budget = FrameBudget::new(&EncodingParams::default()).unwrap();
        let mut reservoir = BitReservoir::new();
        b.iter(|| {
            let frame = budget.next_frame(reservoir.main_data_begin() * 8);
            reservoir.begin_frame(&frame).unwrap();
            let mut side_info = SideInfo::for_frame(&frame);
            for gr in 0..side_info.granules() {
                for ch in 0..side_info.channels() {
                    let max_bits = reservoir.max_bits_for_granule(&frame, black_box(600.0));
                    let coded = max_bits.min(1400);
                    side_info[(gr, ch)].coded_length_bits = coded;
                    reservoir.adjust_after_granule(&frame, coded);
                }
            }
            black_box(reservoir.end_frame(&frame, &mut side_info));
        })
    });
}

fn benchmark_distribute_stuffing(c: &mut Criterion) {
    let lengths = [4090u32, 3000, 4095, 100];

    c.bench_function("distribute_stuffing_plan_b", |b| {
        b.iter(|| black_box(distribute_stuffing(black_box(&lengths), black_box(2500))))
    });
}

criterion_group!(benches, benchmark_frame_cycle, benchmark_distribute_stuffing);
criterion_main!(benches);
