//! Block convolution throughput benchmarks.

use ambibin_hrir::{read_dataset, HrirWriter};
use ambibin_modal::{build_filter_bank, fibonacci_grid, ModalFilterBank};
use ambibin_render::BlockConvolver;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::TempDir;

fn delta_bank(order: usize, ir_length: usize) -> ModalFilterBank {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bench.hrir");
    let channels = (order + 1) * (order + 1);
    let mut writer = HrirWriter::new(48_000.0);
    for direction in fibonacci_grid(2 * channels + 8) {
        let mut ir = vec![0.0f32; ir_length];
        ir[0] = 1.0;
        writer
            .add_measurement(direction.azimuth, direction.elevation, ir.clone(), ir)
            .unwrap();
    }
    writer.finalize(&path).unwrap();
    let dataset = read_dataset(&path).unwrap();
    build_filter_bank(&dataset, order).unwrap()
}

fn bench_process_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_block");
    let block_size = 4096usize;

    for order in [1usize, 3] {
        let bank = delta_bank(order, 256);
        let channels = bank.channels();
        let mut convolver = BlockConvolver::new(&bank, block_size);

        let mut block = vec![vec![0.0f32; block_size]; channels];
        for (channel, samples) in block.iter_mut().enumerate() {
            for (i, s) in samples.iter_mut().enumerate() {
                *s = ((i + channel) as f32 * 0.01).sin() * 0.5;
            }
        }

        group.throughput(Throughput::Elements(block_size as u64));
        group.bench_with_input(BenchmarkId::new("order", order), &order, |b, _| {
            b.iter(|| {
                let (left, right) = convolver.process_block(&block, block_size);
                criterion::black_box((left[0], right[0]));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_process_block);
criterion_main!(benches);
