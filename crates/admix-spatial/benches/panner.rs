//! Point-source panner benchmarks

use admix_spatial::{JumpPosition, Layout, ObjectDivergence, ObjectMetadata, PointSourcePanner};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

const BLOCK_SIZE: usize = 512;

fn bench_static_object(c: &mut Criterion) {
    let layout = Layout::atmos_7_1_4();
    let mut panner = PointSourcePanner::new(&layout).unwrap();
    let metadata = ObjectMetadata::at_polar(20.0, 10.0, 1.0);
    let input: Vec<f32> = (0..BLOCK_SIZE).map(|i| (i as f32 * 0.01).sin()).collect();
    let mut direct = vec![vec![0.0f32; BLOCK_SIZE]; layout.total_channels()];
    let mut diffuse = vec![vec![0.0f32; BLOCK_SIZE]; layout.total_channels()];

    c.bench_function("panner_static_7_1_4_512", |b| {
        b.iter(|| {
            panner.accumulate_block(black_box(&metadata), &input, &mut direct, &mut diffuse, 0);
        })
    });
}

fn bench_moving_object(c: &mut Criterion) {
    let layout = Layout::atmos_7_1_4();
    let input: Vec<f32> = (0..BLOCK_SIZE).map(|i| (i as f32 * 0.01).sin()).collect();
    let mut direct = vec![vec![0.0f32; BLOCK_SIZE]; layout.total_channels()];
    let mut diffuse = vec![vec![0.0f32; BLOCK_SIZE]; layout.total_channels()];

    let mut group = c.benchmark_group("panner_moving");
    for divergence in [0.0, 0.5] {
        let mut panner = PointSourcePanner::new(&layout).unwrap();
        let mut azimuth = 0.0;
        group.bench_with_input(
            BenchmarkId::from_parameter(divergence),
            &divergence,
            |b, &divergence| {
                b.iter(|| {
                    azimuth = (azimuth + 1.0) % 360.0;
                    let metadata = ObjectMetadata {
                        divergence: ObjectDivergence {
                            value: divergence,
                            azimuth_range: 45.0,
                        },
                        jump_position: JumpPosition::ramp(BLOCK_SIZE),
                        ..ObjectMetadata::at_polar(azimuth - 180.0, 0.0, 1.0)
                    };
                    panner.accumulate_block(&metadata, &input, &mut direct, &mut diffuse, 0);
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_static_object, bench_moving_object);
criterion_main!(benches);
