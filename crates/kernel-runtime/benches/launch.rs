// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for full tiled launches across completion orders and dtypes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kernel_runtime::{CompletionOrder, KernelLauncher};
use platform_info::{PlatformInfo, Preset};
use tensor_core::{kernel_by_name, DType, Shape, Tensor, TileGranularity};
use tiling_planner::{auto_plan, ProblemDescriptor, TilingProfile};

const ELEMENTS: usize = 1 << 20;

fn pool() -> rayon::ThreadPool {
    rayon::ThreadPoolBuilder::new()
        .num_threads(8)
        .build()
        .unwrap()
}

fn bench_orders(c: &mut Criterion) {
    let pool = pool();
    let limits = Preset::Standard.limits();
    let plan = auto_plan(
        &ProblemDescriptor::flat(ELEMENTS, DType::F32),
        &limits,
        &TilingProfile::default(),
    )
    .unwrap();
    let values: Vec<f32> = (0..ELEMENTS).map(|i| (i % 113) as f32 * 0.01 - 0.5).collect();
    let input = Tensor::from_f32(Shape::vector(ELEMENTS), DType::F32, &values).unwrap();
    let mut output = vec![0u8; input.size_bytes()];
    let gelu = kernel_by_name("gelu").unwrap();

    let mut group = c.benchmark_group("launch_order");
    group.throughput(Throughput::Bytes(input.size_bytes() as u64));
    for order in [
        CompletionOrder::InOrder,
        CompletionOrder::Reverse,
        CompletionOrder::Shuffled { seed: 7 },
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(order.as_str()), &order, |b, &order| {
            b.iter(|| {
                KernelLauncher::launch_in(
                    &pool,
                    &plan,
                    gelu.as_ref(),
                    black_box(input.as_bytes()),
                    &mut output,
                    order,
                    false,
                )
                .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_dtypes(c: &mut Criterion) {
    let pool = pool();
    let limits = Preset::Compact.limits();
    let softmax = kernel_by_name("softmax").unwrap();
    let profile = TilingProfile {
        granularity: TileGranularity::Row,
        ..TilingProfile::default()
    };
    let (rows, cols) = (2048, 256);
    let values: Vec<f32> = (0..rows * cols).map(|i| (i % 31) as f32 * 0.1).collect();

    let mut group = c.benchmark_group("launch_softmax_dtype");
    for dtype in DType::ALL {
        let plan = auto_plan(&ProblemDescriptor::rows(rows, cols, dtype).unwrap(), &limits, &profile).unwrap();
        let input = Tensor::from_f32(Shape::matrix(rows, cols), dtype, &values).unwrap();
        let mut output = vec![0u8; input.size_bytes()];
        group.bench_function(dtype.as_str(), |b| {
            b.iter(|| {
                KernelLauncher::launch_in(
                    &pool,
                    &plan,
                    softmax.as_ref(),
                    black_box(input.as_bytes()),
                    &mut output,
                    CompletionOrder::InOrder,
                    false,
                )
                .unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_orders, bench_dtypes);
criterion_main!(benches);
