// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! SPMD launch over every platform core.
//!
//! The same plan is handed to every core. The launcher cuts global input
//! and output into the disjoint per-core chunks the plan describes, so each
//! core's executor can only ever write its own range, then runs all cores
//! in parallel on rayon. Idle cores get empty slices and return at once.

use crate::event::CompletionOrder;
use crate::executor::PipelinedExecutor;
use crate::metrics::{CoreMetrics, LaunchMetrics};
use crate::RuntimeError;
use rayon::prelude::*;
use std::time::Instant;
use tensor_core::TileKernel;
use tiling_planner::TilingPlan;

/// Stateless entry point for one tiled operator invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelLauncher;

impl KernelLauncher {
    /// Runs `kernel` over `input` into `output` according to `plan`, on the
    /// current rayon pool, with per-core profiling.
    pub fn launch(
        plan: &TilingPlan,
        kernel: &dyn TileKernel,
        input: &[u8],
        output: &mut [u8],
        order: CompletionOrder,
    ) -> Result<LaunchMetrics, RuntimeError> {
        Self::run(plan, kernel, input, output, order, true)
    }

    /// Same as [`KernelLauncher::launch`], inside a dedicated pool. With
    /// `profiling` off, per-core durations stay zero and only the launch
    /// wall time is measured.
    pub fn launch_in(
        pool: &rayon::ThreadPool,
        plan: &TilingPlan,
        kernel: &dyn TileKernel,
        input: &[u8],
        output: &mut [u8],
        order: CompletionOrder,
        profiling: bool,
    ) -> Result<LaunchMetrics, RuntimeError> {
        pool.install(|| Self::run(plan, kernel, input, output, order, profiling))
    }

    fn run(
        plan: &TilingPlan,
        kernel: &dyn TileKernel,
        input: &[u8],
        output: &mut [u8],
        order: CompletionOrder,
        profiling: bool,
    ) -> Result<LaunchMetrics, RuntimeError> {
        let expected = plan.total_elements * plan.element_bytes;
        if input.len() != expected {
            return Err(RuntimeError::BufferSizeMismatch {
                buffer: "input",
                expected,
                actual: input.len(),
            });
        }
        if output.len() != expected {
            return Err(RuntimeError::BufferSizeMismatch {
                buffer: "output",
                expected,
                actual: output.len(),
            });
        }

        let executor = PipelinedExecutor::new(plan, kernel, order)?.with_profiling(profiling);
        let start = Instant::now();

        let work = split_per_core(plan, input, output);
        let mut cores = work
            .into_par_iter()
            .map(|(core, src, dst)| executor.run_core(core, src, dst))
            .collect::<Result<Vec<CoreMetrics>, RuntimeError>>()?;
        cores.sort_by_key(|m| m.core);

        let metrics = LaunchMetrics::new(kernel.name(), cores, start.elapsed());
        if profiling {
            tracing::info!("{}", metrics.summary());
        }
        Ok(metrics)
    }
}

type CoreWork<'a> = (usize, &'a [u8], &'a mut [u8]);

/// One entry per platform core, in core order.
fn split_per_core<'a>(
    plan: &TilingPlan,
    mut input: &'a [u8],
    mut output: &'a mut [u8],
) -> Vec<CoreWork<'a>> {
    let width = plan.element_bytes;
    let mut work = Vec::with_capacity(plan.core_count);
    for core in 0..plan.core_count {
        let len = plan.core_element_count(core) * width;
        let (src, rest_in) = input.split_at(len);
        let (dst, rest_out) = std::mem::take(&mut output).split_at_mut(len);
        input = rest_in;
        output = rest_out;
        work.push((core, src, dst));
    }
    work
}
