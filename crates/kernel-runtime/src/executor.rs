// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The per-core pipelined double-buffer loop.
//!
//! ```text
//! prefetch tile 0 → slot 0
//! for i in 0..iterations:
//!     s = i % slots
//!     if i + 1 < iterations:
//!         wait compute(slot of i+1)      // its input region is free again
//!         copy-in tile i+1 → slot of i+1
//!     wait copy-in(s)
//!     wait copy-out(s)                   // previous result from s has left
//!     compute(s); wait compute(s)
//!     copy-out(s) → tile i
//! wait every outstanding copy-out
//! ```
//!
//! With one slot there is nothing to overlap with, so the prefetch of tile
//! `i + 1` moves after tile `i`'s compute.
//!
//! The executor trusts the plan's arithmetic. It only checks, once per
//! launch, that the plan's variant and buffer layout are ones it can run.

use crate::context::CoreContext;
use crate::dispatch::KernelVariant;
use crate::event::{CompletionOrder, Event};
use crate::metrics::CoreMetrics;
use crate::RuntimeError;
use scratch_memory::{ScratchBudget, SlotRing};
use std::ops::Range;
use std::time::Instant;
use tensor_core::{TileGranularity, TileKernel};
use tiling_planner::{Template, TileSpan, TilingPlan};

/// Where a core is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum CoreState {
    Idle,
    CopyIn,
    WaitCopyInDone,
    Compute,
    WaitComputeDone,
    CopyOut,
    Done,
}

/// Runs one plan's per-core loop. Shared read-only by every core.
pub struct PipelinedExecutor<'p> {
    plan: &'p TilingPlan,
    kernel: &'p dyn TileKernel,
    variant: KernelVariant,
    order: CompletionOrder,
    row_len: usize,
    profiling: bool,
}

impl<'p> PipelinedExecutor<'p> {
    /// Resolves the plan's variant and checks that the kernel can run on
    /// its tiles.
    pub fn new(
        plan: &'p TilingPlan,
        kernel: &'p dyn TileKernel,
        order: CompletionOrder,
    ) -> Result<Self, RuntimeError> {
        let variant = KernelVariant::resolve(plan.variant_key())?;

        if variant.dtype.size_bytes() != plan.element_bytes {
            return Err(RuntimeError::contract(format!(
                "variant {} is {} but the plan has {}-byte elements",
                plan.variant, variant.dtype, plan.element_bytes
            )));
        }
        if plan.buffer_count == 0 || plan.tensors_per_buffer < 2 {
            return Err(RuntimeError::contract(format!(
                "{} slots × {} tensors cannot hold separate input and output regions",
                plan.buffer_count, plan.tensors_per_buffer
            )));
        }
        if variant.template == Template::SingleCoreFallback && plan.used_core_count != 1 {
            return Err(RuntimeError::contract(format!(
                "single-core variant planned over {} cores",
                plan.used_core_count
            )));
        }

        let row_len = match kernel.granularity() {
            TileGranularity::Element => plan.tile_element_count(),
            TileGranularity::Row => {
                if plan.cols == 0 || plan.unit_elements != plan.cols {
                    return Err(RuntimeError::contract(format!(
                        "row kernel '{}' needs whole-row tiles, plan uses {}-element units",
                        kernel.name(),
                        plan.unit_elements
                    )));
                }
                plan.cols
            }
        };

        tracing::debug!(
            kernel = kernel.name(),
            variant = ?variant,
            %order,
            "executor ready"
        );

        Ok(Self {
            plan,
            kernel,
            variant,
            order,
            row_len,
            profiling: true,
        })
    }

    /// Per-core timing and the per-core `debug!` report. On by default.
    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }

    pub fn plan(&self) -> &TilingPlan {
        self.plan
    }

    pub fn variant(&self) -> &KernelVariant {
        &self.variant
    }

    /// Runs `core`'s share of the launch.
    ///
    /// `input` and `output` are this core's chunk only, as laid out by
    /// [`TilingPlan::core_offset`] and [`TilingPlan::core_element_count`].
    /// Cores past `used_core_count` return at once without touching either.
    pub fn run_core(
        &self,
        core: usize,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<CoreMetrics, RuntimeError> {
        let mut state = CoreState::Idle;
        if core >= self.plan.used_core_count {
            transition(core, None, &mut state, CoreState::Done);
            return Ok(CoreMetrics::idle(core));
        }

        let width = self.plan.element_bytes;
        let expected = self.plan.core_element_count(core) * width;
        check_len("input", expected, input.len())?;
        check_len("output", expected, output.len())?;

        let start = self.profiling.then(Instant::now);
        let ring = SlotRing::carve(
            ScratchBudget::from_bytes(self.plan.scratch_bytes),
            self.plan.buffer_count,
            self.plan.tile_bytes(),
            ring_alignment(self.plan.alignment_bytes),
        )?;
        let mut ctx = CoreContext::new(
            core,
            input,
            output,
            ring,
            self.kernel,
            self.variant,
            self.row_len,
            self.order,
        );

        let tiles: Vec<TileSpan> = self.plan.tiles(core).collect();
        let base = self.plan.core_offset(core);
        let slots = ctx.slot_count();
        let lookahead = slots >= 2;
        let mut events = SlotEvents::new(slots);

        self.prefetch(&mut ctx, &mut events, &mut state, core, base, &tiles, 0)?;

        for (i, tile) in tiles.iter().enumerate() {
            let slot = i % slots;
            let has_next = i + 1 < tiles.len();

            if lookahead && has_next {
                self.prefetch(&mut ctx, &mut events, &mut state, core, base, &tiles, i + 1)?;
            }

            transition(core, Some(i), &mut state, CoreState::WaitCopyInDone);
            wait(&mut ctx, events.copy_in[slot].take())?;
            wait(&mut ctx, events.copy_out[slot].take())?;

            transition(core, Some(i), &mut state, CoreState::Compute);
            let ev = ctx.issue_compute(slot, tile.len * width)?;
            events.compute[slot] = Some(ev);

            transition(core, Some(i), &mut state, CoreState::WaitComputeDone);
            ctx.wait(ev)?;

            if !lookahead && has_next {
                self.prefetch(&mut ctx, &mut events, &mut state, core, base, &tiles, i + 1)?;
            }

            transition(core, Some(i), &mut state, CoreState::CopyOut);
            events.copy_out[slot] = Some(ctx.issue_copy_out(slot, byte_range(tile, base, width))?);
        }

        for ev in events.copy_out.iter_mut() {
            wait(&mut ctx, ev.take())?;
        }
        transition(core, None, &mut state, CoreState::Done);

        let (mut metrics, stats) = ctx.finish(tiles.len())?;
        if let Some(start) = start {
            metrics.duration = start.elapsed();
            tracing::debug!(
                core,
                tiles = metrics.iterations,
                bytes_in = metrics.bytes_in,
                bytes_out = metrics.bytes_out,
                peak_scratch = stats.peak_bytes,
                "core done"
            );
        }
        Ok(metrics)
    }

    /// Issues the copy-in of tile `i` once its slot's last compute has
    /// released the input region.
    #[allow(clippy::too_many_arguments)]
    fn prefetch(
        &self,
        ctx: &mut CoreContext<'_>,
        events: &mut SlotEvents,
        state: &mut CoreState,
        core: usize,
        base: usize,
        tiles: &[TileSpan],
        i: usize,
    ) -> Result<(), RuntimeError> {
        let slot = i % events.slots();
        wait(ctx, events.compute[slot].take())?;
        transition(core, Some(i), state, CoreState::CopyIn);
        let range = byte_range(&tiles[i], base, self.plan.element_bytes);
        events.copy_in[slot] = Some(ctx.issue_copy_in(slot, range)?);
        Ok(())
    }
}

/// Last issued event per slot and pipe.
struct SlotEvents {
    copy_in: Vec<Option<Event>>,
    compute: Vec<Option<Event>>,
    copy_out: Vec<Option<Event>>,
}

impl SlotEvents {
    fn new(slots: usize) -> Self {
        Self {
            copy_in: vec![None; slots],
            compute: vec![None; slots],
            copy_out: vec![None; slots],
        }
    }

    fn slots(&self) -> usize {
        self.copy_in.len()
    }
}

fn wait(ctx: &mut CoreContext<'_>, event: Option<Event>) -> Result<(), RuntimeError> {
    match event {
        Some(ev) => ctx.wait(ev),
        None => Ok(()),
    }
}

fn transition(core: usize, tile: Option<usize>, state: &mut CoreState, next: CoreState) {
    tracing::trace!(core, ?tile, from = ?*state, to = ?next, "core state");
    *state = next;
}

/// Byte range of `tile` inside a core chunk that starts at element `base`.
fn byte_range(tile: &TileSpan, base: usize, width: usize) -> Range<usize> {
    let start = (tile.offset - base) * width;
    start..start + tile.len * width
}

fn check_len(buffer: &'static str, expected: usize, actual: usize) -> Result<(), RuntimeError> {
    if expected == actual {
        Ok(())
    } else {
        Err(RuntimeError::BufferSizeMismatch {
            buffer,
            expected,
            actual,
        })
    }
}

/// Largest power of two dividing the transfer alignment. Tiles are whole
/// multiples of the alignment, so regions stay aligned to it either way.
fn ring_alignment(alignment_bytes: usize) -> usize {
    1 << alignment_bytes.trailing_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform_info::PlatformLimits;
    use tensor_core::{kernel_by_name, reference_apply, DType, Shape, Tensor};
    use tiling_planner::{auto_plan, ProblemDescriptor, TilingProfile};

    fn plan_for(n: usize, dtype: DType, cores: usize, scratch: usize, profile: TilingProfile) -> TilingPlan {
        auto_plan(
            &ProblemDescriptor::flat(n, dtype),
            &PlatformLimits::new(cores, scratch),
            &profile,
        )
        .unwrap()
    }

    fn ramp(n: usize, dtype: DType) -> Tensor {
        let values: Vec<f32> = (0..n).map(|i| (i % 23) as f32 * 0.5 - 5.0).collect();
        Tensor::from_f32(Shape::vector(n), dtype, &values).unwrap()
    }

    fn run_single(plan: &TilingPlan, name: &str, order: CompletionOrder, input: &Tensor) -> (Vec<u8>, CoreMetrics) {
        let kernel = kernel_by_name(name).unwrap();
        let exec = PipelinedExecutor::new(plan, kernel.as_ref(), order).unwrap();
        let mut out = vec![0u8; input.size_bytes()];
        let metrics = exec.run_core(0, input.as_bytes(), &mut out).unwrap();
        (out, metrics)
    }

    #[test]
    fn test_multi_tile_matches_reference() {
        // 1 KiB scratch / 4 buffers / 4 B = 64-element tiles, 1000 elements → 16 tiles.
        let plan = plan_for(1000, DType::F32, 1, 1024, TilingProfile::default());
        assert_eq!(plan.iteration_count(0), 16);
        let input = ramp(1000, DType::F32);
        let relu = kernel_by_name("relu").unwrap();
        let expected = reference_apply(relu.as_ref(), DType::F32, 1000, input.as_bytes()).unwrap();

        for order in [
            CompletionOrder::InOrder,
            CompletionOrder::Reverse,
            CompletionOrder::Shuffled { seed: 11 },
        ] {
            let (out, metrics) = run_single(&plan, "relu", order, &input);
            assert_eq!(out, expected, "{order}");
            assert_eq!(metrics.iterations, 16);
            assert_eq!(metrics.bytes_in, 4000);
            assert_eq!(metrics.bytes_out, 4000);
        }
    }

    #[test]
    fn test_profiling_off_skips_core_timing() {
        let plan = plan_for(1000, DType::F32, 1, 1024, TilingProfile::default());
        let input = ramp(1000, DType::F32);
        let relu = kernel_by_name("relu").unwrap();
        let exec = PipelinedExecutor::new(&plan, relu.as_ref(), CompletionOrder::InOrder)
            .unwrap()
            .with_profiling(false);
        let mut out = vec![0u8; input.size_bytes()];
        let metrics = exec.run_core(0, input.as_bytes(), &mut out).unwrap();

        assert_eq!(metrics.duration, std::time::Duration::ZERO);
        assert_eq!(metrics.iterations, 16);
        let expected = reference_apply(relu.as_ref(), DType::F32, 1000, input.as_bytes()).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_single_slot_runs_serially() {
        let profile = TilingProfile {
            buffer_count: 1,
            ..TilingProfile::default()
        };
        let plan = plan_for(300, DType::F16, 1, 256, profile);
        let input = ramp(300, DType::F16);
        let silu = kernel_by_name("silu").unwrap();
        let expected = reference_apply(silu.as_ref(), DType::F16, 300, input.as_bytes()).unwrap();

        let (out, metrics) = run_single(&plan, "silu", CompletionOrder::Reverse, &input);
        assert_eq!(out, expected);
        assert_eq!(metrics.iterations, 5);
        // Only the next copy-in and the last copy-out can be in flight together.
        assert!(metrics.max_in_flight <= 2);
    }

    #[test]
    fn test_reverse_order_overlaps_transfers() {
        let plan = plan_for(512, DType::I8, 1, 256, TilingProfile::default());
        let input = ramp(512, DType::I8);
        let (_, metrics) = run_single(&plan, "relu", CompletionOrder::Reverse, &input);
        assert!(metrics.max_in_flight >= 2);
        assert!(metrics.out_of_order_retirements > 0);
    }

    #[test]
    fn test_idle_core_touches_nothing() {
        let plan = plan_for(3, DType::F32, 8, 4096, TilingProfile::default());
        let relu = kernel_by_name("relu").unwrap();
        let exec = PipelinedExecutor::new(&plan, relu.as_ref(), CompletionOrder::InOrder).unwrap();
        let mut out: [u8; 0] = [];
        let metrics = exec.run_core(5, &[], &mut out).unwrap();
        assert!(metrics.is_idle());
        assert_eq!(metrics.bytes_in, 0);
    }

    #[test]
    fn test_wrong_chunk_length_rejected() {
        let plan = plan_for(64, DType::F32, 2, 4096, TilingProfile::default());
        let relu = kernel_by_name("relu").unwrap();
        let exec = PipelinedExecutor::new(&plan, relu.as_ref(), CompletionOrder::InOrder).unwrap();
        let input = vec![0u8; 10];
        let mut out = vec![0u8; 128];
        assert!(matches!(
            exec.run_core(0, &input, &mut out),
            Err(RuntimeError::BufferSizeMismatch { buffer: "input", .. })
        ));
    }

    #[test]
    fn test_single_tensor_buffers_rejected() {
        let profile = TilingProfile {
            tensors_per_buffer: 1,
            ..TilingProfile::default()
        };
        let plan = plan_for(64, DType::F32, 2, 4096, profile);
        let relu = kernel_by_name("relu").unwrap();
        let err = PipelinedExecutor::new(&plan, relu.as_ref(), CompletionOrder::InOrder).err();
        assert!(matches!(err, Some(RuntimeError::ContractViolation(_))));
    }

    #[test]
    fn test_row_kernel_on_element_tiles_rejected() {
        let plan = plan_for(64, DType::F32, 2, 4096, TilingProfile::default());
        let softmax = kernel_by_name("softmax").unwrap();
        let err = PipelinedExecutor::new(&plan, softmax.as_ref(), CompletionOrder::InOrder).err();
        assert!(matches!(err, Some(RuntimeError::ContractViolation(_))));
    }

    #[test]
    fn test_ring_alignment() {
        assert_eq!(ring_alignment(32), 32);
        assert_eq!(ring_alignment(48), 16);
        assert_eq!(ring_alignment(1), 1);
    }
}
