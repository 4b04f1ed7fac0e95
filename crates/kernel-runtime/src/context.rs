// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-core execution context.
//!
//! A [`CoreContext`] owns everything one core touches: its disjoint slices
//! of global input and output, its scratch ring, the queue of issued but
//! not yet retired operations, and its metrics. Nothing here is shared
//! with another core, so there is no locking.
//!
//! Issuing an operation claims the scratch regions it needs; retiring it
//! performs the data movement or compute and releases them. Retirement only
//! happens inside [`CoreContext::wait`], in the order the core's
//! [`CompletionScheduler`] picks.

use crate::dispatch::{ComputeScratch, KernelVariant};
use crate::event::{CompletionOrder, CompletionScheduler, Event, Pipe};
use crate::metrics::CoreMetrics;
use crate::RuntimeError;
use scratch_memory::{MemoryError, ScratchStats, SlotRing};
use std::ops::Range;
use tensor_core::TileKernel;

#[derive(Debug)]
enum Op {
    /// Copy `input[range]` into the slot's input region.
    CopyIn { range: Range<usize> },
    /// Run the kernel over the first `bytes` of the slot.
    Compute { bytes: usize },
    /// Copy the slot's output region into `output[range]`.
    CopyOut { range: Range<usize> },
}

#[derive(Debug)]
struct Pending {
    event: Event,
    op: Op,
}

pub(crate) struct CoreContext<'a> {
    core: usize,
    input: &'a [u8],
    output: &'a mut [u8],
    ring: SlotRing,
    kernel: &'a dyn TileKernel,
    variant: KernelVariant,
    row_len: usize,
    scheduler: CompletionScheduler,
    /// Oldest first.
    pending: Vec<Pending>,
    next_ticket: u64,
    scratch: ComputeScratch,
    metrics: CoreMetrics,
}

impl<'a> CoreContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        core: usize,
        input: &'a [u8],
        output: &'a mut [u8],
        ring: SlotRing,
        kernel: &'a dyn TileKernel,
        variant: KernelVariant,
        row_len: usize,
        order: CompletionOrder,
    ) -> Self {
        let tile_elements = ring.region_bytes() / variant.dtype.size_bytes();
        Self {
            core,
            input,
            output,
            ring,
            kernel,
            variant,
            row_len,
            scheduler: CompletionScheduler::new(order, core),
            pending: Vec::with_capacity(4),
            next_ticket: 0,
            scratch: ComputeScratch::with_capacity(tile_elements),
            metrics: CoreMetrics {
                core,
                ..CoreMetrics::default()
            },
        }
    }

    pub fn slot_count(&self) -> usize {
        self.ring.slot_count()
    }

    // ── Issue ────────────────────────────────────────────────────

    /// Starts moving `input[range]` into `slot`.
    pub fn issue_copy_in(&mut self, slot: usize, range: Range<usize>) -> Result<Event, RuntimeError> {
        self.ring.begin_fill(slot).map_err(hazard)?;
        Ok(self.push(Pipe::CopyIn, slot, Op::CopyIn { range }))
    }

    /// Starts computing the first `bytes` of `slot`.
    pub fn issue_compute(&mut self, slot: usize, bytes: usize) -> Result<Event, RuntimeError> {
        self.ring.begin_compute(slot).map_err(hazard)?;
        Ok(self.push(Pipe::Compute, slot, Op::Compute { bytes }))
    }

    /// Starts moving `slot`'s result into `output[range]`.
    pub fn issue_copy_out(&mut self, slot: usize, range: Range<usize>) -> Result<Event, RuntimeError> {
        self.ring.begin_drain(slot).map_err(hazard)?;
        Ok(self.push(Pipe::CopyOut, slot, Op::CopyOut { range }))
    }

    fn push(&mut self, pipe: Pipe, slot: usize, op: Op) -> Event {
        let event = Event {
            pipe,
            slot,
            ticket: self.next_ticket,
        };
        self.next_ticket += 1;
        self.pending.push(Pending { event, op });
        self.metrics.max_in_flight = self.metrics.max_in_flight.max(self.pending.len());
        event
    }

    // ── Wait ─────────────────────────────────────────────────────

    pub fn is_signalled(&self, event: Event) -> bool {
        !self.pending.iter().any(|p| p.event.ticket == event.ticket)
    }

    /// Blocks until `event` is signalled. Other pending operations may
    /// retire first.
    pub fn wait(&mut self, event: Event) -> Result<(), RuntimeError> {
        if self.is_signalled(event) {
            return Ok(());
        }
        self.metrics.blocking_waits += 1;
        while !self.is_signalled(event) {
            let idx = self.scheduler.next(self.pending.len());
            if idx != 0 {
                self.metrics.out_of_order_retirements += 1;
            }
            let pending = self.pending.remove(idx);
            self.retire(pending)?;
        }
        Ok(())
    }

    fn retire(&mut self, pending: Pending) -> Result<(), RuntimeError> {
        let Event { pipe, slot, ticket } = pending.event;
        tracing::trace!(core = self.core, %pipe, slot, ticket, "retire");

        match pending.op {
            Op::CopyIn { range } => {
                let len = range.len();
                let dst = self.ring.fill_view(slot).map_err(hazard)?;
                dst[..len].copy_from_slice(&self.input[range]);
                self.ring.finish_fill(slot).map_err(hazard)?;
                self.metrics.bytes_in += len;
            }
            Op::Compute { bytes } => {
                let (src, dst) = self.ring.compute_views(slot).map_err(hazard)?;
                self.variant.compute(
                    self.kernel,
                    &src[..bytes],
                    &mut dst[..bytes],
                    self.row_len,
                    &mut self.scratch,
                )?;
                self.ring.finish_compute(slot).map_err(hazard)?;
            }
            Op::CopyOut { range } => {
                let len = range.len();
                let src = self.ring.drain_view(slot).map_err(hazard)?;
                self.output[range].copy_from_slice(&src[..len]);
                self.ring.finish_drain(slot).map_err(hazard)?;
                self.metrics.bytes_out += len;
            }
        }
        Ok(())
    }

    /// Ends the core's run. Every issued operation must have retired and
    /// every region must be free again.
    pub fn finish(mut self, iterations: usize) -> Result<(CoreMetrics, ScratchStats), RuntimeError> {
        if !self.pending.is_empty() {
            return Err(RuntimeError::contract(format!(
                "core {} finished with {} operations in flight",
                self.core,
                self.pending.len()
            )));
        }
        if !self.ring.is_quiescent() {
            return Err(RuntimeError::contract(format!(
                "core {} finished with scratch regions still owned",
                self.core
            )));
        }
        self.metrics.iterations = iterations;
        self.metrics.elements = self.output.len() / self.variant.dtype.size_bytes();
        Ok((self.metrics, self.ring.stats().clone()))
    }
}

/// Region-state violations mean the event discipline is broken.
fn hazard(err: MemoryError) -> RuntimeError {
    match err {
        MemoryError::SlotHazard { .. } | MemoryError::SlotOutOfRange { .. } => {
            RuntimeError::contract(err.to_string())
        }
        other => RuntimeError::Memory(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scratch_memory::ScratchBudget;
    use tensor_core::{kernel_by_name, DType};
    use tiling_planner::{Layout, Template, VariantKey};

    fn variant() -> KernelVariant {
        KernelVariant::resolve(VariantKey::new(Layout::Flat, Template::Parallel, DType::I8)).unwrap()
    }

    fn ring() -> SlotRing {
        SlotRing::carve(ScratchBudget::from_bytes(128), 2, 32, 32).unwrap()
    }

    #[test]
    fn test_single_tile_round_trip() {
        let relu = kernel_by_name("relu").unwrap();
        let input: Vec<u8> = [-3i8, 4, -1, 9].iter().map(|&v| v as u8).collect();
        let mut output = vec![0u8; 4];
        let mut ctx = CoreContext::new(
            0,
            &input,
            &mut output,
            ring(),
            relu.as_ref(),
            variant(),
            4,
            CompletionOrder::InOrder,
        );

        let ev = ctx.issue_copy_in(0, 0..4).unwrap();
        assert!(!ctx.is_signalled(ev));
        ctx.wait(ev).unwrap();
        let ev = ctx.issue_compute(0, 4).unwrap();
        ctx.wait(ev).unwrap();
        let ev = ctx.issue_copy_out(0, 0..4).unwrap();
        ctx.wait(ev).unwrap();
        let (metrics, stats) = ctx.finish(1).unwrap();

        assert_eq!(output, vec![0, 4, 0, 9]);
        assert_eq!(metrics.bytes_in, 4);
        assert_eq!(metrics.bytes_out, 4);
        assert_eq!(stats.computes, 1);
    }

    #[test]
    fn test_reverse_order_retires_newest_first() {
        let relu = kernel_by_name("relu").unwrap();
        let input = vec![1u8; 8];
        let mut output = vec![0u8; 8];
        let mut ctx = CoreContext::new(
            0,
            &input,
            &mut output,
            ring(),
            relu.as_ref(),
            variant(),
            4,
            CompletionOrder::Reverse,
        );

        let first = ctx.issue_copy_in(0, 0..4).unwrap();
        let second = ctx.issue_copy_in(1, 4..8).unwrap();
        ctx.wait(first).unwrap();
        assert!(ctx.is_signalled(second));
        let m = ctx.metrics.clone();
        assert_eq!(m.out_of_order_retirements, 1);
        assert_eq!(m.max_in_flight, 2);
    }

    #[test]
    fn test_compute_on_unfilled_slot_is_contract_violation() {
        let relu = kernel_by_name("relu").unwrap();
        let input = vec![0u8; 4];
        let mut output = vec![0u8; 4];
        let mut ctx = CoreContext::new(
            0,
            &input,
            &mut output,
            ring(),
            relu.as_ref(),
            variant(),
            4,
            CompletionOrder::InOrder,
        );
        let _ = ctx.issue_copy_in(0, 0..4).unwrap();
        // Copy-in has not been waited on, so the input is still filling.
        let err = ctx.issue_compute(0, 4).unwrap_err();
        assert!(matches!(err, RuntimeError::ContractViolation(_)));
    }

    #[test]
    fn test_finish_with_pending_is_contract_violation() {
        let relu = kernel_by_name("relu").unwrap();
        let input = vec![0u8; 4];
        let mut output = vec![0u8; 4];
        let mut ctx = CoreContext::new(
            0,
            &input,
            &mut output,
            ring(),
            relu.as_ref(),
            variant(),
            4,
            CompletionOrder::InOrder,
        );
        ctx.issue_copy_in(0, 0..4).unwrap();
        assert!(matches!(ctx.finish(1), Err(RuntimeError::ContractViolation(_))));
    }
}
