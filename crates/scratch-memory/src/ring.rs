// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! N-slot ring of scratch buffers with per-region ownership state.
//!
//! Each slot owns an input region (written by copy-in, read by compute) and
//! an output region (written by compute, read by copy-out). Iteration `i`
//! uses slot `i % slot_count`. Every stage must move its region through an
//! explicit transition, so reusing a slot before its previous consumer has
//! finished is reported as [`MemoryError::SlotHazard`] instead of silently
//! corrupting data.
//!
//! ```text
//! input : Free ─begin_fill→ Filling ─finish_fill→ Filled ─begin_compute→ Computing ─finish_compute→ Free
//! output: Free ─begin_compute→ Computing ─finish_compute→ Computed ─begin_drain→ Draining ─finish_drain→ Free
//! ```

use crate::arena::align_up;
use crate::{MemoryError, Region, ScratchArena, ScratchBudget, ScratchStats};

/// Ownership state of one scratch region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum RegionState {
    Free,
    Filling,
    Filled,
    Computing,
    Computed,
    Draining,
}

#[derive(Debug, Clone)]
struct Slot {
    input: Region,
    output: Region,
    input_state: RegionState,
    output_state: RegionState,
}

/// The ring of named buffers a core pipelines through.
pub struct SlotRing {
    arena: ScratchArena,
    slots: Vec<Slot>,
    region_bytes: usize,
}

impl SlotRing {
    /// Carves `slot_count` input/output region pairs of `region_bytes` each
    /// (rounded up to `alignment`) out of a fresh arena of `budget` bytes.
    pub fn carve(
        budget: ScratchBudget,
        slot_count: usize,
        region_bytes: usize,
        alignment: usize,
    ) -> Result<Self, MemoryError> {
        if slot_count == 0 {
            return Err(MemoryError::SlotOutOfRange {
                slot: 0,
                slot_count: 0,
            });
        }
        if alignment == 0 || !alignment.is_power_of_two() {
            return Err(MemoryError::InvalidAlignment(alignment));
        }

        let padded = align_up(region_bytes, alignment);
        let mut arena = ScratchArena::new(budget);
        let mut slots = Vec::with_capacity(slot_count);
        for _ in 0..slot_count {
            let input = arena.alloc(padded, alignment)?;
            let output = arena.alloc(padded, alignment)?;
            slots.push(Slot {
                input,
                output,
                input_state: RegionState::Free,
                output_state: RegionState::Free,
            });
        }

        tracing::trace!(
            slots = slot_count,
            region_bytes = padded,
            carved = arena.stats().carved_bytes,
            budget = budget.as_bytes(),
            "scratch ring carved"
        );

        Ok(Self {
            arena,
            slots,
            region_bytes: padded,
        })
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Usable bytes per region.
    pub fn region_bytes(&self) -> usize {
        self.region_bytes
    }

    /// Slot that iteration `iteration` runs in.
    pub fn slot_for(&self, iteration: usize) -> usize {
        iteration % self.slots.len()
    }

    pub fn input_state(&self, slot: usize) -> Result<RegionState, MemoryError> {
        Ok(self.slot(slot)?.input_state)
    }

    pub fn output_state(&self, slot: usize) -> Result<RegionState, MemoryError> {
        Ok(self.slot(slot)?.output_state)
    }

    /// `true` when no region in any slot is owned by a stage.
    pub fn is_quiescent(&self) -> bool {
        self.slots
            .iter()
            .all(|s| s.input_state == RegionState::Free && s.output_state == RegionState::Free)
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Claims the input region for a copy-in.
    pub fn begin_fill(&mut self, slot: usize) -> Result<(), MemoryError> {
        let s = self.slot_mut(slot)?;
        expect_state(slot, "input", "begin fill", s.input_state, RegionState::Free)?;
        s.input_state = RegionState::Filling;
        Ok(())
    }

    pub fn finish_fill(&mut self, slot: usize) -> Result<(), MemoryError> {
        let s = self.slot_mut(slot)?;
        expect_state(slot, "input", "finish fill", s.input_state, RegionState::Filling)?;
        s.input_state = RegionState::Filled;
        self.arena.stats_mut().fills += 1;
        Ok(())
    }

    /// Claims both regions for compute: the input must be filled and the
    /// output's previous tile fully drained.
    pub fn begin_compute(&mut self, slot: usize) -> Result<(), MemoryError> {
        let s = self.slot_mut(slot)?;
        expect_state(slot, "input", "begin compute", s.input_state, RegionState::Filled)?;
        expect_state(slot, "output", "begin compute", s.output_state, RegionState::Free)?;
        s.input_state = RegionState::Computing;
        s.output_state = RegionState::Computing;
        Ok(())
    }

    /// Releases the input region and marks the output ready to drain.
    pub fn finish_compute(&mut self, slot: usize) -> Result<(), MemoryError> {
        let s = self.slot_mut(slot)?;
        expect_state(slot, "input", "finish compute", s.input_state, RegionState::Computing)?;
        expect_state(slot, "output", "finish compute", s.output_state, RegionState::Computing)?;
        s.input_state = RegionState::Free;
        s.output_state = RegionState::Computed;
        self.arena.stats_mut().computes += 1;
        Ok(())
    }

    pub fn begin_drain(&mut self, slot: usize) -> Result<(), MemoryError> {
        let s = self.slot_mut(slot)?;
        expect_state(slot, "output", "begin drain", s.output_state, RegionState::Computed)?;
        s.output_state = RegionState::Draining;
        Ok(())
    }

    pub fn finish_drain(&mut self, slot: usize) -> Result<(), MemoryError> {
        let s = self.slot_mut(slot)?;
        expect_state(slot, "output", "finish drain", s.output_state, RegionState::Draining)?;
        s.output_state = RegionState::Free;
        self.arena.stats_mut().drains += 1;
        Ok(())
    }

    // ── Views ────────────────────────────────────────────────────

    /// Input region of a slot that is being filled.
    pub fn fill_view(&mut self, slot: usize) -> Result<&mut [u8], MemoryError> {
        let s = self.slot(slot)?;
        expect_state(slot, "input", "write", s.input_state, RegionState::Filling)?;
        let region = s.input;
        Ok(self.arena.slice_mut(region))
    }

    /// Input (read) and output (write) regions of a slot under compute.
    pub fn compute_views(&mut self, slot: usize) -> Result<(&[u8], &mut [u8]), MemoryError> {
        let s = self.slot(slot)?;
        expect_state(slot, "input", "read", s.input_state, RegionState::Computing)?;
        let (input, output) = (s.input, s.output);
        Ok(self.arena.split_pair_mut(input, output))
    }

    /// Output region of a slot that is being drained.
    pub fn drain_view(&self, slot: usize) -> Result<&[u8], MemoryError> {
        let s = self.slot(slot)?;
        expect_state(slot, "output", "read", s.output_state, RegionState::Draining)?;
        Ok(self.arena.slice(s.output))
    }

    pub fn stats(&self) -> &ScratchStats {
        self.arena.stats()
    }

    fn slot(&self, slot: usize) -> Result<&Slot, MemoryError> {
        let slot_count = self.slots.len();
        self.slots
            .get(slot)
            .ok_or(MemoryError::SlotOutOfRange { slot, slot_count })
    }

    fn slot_mut(&mut self, slot: usize) -> Result<&mut Slot, MemoryError> {
        let slot_count = self.slots.len();
        self.slots
            .get_mut(slot)
            .ok_or(MemoryError::SlotOutOfRange { slot, slot_count })
    }
}

fn expect_state(
    slot: usize,
    region: &'static str,
    op: &'static str,
    actual: RegionState,
    required: RegionState,
) -> Result<(), MemoryError> {
    if actual == required {
        Ok(())
    } else {
        Err(MemoryError::SlotHazard {
            slot,
            region,
            op,
            state: actual,
        })
    }
}
