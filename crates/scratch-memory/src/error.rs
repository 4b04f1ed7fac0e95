// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for scratch memory management.

use crate::RegionState;

/// Errors that can occur while carving or using scratch memory.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// The requested region would exceed the scratch budget.
    #[error("out of scratch: requested {requested} bytes, but only {available} available (budget: {budget})")]
    OutOfScratch {
        requested: usize,
        available: usize,
        budget: usize,
    },

    /// Attempted to carve a zero-sized region.
    #[error("cannot allocate zero-sized region")]
    ZeroSizedAllocation,

    /// Alignment is zero or not a power of two.
    #[error("invalid alignment {0}: must be a non-zero power of two")]
    InvalidAlignment(usize),

    /// The budget string or value is unusable.
    #[error("invalid scratch budget: {0}")]
    InvalidBudget(String),

    /// A slot index outside the ring.
    #[error("slot {slot} out of range for a ring of {slot_count}")]
    SlotOutOfRange { slot: usize, slot_count: usize },

    /// A pipeline stage touched a region that was not in the state it
    /// requires. Always an event-discipline bug in the caller.
    #[error("slot {slot}: cannot {op} while {region} region is {state:?}")]
    SlotHazard {
        slot: usize,
        region: &'static str,
        op: &'static str,
        state: RegionState,
    },
}
