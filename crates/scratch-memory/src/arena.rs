// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fixed-budget bump arena.
//!
//! A [`ScratchArena`] models one core's local memory: a single buffer of
//! exactly the budget's size, carved into [`Region`]s once at kernel entry.
//! Nothing is ever freed individually; the whole arena is dropped when the
//! core finishes.

use crate::{MemoryError, ScratchBudget, ScratchStats};

/// A carved byte range inside an arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Region {
    pub offset: usize,
    pub len: usize,
}

impl Region {
    /// One past the last byte.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    /// `true` if the two regions share any byte.
    pub fn overlaps(&self, other: &Region) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}

/// One core's scratch memory.
pub struct ScratchArena {
    data: Vec<u8>,
    cursor: usize,
    stats: ScratchStats,
}

impl ScratchArena {
    /// Creates an arena backed by exactly `budget` bytes.
    pub fn new(budget: ScratchBudget) -> Self {
        let bytes = budget.as_bytes();
        Self {
            data: vec![0u8; bytes],
            cursor: 0,
            stats: ScratchStats {
                budget_bytes: bytes,
                ..ScratchStats::default()
            },
        }
    }

    /// Carves `len` bytes starting at the next `align`-byte boundary.
    ///
    /// Returns `Err(OutOfScratch)` if the region would run past the budget.
    pub fn alloc(&mut self, len: usize, align: usize) -> Result<Region, MemoryError> {
        if len == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }
        if align == 0 || !align.is_power_of_two() {
            return Err(MemoryError::InvalidAlignment(align));
        }

        let budget = self.data.len();
        let offset = align_up(self.cursor, align);
        let end = offset.checked_add(len).filter(|&end| end <= budget);
        let Some(end) = end else {
            self.stats.failed_allocations += 1;
            return Err(MemoryError::OutOfScratch {
                requested: len,
                available: budget.saturating_sub(offset),
                budget,
            });
        };

        self.cursor = end;
        self.stats.allocations += 1;
        self.stats.carved_bytes = end;
        self.stats.peak_bytes = self.stats.peak_bytes.max(end);
        Ok(Region { offset, len })
    }

    /// Bytes not yet carved.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    pub fn budget_bytes(&self) -> usize {
        self.data.len()
    }

    pub fn slice(&self, region: Region) -> &[u8] {
        &self.data[region.offset..region.end()]
    }

    pub fn slice_mut(&mut self, region: Region) -> &mut [u8] {
        &mut self.data[region.offset..region.end()]
    }

    /// Borrows two disjoint regions at once: `a` shared, `b` exclusive.
    ///
    /// # Panics
    /// Panics if the regions overlap.
    pub fn split_pair_mut(&mut self, a: Region, b: Region) -> (&[u8], &mut [u8]) {
        assert!(!a.overlaps(&b), "split_pair_mut on overlapping regions {a:?} and {b:?}");
        if a.offset < b.offset {
            let (lo, hi) = self.data.split_at_mut(b.offset);
            (&lo[a.offset..a.end()], &mut hi[..b.len])
        } else {
            let (lo, hi) = self.data.split_at_mut(a.offset);
            (&hi[..a.len], &mut lo[b.offset..b.end()])
        }
    }

    pub fn stats(&self) -> &ScratchStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut ScratchStats {
        &mut self.stats
    }
}

/// Rounds `value` up to a multiple of the power-of-two `align`.
pub(crate) fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}
