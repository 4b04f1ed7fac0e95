// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tiling plan: the output of the planner.
//!
//! A plan partitions `N` elements into one contiguous chunk per used core
//! and each chunk into scratch-sized tiles. Chunks and tiles are counted in
//! *units* of `unit_elements` elements (one element, or one row), so a row
//! kernel never sees a tile that splits a row. The plan is the contract
//! between the planner and every core's executor and is never mutated
//! after creation.

use crate::variant::{Layout, Template, VariantKey};
use crate::PlannerError;

/// One pipeline iteration's element range, in global element offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct TileSpan {
    pub index: usize,
    pub offset: usize,
    pub len: usize,
}

/// One used core's slice of the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CoreAssignment {
    pub core: usize,
    pub offset: usize,
    pub elements: usize,
    pub iterations: usize,
}

/// The complete partition of one operator invocation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TilingPlan {
    pub total_elements: usize,
    /// Element byte width `W`.
    pub element_bytes: usize,
    /// Cores on the platform, used or not.
    pub core_count: usize,
    pub used_core_count: usize,
    /// Elements per unit: 1, or the row length for row tiling.
    pub unit_elements: usize,
    /// Units assigned to every used core except the last.
    pub base_units: usize,
    /// Units assigned to the last used core.
    pub tail_units: usize,
    /// Units per full tile.
    pub tile_units: usize,
    pub buffer_count: usize,
    pub tensors_per_buffer: usize,
    /// Usable scratch per core the plan was sized against.
    pub scratch_bytes: usize,
    pub alignment_bytes: usize,
    pub variant: VariantKey,
    /// Row decomposition, zero for flat problems.
    pub rows: usize,
    pub cols: usize,
}

impl TilingPlan {
    pub fn per_core_element_count(&self) -> usize {
        self.base_units * self.unit_elements
    }

    pub fn tail_core_element_count(&self) -> usize {
        self.tail_units * self.unit_elements
    }

    pub fn tile_element_count(&self) -> usize {
        self.tile_units * self.unit_elements
    }

    pub fn tile_bytes(&self) -> usize {
        self.tile_element_count() * self.element_bytes
    }

    pub fn double_buffer_factor(&self) -> usize {
        self.buffer_count * self.tensors_per_buffer
    }

    /// Length of the innermost dimension handed to the compute kernel.
    pub fn row_len(&self) -> usize {
        if self.cols > 0 {
            self.cols
        } else {
            self.total_elements
        }
    }

    pub fn variant_key(&self) -> VariantKey {
        self.variant
    }

    /// Name of the policy family that produced this layout.
    pub fn policy_name(&self) -> &'static str {
        match self.variant.decode() {
            Some((Layout::Rows, _, _)) => "capacity-driven",
            _ => "uniform-chunk",
        }
    }

    pub fn is_single_core_fallback(&self) -> bool {
        matches!(self.variant.decode(), Some((_, Template::SingleCoreFallback, _)))
    }

    /// Elements assigned to `core`; zero for idle cores.
    pub fn core_element_count(&self, core: usize) -> usize {
        if core + 1 < self.used_core_count {
            self.per_core_element_count()
        } else if core + 1 == self.used_core_count {
            self.tail_core_element_count()
        } else {
            0
        }
    }

    /// First element of `core`'s chunk; `total_elements` for idle cores.
    pub fn core_offset(&self, core: usize) -> usize {
        if core < self.used_core_count {
            core * self.per_core_element_count()
        } else {
            self.total_elements
        }
    }

    /// `ceil(core_elements / tile_elements)`.
    pub fn iteration_count(&self, core: usize) -> usize {
        let tile = self.tile_element_count();
        if tile == 0 {
            return 0;
        }
        self.core_element_count(core).div_ceil(tile)
    }

    /// The tiles `core` processes, in order. The last one holds the true
    /// remainder.
    pub fn tiles(&self, core: usize) -> impl Iterator<Item = TileSpan> {
        let start = self.core_offset(core);
        let len = self.core_element_count(core);
        let tile = self.tile_element_count();
        (0..self.iteration_count(core)).map(move |index| {
            let off = index * tile;
            TileSpan {
                index,
                offset: start + off,
                len: tile.min(len - off),
            }
        })
    }

    pub fn core_assignment(&self) -> Vec<CoreAssignment> {
        (0..self.used_core_count)
            .map(|core| CoreAssignment {
                core,
                offset: self.core_offset(core),
                elements: self.core_element_count(core),
                iterations: self.iteration_count(core),
            })
            .collect()
    }

    /// Checks the partition invariants.
    ///
    /// - `1 ≤ used_core_count ≤ core_count` and `N > 0`.
    /// - Chunks sum to `N` and only the last may differ from the base.
    /// - The tile is non-empty, aligned, and `tile × W × dbf ≤ scratch`.
    /// - The variant key decodes and matches `W`.
    pub fn validate(&self) -> Result<(), PlannerError> {
        let fail = |msg: String| Err(PlannerError::InvariantViolated(msg));

        if self.total_elements == 0 {
            return fail("plan covers zero elements".into());
        }
        if self.used_core_count == 0 || self.used_core_count > self.core_count {
            return fail(format!(
                "used core count {} outside 1..={}",
                self.used_core_count, self.core_count
            ));
        }
        if self.unit_elements == 0 || self.base_units == 0 || self.tile_units == 0 {
            return fail("unit, base chunk and tile must be non-zero".into());
        }
        if self.tail_units == 0 || self.tail_units > self.base_units {
            return fail(format!(
                "tail chunk {} must be in 1..={} units",
                self.tail_units, self.base_units
            ));
        }
        if self.used_core_count == 1 && self.tail_units != self.base_units {
            return fail("single-core plan must have tail == base".into());
        }

        let covered = (self.used_core_count - 1)
            .checked_mul(self.base_units)
            .and_then(|b| b.checked_add(self.tail_units))
            .and_then(|u| u.checked_mul(self.unit_elements));
        if covered != Some(self.total_elements) {
            return fail(format!(
                "chunks cover {covered:?} elements, expected {}",
                self.total_elements
            ));
        }

        let Some((layout, _, dtype)) = self.variant.decode() else {
            return fail(format!("unknown variant key {}", self.variant));
        };
        if dtype.size_bytes() != self.element_bytes {
            return fail(format!(
                "variant {} is {} but element width is {} B",
                self.variant, dtype, self.element_bytes
            ));
        }
        match layout {
            Layout::Flat => {
                if self.unit_elements != 1 || self.rows != 0 || self.cols != 0 {
                    return fail("flat plan must tile single elements".into());
                }
            }
            Layout::Rows => {
                if self.rows.checked_mul(self.cols) != Some(self.total_elements) {
                    return fail(format!(
                        "{} rows × {} cols ≠ {} elements",
                        self.rows, self.cols, self.total_elements
                    ));
                }
                if self.unit_elements != 1 && self.unit_elements != self.cols {
                    return fail(format!("unit of {} elements is not 1 or a row", self.unit_elements));
                }
            }
        }

        if self.buffer_count == 0 || self.tensors_per_buffer == 0 {
            return fail("empty buffer ring".into());
        }
        if self.alignment_bytes == 0 || self.alignment_bytes % self.element_bytes != 0 {
            return fail(format!(
                "alignment {} B is not a multiple of {} B",
                self.alignment_bytes, self.element_bytes
            ));
        }
        let align_elems = self.alignment_bytes / self.element_bytes;
        // Transport bytes can hold any value; nothing below may wrap.
        let Some(tile_elements) = self.tile_units.checked_mul(self.unit_elements) else {
            return fail(format!(
                "tile of {} × {} elements overflows",
                self.tile_units, self.unit_elements
            ));
        };
        if tile_elements % align_elems != 0 {
            return fail(format!(
                "tile of {tile_elements} elements is not a multiple of {align_elems}"
            ));
        }
        let tile_bytes = tile_elements.checked_mul(self.element_bytes);
        let dbf = self.buffer_count.checked_mul(self.tensors_per_buffer);
        let working_set = tile_bytes
            .zip(dbf)
            .and_then(|(tile, dbf)| tile.checked_mul(dbf));
        match working_set {
            None => {
                return fail(format!(
                    "{tile_elements}-element tiles × {} × {} buffers overflow",
                    self.buffer_count, self.tensors_per_buffer
                ))
            }
            Some(ws) if ws > self.scratch_bytes => {
                return fail(format!(
                    "{ws} B working set exceeds {} B of scratch",
                    self.scratch_bytes
                ))
            }
            Some(_) => {}
        }

        Ok(())
    }

    /// Returns a human-readable summary of the plan.
    ///
    /// # Example output
    /// ```text
    /// Plan 'uniform-chunk' [variant 1000]: 1024 elements on 40/40 cores (26 per core, tail 10), tile 32 elements (1..1 iterations), 512/196608 B scratch
    /// ```
    pub fn summary(&self) -> String {
        let last = self.used_core_count.saturating_sub(1);
        format!(
            "Plan '{}' [variant {}{}]: {} elements on {}/{} cores ({} per core, tail {}), \
             tile {} elements ({}..{} iterations), {}/{} B scratch",
            self.policy_name(),
            self.variant,
            if self.is_single_core_fallback() {
                ", single-core fallback"
            } else {
                ""
            },
            self.total_elements,
            self.used_core_count,
            self.core_count,
            self.per_core_element_count(),
            self.tail_core_element_count(),
            self.tile_element_count(),
            self.iteration_count(last),
            self.iteration_count(0),
            self.tile_bytes() * self.double_buffer_factor(),
            self.scratch_bytes,
        )
    }
}
