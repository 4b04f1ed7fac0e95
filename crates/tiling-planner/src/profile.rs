// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operator-specific knobs for the generic planner.

use crate::PlannerError;
use tensor_core::{TileGranularity, TileKernel};

/// Row limit applied to row problems unless a profile overrides it.
pub const DEFAULT_MAX_ROWS: usize = 200_000;

/// What to do when a row problem's last dimension is not a multiple of the
/// element alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MisalignmentPolicy {
    /// Run the whole problem on one core.
    #[default]
    SingleCoreFallback,
    /// Fail with `InvalidShape`.
    Reject,
}

/// Parameters that distinguish one operator's tiling from another's.
///
/// The planner itself is shared; operators differ only in how many live
/// buffers they keep in scratch, how coarse a per-core chunk must be, and
/// how they treat awkward row shapes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TilingProfile {
    /// Ring slots per core (2 = ping/pong).
    pub buffer_count: usize,
    /// Tile-sized tensors resident per slot (input + output = 2).
    pub tensors_per_buffer: usize,
    /// Smallest per-core chunk worth dispatching, in elements.
    pub min_core_elements: usize,
    /// Round per-core chunks up to the element alignment.
    pub align_core_chunks: bool,
    /// Largest row count accepted for row problems.
    pub max_rows: Option<usize>,
    /// Per-core element budget used by the capacity-driven policy.
    pub max_elements_per_core: Option<usize>,
    pub granularity: TileGranularity,
    pub misalignment: MisalignmentPolicy,
}

impl Default for TilingProfile {
    fn default() -> Self {
        Self {
            buffer_count: 2,
            tensors_per_buffer: 2,
            min_core_elements: 1,
            align_core_chunks: false,
            max_rows: Some(DEFAULT_MAX_ROWS),
            max_elements_per_core: None,
            granularity: TileGranularity::Element,
            misalignment: MisalignmentPolicy::SingleCoreFallback,
        }
    }
}

impl TilingProfile {
    /// Default profile with the kernel's granularity.
    pub fn for_kernel(kernel: &dyn TileKernel) -> Self {
        Self {
            granularity: kernel.granularity(),
            ..Self::default()
        }
    }

    /// Number of tile-sized buffers resident in scratch at once.
    pub fn double_buffer_factor(&self) -> usize {
        self.buffer_count * self.tensors_per_buffer
    }

    pub(crate) fn check(&self) -> Result<(), PlannerError> {
        if self.buffer_count == 0 {
            return Err(PlannerError::InvalidProfile("buffer_count is zero".into()));
        }
        if self.tensors_per_buffer == 0 {
            return Err(PlannerError::InvalidProfile("tensors_per_buffer is zero".into()));
        }
        if self.max_elements_per_core == Some(0) {
            return Err(PlannerError::InvalidProfile("max_elements_per_core is zero".into()));
        }
        Ok(())
    }
}
