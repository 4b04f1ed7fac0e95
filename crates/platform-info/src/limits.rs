// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Platform limits and the provider trait.

use crate::PlatformError;

/// Minimum contiguous transfer granularity assumed when a provider does not
/// say otherwise.
pub const DEFAULT_ALIGNMENT_BYTES: usize = 32;

/// Hardware constants the planner works against. Constant for the duration
/// of planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PlatformLimits {
    /// Independent parallel execution units.
    pub core_count: usize,
    /// Fast local memory available to each core, in bytes.
    pub scratch_bytes: usize,
    /// Minimum contiguous transfer granularity, in bytes.
    pub alignment_bytes: usize,
    /// Bytes of scratch held back for the runtime and never handed to tiles.
    pub reserved_scratch_bytes: usize,
}

impl PlatformLimits {
    /// Limits with the default alignment and no reserved scratch.
    pub fn new(core_count: usize, scratch_bytes: usize) -> Self {
        Self {
            core_count,
            scratch_bytes,
            alignment_bytes: DEFAULT_ALIGNMENT_BYTES,
            reserved_scratch_bytes: 0,
        }
    }

    /// Builder-style setter for the alignment.
    pub fn with_alignment(mut self, alignment_bytes: usize) -> Self {
        self.alignment_bytes = alignment_bytes;
        self
    }

    /// Builder-style setter for the reserved margin.
    pub fn with_reserved(mut self, reserved_scratch_bytes: usize) -> Self {
        self.reserved_scratch_bytes = reserved_scratch_bytes;
        self
    }

    /// Scratch left for tiles once the reserved margin is removed.
    pub fn usable_scratch_bytes(&self) -> usize {
        self.scratch_bytes.saturating_sub(self.reserved_scratch_bytes)
    }

    /// Rejects limits no plan could ever be built against.
    pub fn validate(&self) -> Result<(), PlatformError> {
        if self.core_count == 0 {
            return Err(PlatformError::InvalidLimits("core count is zero".into()));
        }
        if self.scratch_bytes == 0 {
            return Err(PlatformError::InvalidLimits("scratch size is zero".into()));
        }
        if self.alignment_bytes == 0 {
            return Err(PlatformError::InvalidLimits("alignment is zero".into()));
        }
        if self.reserved_scratch_bytes >= self.scratch_bytes {
            return Err(PlatformError::InvalidLimits(format!(
                "reserved scratch ({} B) leaves nothing of {} B",
                self.reserved_scratch_bytes, self.scratch_bytes
            )));
        }
        Ok(())
    }
}

/// Black-box provider of platform limits.
pub trait PlatformInfo {
    /// Number of independent cores.
    fn core_count(&self) -> usize;

    /// Per-core scratch size in bytes.
    fn scratch_bytes(&self) -> usize;

    fn alignment_bytes(&self) -> usize {
        DEFAULT_ALIGNMENT_BYTES
    }

    fn reserved_scratch_bytes(&self) -> usize {
        0
    }

    /// Reads every limit once into a value snapshot.
    fn limits(&self) -> PlatformLimits {
        PlatformLimits {
            core_count: self.core_count(),
            scratch_bytes: self.scratch_bytes(),
            alignment_bytes: self.alignment_bytes(),
            reserved_scratch_bytes: self.reserved_scratch_bytes(),
        }
    }

    /// Short label used in logs and snapshots.
    fn source(&self) -> String {
        "custom".to_string()
    }
}

impl PlatformInfo for PlatformLimits {
    fn core_count(&self) -> usize {
        self.core_count
    }

    fn scratch_bytes(&self) -> usize {
        self.scratch_bytes
    }

    fn alignment_bytes(&self) -> usize {
        self.alignment_bytes
    }

    fn reserved_scratch_bytes(&self) -> usize {
        self.reserved_scratch_bytes
    }
}
