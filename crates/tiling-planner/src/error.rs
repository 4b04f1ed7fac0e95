// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the tiling planner.
//!
//! Every planning failure is deterministic: retrying with the same problem
//! and the same platform cannot succeed.

/// Errors that can occur during tiling.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// A required dimension is zero, over its limit, or misaligned with no
    /// fallback permitted.
    #[error("invalid shape: {detail}")]
    InvalidShape { detail: String },

    /// The problem cannot be tiled within the scratch and alignment limits,
    /// even at minimum granularity.
    #[error("exceeds platform limit: {detail}")]
    ExceedsPlatformLimit { detail: String },

    /// The tiling profile itself is unusable.
    #[error("invalid tiling profile: {0}")]
    InvalidProfile(String),

    /// The caller's record buffer is too small.
    #[error("tiling record needs {required} bytes, buffer holds {capacity}")]
    RecordCapacity { required: usize, capacity: usize },

    /// The bytes are not a tiling record this version understands.
    #[error("malformed tiling record: {0}")]
    MalformedRecord(String),

    /// A plan broke one of the partition invariants.
    #[error("plan invariant violated: {0}")]
    InvariantViolated(String),

    /// The platform limits were rejected before planning.
    #[error("platform error: {0}")]
    Platform(#[from] platform_info::PlatformError),
}

impl PlannerError {
    pub(crate) fn invalid_shape(detail: impl Into<String>) -> Self {
        Self::InvalidShape {
            detail: detail.into(),
        }
    }

    pub(crate) fn exceeds_limit(detail: impl Into<String>) -> Self {
        Self::ExceedsPlatformLimit {
            detail: detail.into(),
        }
    }
}
