// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tiling-planner
//!
//! Decides how one vector operator is split across a fixed number of cores
//! and, within each core, into tiles small enough that input and output
//! double buffers fit in scratch.
//!
//! # Policies
//!
//! | Policy | Per-core granularity from | Typical operators |
//! |---|---|---|
//! | [`UniformChunk`] | `ceil(N / cores)` | element-wise activations |
//! | [`CapacityDriven`] | `max_elements_per_core / cols` | row kernels with per-row cost |
//!
//! Both hand the remainder to the last used core only, and both size tiles
//! the same way: `floor(scratch / dbf / W)` rounded down to `alignment / W`.
//!
//! # Trait-Based Extensibility
//!
//! ```ignore
//! struct Custom;
//! impl TilingPolicy for Custom {
//!     fn name(&self) -> &str { "custom" }
//!     fn plan(&self, problem: &ProblemDescriptor, limits: &PlatformLimits,
//!             profile: &TilingProfile) -> Result<TilingPlan, PlannerError> { /* ... */ }
//! }
//! ```
//!
//! # Example
//! ```
//! use platform_info::PlatformLimits;
//! use tensor_core::DType;
//! use tiling_planner::{auto_plan, ProblemDescriptor, TilingProfile};
//!
//! let plan = auto_plan(
//!     &ProblemDescriptor::flat(1024, DType::F32),
//!     &PlatformLimits::new(40, 196608),
//!     &TilingProfile::default(),
//! )
//! .unwrap();
//! assert_eq!(plan.used_core_count, 40);
//! assert_eq!(plan.tail_core_element_count(), 10);
//! ```

mod error;
pub(crate) mod plan;
pub mod policy;
mod problem;
mod profile;
mod record;
mod variant;

pub use error::PlannerError;
pub use plan::{CoreAssignment, TileSpan, TilingPlan};
pub use policy::capacity::CapacityDriven;
pub use policy::uniform::UniformChunk;
pub use policy::TilingPolicy;
pub use problem::{ProblemDescriptor, RowShape};
pub use profile::{MisalignmentPolicy, TilingProfile, DEFAULT_MAX_ROWS};
pub use record::{TilingRecord, RECORD_MAGIC, RECORD_SIZE, RECORD_VERSION};
pub use variant::{Layout, Template, VariantKey};

use platform_info::PlatformLimits;

/// Selects the policy for the problem's shape and runs it.
///
/// Heuristic:
/// - Row problems use [`CapacityDriven`], which honours the profile's
///   per-core budget and falls back to a single core when a row cannot be
///   split safely.
/// - Flat problems use [`UniformChunk`].
pub fn auto_plan(
    problem: &ProblemDescriptor,
    limits: &PlatformLimits,
    profile: &TilingProfile,
) -> Result<TilingPlan, PlannerError> {
    let policy: &dyn TilingPolicy = if problem.rows.is_some() {
        &CapacityDriven
    } else {
        &UniformChunk
    };

    let plan = policy.plan(problem, limits, profile)?;
    tracing::info!(
        policy = policy.name(),
        variant = %plan.variant,
        used_cores = plan.used_core_count,
        tile = plan.tile_element_count(),
        "tiling planned"
    );
    Ok(plan)
}

/// Looks up a policy by name (`"uniform-chunk"` or `"capacity-driven"`).
pub fn policy_by_name(name: &str) -> Option<Box<dyn TilingPolicy>> {
    match name {
        "uniform-chunk" | "uniform" => Some(Box::new(UniformChunk)),
        "capacity-driven" | "capacity" => Some(Box::new(CapacityDriven)),
        _ => None,
    }
}
