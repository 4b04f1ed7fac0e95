// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Capacity-driven core count policy.
//!
//! Used when each row carries a fixed processing cost, so the number of
//! rows one core can take is bounded by a per-core element budget rather
//! than by an even split:
//!
//! ```text
//! rows_per_core = max_elements_per_core / cols
//! needed        = ceil(rows / rows_per_core), clamped to the core count
//! ```
//!
//! A row wider than the whole per-core budget, or a last dimension that is
//! not aligned, cannot be split safely and runs the single-core fallback.

use super::{assemble, check_rows, geometry, row_granule, split_units, Split, TilingPolicy};
use crate::variant::Template;
use crate::{PlannerError, ProblemDescriptor, TilingPlan, TilingProfile};
use platform_info::PlatformLimits;

/// Derives the core count from a per-core element budget.
#[derive(Debug, Clone, Default)]
pub struct CapacityDriven;

impl CapacityDriven {
    pub fn new() -> Self {
        Self
    }
}

impl TilingPolicy for CapacityDriven {
    fn name(&self) -> &str {
        "capacity-driven"
    }

    fn plan(
        &self,
        problem: &ProblemDescriptor,
        limits: &PlatformLimits,
        profile: &TilingProfile,
    ) -> Result<TilingPlan, PlannerError> {
        let Some(shape) = problem.rows else {
            return Err(PlannerError::invalid_shape(
                "capacity-driven tiling needs a row decomposition",
            ));
        };
        let geo = geometry(problem, limits, profile)?;
        let aligned = check_rows(shape, profile, &geo)?;

        let budget = match profile.max_elements_per_core {
            Some(budget) => budget,
            None => shape
                .rows
                .div_ceil(limits.core_count)
                .checked_mul(shape.cols)
                .ok_or_else(|| {
                    PlannerError::invalid_shape(format!(
                        "per-core share of {} × {} elements overflows",
                        shape.rows, shape.cols
                    ))
                })?,
        };
        let rows_per_core = budget / shape.cols;

        let (split, template) = if !aligned {
            tracing::debug!(cols = shape.cols, align = geo.align_elems, "misaligned last dimension");
            (Split::single(shape.rows), Template::SingleCoreFallback)
        } else if rows_per_core == 0 {
            tracing::debug!(cols = shape.cols, budget, "row exceeds per-core budget");
            (Split::single(shape.rows), Template::SingleCoreFallback)
        } else {
            let needed = shape.rows.div_ceil(rows_per_core).min(limits.core_count);
            let align = profile
                .align_core_chunks
                .then(|| row_granule(shape.cols, geo.align_elems));
            let min_rows = profile.min_core_elements.div_ceil(shape.cols);
            (split_units(shape.rows, needed, min_rows, align), Template::Parallel)
        };

        tracing::debug!(
            policy = self.name(),
            rows_per_core,
            base = split.base,
            used = split.used,
            tail = split.tail,
            "core split"
        );

        assemble(problem, limits, profile, &geo, split, template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_MAX_ROWS;
    use tensor_core::{DType, TileGranularity};

    fn row_profile(max_elements_per_core: Option<usize>) -> TilingProfile {
        TilingProfile {
            granularity: TileGranularity::Row,
            max_elements_per_core,
            ..TilingProfile::default()
        }
    }

    #[test]
    fn test_budget_limits_core_count() {
        // 4096-element budget over 512-wide rows = 8 rows per core → 13 cores for 100 rows.
        let plan = CapacityDriven::new()
            .plan(
                &ProblemDescriptor::rows(100, 512, DType::F16).unwrap(),
                &PlatformLimits::new(40, 196608),
                &row_profile(Some(4096)),
            )
            .unwrap();
        assert_eq!(plan.used_core_count, 13);
        assert_eq!(plan.per_core_element_count(), 8 * 512);
        assert_eq!(plan.tail_core_element_count(), 4 * 512);
        assert!(!plan.is_single_core_fallback());
    }

    #[test]
    fn test_needed_cores_clamped() {
        let plan = CapacityDriven::new()
            .plan(
                &ProblemDescriptor::rows(1000, 64, DType::F32).unwrap(),
                &PlatformLimits::new(8, 65536),
                &row_profile(Some(64)),
            )
            .unwrap();
        assert_eq!(plan.used_core_count, 8);
        assert_eq!(plan.per_core_element_count(), 125 * 64);
    }

    #[test]
    fn test_row_over_budget_runs_single_core() {
        let plan = CapacityDriven::new()
            .plan(
                &ProblemDescriptor::rows(16, 2048, DType::F32).unwrap(),
                &PlatformLimits::new(40, 196608),
                &row_profile(Some(1024)),
            )
            .unwrap();
        assert_eq!(plan.used_core_count, 1);
        assert!(plan.is_single_core_fallback());
        assert_eq!(plan.core_element_count(0), 16 * 2048);
    }

    #[test]
    fn test_row_limit_exceeded() {
        let err = CapacityDriven::new()
            .plan(
                &ProblemDescriptor::rows(DEFAULT_MAX_ROWS + 1, 8, DType::F32).unwrap(),
                &PlatformLimits::new(40, 196608),
                &row_profile(None),
            )
            .unwrap_err();
        assert!(matches!(err, PlannerError::InvalidShape { .. }));
    }

    #[test]
    fn test_overflowing_default_budget_is_invalid_shape() {
        let problem = ProblemDescriptor {
            total_elements: 1024,
            dtype: DType::F32,
            rows: Some(crate::RowShape { rows: usize::MAX / 2, cols: 1024 }),
        };
        let profile = TilingProfile {
            max_rows: None,
            ..row_profile(None)
        };
        let err = CapacityDriven::new()
            .plan(&problem, &PlatformLimits::new(4, 65536), &profile)
            .unwrap_err();
        assert!(matches!(err, PlannerError::InvalidShape { .. }));
    }

    #[test]
    fn test_zero_cols_is_invalid_shape() {
        let err = CapacityDriven::new()
            .plan(
                &ProblemDescriptor::rows(4, 0, DType::F32).unwrap(),
                &PlatformLimits::new(4, 4096),
                &row_profile(None),
            )
            .unwrap_err();
        assert!(matches!(err, PlannerError::InvalidShape { .. }));
    }

    #[test]
    fn test_row_kernel_row_too_wide_for_tile() {
        // 8 KiB scratch / 4 buffers / 4 B = 512 elements; a 1024-wide row cannot fit.
        let err = CapacityDriven::new()
            .plan(
                &ProblemDescriptor::rows(4, 1024, DType::F32).unwrap(),
                &PlatformLimits::new(4, 8192),
                &row_profile(None),
            )
            .unwrap_err();
        assert!(matches!(err, PlannerError::ExceedsPlatformLimit { .. }));
    }

    #[test]
    fn test_element_kernel_tiles_inside_wide_rows() {
        let plan = CapacityDriven::new()
            .plan(
                &ProblemDescriptor::rows(4, 1024, DType::F32).unwrap(),
                &PlatformLimits::new(4, 8192),
                &TilingProfile::default(),
            )
            .unwrap();
        assert_eq!(plan.unit_elements, 1);
        assert_eq!(plan.tile_element_count(), 512);
        assert_eq!(plan.used_core_count, 4);
        assert_eq!(plan.iteration_count(0), 2);
    }

    #[test]
    fn test_flat_problem_rejected() {
        let err = CapacityDriven::new()
            .plan(
                &ProblemDescriptor::flat(64, DType::F32),
                &PlatformLimits::new(4, 4096),
                &row_profile(None),
            )
            .unwrap_err();
        assert!(matches!(err, PlannerError::InvalidShape { .. }));
    }
}
