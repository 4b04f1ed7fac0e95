// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Uniform-chunk-with-tail policy.
//!
//! `base = ceil(N / cores)`, `used = ceil(N / base)`, and the last used core
//! takes `N - base * (used - 1)`. Row problems are split the same way with
//! whole rows as the unit.
//!
//! # When to use
//! - Element-wise operators with no per-row cost.
//! - As the baseline the capacity-driven policy is compared against.

use super::{assemble, check_rows, geometry, row_granule, split_units, Split, TilingPolicy};
use crate::variant::Template;
use crate::{PlannerError, ProblemDescriptor, TilingPlan, TilingProfile};
use platform_info::PlatformLimits;
use tensor_core::TileGranularity;

/// Equal chunks for every used core, remainder on the last.
#[derive(Debug, Clone, Default)]
pub struct UniformChunk;

impl UniformChunk {
    pub fn new() -> Self {
        Self
    }
}

impl TilingPolicy for UniformChunk {
    fn name(&self) -> &str {
        "uniform-chunk"
    }

    fn plan(
        &self,
        problem: &ProblemDescriptor,
        limits: &PlatformLimits,
        profile: &TilingProfile,
    ) -> Result<TilingPlan, PlannerError> {
        let geo = geometry(problem, limits, profile)?;

        let (split, template) = match problem.rows {
            None => {
                if profile.granularity == TileGranularity::Row {
                    return Err(PlannerError::invalid_shape(
                        "row-granular kernel needs a row decomposition",
                    ));
                }
                let align = profile.align_core_chunks.then_some(geo.align_elems);
                let split = split_units(
                    problem.total_elements,
                    limits.core_count,
                    profile.min_core_elements,
                    align,
                );
                (split, Template::Parallel)
            }
            Some(shape) => {
                if check_rows(shape, profile, &geo)? {
                    let align = profile
                        .align_core_chunks
                        .then(|| row_granule(shape.cols, geo.align_elems));
                    let min_rows = profile.min_core_elements.div_ceil(shape.cols);
                    let split = split_units(shape.rows, limits.core_count, min_rows, align);
                    (split, Template::Parallel)
                } else {
                    (Split::single(shape.rows), Template::SingleCoreFallback)
                }
            }
        };

        tracing::debug!(
            policy = self.name(),
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
    use crate::MisalignmentPolicy;
    use tensor_core::DType;

    fn profile_dbf2() -> TilingProfile {
        TilingProfile {
            tensors_per_buffer: 1,
            ..TilingProfile::default()
        }
    }

    #[test]
    fn test_scenario_1024_over_40_cores() {
        let plan = UniformChunk::new()
            .plan(
                &ProblemDescriptor::flat(1024, DType::F32),
                &PlatformLimits::new(40, 196608),
                &TilingProfile::default(),
            )
            .unwrap();
        assert_eq!(plan.used_core_count, 40);
        assert_eq!(plan.per_core_element_count(), 26);
        assert_eq!(plan.tail_core_element_count(), 1024 - 26 * 39);
        assert_eq!(plan.tile_element_count(), 32);
        assert_eq!(plan.iteration_count(0), 1);
    }

    #[test]
    fn test_zero_elements_is_invalid_shape() {
        let err = UniformChunk::new()
            .plan(
                &ProblemDescriptor::flat(0, DType::F32),
                &PlatformLimits::new(40, 196608),
                &TilingProfile::default(),
            )
            .unwrap_err();
        assert!(matches!(err, PlannerError::InvalidShape { .. }));
    }

    #[test]
    fn test_tile_from_scratch_double_buffered() {
        // 196608 B / 2 buffers / 4 B = 24576 elements, a multiple of 8.
        let plan = UniformChunk::new()
            .plan(
                &ProblemDescriptor::flat(1 << 20, DType::F32),
                &PlatformLimits::new(1, 196608),
                &profile_dbf2(),
            )
            .unwrap();
        assert_eq!(plan.tile_element_count(), 24576);
        assert_eq!(plan.iteration_count(0), (1usize << 20).div_ceil(24576));
        let last = plan.tiles(0).last().unwrap();
        assert_eq!(last.len, (1 << 20) % 24576);
    }

    #[test]
    fn test_tile_nonzero_for_every_dtype() {
        for dtype in DType::ALL {
            let plan = UniformChunk::new()
                .plan(
                    &ProblemDescriptor::flat(1 << 20, dtype),
                    &PlatformLimits::new(1, 196608),
                    &profile_dbf2(),
                )
                .unwrap();
            let align = 32 / dtype.size_bytes();
            assert!(plan.tile_element_count() > 0);
            assert_eq!(plan.tile_element_count() % align, 0, "{dtype}");
            assert_eq!(plan.tile_element_count(), 196608 / 2 / dtype.size_bytes());
        }
    }

    #[test]
    fn test_scratch_too_small() {
        // 100 B / 4 buffers / 4 B = 6 elements, rounds down to 0 of 8.
        let err = UniformChunk::new()
            .plan(
                &ProblemDescriptor::flat(64, DType::F32),
                &PlatformLimits::new(2, 100),
                &TilingProfile::default(),
            )
            .unwrap_err();
        assert!(matches!(err, PlannerError::ExceedsPlatformLimit { .. }));
    }

    #[test]
    fn test_alignment_narrower_than_element() {
        let err = UniformChunk::new()
            .plan(
                &ProblemDescriptor::flat(64, DType::F32),
                &PlatformLimits::new(2, 4096).with_alignment(2),
                &TilingProfile::default(),
            )
            .unwrap_err();
        assert!(matches!(err, PlannerError::ExceedsPlatformLimit { .. }));
    }

    #[test]
    fn test_fewer_elements_than_cores() {
        let plan = UniformChunk::new()
            .plan(
                &ProblemDescriptor::flat(7, DType::F16),
                &PlatformLimits::new(40, 196608),
                &TilingProfile::default(),
            )
            .unwrap();
        assert_eq!(plan.used_core_count, 7);
        assert_eq!(plan.per_core_element_count(), 1);
        assert_eq!(plan.tail_core_element_count(), 1);
        assert_eq!(plan.tile_element_count(), 16);
    }

    #[test]
    fn test_rows_split_whole_rows() {
        let plan = UniformChunk::new()
            .plan(
                &ProblemDescriptor::rows(10, 64, DType::F32).unwrap(),
                &PlatformLimits::new(4, 65536),
                &TilingProfile {
                    granularity: TileGranularity::Row,
                    ..TilingProfile::default()
                },
            )
            .unwrap();
        assert_eq!(plan.unit_elements, 64);
        assert_eq!(plan.used_core_count, 4);
        assert_eq!(plan.per_core_element_count(), 3 * 64);
        assert_eq!(plan.tail_core_element_count(), 64);
        assert_eq!(plan.tile_element_count() % 64, 0);
    }

    #[test]
    fn test_misaligned_rows_fall_back_or_reject() {
        let problem = ProblemDescriptor::rows(32, 13, DType::F32).unwrap();
        let limits = PlatformLimits::new(8, 65536);

        let plan = UniformChunk::new()
            .plan(&problem, &limits, &TilingProfile::default())
            .unwrap();
        assert_eq!(plan.used_core_count, 1);
        assert!(plan.is_single_core_fallback());

        let strict = TilingProfile {
            misalignment: MisalignmentPolicy::Reject,
            ..TilingProfile::default()
        };
        assert!(matches!(
            UniformChunk::new().plan(&problem, &limits, &strict),
            Err(PlannerError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_row_kernel_on_flat_problem() {
        let err = UniformChunk::new()
            .plan(
                &ProblemDescriptor::flat(64, DType::F32),
                &PlatformLimits::new(2, 4096),
                &TilingProfile {
                    granularity: TileGranularity::Row,
                    ..TilingProfile::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, PlannerError::InvalidShape { .. }));
    }
}
