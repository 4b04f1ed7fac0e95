// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`TilingPolicy`] trait and the shared split/tile arithmetic.
//!
//! Both policies follow the same three steps: pick a per-core granularity,
//! derive how many cores are actually needed, and give the remainder to the
//! last used core. They differ only in where the granularity comes from.

pub mod capacity;
pub mod uniform;

use crate::problem::RowShape;
use crate::variant::{Layout, Template, VariantKey};
use crate::{PlannerError, ProblemDescriptor, TilingPlan, TilingProfile};
use platform_info::PlatformLimits;
use tensor_core::TileGranularity;

/// Trait for tiling policies.
///
/// Policies are pure functions of their inputs: no I/O, no hidden state,
/// and identical inputs always yield identical plans.
pub trait TilingPolicy: Send + Sync {
    /// Human-readable name of this policy.
    fn name(&self) -> &str;

    /// Produces a validated plan, or fails before any work is assigned.
    fn plan(
        &self,
        problem: &ProblemDescriptor,
        limits: &PlatformLimits,
        profile: &TilingProfile,
    ) -> Result<TilingPlan, PlannerError>;
}

/// Per-core chunking in units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Split {
    pub base: usize,
    pub used: usize,
    pub tail: usize,
}

impl Split {
    /// Everything on one core.
    pub fn single(count: usize) -> Self {
        Self {
            base: count,
            used: 1,
            tail: count,
        }
    }
}

/// `base = ceil(count / cores)` (raised to `min_units`, optionally rounded
/// up to `align_units`), `used = ceil(count / base)`, last core takes the
/// rest.
pub(crate) fn split_units(
    count: usize,
    cores: usize,
    min_units: usize,
    align_units: Option<usize>,
) -> Split {
    let mut base = count.div_ceil(cores.max(1)).max(min_units.max(1));
    if let Some(align) = align_units.filter(|&a| a > 1) {
        base = base.div_ceil(align) * align;
    }
    let base = base.min(count);
    let used = count.div_ceil(base);
    let tail = count - base * (used - 1);
    Split { base, used, tail }
}

/// Platform-derived sizes shared by every policy.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Geometry {
    pub element_bytes: usize,
    /// `alignment_bytes / W`.
    pub align_elems: usize,
    /// Largest aligned tile, in elements.
    pub capacity: usize,
}

/// Validates the inputs and sizes the largest tile:
/// `floor(usable_scratch / dbf / W)` rounded down to `alignment / W`.
pub(crate) fn geometry(
    problem: &ProblemDescriptor,
    limits: &PlatformLimits,
    profile: &TilingProfile,
) -> Result<Geometry, PlannerError> {
    limits.validate()?;
    profile.check()?;

    if problem.total_elements == 0 {
        return Err(PlannerError::invalid_shape("problem has zero elements"));
    }

    let w = problem.element_bytes();
    if limits.alignment_bytes < w || limits.alignment_bytes % w != 0 {
        return Err(PlannerError::exceeds_limit(format!(
            "{} B alignment cannot hold whole {}-byte elements",
            limits.alignment_bytes, w
        )));
    }
    let align_elems = limits.alignment_bytes / w;

    let raw = limits.usable_scratch_bytes() / profile.double_buffer_factor() / w;
    let capacity = raw / align_elems * align_elems;
    if capacity == 0 {
        return Err(PlannerError::exceeds_limit(format!(
            "{} B of scratch over {} buffers cannot hold one aligned {}-element {} tile",
            limits.usable_scratch_bytes(),
            profile.double_buffer_factor(),
            align_elems,
            problem.dtype
        )));
    }

    Ok(Geometry {
        element_bytes: w,
        align_elems,
        capacity,
    })
}

/// Row-problem checks shared by both policies. Returns the row shape and
/// whether its last dimension is aligned.
pub(crate) fn check_rows(
    rows: RowShape,
    profile: &TilingProfile,
    geo: &Geometry,
) -> Result<bool, PlannerError> {
    if rows.rows == 0 || rows.cols == 0 {
        return Err(PlannerError::invalid_shape(format!(
            "{} rows × {} cols has a zero dimension",
            rows.rows, rows.cols
        )));
    }
    if let Some(max) = profile.max_rows {
        if rows.rows > max {
            return Err(PlannerError::invalid_shape(format!(
                "{} rows exceeds the limit of {max}",
                rows.rows
            )));
        }
    }

    let aligned = rows.cols % geo.align_elems == 0;
    if !aligned && profile.misalignment == crate::MisalignmentPolicy::Reject {
        return Err(PlannerError::invalid_shape(format!(
            "last dimension {} is not a multiple of {} elements",
            rows.cols, geo.align_elems
        )));
    }
    Ok(aligned)
}

/// Smallest row count whose element total is a multiple of the alignment.
pub(crate) fn row_granule(cols: usize, align_elems: usize) -> usize {
    align_elems / gcd(cols, align_elems)
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Sizes the tile for a split and builds the validated plan.
pub(crate) fn assemble(
    problem: &ProblemDescriptor,
    limits: &PlatformLimits,
    profile: &TilingProfile,
    geo: &Geometry,
    split: Split,
    template: Template,
) -> Result<TilingPlan, PlannerError> {
    let (unit, base, tail, tile, rows, cols, layout) = match problem.rows {
        None => {
            let tile = geo.capacity.min(round_up(split.base, geo.align_elems));
            (1, split.base, split.tail, tile, 0, 0, Layout::Flat)
        }
        Some(shape) => {
            let granule = row_granule(shape.cols, geo.align_elems);
            let rows_cap = geo.capacity / shape.cols / granule * granule;
            let rows_per_tile = rows_cap.min(round_up(split.base, granule));

            if rows_per_tile > 0 {
                (shape.cols, split.base, split.tail, rows_per_tile, shape.rows, shape.cols, Layout::Rows)
            } else if profile.granularity == TileGranularity::Row {
                return Err(PlannerError::exceeds_limit(format!(
                    "{} rows of {} elements do not fit a {}-element tile",
                    granule, shape.cols, geo.capacity
                )));
            } else {
                // No aligned whole-row tile fits; element kernels may cut rows.
                let base = split.base * shape.cols;
                let tile = geo.capacity.min(round_up(base, geo.align_elems));
                (1, base, split.tail * shape.cols, tile, shape.rows, shape.cols, Layout::Rows)
            }
        }
    };

    let plan = TilingPlan {
        total_elements: problem.total_elements,
        element_bytes: geo.element_bytes,
        core_count: limits.core_count,
        used_core_count: split.used,
        unit_elements: unit,
        base_units: base,
        tail_units: tail,
        tile_units: tile,
        buffer_count: profile.buffer_count,
        tensors_per_buffer: profile.tensors_per_buffer,
        scratch_bytes: limits.usable_scratch_bytes(),
        alignment_bytes: limits.alignment_bytes,
        variant: VariantKey::new(layout, template, problem.dtype),
        rows,
        cols,
    };
    plan.validate()?;
    Ok(plan)
}

fn round_up(value: usize, multiple: usize) -> usize {
    value.div_ceil(multiple) * multiple
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_uniform() {
        assert_eq!(split_units(1024, 40, 1, None), Split { base: 26, used: 40, tail: 10 });
        assert_eq!(split_units(80, 40, 1, None), Split { base: 2, used: 40, tail: 2 });
    }

    #[test]
    fn test_split_fewer_elements_than_cores() {
        assert_eq!(split_units(5, 40, 1, None), Split { base: 1, used: 5, tail: 1 });
    }

    #[test]
    fn test_split_min_chunk() {
        // 1000 elements with a 128-element floor use 8 cores.
        assert_eq!(split_units(1000, 40, 128, None), Split { base: 128, used: 8, tail: 104 });
        assert_eq!(split_units(50, 40, 128, None), Split::single(50));
    }

    #[test]
    fn test_split_aligned_chunks() {
        assert_eq!(split_units(1024, 40, 1, Some(8)), Split { base: 32, used: 32, tail: 32 });
        assert_eq!(split_units(1030, 40, 1, Some(8)), Split { base: 32, used: 33, tail: 6 });
    }

    #[test]
    fn test_row_granule() {
        assert_eq!(row_granule(16, 8), 1);
        assert_eq!(row_granule(12, 8), 2);
        assert_eq!(row_granule(7, 8), 8);
        assert_eq!(row_granule(10, 16), 8);
    }

    #[test]
    fn test_geometry_tile_capacity() {
        let limits = PlatformLimits::new(40, 196608);
        let profile = TilingProfile::default();
        let geo = geometry(
            &ProblemDescriptor::flat(10, tensor_core::DType::F32),
            &limits,
            &profile,
        )
        .unwrap();
        assert_eq!(geo.align_elems, 8);
        assert_eq!(geo.capacity, 12288);
    }
}
