// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Property-based tests for the partition invariants.
//!
//! For every problem the planner accepts:
//! - Coverage: core ranges tile `[0, N)` exactly once.
//! - Boundedness: `tile × W × dbf ≤ scratch` and the tile is aligned.
//! - Tail-only-last: only the last used core may differ from the base chunk.
//! - Idempotence: planning twice yields byte-identical records.

use platform_info::PlatformLimits;
use proptest::prelude::*;
use tensor_core::{DType, TileGranularity};
use tiling_planner::{
    auto_plan, CapacityDriven, PlannerError, ProblemDescriptor, TilingPlan, TilingPolicy,
    TilingProfile, UniformChunk,
};

// ── Strategies ─────────────────────────────────────────────────

fn arb_dtype() -> impl Strategy<Value = DType> {
    prop_oneof![
        Just(DType::F32),
        Just(DType::F16),
        Just(DType::BF16),
        Just(DType::I8),
    ]
}

fn arb_limits() -> impl Strategy<Value = PlatformLimits> {
    (
        1usize..=64,
        prop_oneof![Just(4096usize), Just(65536), Just(196608), Just(253952), 4096usize..300_000],
        prop_oneof![Just(32usize), Just(64), Just(16)],
        prop_oneof![Just(0usize), Just(512), Just(2048)],
    )
        .prop_map(|(cores, scratch, align, reserved)| {
            PlatformLimits::new(cores, scratch)
                .with_alignment(align)
                .with_reserved(reserved)
        })
}

fn arb_profile() -> impl Strategy<Value = TilingProfile> {
    (
        1usize..=3,
        prop_oneof![Just(1usize), Just(128)],
        any::<bool>(),
        proptest::option::of(1usize..20_000),
        prop_oneof![Just(TileGranularity::Element), Just(TileGranularity::Row)],
    )
        .prop_map(|(buffers, min_core, align_chunks, max_per_core, granularity)| TilingProfile {
            buffer_count: buffers,
            min_core_elements: min_core,
            align_core_chunks: align_chunks,
            max_elements_per_core: max_per_core,
            granularity,
            ..TilingProfile::default()
        })
}

fn arb_problem() -> impl Strategy<Value = ProblemDescriptor> {
    prop_oneof![
        (1usize..2_000_000, arb_dtype()).prop_map(|(n, d)| ProblemDescriptor::flat(n, d)),
        (1usize..5_000, 1usize..4_096, arb_dtype())
            .prop_map(|(r, c, d)| ProblemDescriptor::rows(r, c, d).unwrap()),
    ]
}

// ── Checks ─────────────────────────────────────────────────────

fn check_invariants(
    plan: &TilingPlan,
    problem: &ProblemDescriptor,
    limits: &PlatformLimits,
) -> Result<(), TestCaseError> {
    let n = problem.total_elements;
    let w = problem.element_bytes();

    prop_assert!(plan.used_core_count >= 1);
    prop_assert!(plan.used_core_count <= limits.core_count);

    // Coverage: contiguous, non-overlapping, exactly [0, N).
    let mut next = 0;
    for a in plan.core_assignment() {
        prop_assert_eq!(a.offset, next);
        prop_assert!(a.elements > 0);
        next += a.elements;
    }
    prop_assert_eq!(next, n);

    // Tail-only-last.
    let base = plan.per_core_element_count();
    for core in 0..plan.used_core_count.saturating_sub(1) {
        prop_assert_eq!(plan.core_element_count(core), base);
    }
    prop_assert!(plan.tail_core_element_count() <= base);
    for core in plan.used_core_count..limits.core_count {
        prop_assert_eq!(plan.core_element_count(core), 0);
        prop_assert_eq!(plan.iteration_count(core), 0);
    }

    // Boundedness.
    let tile = plan.tile_element_count();
    prop_assert!(tile > 0);
    prop_assert!(tile * w * plan.double_buffer_factor() <= limits.scratch_bytes);
    prop_assert_eq!(tile % (limits.alignment_bytes / w), 0);

    // Tiles cover each core's chunk, last one is the remainder.
    for core in [0, plan.used_core_count - 1] {
        let tiles: Vec<_> = plan.tiles(core).collect();
        prop_assert_eq!(tiles.len(), plan.iteration_count(core));
        let covered: usize = tiles.iter().map(|t| t.len).sum();
        prop_assert_eq!(covered, plan.core_element_count(core));
        for t in &tiles[..tiles.len() - 1] {
            prop_assert_eq!(t.len, tile);
        }
    }
    Ok(())
}

// ── Properties ─────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// Every accepted plan satisfies coverage, boundedness and tail-only-last.
    #[test]
    fn prop_plans_hold_invariants(
        problem in arb_problem(),
        limits in arb_limits(),
        profile in arb_profile(),
    ) {
        match auto_plan(&problem, &limits, &profile) {
            Ok(plan) => check_invariants(&plan, &problem, &limits)?,
            Err(PlannerError::InvalidShape { .. }) | Err(PlannerError::ExceedsPlatformLimit { .. }) => {}
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    /// Identical inputs produce byte-identical records.
    #[test]
    fn prop_planning_is_idempotent(
        problem in arb_problem(),
        limits in arb_limits(),
        profile in arb_profile(),
    ) {
        let first = auto_plan(&problem, &limits, &profile);
        let second = auto_plan(&problem, &limits, &profile);
        match (first, second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a.to_record_bytes(), b.to_record_bytes()),
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "planner was not deterministic"),
        }
    }

    /// The record round-trips and re-validates.
    #[test]
    fn prop_record_reads_back(problem in arb_problem(), limits in arb_limits()) {
        if let Ok(plan) = auto_plan(&problem, &limits, &TilingProfile::default()) {
            let bytes = plan.to_record_bytes();
            prop_assert_eq!(TilingPlan::read_from(&bytes).unwrap(), plan);
        }
    }

    /// With fewer elements than cores, each element gets its own core.
    #[test]
    fn prop_small_problems_one_element_per_core(n in 1usize..40, dtype in arb_dtype()) {
        let plan = UniformChunk::new()
            .plan(
                &ProblemDescriptor::flat(n, dtype),
                &PlatformLimits::new(40, 196608),
                &TilingProfile::default(),
            )
            .unwrap();
        prop_assert_eq!(plan.used_core_count, n);
        prop_assert_eq!(plan.per_core_element_count(), 1);
    }

    /// A row wider than the per-core budget always runs on one core.
    #[test]
    fn prop_oversized_rows_use_single_core(
        rows in 1usize..500,
        cols_blocks in 2usize..64,
        cores in 1usize..48,
    ) {
        let cols = cols_blocks * 8;
        let profile = TilingProfile {
            max_elements_per_core: Some(cols - 1),
            ..TilingProfile::default()
        };
        let plan = CapacityDriven::new()
            .plan(
                &ProblemDescriptor::rows(rows, cols, DType::F32).unwrap(),
                &PlatformLimits::new(cores, 196608),
                &profile,
            )
            .unwrap();
        prop_assert_eq!(plan.used_core_count, 1);
        prop_assert!(plan.is_single_core_fallback());
    }
}

// ── Scenarios ──────────────────────────────────────────────────

#[test]
fn scenario_uniform_1024_elements_40_cores() {
    let plan = auto_plan(
        &ProblemDescriptor::flat(1024, DType::F32),
        &PlatformLimits::new(40, 196608),
        &TilingProfile::default(),
    )
    .unwrap();
    assert_eq!(plan.used_core_count, 40);
    assert_eq!(plan.per_core_element_count(), 26);
    assert_eq!(plan.tail_core_element_count(), 10);
}

#[test]
fn scenario_zero_elements() {
    let result = auto_plan(
        &ProblemDescriptor::flat(0, DType::F32),
        &PlatformLimits::new(40, 196608),
        &TilingProfile::default(),
    );
    assert!(matches!(result, Err(PlannerError::InvalidShape { .. })));
}

#[test]
fn scenario_batch_over_row_limit() {
    let result = auto_plan(
        &ProblemDescriptor::rows(200_001, 16, DType::F16).unwrap(),
        &PlatformLimits::new(40, 196608),
        &TilingProfile {
            max_rows: Some(200_000),
            ..TilingProfile::default()
        },
    );
    assert!(matches!(result, Err(PlannerError::InvalidShape { .. })));
}

#[test]
fn scenario_tile_rounds_to_alignment() {
    let profile = TilingProfile {
        buffer_count: 2,
        tensors_per_buffer: 1,
        ..TilingProfile::default()
    };
    for dtype in DType::ALL {
        let plan = auto_plan(
            &ProblemDescriptor::flat(1 << 22, dtype),
            &PlatformLimits::new(1, 196608),
            &profile,
        )
        .unwrap();
        let align = 32 / dtype.size_bytes();
        assert!(plan.tile_element_count() > 0, "{dtype}");
        assert_eq!(plan.tile_element_count() % align, 0, "{dtype}");
        assert!(plan.tile_bytes() * 2 <= 196608);
    }
}

#[test]
fn plan_serializes_to_json() {
    let plan = auto_plan(
        &ProblemDescriptor::rows(64, 128, DType::BF16).unwrap(),
        &PlatformLimits::new(8, 65536),
        &TilingProfile::default(),
    )
    .unwrap();
    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["used_core_count"], 8);
    assert_eq!(json["variant"], plan.variant.raw());
}
