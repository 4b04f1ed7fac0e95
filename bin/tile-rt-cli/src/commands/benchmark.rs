// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tile-rt benchmark` command: sweep scratch budgets and core counts.
//!
//! Plans and runs the operator once per combination and prints a
//! comparison table of tile size, iterations, latency and throughput.

use crate::ProblemArgs;
use kernel_runtime::{OperatorSession, RuntimeConfig};
use scratch_memory::ScratchBudget;
use tensor_core::{DType, Shape, Tensor};

pub async fn execute(
    base: RuntimeConfig,
    args: ProblemArgs,
    sweep_scratch: Option<String>,
    sweep_cores: Option<String>,
    runs: usize,
) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║            tile-rt · Benchmark Suite                ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let (config, shape, dtype) = super::resolve(base, &args)?;

    // `None` keeps the platform's own value.
    let budgets: Vec<Option<String>> = match &sweep_scratch {
        Some(list) => list
            .split(',')
            .map(|s| {
                let s = s.trim();
                ScratchBudget::parse(s)
                    .map(|_| Some(s.to_string()))
                    .map_err(|e| anyhow::anyhow!("invalid budget '{s}': {e}"))
            })
            .collect::<Result<_, _>>()?,
        None => vec![config.scratch_budget.clone()],
    };
    let cores: Vec<Option<usize>> = match &sweep_cores {
        Some(list) => list
            .split(',')
            .map(|s| {
                s.trim()
                    .parse::<usize>()
                    .map(Some)
                    .map_err(|e| anyhow::anyhow!("invalid core count '{}': {e}", s.trim()))
            })
            .collect::<Result<_, _>>()?,
        None => vec![config.core_count],
    };

    println!("  Operator: {} on {shape} {dtype}", config.operator);
    println!("  Platform: {}", config.platform);
    println!("  Runs:     {}", runs.max(1));
    println!();

    // ── Results Table ──────────────────────────────────────────
    println!(
        "  {:>8} {:>6} {:>6} {:>8} {:>6} {:>10} {:>10} {:>10}",
        "Scratch", "Cores", "Used", "Tile", "Iters", "Mean", "Best", "MB/s",
    );
    println!("  {}", "-".repeat(74));

    let mut results: Vec<BenchResult> = Vec::new();
    for budget in &budgets {
        for &core_count in &cores {
            let mut run_config = config.clone();
            run_config.scratch_budget = budget.clone();
            run_config.core_count = core_count;
            run_config.enable_profiling = false;

            match run_single(run_config, &shape, dtype, runs.max(1)).await {
                Ok(r) => {
                    println!(
                        "  {:>8} {:>6} {:>6} {:>8} {:>6} {:>8.3}ms {:>8.3}ms {:>10.1}",
                        r.scratch_label,
                        r.cores,
                        r.used_cores,
                        r.tile,
                        r.iterations,
                        r.mean_ms,
                        r.best_ms,
                        r.mb_per_sec,
                    );
                    results.push(r);
                }
                Err(e) => {
                    println!(
                        "  {:>8} {:>6}     FAILED: {e}",
                        budget.as_deref().unwrap_or("default"),
                        core_count.map_or("default".to_string(), |c| c.to_string()),
                    );
                }
            }
        }
    }
    println!();

    // ── Summary ────────────────────────────────────────────────
    let fastest = results.iter().min_by(|a, b| a.best_ms.total_cmp(&b.best_ms));
    let Some(fastest) = fastest else {
        println!("  No successful benchmark runs.");
        return Ok(());
    };
    println!("  Summary:");
    println!(
        "   Fastest: {} scratch on {} cores ({:.3}ms, tile {} elements)",
        fastest.scratch_label, fastest.cores, fastest.best_ms, fastest.tile,
    );
    println!();

    Ok(())
}

#[derive(Debug)]
struct BenchResult {
    scratch_label: String,
    cores: usize,
    used_cores: usize,
    tile: usize,
    iterations: usize,
    mean_ms: f64,
    best_ms: f64,
    mb_per_sec: f64,
}

/// Plans once, warms up once, then times `runs` launches.
async fn run_single(
    config: RuntimeConfig,
    shape: &Shape,
    dtype: DType,
    runs: usize,
) -> anyhow::Result<BenchResult> {
    let ready = OperatorSession::new(config)?
        .plan(shape.clone(), dtype)?
        .prepare()?;
    let plan = ready.plan();
    let input = Tensor::from_f32(
        shape.clone(),
        dtype,
        &super::synthetic_values(shape.num_elements()),
    )?;

    let _ = ready.run_blocking(&input)?;

    let mut total = 0.0;
    let mut best = f64::MAX;
    let mut bytes = 0usize;
    for _ in 0..runs {
        let out = ready.run(input.clone()).await?;
        let ms = out.metrics.total_duration.as_secs_f64() * 1000.0;
        total += ms;
        best = best.min(ms);
        bytes = out.metrics.total_bytes();
    }
    let best_secs = (best / 1000.0).max(f64::EPSILON);

    Ok(BenchResult {
        scratch_label: super::format_bytes(ready.platform().limits.scratch_bytes),
        cores: plan.core_count,
        used_cores: plan.used_core_count,
        tile: plan.tile_element_count(),
        iterations: plan.iteration_count(0),
        mean_ms: total / runs as f64,
        best_ms: best,
        mb_per_sec: bytes as f64 / best_secs / (1024.0 * 1024.0),
    })
}
