// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tile-rt run` command: execute one launch and verify it.
//!
//! Demonstrates the full type-state pipeline:
//! ```text
//! OperatorSession<Idle> → plan → <Planned> → prepare → <Ready> → run
//! ```
//! The output is compared byte for byte against a single untiled pass of
//! the same kernel.

use crate::ProblemArgs;
use kernel_runtime::{LaunchMetrics, OperatorSession, RuntimeConfig};
use tensor_core::{reference_apply, Tensor};

pub async fn execute(
    base: RuntimeConfig,
    args: ProblemArgs,
    order: Option<String>,
    seed: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let (mut config, shape, dtype) = super::resolve(base, &args)?;
    if let Some(order) = order {
        config.completion_order = order;
    }
    if let Some(seed) = seed {
        config.completion_seed = seed;
    }
    let completion = config.completion()?;

    // ── Type-State Pipeline ────────────────────────────────────
    let planned = OperatorSession::new(config)?.plan(shape.clone(), dtype)?;
    let ready = planned.prepare()?;
    let plan = ready.plan();

    let input = Tensor::from_f32(
        shape.clone(),
        dtype,
        &super::synthetic_values(shape.num_elements()),
    )?;
    let expected = reference_apply(ready.kernel(), dtype, plan.row_len(), input.as_bytes())?;

    let output = ready.run(input).await?;
    let verified = output.tensor.as_bytes() == expected.as_slice();
    if !verified {
        tracing::error!("tiled output differs from the untiled reference");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&output.metrics)?);
    } else {
        println!("╔══════════════════════════════════════════════════════╗");
        println!("║              tile-rt · Kernel Runner                ║");
        println!("╚══════════════════════════════════════════════════════╝");
        println!();
        println!("  {}", ready.platform().summary());
        println!("  {}", plan.summary());
        println!("  Completion: {completion}");
        println!();
        print_metrics(&output.metrics);
        println!(
            "  Verification: {}",
            if verified { "OK (matches untiled reference)" } else { "MISMATCH" },
        );
        println!();
    }

    if !verified {
        anyhow::bail!("verification failed for '{}' on {shape} {dtype}", ready.kernel().name());
    }
    Ok(())
}

fn print_metrics(metrics: &LaunchMetrics) {
    println!("  Metrics:");
    println!("   {}", metrics.summary());
    println!(
        "   Critical path: {:.3}ms, throughput {:.1} MB/s",
        metrics.critical_path().as_secs_f64() * 1000.0,
        metrics.throughput_bytes_per_sec() / (1024.0 * 1024.0),
    );
    let busiest = metrics.cores.iter().max_by_key(|c| c.duration);
    if let Some(core) = busiest {
        println!(
            "   Busiest core:  #{} ({} tiles, {} waits, {} in flight max)",
            core.core, core.iterations, core.blocking_waits, core.max_in_flight,
        );
    }
    println!();
}
