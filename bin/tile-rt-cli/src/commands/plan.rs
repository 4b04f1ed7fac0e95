// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tile-rt plan` command: print the tiling plan for one tensor.

use crate::ProblemArgs;
use kernel_runtime::{OperatorSession, RuntimeConfig};

pub async fn execute(
    base: RuntimeConfig,
    args: ProblemArgs,
    json: bool,
    show_record: bool,
) -> anyhow::Result<()> {
    let (config, shape, dtype) = super::resolve(base, &args)?;
    let planned = OperatorSession::new(config)?.plan(shape.clone(), dtype)?;
    let plan = planned.plan();

    if json {
        println!("{}", serde_json::to_string_pretty(plan)?);
        return Ok(());
    }

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              tile-rt · Tiling Plan                  ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
    println!("  {}", planned.platform().summary());
    println!("  Operator: {} on {shape} {dtype}", planned.kernel().name());
    println!();
    println!("  {}", plan.summary());
    println!();

    // ── Per-core Assignment ────────────────────────────────────
    println!(
        "  {:>6} {:>12} {:>12} {:>12}",
        "Core", "Offset", "Elements", "Iterations",
    );
    println!("  {}", "-".repeat(46));
    let assignment = plan.core_assignment();
    let shown = assignment.len().min(8);
    for a in &assignment[..shown] {
        println!(
            "  {:>6} {:>12} {:>12} {:>12}",
            a.core, a.offset, a.elements, a.iterations,
        );
    }
    if assignment.len() > shown {
        // Every middle core matches core 0; the last holds the tail.
        let last = assignment[assignment.len() - 1];
        println!("  {:>6}", "...");
        println!(
            "  {:>6} {:>12} {:>12} {:>12}",
            last.core, last.offset, last.elements, last.iterations,
        );
    }
    let idle = plan.core_count - plan.used_core_count;
    if idle > 0 {
        println!("  ({idle} idle cores)");
    }
    println!();

    // ── Scratch ────────────────────────────────────────────────
    let used = plan.tile_bytes() * plan.double_buffer_factor();
    println!("  Scratch");
    println!(
        "   Tile:     {} ({} B × {} buffers × {} tensors)",
        super::format_bytes(plan.tile_bytes()),
        plan.tile_bytes(),
        plan.buffer_count,
        plan.tensors_per_buffer,
    );
    println!(
        "   Used:     {} of {} ({:.1}%)",
        super::format_bytes(used),
        super::format_bytes(plan.scratch_bytes),
        used as f64 / plan.scratch_bytes.max(1) as f64 * 100.0,
    );
    println!();

    if show_record {
        let record = planned.record();
        let hex: String = record.iter().map(|b| format!("{b:02x}")).collect();
        println!("  Record ({} B)", record.len());
        for line in hex.as_bytes().chunks(64) {
            println!("   {}", String::from_utf8_lossy(line));
        }
        println!();
    }

    Ok(())
}
