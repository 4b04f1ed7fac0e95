// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tile-rt status` command: display platform limits and kernels.
//!
//! Lists the built-in presets next to what the host probe reads from
//! sysfs. On hosts without sysfs (containers, macOS) the probe falls back
//! to defaults and is marked as degraded; the command still works.

use kernel_runtime::RuntimeConfig;
use platform_info::{HostPlatform, PlatformInfo, PlatformLimits, Preset};
use tensor_core::{available_kernels, kernel_by_name, TileGranularity};

pub async fn execute(base: RuntimeConfig) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║            tile-rt · Platform Status                ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    // ── Platforms ──────────────────────────────────────────────
    println!(
        "  {:<10} {:>6} {:>10} {:>10} {:>6}",
        "Platform", "Cores", "Scratch", "Usable", "Align",
    );
    println!("  {}", "-".repeat(46));
    for preset in Preset::ALL {
        print_limits(preset.as_str(), &preset.limits());
    }
    let host = HostPlatform::probe();
    print_limits("host", &host.limits());
    if host.degraded {
        println!("  (host probe degraded: some values are fallbacks)");
    }
    println!();

    // ── Active Configuration ───────────────────────────────────
    println!("  Configuration");
    match base.resolve_platform() {
        Ok(snapshot) => println!("   {}", snapshot.summary()),
        Err(e) => println!("   Platform '{}' unavailable: {e}", base.platform),
    }
    println!("   Operator:     {}", base.operator);
    println!(
        "   Buffering:    {} buffers × {} tensors",
        base.buffer_count, base.tensors_per_buffer,
    );
    match base.completion() {
        Ok(order) => println!("   Completion:   {order}"),
        Err(e) => println!("   Completion:   {e}"),
    }
    println!();

    // ── Kernels ────────────────────────────────────────────────
    println!("  Kernels");
    for name in available_kernels() {
        let granularity = match kernel_by_name(name).map(|k| k.granularity()) {
            Some(TileGranularity::Row) => "row",
            Some(TileGranularity::Element) => "element",
            None => "?",
        };
        println!("   {name:<14} {granularity}");
    }
    println!();

    Ok(())
}

fn print_limits(label: &str, limits: &PlatformLimits) {
    println!(
        "  {:<10} {:>6} {:>10} {:>10} {:>4} B",
        label,
        limits.core_count,
        super::format_bytes(limits.scratch_bytes),
        super::format_bytes(limits.usable_scratch_bytes()),
        limits.alignment_bytes,
    );
}
