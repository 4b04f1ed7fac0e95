// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

pub mod benchmark;
pub mod plan;
pub mod run;
pub mod status;

use crate::ProblemArgs;
use anyhow::Context;
use kernel_runtime::RuntimeConfig;
use std::path::Path;
use tensor_core::{DType, Shape};
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Loads the base configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<RuntimeConfig> {
    match path {
        Some(path) => RuntimeConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(RuntimeConfig::default()),
    }
}

/// Applies command-line overrides on top of `base`.
pub fn resolve(
    mut base: RuntimeConfig,
    args: &ProblemArgs,
) -> anyhow::Result<(RuntimeConfig, Shape, DType)> {
    if let Some(op) = &args.operator {
        base.operator = op.clone();
    }
    if let Some(platform) = &args.platform {
        base.platform = platform.clone();
    }
    if let Some(scratch) = &args.scratch {
        base.scratch_budget = Some(scratch.clone());
    }
    if args.cores.is_some() {
        base.core_count = args.cores;
    }
    if let Some(policy) = &args.policy {
        base.policy = Some(policy.clone());
    }

    let shape = parse_shape(&args.shape)?;
    let dtype: DType = args.dtype.parse()?;
    Ok((base, shape, dtype))
}

/// Parses `"4x128x64"` (or comma-separated) into a shape.
pub fn parse_shape(s: &str) -> anyhow::Result<Shape> {
    let dims = s
        .split(|c| c == 'x' || c == 'X' || c == ',')
        .map(|d| {
            d.trim()
                .parse::<usize>()
                .map_err(|e| anyhow::anyhow!("invalid dimension '{}' in '{s}': {e}", d.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if dims.is_empty() {
        anyhow::bail!("empty shape");
    }
    Ok(Shape::new(dims))
}

/// Deterministic test data covering negatives and zero.
pub fn synthetic_values(n: usize) -> Vec<f32> {
    (0..n).map(|i| ((i * 37) % 101) as f32 * 0.08 - 4.0).collect()
}

/// Human-readable byte count.
pub fn format_bytes(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
