// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tile-rt
//!
//! Command-line interface for the tiled vector kernel runtime.
//!
//! ## Usage
//! ```bash
//! # Show the tiling plan for a tensor
//! tile-rt plan --shape 1024 --dtype f32 --platform standard
//!
//! # Run a kernel with out-of-order completion and verify the result
//! tile-rt run --operator softmax --shape 512x256 --dtype bf16 --order shuffled --seed 7
//!
//! # Sweep scratch budgets and core counts
//! tile-rt benchmark --operator gelu --shape 1048576 --sweep-scratch 16K,64K,192K
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tile-rt",
    about = "Tiling planner and pipelined executor for vector kernels",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file (CLI arguments override it).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that plans an operator.
#[derive(clap::Args, Debug, Clone)]
pub struct ProblemArgs {
    /// Tensor shape, e.g. "1024" or "4x128x64".
    #[arg(short, long)]
    shape: String,

    /// Element type: f32, f16, bf16, i8.
    #[arg(short, long, default_value = "f32")]
    dtype: String,

    /// Tile kernel name (see `tile-rt status`).
    #[arg(short, long)]
    operator: Option<String>,

    /// Platform preset name or "host".
    #[arg(short, long)]
    platform: Option<String>,

    /// Per-core scratch override (e.g., "64K").
    #[arg(long)]
    scratch: Option<String>,

    /// Core count override.
    #[arg(long)]
    cores: Option<usize>,

    /// Tiling policy: uniform-chunk, capacity-driven.
    #[arg(long)]
    policy: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute and print the tiling plan for a tensor.
    Plan {
        #[command(flatten)]
        problem: ProblemArgs,

        /// Print the plan as JSON.
        #[arg(long)]
        json: bool,

        /// Also print the transport record as hex.
        #[arg(long)]
        record: bool,
    },

    /// Plan, execute and verify one operator launch.
    Run {
        #[command(flatten)]
        problem: ProblemArgs,

        /// Completion order: in-order, reverse, shuffled.
        #[arg(long)]
        order: Option<String>,

        /// Seed for the shuffled completion order.
        #[arg(long)]
        seed: Option<u64>,

        /// Print launch metrics as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Sweep scratch budgets and core counts for one operator.
    Benchmark {
        #[command(flatten)]
        problem: ProblemArgs,

        /// Comma-separated scratch budgets to sweep (e.g., "16K,64K,192K").
        #[arg(long)]
        sweep_scratch: Option<String>,

        /// Comma-separated core counts to sweep (e.g., "1,8,40").
        #[arg(long)]
        sweep_cores: Option<String>,

        /// Timed runs per configuration.
        #[arg(long, default_value_t = 5)]
        runs: usize,
    },

    /// Display platform presets, the host probe and available kernels.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);
    let base = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Plan {
            problem,
            json,
            record,
        } => commands::plan::execute(base, problem, json, record).await,
        Commands::Run {
            problem,
            order,
            seed,
            json,
        } => commands::run::execute(base, problem, order, seed, json).await,
        Commands::Benchmark {
            problem,
            sweep_scratch,
            sweep_cores,
            runs,
        } => commands::benchmark::execute(base, problem, sweep_scratch, sweep_cores, runs).await,
        Commands::Status => commands::status::execute(base).await,
    }
}
