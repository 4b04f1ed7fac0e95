// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # kernel-runtime
//!
//! Executes a [`TilingPlan`](tiling_planner::TilingPlan) on every core of
//! the platform.
//!
//! The runtime takes:
//! - A validated plan from `tiling-planner` (computed locally or decoded
//!   from a transport record).
//! - A [`TileKernel`](tensor_core::TileKernel) from `tensor-core`.
//! - Global input and output buffers.
//!
//! And runs the same pipelined double-buffer loop on each core, overlapping
//! the copy-in of tile `i + 1` with the compute of tile `i` through a ring
//! of scratch slots from `scratch-memory`.
//!
//! # Type-State Pipeline
//! ```text
//! OperatorSession<Idle> → OperatorSession<Planned> → OperatorSession<Ready>
//! ```
//! Transitions are compile-time checked.
//!
//! # Completion order
//! Operations retire only when a core waits on an event, in the order
//! chosen by [`CompletionOrder`]. Running the same launch in-order,
//! reversed and shuffled must give byte-identical output; anything else
//! means a missing wait.

mod config;
mod context;
mod dispatch;
mod error;
mod event;
mod executor;
mod launcher;
mod metrics;
mod session;

pub use config::RuntimeConfig;
pub use dispatch::KernelVariant;
pub use error::RuntimeError;
pub use event::{CompletionOrder, Event, Pipe};
pub use executor::{CoreState, PipelinedExecutor};
pub use launcher::KernelLauncher;
pub use metrics::{CoreMetrics, LaunchMetrics};
pub use session::{Idle, LaunchOutput, OperatorSession, Planned, Ready, SessionState};
