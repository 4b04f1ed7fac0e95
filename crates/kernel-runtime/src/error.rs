// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the kernel runtime.

/// Errors that can occur while preparing or running a tiled launch.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The executor was handed a plan it cannot honour, or its own event
    /// discipline let two stages touch the same scratch region. Always fatal.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// Input or output buffer does not match the plan.
    #[error("{buffer} buffer is {actual} bytes, plan needs {expected}")]
    BufferSizeMismatch {
        buffer: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The tiling planner rejected the problem.
    #[error("planner error: {0}")]
    Planner(#[from] tiling_planner::PlannerError),

    /// Scratch carving failed.
    #[error("scratch error: {0}")]
    Memory(#[from] scratch_memory::MemoryError),

    /// A tile kernel failed.
    #[error("kernel error: {0}")]
    Kernel(#[from] tensor_core::TensorError),

    /// The platform could not be resolved.
    #[error("platform error: {0}")]
    Platform(#[from] platform_info::PlatformError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// No kernel is registered under the configured operator name.
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    /// A worker thread or blocking task failed to complete.
    #[error("worker failed: {0}")]
    Join(String),
}

impl RuntimeError {
    pub(crate) fn contract(detail: impl Into<String>) -> Self {
        Self::ContractViolation(detail.into())
    }
}
