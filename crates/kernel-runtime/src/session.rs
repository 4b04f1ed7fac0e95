// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! One operator invocation with a type-state enforced pipeline.
//!
//! ```text
//! OperatorSession<Idle>
//!     │  .plan(shape, dtype)   or   OperatorSession::from_record(..)
//!     ▼
//! OperatorSession<Planned>
//!     │  .prepare()
//!     ▼
//! OperatorSession<Ready>
//!     │  .run(tensor).await
//!     ▼
//!   LaunchOutput
//! ```
//!
//! Each state transition consumes the old value and returns a new one,
//! making invalid state sequences a compile error. All planning failures
//! surface before `Ready` exists, so `run` never starts work it cannot
//! finish for shape reasons.

use crate::{CompletionOrder, KernelLauncher, LaunchMetrics, PipelinedExecutor, RuntimeConfig, RuntimeError};
use platform_info::PlatformSnapshot;
use std::sync::Arc;
use tensor_core::{DType, Shape, Tensor, TileKernel};
use tiling_planner::{auto_plan, ProblemDescriptor, TilingPlan};

// ── Type-state markers ─────────────────────────────────────────

/// Session is configured but nothing is planned.
#[derive(Debug)]
pub struct Idle;

/// A validated plan exists for one shape and dtype.
#[derive(Debug)]
pub struct Planned {
    plan: TilingPlan,
    shape: Shape,
    dtype: DType,
}

/// Worker pool is up and the executor accepted the plan.
#[derive(Debug)]
pub struct Ready {
    plan: Arc<TilingPlan>,
    shape: Shape,
    dtype: DType,
    order: CompletionOrder,
    profiling: bool,
    pool: Arc<rayon::ThreadPool>,
}

/// Sealed trait for session states.
pub trait SessionState: std::fmt::Debug {}
impl SessionState for Idle {}
impl SessionState for Planned {}
impl SessionState for Ready {}

// ── Output ─────────────────────────────────────────────────────

/// The result of one run.
#[derive(Debug)]
pub struct LaunchOutput {
    pub tensor: Tensor,
    pub metrics: LaunchMetrics,
}

// ── Session ────────────────────────────────────────────────────

/// A single tiled operator, from configuration to results.
///
/// # Example
/// ```no_run
/// use kernel_runtime::{OperatorSession, RuntimeConfig};
/// use tensor_core::{DType, Shape, Tensor};
///
/// # async fn example() -> Result<(), kernel_runtime::RuntimeError> {
/// let session = OperatorSession::new(RuntimeConfig::default())?
///     .plan(Shape::vector(4096), DType::F16)?
///     .prepare()?;
/// let input = Tensor::zeros(Shape::vector(4096), DType::F16);
/// let output = session.run(input).await?;
/// println!("{}", output.metrics.summary());
/// # Ok(())
/// # }
/// ```
pub struct OperatorSession<S: SessionState = Idle> {
    config: RuntimeConfig,
    kernel: Arc<dyn TileKernel>,
    platform: PlatformSnapshot,
    state: S,
}

// ── Idle → Planned ─────────────────────────────────────────────

impl OperatorSession<Idle> {
    /// Resolves the operator and reads the platform once.
    pub fn new(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        let kernel = tensor_core::kernel_by_name(&config.operator)
            .ok_or_else(|| RuntimeError::UnknownOperator(config.operator.clone()))?;
        let platform = config.resolve_platform()?;
        tracing::info!("session for '{}' on {}", kernel.name(), platform.summary());

        Ok(Self {
            config,
            kernel,
            platform,
            state: Idle,
        })
    }

    /// Plans the operator for one input shape and dtype.
    pub fn plan(self, shape: Shape, dtype: DType) -> Result<OperatorSession<Planned>, RuntimeError> {
        let profile = self.config.profile(self.kernel.granularity());
        let problem = ProblemDescriptor::from_shape(&shape, dtype, profile.granularity)?;
        let limits = self.platform.limits;

        let plan = match self.config.create_policy()? {
            Some(policy) => policy.plan(&problem, &limits, &profile)?,
            None => auto_plan(&problem, &limits, &profile)?,
        };
        tracing::info!("{}", plan.summary());

        Ok(OperatorSession {
            config: self.config,
            kernel: self.kernel,
            platform: self.platform,
            state: Planned { plan, shape, dtype },
        })
    }

    /// Adopts a plan computed elsewhere and shipped as a transport record.
    ///
    /// A record that does not decode, fails any plan invariant, or does not
    /// describe `shape` is a broken contract between planner and executor.
    pub fn from_record(
        self,
        record: &[u8],
        shape: Shape,
        dtype: DType,
    ) -> Result<OperatorSession<Planned>, RuntimeError> {
        let plan = TilingPlan::read_from(record)
            .map_err(|e| RuntimeError::contract(format!("transport record rejected: {e}")))?;

        if plan.total_elements != shape.num_elements() || plan.element_bytes != dtype.size_bytes() {
            return Err(RuntimeError::contract(format!(
                "record covers {} × {} B elements, tensor is {} {}",
                plan.total_elements,
                plan.element_bytes,
                shape,
                dtype
            )));
        }
        let limits = &self.platform.limits;
        if plan.core_count > limits.core_count {
            return Err(RuntimeError::contract(format!(
                "record was planned for {} cores, platform has {}",
                plan.core_count, limits.core_count
            )));
        }
        if plan.scratch_bytes > limits.usable_scratch_bytes() {
            return Err(RuntimeError::contract(format!(
                "record was sized for {} B of scratch, platform has {} B usable",
                plan.scratch_bytes,
                limits.usable_scratch_bytes()
            )));
        }
        if plan.alignment_bytes != limits.alignment_bytes {
            return Err(RuntimeError::contract(format!(
                "record uses {} B alignment, platform transfers in {} B",
                plan.alignment_bytes, limits.alignment_bytes
            )));
        }
        // Row layouts carry their row length; it must be the tensor's.
        if plan.cols != 0 && shape.last_dim() != Some(plan.cols) {
            return Err(RuntimeError::contract(format!(
                "record tiles rows of {} elements, tensor {} has rows of {:?}",
                plan.cols,
                shape,
                shape.last_dim()
            )));
        }

        Ok(OperatorSession {
            config: self.config,
            kernel: self.kernel,
            platform: self.platform,
            state: Planned { plan, shape, dtype },
        })
    }
}

// ── Planned → Ready ────────────────────────────────────────────

impl OperatorSession<Planned> {
    pub fn plan(&self) -> &TilingPlan {
        &self.state.plan
    }

    /// The plan as transport bytes.
    pub fn record(&self) -> [u8; tiling_planner::RECORD_SIZE] {
        self.state.plan.to_record_bytes()
    }

    /// Starts the worker pool and checks the executor accepts the plan.
    pub fn prepare(self) -> Result<OperatorSession<Ready>, RuntimeError> {
        let order = self.config.completion()?;
        PipelinedExecutor::new(&self.state.plan, self.kernel.as_ref(), order)?;

        let threads = self.config.resolve_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("tile-core-{i}"))
            .build()
            .map_err(|e| RuntimeError::Config(format!("cannot start {threads} workers: {e}")))?;
        tracing::info!("worker pool: {threads} threads, completion {order}");

        let profiling = self.config.enable_profiling;
        let Planned { plan, shape, dtype } = self.state;
        Ok(OperatorSession {
            config: self.config,
            kernel: self.kernel,
            platform: self.platform,
            state: Ready {
                plan: Arc::new(plan),
                shape,
                dtype,
                order,
                profiling,
                pool: Arc::new(pool),
            },
        })
    }
}

// ── Ready: run ─────────────────────────────────────────────────

impl OperatorSession<Ready> {
    pub fn plan(&self) -> &TilingPlan {
        &self.state.plan
    }

    /// Runs the tiled operator on a blocking worker and returns the result.
    pub async fn run(&self, input: Tensor) -> Result<LaunchOutput, RuntimeError> {
        self.check_input(&input)?;

        let plan = Arc::clone(&self.state.plan);
        let pool = Arc::clone(&self.state.pool);
        let kernel = Arc::clone(&self.kernel);
        let (order, profiling) = (self.state.order, self.state.profiling);

        tokio::task::spawn_blocking(move || execute(&pool, &plan, kernel.as_ref(), &input, order, profiling))
            .await
            .map_err(|e| RuntimeError::Join(e.to_string()))?
    }

    /// Runs on the calling thread's behalf, blocking until done.
    pub fn run_blocking(&self, input: &Tensor) -> Result<LaunchOutput, RuntimeError> {
        self.check_input(input)?;
        execute(
            &self.state.pool,
            &self.state.plan,
            self.kernel.as_ref(),
            input,
            self.state.order,
            self.state.profiling,
        )
    }

    fn check_input(&self, input: &Tensor) -> Result<(), RuntimeError> {
        if input.dtype() != self.state.dtype || input.shape() != &self.state.shape {
            return Err(RuntimeError::Config(format!(
                "session was planned for {} {}, got {} {}",
                self.state.shape,
                self.state.dtype,
                input.shape(),
                input.dtype()
            )));
        }
        Ok(())
    }
}

fn execute(
    pool: &rayon::ThreadPool,
    plan: &TilingPlan,
    kernel: &dyn TileKernel,
    input: &Tensor,
    order: CompletionOrder,
    profiling: bool,
) -> Result<LaunchOutput, RuntimeError> {
    let mut out = vec![0u8; input.size_bytes()];
    let metrics = KernelLauncher::launch_in(pool, plan, kernel, input.as_bytes(), &mut out, order, profiling)?;
    let tensor = Tensor::from_bytes(input.shape().clone(), input.dtype(), out)?;
    Ok(LaunchOutput { tensor, metrics })
}

// ── Shared accessors ───────────────────────────────────────────

impl<S: SessionState> OperatorSession<S> {
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn platform(&self) -> &PlatformSnapshot {
        &self.platform
    }

    pub fn kernel(&self) -> &dyn TileKernel {
        self.kernel.as_ref()
    }
}

impl<S: SessionState> std::fmt::Debug for OperatorSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorSession")
            .field("state", &std::any::type_name::<S>())
            .field("operator", &self.kernel.name())
            .field("platform", &self.platform.source)
            .finish()
    }
}
