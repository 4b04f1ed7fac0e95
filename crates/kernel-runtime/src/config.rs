// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runtime configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! operator = "gelu"
//! platform = "standard"        # preset name or "host"
//! scratch_budget = "128K"      # optional override
//! buffer_count = 2
//! completion_order = "shuffled"
//! completion_seed = 42
//! num_threads = 8
//! enable_profiling = true
//! ```

use crate::{CompletionOrder, RuntimeError};
use platform_info::{PlatformLimits, PlatformSnapshot};
use scratch_memory::{MemoryError, ScratchBudget};
use std::path::Path;
use tensor_core::TileGranularity;
use tiling_planner::{MisalignmentPolicy, TilingPolicy, TilingProfile, DEFAULT_MAX_ROWS};

/// Configuration for one operator session.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Tile kernel name, e.g. `"relu"` or `"softmax"`.
    pub operator: String,
    /// Platform preset name or `"host"`.
    pub platform: String,
    pub core_count: Option<usize>,
    /// Per-core scratch (human-readable, e.g. `"192K"`).
    pub scratch_budget: Option<String>,
    pub alignment_bytes: Option<usize>,
    /// Scratch held back for the runtime (human-readable).
    pub reserved_scratch: Option<String>,
    /// Tiling policy name; chosen from the problem shape when unset.
    pub policy: Option<String>,
    pub buffer_count: usize,
    pub tensors_per_buffer: usize,
    pub min_core_elements: usize,
    pub align_core_chunks: bool,
    pub max_rows: Option<usize>,
    pub max_elements_per_core: Option<usize>,
    pub misalignment: MisalignmentPolicy,
    /// `"in-order"`, `"reverse"` or `"shuffled"`.
    pub completion_order: String,
    /// Seed for the shuffled completion order.
    pub completion_seed: u64,
    /// Number of worker threads (defaults to the number of online CPUs).
    pub num_threads: Option<usize>,
    /// Per-core timing and the launch summary log. Off leaves per-core
    /// durations at zero.
    pub enable_profiling: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let profile = TilingProfile::default();
        Self {
            operator: "relu".to_string(),
            platform: "standard".to_string(),
            core_count: None,
            scratch_budget: None,
            alignment_bytes: None,
            reserved_scratch: None,
            policy: None,
            buffer_count: profile.buffer_count,
            tensors_per_buffer: profile.tensors_per_buffer,
            min_core_elements: profile.min_core_elements,
            align_core_chunks: profile.align_core_chunks,
            max_rows: Some(DEFAULT_MAX_ROWS),
            max_elements_per_core: None,
            misalignment: MisalignmentPolicy::default(),
            completion_order: "in-order".to_string(),
            completion_seed: 0,
            num_threads: None,
            enable_profiling: true,
        }
    }
}

impl RuntimeConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RuntimeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, RuntimeError> {
        toml::from_str(toml_str).map_err(|e| RuntimeError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, RuntimeError> {
        toml::to_string_pretty(self)
            .map_err(|e| RuntimeError::Config(format!("TOML serialise error: {e}")))
    }

    /// Reads the configured platform once and applies any overrides.
    pub fn resolve_platform(&self) -> Result<PlatformSnapshot, RuntimeError> {
        let mut snapshot = platform_info::resolve(&self.platform)?;
        let limits = &mut snapshot.limits;
        let mut overridden = false;

        if let Some(cores) = self.core_count {
            limits.core_count = cores;
            overridden = true;
        }
        if let Some(budget) = &self.scratch_budget {
            limits.scratch_bytes = parse_bytes("scratch_budget", budget)?;
            overridden = true;
        }
        if let Some(align) = self.alignment_bytes {
            limits.alignment_bytes = align;
            overridden = true;
        }
        if let Some(reserved) = &self.reserved_scratch {
            // A zero margin is meaningful here, unlike a zero budget.
            limits.reserved_scratch_bytes = match ScratchBudget::parse(reserved) {
                Err(MemoryError::ZeroSizedAllocation) => 0,
                _ => parse_bytes("reserved_scratch", reserved)?,
            };
            overridden = true;
        }

        if overridden {
            limits.validate()?;
            snapshot.source = format!("{}+overrides", snapshot.source);
        }
        Ok(snapshot)
    }

    /// Shortcut for [`RuntimeConfig::resolve_platform`]'s limits.
    pub fn limits(&self) -> Result<PlatformLimits, RuntimeError> {
        Ok(self.resolve_platform()?.limits)
    }

    /// The tiling profile for a kernel of the given granularity.
    pub fn profile(&self, granularity: TileGranularity) -> TilingProfile {
        TilingProfile {
            buffer_count: self.buffer_count,
            tensors_per_buffer: self.tensors_per_buffer,
            min_core_elements: self.min_core_elements,
            align_core_chunks: self.align_core_chunks,
            max_rows: self.max_rows,
            max_elements_per_core: self.max_elements_per_core,
            granularity,
            misalignment: self.misalignment,
        }
    }

    /// Creates the tiling policy named by this config, if any.
    pub fn create_policy(&self) -> Result<Option<Box<dyn TilingPolicy>>, RuntimeError> {
        match &self.policy {
            None => Ok(None),
            Some(name) => tiling_planner::policy_by_name(&name.to_lowercase())
                .map(Some)
                .ok_or_else(|| {
                    RuntimeError::Config(format!(
                        "unknown policy '{name}'; expected 'uniform-chunk' or 'capacity-driven'"
                    ))
                }),
        }
    }

    pub fn completion(&self) -> Result<CompletionOrder, RuntimeError> {
        match self.completion_order.to_lowercase().as_str() {
            "in-order" | "inorder" => Ok(CompletionOrder::InOrder),
            "reverse" => Ok(CompletionOrder::Reverse),
            "shuffled" | "random" => Ok(CompletionOrder::Shuffled {
                seed: self.completion_seed,
            }),
            other => Err(RuntimeError::Config(format!(
                "unknown completion order '{other}'; expected 'in-order', 'reverse' or 'shuffled'"
            ))),
        }
    }

    /// Resolves the number of worker threads.
    pub fn resolve_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }
}

fn parse_bytes(field: &str, value: &str) -> Result<usize, RuntimeError> {
    ScratchBudget::parse(value)
        .map(|b| b.as_bytes())
        .map_err(|e| RuntimeError::Config(format!("invalid {field}: {e}")))
}
