// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Launch profiling metrics.
//!
//! [`LaunchMetrics`] aggregates what every core did during one launch:
//! bytes moved, tiles processed, how often the core blocked on an event and
//! how much the transfer engines overlapped. These are the numbers the CLI
//! benchmark compares across scratch sizes and core counts.

use std::time::Duration;

/// What one core did during a launch.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CoreMetrics {
    pub core: usize,
    pub elements: usize,
    /// Pipeline iterations, one per tile.
    pub iterations: usize,
    pub bytes_in: usize,
    pub bytes_out: usize,
    /// Waits that had to retire at least one operation.
    pub blocking_waits: usize,
    /// Most operations in flight at once.
    pub max_in_flight: usize,
    /// Operations that retired ahead of an older pending one.
    pub out_of_order_retirements: usize,
    pub duration: Duration,
}

impl CoreMetrics {
    pub fn idle(core: usize) -> Self {
        Self {
            core,
            ..Self::default()
        }
    }

    pub fn is_idle(&self) -> bool {
        self.iterations == 0
    }
}

/// Aggregate metrics for one launch.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LaunchMetrics {
    pub operator: String,
    pub total_duration: Duration,
    pub cores: Vec<CoreMetrics>,
}

impl LaunchMetrics {
    pub fn new(operator: impl Into<String>, cores: Vec<CoreMetrics>, total: Duration) -> Self {
        Self {
            operator: operator.into(),
            total_duration: total,
            cores,
        }
    }

    pub fn active_cores(&self) -> usize {
        self.cores.iter().filter(|c| !c.is_idle()).count()
    }

    pub fn total_iterations(&self) -> usize {
        self.cores.iter().map(|c| c.iterations).sum()
    }

    pub fn total_bytes(&self) -> usize {
        self.cores.iter().map(|c| c.bytes_in + c.bytes_out).sum()
    }

    pub fn out_of_order_retirements(&self) -> usize {
        self.cores.iter().map(|c| c.out_of_order_retirements).sum()
    }

    /// Slowest core, which bounds the launch.
    pub fn critical_path(&self) -> Duration {
        self.cores
            .iter()
            .map(|c| c.duration)
            .max()
            .unwrap_or(Duration::ZERO)
    }

    /// Bytes moved per second of wall-clock time.
    pub fn throughput_bytes_per_sec(&self) -> f64 {
        let secs = self.total_duration.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.total_bytes() as f64 / secs
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        format!(
            "Launch '{}': {:.3}ms total, {}/{} cores active, {} tiles, \
             {:.2} MB moved ({:.1} MB/s), critical path {:.3}ms, {} out-of-order retirements",
            self.operator,
            self.total_duration.as_secs_f64() * 1000.0,
            self.active_cores(),
            self.cores.len(),
            self.total_iterations(),
            self.total_bytes() as f64 / (1024.0 * 1024.0),
            self.throughput_bytes_per_sec() / (1024.0 * 1024.0),
            self.critical_path().as_secs_f64() * 1000.0,
            self.out_of_order_retirements(),
        )
    }
}
