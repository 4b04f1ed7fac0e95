// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Scratch usage statistics.

/// Cumulative counters for one core's scratch arena and slot ring.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ScratchStats {
    /// Size of the arena in bytes.
    pub budget_bytes: usize,
    /// Bytes carved so far, including alignment padding.
    pub carved_bytes: usize,
    /// High-water mark of carved bytes.
    pub peak_bytes: usize,
    /// Successful region allocations.
    pub allocations: u64,
    /// Allocation requests refused for lack of space.
    pub failed_allocations: u64,
    /// Completed copy-in stages.
    pub fills: u64,
    /// Completed compute stages.
    pub computes: u64,
    /// Completed copy-out stages.
    pub drains: u64,
}

impl ScratchStats {
    /// Fraction of the budget carved, in `[0.0, 1.0]`.
    pub fn utilisation(&self) -> f64 {
        if self.budget_bytes == 0 {
            return 0.0;
        }
        self.peak_bytes as f64 / self.budget_bytes as f64
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Scratch: {}/{} B carved ({:.0}%), {} regions, {} fills, {} computes, {} drains",
            self.peak_bytes,
            self.budget_bytes,
            self.utilisation() * 100.0,
            self.allocations,
            self.fills,
            self.computes,
            self.drains,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let s = ScratchStats::default();
        assert_eq!(s.allocations, 0);
        assert_eq!(s.utilisation(), 0.0);
    }

    #[test]
    fn test_summary() {
        let s = ScratchStats {
            budget_bytes: 1000,
            carved_bytes: 500,
            peak_bytes: 500,
            allocations: 4,
            fills: 3,
            computes: 3,
            drains: 2,
            ..ScratchStats::default()
        };
        let summary = s.summary();
        assert!(summary.contains("500/1000 B carved (50%)"));
        assert!(summary.contains("4 regions"));
        assert!(summary.contains("2 drains"));
    }
}
