// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Point-in-time platform reading.
//!
//! A [`PlatformSnapshot`] is what the planner is handed: limits read once
//! from a provider, validated, and stamped with where they came from.

use crate::{PlatformError, PlatformInfo, PlatformLimits};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, serde::Serialize)]
pub struct PlatformSnapshot {
    pub limits: PlatformLimits,
    /// Provider label, e.g. `preset:standard` or `host`.
    pub source: String,
    /// Unix timestamp in milliseconds when the snapshot was taken.
    pub timestamp_ms: u64,
}

impl PlatformSnapshot {
    /// Reads and validates the provider's limits.
    pub fn capture(provider: &dyn PlatformInfo) -> Result<Self, PlatformError> {
        let limits = provider.limits();
        limits.validate()?;

        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        tracing::debug!(
            source = %provider.source(),
            cores = limits.core_count,
            scratch = limits.scratch_bytes,
            "platform limits captured"
        );

        Ok(Self {
            limits,
            source: provider.source(),
            timestamp_ms,
        })
    }

    /// Returns a summary string suitable for logging or CLI display.
    ///
    /// # Example output
    /// ```text
    /// Platform preset:standard: 40 cores, scratch 192.0 KB (184.0 KB usable), align 32 B
    /// ```
    pub fn summary(&self) -> String {
        let l = &self.limits;
        format!(
            "Platform {}: {} cores, scratch {:.1} KB ({:.1} KB usable), align {} B",
            self.source,
            l.core_count,
            l.scratch_bytes as f64 / 1024.0,
            l.usable_scratch_bytes() as f64 / 1024.0,
            l.alignment_bytes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Preset;

    #[test]
    fn test_capture_preset() {
        let snap = PlatformSnapshot::capture(&Preset::Standard).unwrap();
        assert_eq!(snap.source, "preset:standard");
        assert!(snap.timestamp_ms > 0);
        let summary = snap.summary();
        assert!(summary.contains("40 cores"));
        assert!(summary.contains("192.0 KB"));
        assert!(summary.contains("184.0 KB usable"));
    }

    #[test]
    fn test_capture_rejects_invalid() {
        let bad = PlatformLimits::new(0, 4096);
        assert!(PlatformSnapshot::capture(&bad).is_err());
    }

    #[test]
    fn test_resolve_by_name() {
        assert_eq!(crate::resolve("compact").unwrap().limits.core_count, 8);
        assert!(crate::resolve("host").is_ok());
        assert!(crate::resolve("nope").is_err());
    }
}
