// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Host machine probing via sysfs.
//!
//! Maps the host onto the accelerator model:
//! - `/sys/devices/system/cpu/online`: online core count (e.g. `"0-7"`).
//! - `/sys/devices/system/cpu/cpu0/cache/index0/size`: L1 data cache size
//!   (e.g. `"48K"`), standing in for per-core scratch.

use crate::{PlatformError, PlatformInfo, DEFAULT_ALIGNMENT_BYTES};
use std::path::Path;

/// Base sysfs path for CPU information.
const CPU_BASE: &str = "/sys/devices/system/cpu";

/// Scratch size assumed when the cache size cannot be read.
const FALLBACK_SCRATCH_BYTES: usize = 48 * 1024;

/// Limits probed from the running machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct HostPlatform {
    cores: usize,
    scratch: usize,
    /// `true` when at least one value came from a fallback.
    pub degraded: bool,
}

impl HostPlatform {
    /// Probes the host, falling back to defaults for anything unreadable.
    pub fn probe() -> Self {
        let mut degraded = false;

        let cores = match read_online_cores() {
            Ok(n) => n,
            Err(e) => {
                tracing::debug!(error = %e, "online cpu list unavailable, using available_parallelism");
                degraded = true;
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            }
        };

        let scratch = match read_l1d_bytes() {
            Ok(n) => n,
            Err(e) => {
                tracing::debug!(error = %e, "l1d cache size unavailable, using fallback scratch");
                degraded = true;
                FALLBACK_SCRATCH_BYTES
            }
        };

        Self {
            cores,
            scratch,
            degraded,
        }
    }
}

impl PlatformInfo for HostPlatform {
    fn core_count(&self) -> usize {
        self.cores
    }

    fn scratch_bytes(&self) -> usize {
        self.scratch
    }

    fn alignment_bytes(&self) -> usize {
        DEFAULT_ALIGNMENT_BYTES
    }

    fn source(&self) -> String {
        if self.degraded {
            "host (fallback)".to_string()
        } else {
            "host".to_string()
        }
    }
}

/// Reads a sysfs file and returns its trimmed content.
fn read_sysfs_file(path: &Path) -> Result<String, PlatformError> {
    if !path.exists() {
        return Err(PlatformError::NotAvailable {
            path: path.display().to_string(),
        });
    }
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|e| PlatformError::ReadError {
            path: path.display().to_string(),
            source: e,
        })
}

fn read_online_cores() -> Result<usize, PlatformError> {
    let path_str = format!("{CPU_BASE}/online");
    let path = Path::new(&path_str);
    let content = read_sysfs_file(path)?;
    parse_cpu_range(&content).ok_or_else(|| PlatformError::ParseError {
        path: path_str.clone(),
        detail: format!("expected a cpu range list, got '{content}'"),
    })
}

fn read_l1d_bytes() -> Result<usize, PlatformError> {
    let path_str = format!("{CPU_BASE}/cpu0/cache/index0/size");
    let path = Path::new(&path_str);
    let content = read_sysfs_file(path)?;
    parse_cache_size(&content).ok_or_else(|| PlatformError::ParseError {
        path: path_str.clone(),
        detail: format!("expected a size like '48K', got '{content}'"),
    })
}

/// Parses a CPU range string like `"0-3"` → 4, `"0"` → 1, `"0,2-3"` → 3.
fn parse_cpu_range(s: &str) -> Option<usize> {
    let mut total = 0usize;
    for part in s.split(',') {
        let part = part.trim();
        if let Some((start_s, end_s)) = part.split_once('-') {
            let start: usize = start_s.trim().parse().ok()?;
            let end: usize = end_s.trim().parse().ok()?;
            if end < start {
                return None;
            }
            total += end - start + 1;
        } else {
            let _: usize = part.parse().ok()?;
            total += 1;
        }
    }
    (total > 0).then_some(total)
}

/// Parses a sysfs cache size: `"48K"`, `"2M"` or a plain byte count.
fn parse_cache_size(s: &str) -> Option<usize> {
    let s = s.trim();
    let (digits, multiplier) = match s.chars().last()? {
        'K' | 'k' => (&s[..s.len() - 1], 1024),
        'M' | 'm' => (&s[..s.len() - 1], 1024 * 1024),
        _ => (s, 1),
    };
    let value: usize = digits.trim().parse().ok()?;
    (value > 0).then_some(value * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cpu_range() {
        assert_eq!(parse_cpu_range("0-3"), Some(4));
        assert_eq!(parse_cpu_range("0"), Some(1));
        assert_eq!(parse_cpu_range("0,2-3"), Some(3));
        assert_eq!(parse_cpu_range("0-1,3-5"), Some(5));
        assert_eq!(parse_cpu_range(""), None);
        assert_eq!(parse_cpu_range("3-1"), None);
    }

    #[test]
    fn test_parse_cache_size() {
        assert_eq!(parse_cache_size("48K"), Some(49152));
        assert_eq!(parse_cache_size("2M"), Some(2 * 1024 * 1024));
        assert_eq!(parse_cache_size("32768"), Some(32768));
        assert_eq!(parse_cache_size("0K"), None);
        assert_eq!(parse_cache_size("lots"), None);
    }

    #[test]
    fn test_probe_never_fails() {
        let host = HostPlatform::probe();
        assert!(host.core_count() >= 1);
        assert!(host.scratch_bytes() > 0);
        assert!(host.limits().validate().is_ok());
    }
}
