// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Scratch budget configuration and parsing.

use crate::MemoryError;
use std::fmt;

/// The fixed size of one core's scratch memory.
///
/// # Parsing
/// Supports human-readable strings with binary suffixes:
/// - `"192K"` or `"192KB"` → 192 × 1024 bytes
/// - `"1M"` or `"1MB"` → 1024² bytes
/// - `"196608"` → raw byte count
///
/// # Examples
/// ```
/// use scratch_memory::ScratchBudget;
///
/// let b = ScratchBudget::parse("192K").unwrap();
/// assert_eq!(b.as_bytes(), 196608);
/// assert_eq!(b.to_string(), "192 KB");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScratchBudget {
    bytes: usize,
}

impl ScratchBudget {
    /// Creates a budget from a byte count.
    pub fn from_bytes(bytes: usize) -> Self {
        Self { bytes }
    }

    /// Creates a budget from kilobytes.
    pub fn from_kb(kb: usize) -> Self {
        Self { bytes: kb * 1024 }
    }

    /// Returns the budget in bytes.
    pub fn as_bytes(&self) -> usize {
        self.bytes
    }

    /// Returns the budget in kilobytes (truncated).
    pub fn as_kb(&self) -> usize {
        self.bytes / 1024
    }

    /// Parses a human-readable budget string. Case-insensitive.
    pub fn parse(s: &str) -> Result<Self, MemoryError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MemoryError::InvalidBudget("empty budget string".into()));
        }

        let upper = s.to_uppercase();
        let (num_str, multiplier) = if upper.ends_with("MB") {
            (&s[..s.len() - 2], 1024 * 1024)
        } else if upper.ends_with('M') {
            (&s[..s.len() - 1], 1024 * 1024)
        } else if upper.ends_with("KB") {
            (&s[..s.len() - 2], 1024)
        } else if upper.ends_with('K') {
            (&s[..s.len() - 1], 1024)
        } else if upper.ends_with('B') {
            (&s[..s.len() - 1], 1)
        } else {
            (s, 1)
        };

        let value: usize = num_str.trim().parse().map_err(|_| {
            MemoryError::InvalidBudget(format!(
                "'{s}': expected a number followed by an optional suffix (K, M)"
            ))
        })?;

        let bytes = value
            .checked_mul(multiplier)
            .ok_or_else(|| MemoryError::InvalidBudget(format!("budget overflow: '{s}'")))?;

        if bytes == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }

        Ok(Self { bytes })
    }
}

impl fmt::Display for ScratchBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bytes >= 1024 * 1024 && self.bytes % (1024 * 1024) == 0 {
            write!(f, "{} MB", self.bytes / (1024 * 1024))
        } else if self.bytes >= 1024 && self.bytes % 1024 == 0 {
            write!(f, "{} KB", self.bytes / 1024)
        } else {
            write!(f, "{} B", self.bytes)
        }
    }
}

impl std::str::FromStr for ScratchBudget {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
