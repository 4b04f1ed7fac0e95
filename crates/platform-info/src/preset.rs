// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fixed accelerator profiles.

use crate::{PlatformError, PlatformInfo};
use std::fmt;
use std::str::FromStr;

/// Named platform profiles.
///
/// | Preset     | Cores | Scratch  | Reserved |
/// |------------|-------|----------|----------|
/// | `Compact`  | 8     | 64 KiB   | 2 KiB    |
/// | `Standard` | 40    | 192 KiB  | 8 KiB    |
/// | `Wide`     | 48    | 248 KiB  | 8 KiB    |
///
/// All presets use a 32-byte transfer granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Compact,
    Standard,
    Wide,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Compact, Preset::Standard, Preset::Wide];

    pub fn as_str(self) -> &'static str {
        match self {
            Preset::Compact => "compact",
            Preset::Standard => "standard",
            Preset::Wide => "wide",
        }
    }
}

impl PlatformInfo for Preset {
    fn core_count(&self) -> usize {
        match self {
            Preset::Compact => 8,
            Preset::Standard => 40,
            Preset::Wide => 48,
        }
    }

    fn scratch_bytes(&self) -> usize {
        match self {
            Preset::Compact => 64 * 1024,
            Preset::Standard => 192 * 1024,
            Preset::Wide => 248 * 1024,
        }
    }

    fn reserved_scratch_bytes(&self) -> usize {
        match self {
            Preset::Compact => 2 * 1024,
            Preset::Standard | Preset::Wide => 8 * 1024,
        }
    }

    fn source(&self) -> String {
        format!("preset:{}", self.as_str())
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" => Ok(Preset::Compact),
            "standard" => Ok(Preset::Standard),
            "wide" => Ok(Preset::Wide),
            other => Err(PlatformError::UnknownPreset(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_preset() {
        let limits = Preset::Standard.limits();
        assert_eq!(limits.core_count, 40);
        assert_eq!(limits.scratch_bytes, 196608);
        assert_eq!(limits.alignment_bytes, 32);
        assert_eq!(limits.usable_scratch_bytes(), 188416);
    }

    #[test]
    fn test_all_presets_valid() {
        for preset in Preset::ALL {
            assert!(preset.limits().validate().is_ok(), "{preset}");
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!("Wide".parse::<Preset>().unwrap(), Preset::Wide);
        assert!("huge".parse::<Preset>().is_err());
    }
}
