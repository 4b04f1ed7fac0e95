// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # platform-info
//!
//! Answers the one question the tiling planner asks of the hardware: how
//! many cores are there, how much scratch memory does each core own, and
//! what is the minimum contiguous transfer granularity.
//!
//! # Providers
//! - [`Preset`]: fixed accelerator profiles, used for planning ahead of
//!   time and in tests.
//! - [`HostPlatform`]: probes the machine the runtime is running on,
//!   treating each online CPU as a core and its L1 data cache as scratch.
//!
//! # Graceful Degradation
//! When sysfs is unavailable (containers, non-Linux hosts), the host probe
//! falls back to `std::thread::available_parallelism()` and a 48 KiB
//! scratch default rather than failing.
//!
//! # Example
//! ```
//! use platform_info::{PlatformInfo, Preset};
//!
//! let limits = Preset::Standard.limits();
//! assert_eq!(limits.core_count, 40);
//! assert!(limits.validate().is_ok());
//! ```

mod error;
mod host;
mod limits;
mod preset;
mod snapshot;

pub use error::PlatformError;
pub use host::HostPlatform;
pub use limits::{PlatformInfo, PlatformLimits, DEFAULT_ALIGNMENT_BYTES};
pub use preset::Preset;
pub use snapshot::PlatformSnapshot;

/// Resolves a platform by name: a preset name or `"host"`.
pub fn resolve(name: &str) -> Result<PlatformSnapshot, PlatformError> {
    if name.eq_ignore_ascii_case("host") {
        return PlatformSnapshot::capture(&HostPlatform::probe());
    }
    let preset: Preset = name.parse()?;
    PlatformSnapshot::capture(&preset)
}
