// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fixed-layout transport record.
//!
//! The plan is computed once on the controlling side and handed to every
//! core as the same bytes. The record is a 128-byte `#[repr(C)]` block of
//! little-endian integers, so it can be copied into any caller-provided
//! buffer and read back without alignment requirements.

use crate::variant::VariantKey;
use crate::{PlannerError, TilingPlan};
use bytemuck::{Pod, Zeroable};

/// `b"TILE"` read as a little-endian `u32`.
pub const RECORD_MAGIC: u32 = u32::from_le_bytes(*b"TILE");
pub const RECORD_VERSION: u32 = 1;
/// Size of a serialized plan in bytes.
pub const RECORD_SIZE: usize = std::mem::size_of::<TilingRecord>();

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct TilingRecord {
    magic: u32,
    version: u32,
    total_elements: u64,
    element_bytes: u64,
    core_count: u64,
    used_core_count: u64,
    unit_elements: u64,
    base_units: u64,
    tail_units: u64,
    tile_units: u64,
    buffer_count: u64,
    tensors_per_buffer: u64,
    scratch_bytes: u64,
    alignment_bytes: u64,
    variant_key: u64,
    rows: u64,
    cols: u64,
}

const _: () = assert!(RECORD_SIZE == 128);

impl TilingRecord {
    fn from_plan(plan: &TilingPlan) -> Self {
        let le = |v: usize| (v as u64).to_le();
        Self {
            magic: RECORD_MAGIC.to_le(),
            version: RECORD_VERSION.to_le(),
            total_elements: le(plan.total_elements),
            element_bytes: le(plan.element_bytes),
            core_count: le(plan.core_count),
            used_core_count: le(plan.used_core_count),
            unit_elements: le(plan.unit_elements),
            base_units: le(plan.base_units),
            tail_units: le(plan.tail_units),
            tile_units: le(plan.tile_units),
            buffer_count: le(plan.buffer_count),
            tensors_per_buffer: le(plan.tensors_per_buffer),
            scratch_bytes: le(plan.scratch_bytes),
            alignment_bytes: le(plan.alignment_bytes),
            variant_key: le(plan.variant.raw() as usize),
            rows: le(plan.rows),
            cols: le(plan.cols),
        }
    }

    fn into_plan(self) -> Result<TilingPlan, PlannerError> {
        let magic = u32::from_le(self.magic);
        if magic != RECORD_MAGIC {
            return Err(PlannerError::MalformedRecord(format!("bad magic {magic:#010x}")));
        }
        let version = u32::from_le(self.version);
        if version != RECORD_VERSION {
            return Err(PlannerError::MalformedRecord(format!(
                "unsupported version {version}"
            )));
        }

        let field = |name: &str, v: u64| {
            usize::try_from(u64::from_le(v))
                .map_err(|_| PlannerError::MalformedRecord(format!("{name} does not fit usize")))
        };
        let variant = u32::try_from(u64::from_le(self.variant_key))
            .map_err(|_| PlannerError::MalformedRecord("variant key out of range".into()))?;

        Ok(TilingPlan {
            total_elements: field("total_elements", self.total_elements)?,
            element_bytes: field("element_bytes", self.element_bytes)?,
            core_count: field("core_count", self.core_count)?,
            used_core_count: field("used_core_count", self.used_core_count)?,
            unit_elements: field("unit_elements", self.unit_elements)?,
            base_units: field("base_units", self.base_units)?,
            tail_units: field("tail_units", self.tail_units)?,
            tile_units: field("tile_units", self.tile_units)?,
            buffer_count: field("buffer_count", self.buffer_count)?,
            tensors_per_buffer: field("tensors_per_buffer", self.tensors_per_buffer)?,
            scratch_bytes: field("scratch_bytes", self.scratch_bytes)?,
            alignment_bytes: field("alignment_bytes", self.alignment_bytes)?,
            variant: VariantKey::from_raw(variant),
            rows: field("rows", self.rows)?,
            cols: field("cols", self.cols)?,
        })
    }
}

impl TilingPlan {
    /// Writes the plan into `buf` and returns the number of bytes written.
    pub fn write_to(&self, buf: &mut [u8]) -> Result<usize, PlannerError> {
        if buf.len() < RECORD_SIZE {
            return Err(PlannerError::RecordCapacity {
                required: RECORD_SIZE,
                capacity: buf.len(),
            });
        }
        let record = TilingRecord::from_plan(self);
        buf[..RECORD_SIZE].copy_from_slice(bytemuck::bytes_of(&record));
        Ok(RECORD_SIZE)
    }

    /// Serializes into a fresh buffer.
    pub fn to_record_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        out.copy_from_slice(bytemuck::bytes_of(&TilingRecord::from_plan(self)));
        out
    }

    /// Reads a plan back and re-checks every invariant.
    pub fn read_from(buf: &[u8]) -> Result<Self, PlannerError> {
        if buf.len() < RECORD_SIZE {
            return Err(PlannerError::MalformedRecord(format!(
                "{} bytes is shorter than a {RECORD_SIZE}-byte record",
                buf.len()
            )));
        }
        let record: TilingRecord = bytemuck::pod_read_unaligned(&buf[..RECORD_SIZE]);
        let plan = record.into_plan()?;
        plan.validate()?;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auto_plan, ProblemDescriptor, TilingProfile};
    use platform_info::PlatformLimits;
    use tensor_core::DType;

    fn sample() -> TilingPlan {
        auto_plan(
            &ProblemDescriptor::flat(1024, DType::F32),
            &PlatformLimits::new(40, 196608),
            &TilingProfile::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_write_reports_size() {
        let mut buf = [0u8; 200];
        assert_eq!(sample().write_to(&mut buf).unwrap(), 128);
        assert_eq!(&buf[..4], b"TILE");
    }

    #[test]
    fn test_write_capacity() {
        let mut buf = [0u8; 64];
        let err = sample().write_to(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            PlannerError::RecordCapacity {
                required: 128,
                capacity: 64
            }
        ));
    }

    #[test]
    fn test_read_back_unaligned() {
        let plan = sample();
        let mut buf = vec![0u8; 129];
        plan.write_to(&mut buf[1..]).unwrap();
        assert_eq!(TilingPlan::read_from(&buf[1..]).unwrap(), plan);
    }

    #[test]
    fn test_corrupted_magic_rejected() {
        let mut bytes = sample().to_record_bytes();
        bytes[0] ^= 0xff;
        assert!(matches!(
            TilingPlan::read_from(&bytes),
            Err(PlannerError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_tampered_counts_fail_validation() {
        let mut bytes = sample().to_record_bytes();
        // used_core_count lives at offset 8 + 3 * 8.
        bytes[32..40].copy_from_slice(&39u64.to_le_bytes());
        assert!(matches!(
            TilingPlan::read_from(&bytes),
            Err(PlannerError::InvariantViolated(_))
        ));
    }

    #[test]
    fn test_oversized_tile_fails_validation() {
        let mut bytes = sample().to_record_bytes();
        // tile_units at 64: 2^62 × 4 B wraps a 64-bit byte count.
        bytes[64..72].copy_from_slice(&(1u64 << 62).to_le_bytes());
        assert!(matches!(
            TilingPlan::read_from(&bytes),
            Err(PlannerError::InvariantViolated(_))
        ));
    }

    #[test]
    fn test_oversized_buffer_ring_fails_validation() {
        let mut bytes = sample().to_record_bytes();
        // buffer_count at 72.
        bytes[72..80].copy_from_slice(&(u64::MAX / 2).to_le_bytes());
        assert!(matches!(
            TilingPlan::read_from(&bytes),
            Err(PlannerError::InvariantViolated(_))
        ));
    }

    #[test]
    fn test_short_buffer() {
        assert!(TilingPlan::read_from(&[0u8; 16]).is_err());
    }
}
