// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-dtype element codecs.
//!
//! Tensors are stored as little-endian bytes. Kernels compute in `f32`, so
//! each element type only has to say how it widens to and narrows from
//! `f32`. Slices handed to [`Element::decode`]/[`Element::encode`] are
//! always exactly `DTYPE.size_bytes()` long.

use crate::DType;
use half::{bf16, f16};

/// A storage element type with a fixed width and an `f32` codec.
pub trait Element: Copy + Send + Sync + 'static {
    /// The dtype this element type stores.
    const DTYPE: DType;

    /// Reads one element from its little-endian bytes.
    fn decode(bytes: &[u8]) -> f32;

    /// Writes `value` as one element into `out`.
    fn encode(value: f32, out: &mut [u8]);

    /// Decodes a packed byte slice into `dst`.
    fn decode_slice(src: &[u8], dst: &mut [f32]) {
        let width = Self::DTYPE.size_bytes();
        for (d, chunk) in dst.iter_mut().zip(src.chunks_exact(width)) {
            *d = Self::decode(chunk);
        }
    }

    /// Encodes `src` into a packed byte slice.
    fn encode_slice(src: &[f32], dst: &mut [u8]) {
        let width = Self::DTYPE.size_bytes();
        for (&v, chunk) in src.iter().zip(dst.chunks_exact_mut(width)) {
            Self::encode(v, chunk);
        }
    }
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    #[inline]
    fn decode(bytes: &[u8]) -> f32 {
        f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[inline]
    fn encode(value: f32, out: &mut [u8]) {
        out.copy_from_slice(&value.to_le_bytes());
    }
}

impl Element for f16 {
    const DTYPE: DType = DType::F16;

    #[inline]
    fn decode(bytes: &[u8]) -> f32 {
        f16::from_le_bytes([bytes[0], bytes[1]]).to_f32()
    }

    #[inline]
    fn encode(value: f32, out: &mut [u8]) {
        out.copy_from_slice(&f16::from_f32(value).to_le_bytes());
    }
}

impl Element for bf16 {
    const DTYPE: DType = DType::BF16;

    #[inline]
    fn decode(bytes: &[u8]) -> f32 {
        bf16::from_le_bytes([bytes[0], bytes[1]]).to_f32()
    }

    #[inline]
    fn encode(value: f32, out: &mut [u8]) {
        out.copy_from_slice(&bf16::from_f32(value).to_le_bytes());
    }
}

// Saturating, round-half-away-from-zero; NaN maps to 0.
impl Element for i8 {
    const DTYPE: DType = DType::I8;

    #[inline]
    fn decode(bytes: &[u8]) -> f32 {
        bytes[0] as i8 as f32
    }

    #[inline]
    fn encode(value: f32, out: &mut [u8]) {
        let q = if value.is_nan() {
            0
        } else {
            value.round().clamp(i8::MIN as f32, i8::MAX as f32) as i8
        };
        out[0] = q as u8;
    }
}

/// Encodes `values` as packed `dtype` bytes.
pub(crate) fn encode_values(dtype: DType, values: &[f32]) -> Vec<u8> {
    let mut out = vec![0u8; values.len() * dtype.size_bytes()];
    match dtype {
        DType::F32 => f32::encode_slice(values, &mut out),
        DType::F16 => f16::encode_slice(values, &mut out),
        DType::BF16 => bf16::encode_slice(values, &mut out),
        DType::I8 => i8::encode_slice(values, &mut out),
    }
    out
}

/// Decodes packed `dtype` bytes into `f32` values.
pub(crate) fn decode_values(dtype: DType, bytes: &[u8]) -> Vec<f32> {
    let mut out = vec![0f32; bytes.len() / dtype.size_bytes()];
    match dtype {
        DType::F32 => f32::decode_slice(bytes, &mut out),
        DType::F16 => f16::decode_slice(bytes, &mut out),
        DType::BF16 => bf16::decode_slice(bytes, &mut out),
        DType::I8 => i8::decode_slice(bytes, &mut out),
    }
    out
}
