// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Variant dispatch.
//!
//! A plan's [`VariantKey`] is resolved exactly once per launch into a
//! [`KernelVariant`]: the decoded layout and template plus a typed compute
//! function picked from a table indexed by dtype code. The per-tile hot
//! path then calls a plain function pointer with no further matching.

use crate::RuntimeError;
use tensor_core::{DType, Element, TensorError, TileKernel};
use tiling_planner::{Layout, Template, VariantKey};

/// `f32` staging buffers reused by every tile a core computes.
#[derive(Debug, Default)]
pub(crate) struct ComputeScratch {
    src: Vec<f32>,
    dst: Vec<f32>,
}

impl ComputeScratch {
    pub fn with_capacity(elements: usize) -> Self {
        Self {
            src: vec![0.0; elements],
            dst: vec![0.0; elements],
        }
    }
}

/// Decodes one packed tile, runs the kernel, encodes the result.
pub(crate) type ComputeFn = fn(
    kernel: &dyn TileKernel,
    src: &[u8],
    dst: &mut [u8],
    row_len: usize,
    scratch: &mut ComputeScratch,
) -> Result<(), TensorError>;

fn apply_typed<E: Element>(
    kernel: &dyn TileKernel,
    src: &[u8],
    dst: &mut [u8],
    row_len: usize,
    scratch: &mut ComputeScratch,
) -> Result<(), TensorError> {
    let width = E::DTYPE.size_bytes();
    if src.len() != dst.len() || src.len() % width != 0 {
        return Err(TensorError::BufferSizeMismatch {
            expected: src.len(),
            actual: dst.len(),
        });
    }
    let n = src.len() / width;
    if scratch.src.len() < n {
        scratch.src.resize(n, 0.0);
        scratch.dst.resize(n, 0.0);
    }

    E::decode_slice(src, &mut scratch.src[..n]);
    kernel.apply(&scratch.src[..n], &mut scratch.dst[..n], row_len)?;
    E::encode_slice(&scratch.dst[..n], dst);
    Ok(())
}

/// Indexed by [`DType::code`].
const COMPUTE_TABLE: [ComputeFn; 4] = [
    apply_typed::<f32>,
    apply_typed::<half::f16>,
    apply_typed::<half::bf16>,
    apply_typed::<i8>,
];

/// A resolved, ready-to-call kernel variant.
#[derive(Clone, Copy)]
pub struct KernelVariant {
    pub key: VariantKey,
    pub layout: Layout,
    pub template: Template,
    pub dtype: DType,
    compute: ComputeFn,
}

impl KernelVariant {
    /// Resolves a key. Unknown keys are a broken plan, not a user error.
    pub fn resolve(key: VariantKey) -> Result<Self, RuntimeError> {
        let (layout, template, dtype) = key
            .decode()
            .ok_or_else(|| RuntimeError::contract(format!("unknown variant key {key}")))?;
        let compute = COMPUTE_TABLE
            .get(dtype.code() as usize)
            .copied()
            .ok_or_else(|| RuntimeError::contract(format!("no compute variant for {dtype}")))?;
        Ok(Self {
            key,
            layout,
            template,
            dtype,
            compute,
        })
    }

    pub(crate) fn compute(
        &self,
        kernel: &dyn TileKernel,
        src: &[u8],
        dst: &mut [u8],
        row_len: usize,
        scratch: &mut ComputeScratch,
    ) -> Result<(), TensorError> {
        (self.compute)(kernel, src, dst, row_len, scratch)
    }
}

impl std::fmt::Debug for KernelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelVariant")
            .field("key", &self.key.raw())
            .field("layout", &self.layout)
            .field("template", &self.template)
            .field("dtype", &self.dtype)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_core::{kernel_by_name, reference_apply, Shape, Tensor};

    #[test]
    fn test_resolve_every_dtype() {
        for dtype in DType::ALL {
            let key = VariantKey::new(Layout::Flat, Template::Parallel, dtype);
            let v = KernelVariant::resolve(key).unwrap();
            assert_eq!(v.dtype, dtype);
            assert_eq!(v.layout, Layout::Flat);
        }
    }

    #[test]
    fn test_unknown_key_is_contract_violation() {
        let err = KernelVariant::resolve(VariantKey::from_raw(7)).unwrap_err();
        assert!(matches!(err, RuntimeError::ContractViolation(_)));
    }

    #[test]
    fn test_compute_matches_reference() {
        let gelu = kernel_by_name("gelu").unwrap();
        let values: Vec<f32> = (0..64).map(|i| i as f32 * 0.1 - 3.0).collect();
        for dtype in DType::ALL {
            let input = Tensor::from_f32(Shape::vector(64), dtype, &values).unwrap();
            let expected = reference_apply(gelu.as_ref(), dtype, 64, input.as_bytes()).unwrap();

            let v = KernelVariant::resolve(VariantKey::new(Layout::Flat, Template::Parallel, dtype))
                .unwrap();
            let mut out = vec![0u8; input.size_bytes()];
            let mut scratch = ComputeScratch::default();
            v.compute(gelu.as_ref(), input.as_bytes(), &mut out, 64, &mut scratch)
                .unwrap();
            assert_eq!(out, expected, "{dtype}");
        }
    }
}
