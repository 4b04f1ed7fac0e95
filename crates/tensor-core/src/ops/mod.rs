// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tile compute kernels.
//!
//! A [`TileKernel`] is the computation the pipelined executor runs on one
//! tile once it has been copied into scratch. Kernels work on pre-decoded
//! `f32` buffers owned by the caller, so the hot path never allocates.
//! Element-wise kernels accept any tile length; row kernels require the
//! tile to hold whole rows of `row_len` elements.

mod activation;
mod gelu_op;
mod rms_norm_op;
mod softmax_op;

use std::sync::Arc;

use crate::element::{decode_values, encode_values};
use crate::{DType, TensorError};

pub use activation::{Elu, Relu, Silu, SquaredRelu};
pub use gelu_op::Gelu;
pub use rms_norm_op::RmsNorm;
pub use softmax_op::Softmax;

/// How a kernel's input may be cut into tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileGranularity {
    /// Any contiguous run of elements is a valid tile.
    Element,
    /// Tiles must start and end on row boundaries.
    Row,
}

/// Computation applied by the executor to each tile.
pub trait TileKernel: Send + Sync {
    /// Registry name, e.g. `"gelu"`.
    fn name(&self) -> &str;

    /// Smallest unit the kernel can be tiled by.
    fn granularity(&self) -> TileGranularity;

    /// Computes `dst` from `src`. Both hold the same number of elements;
    /// `row_len` is the size of the innermost dimension of the operand.
    fn apply(&self, src: &[f32], dst: &mut [f32], row_len: usize) -> Result<(), TensorError>;
}

/// Shared length check for element-wise kernels.
pub(crate) fn check_lengths(op: &'static str, src: &[f32], dst: &[f32]) -> Result<(), TensorError> {
    if src.len() != dst.len() {
        return Err(TensorError::TileLengthMismatch {
            op,
            src: src.len(),
            dst: dst.len(),
        });
    }
    Ok(())
}

/// Shared length and row-alignment check for row kernels.
pub(crate) fn check_rows(
    op: &'static str,
    src: &[f32],
    dst: &[f32],
    row_len: usize,
) -> Result<(), TensorError> {
    check_lengths(op, src, dst)?;
    if row_len == 0 || src.len() % row_len != 0 {
        return Err(TensorError::PartialRow {
            op,
            tile_len: src.len(),
            row_len,
        });
    }
    Ok(())
}

/// Names accepted by [`kernel_by_name`].
pub fn available_kernels() -> &'static [&'static str] {
    &["relu", "squared_relu", "silu", "elu", "gelu", "softmax", "rms_norm"]
}

/// Looks up a kernel with default parameters by its registry name.
pub fn kernel_by_name(name: &str) -> Option<Arc<dyn TileKernel>> {
    let kernel: Arc<dyn TileKernel> = match name {
        "relu" => Arc::new(Relu),
        "squared_relu" => Arc::new(SquaredRelu),
        "silu" => Arc::new(Silu),
        "elu" => Arc::new(Elu::default()),
        "gelu" => Arc::new(Gelu),
        "softmax" => Arc::new(Softmax),
        "rms_norm" => Arc::new(RmsNorm::default()),
        _ => return None,
    };
    Some(kernel)
}

/// Applies `kernel` to a whole packed buffer in one call, with no tiling.
///
/// This is the ground truth the executor is checked against: a tiled run
/// must produce byte-identical output.
pub fn reference_apply(
    kernel: &dyn TileKernel,
    dtype: DType,
    row_len: usize,
    input: &[u8],
) -> Result<Vec<u8>, TensorError> {
    let width = dtype.size_bytes();
    if input.len() % width != 0 {
        return Err(TensorError::BufferSizeMismatch {
            expected: input.len() / width * width,
            actual: input.len(),
        });
    }
    let src = decode_values(dtype, input);
    let mut dst = vec![0f32; src.len()];
    kernel.apply(&src, &mut dst, row_len)?;
    Ok(encode_values(dtype, &dst))
}
