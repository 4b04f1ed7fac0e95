// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Root-mean-square normalization over the last dimension.

use super::{check_rows, TileGranularity, TileKernel};
use crate::TensorError;

/// `y = x / sqrt(mean(x²) + eps)`, computed per row.
///
/// No learned scale is applied; the operator exercises the row tiling
/// path, not a full transformer block.
#[derive(Debug, Clone, Copy)]
pub struct RmsNorm {
    pub eps: f32,
}

impl Default for RmsNorm {
    fn default() -> Self {
        Self { eps: 1e-6 }
    }
}

impl TileKernel for RmsNorm {
    fn name(&self) -> &str {
        "rms_norm"
    }

    fn granularity(&self) -> TileGranularity {
        TileGranularity::Row
    }

    fn apply(&self, src: &[f32], dst: &mut [f32], row_len: usize) -> Result<(), TensorError> {
        check_rows("rms_norm", src, dst, row_len)?;

        let inv_n = 1.0 / row_len as f32;
        for (row_src, row_dst) in src.chunks_exact(row_len).zip(dst.chunks_exact_mut(row_len)) {
            let mean_sq: f32 = row_src.iter().map(|&x| x * x).sum::<f32>() * inv_n;
            let scale = 1.0 / (mean_sq + self.eps).sqrt();
            for (d, &x) in row_dst.iter_mut().zip(row_src) {
                *d = x * scale;
            }
        }

        Ok(())
    }
}
