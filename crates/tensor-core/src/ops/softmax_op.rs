// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Softmax over the last dimension.

use super::{check_rows, TileGranularity, TileKernel};
use crate::TensorError;

/// Row-wise softmax: `y[i] = exp(x[i] - max) / sum(exp(x - max))`.
///
/// Uses the numerically stable variant that subtracts the row maximum
/// before exponentiation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Softmax;

impl TileKernel for Softmax {
    fn name(&self) -> &str {
        "softmax"
    }

    fn granularity(&self) -> TileGranularity {
        TileGranularity::Row
    }

    fn apply(&self, src: &[f32], dst: &mut [f32], row_len: usize) -> Result<(), TensorError> {
        check_rows("softmax", src, dst, row_len)?;

        for (row_src, row_dst) in src.chunks_exact(row_len).zip(dst.chunks_exact_mut(row_len)) {
            let max_val = row_src.iter().copied().fold(f32::NEG_INFINITY, f32::max);

            let mut sum = 0.0f32;
            for (d, &s) in row_dst.iter_mut().zip(row_src) {
                let e = (s - max_val).exp();
                *d = e;
                sum += e;
            }

            if sum > 0.0 {
                let inv_sum = 1.0 / sum;
                for d in row_dst.iter_mut() {
                    *d *= inv_sum;
                }
            }
        }

        Ok(())
    }
}
