// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Gaussian Error Linear Unit (GELU) activation.

use super::{check_lengths, TileGranularity, TileKernel};
use crate::TensorError;

/// Coefficient `sqrt(2/π)`.
const SQRT_2_OVER_PI: f32 = 0.797_884_6;

/// Cubic coefficient in the tanh approximation.
const GELU_COEFF: f32 = 0.044715;

/// GELU using the tanh approximation:
///
/// `GELU(x) ≈ 0.5 * x * (1 + tanh(sqrt(2/π) * (x + 0.044715 * x³)))`
#[derive(Debug, Clone, Copy, Default)]
pub struct Gelu;

impl TileKernel for Gelu {
    fn name(&self) -> &str {
        "gelu"
    }

    fn granularity(&self) -> TileGranularity {
        TileGranularity::Element
    }

    fn apply(&self, src: &[f32], dst: &mut [f32], _row_len: usize) -> Result<(), TensorError> {
        check_lengths("gelu", src, dst)?;
        for (d, &x) in dst.iter_mut().zip(src) {
            *d = gelu_scalar(x);
        }
        Ok(())
    }
}

/// Computes GELU for a single f32 value.
#[inline(always)]
fn gelu_scalar(x: f32) -> f32 {
    let inner = SQRT_2_OVER_PI * (x + GELU_COEFF * x * x * x);
    0.5 * x * (1.0 + inner.tanh())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32, tol: f32) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_gelu_zero() {
        assert!(approx_eq(gelu_scalar(0.0), 0.0, 1e-6));
    }

    #[test]
    fn test_gelu_tails() {
        assert!((gelu_scalar(3.0) - 3.0).abs() < 0.01);
        assert!(gelu_scalar(-3.0).abs() < 0.01);
    }

    #[test]
    fn test_gelu_tile() {
        let src = [0.0, 1.0, -1.0, 2.0];
        let mut dst = [0.0; 4];
        Gelu.apply(&src, &mut dst, 4).unwrap();
        assert!(approx_eq(dst[0], 0.0, 1e-5));
        assert!(approx_eq(dst[1], 0.8412, 0.01));
        assert!(approx_eq(dst[2], -0.1588, 0.01));
        assert!(approx_eq(dst[3], 1.9545, 0.01));
    }

    #[test]
    fn test_gelu_ignores_row_len() {
        let src = [0.5; 7];
        let mut dst = [0.0; 7];
        Gelu.apply(&src, &mut dst, 3).unwrap();
        assert!(dst.iter().all(|&y| approx_eq(y, 0.3457, 0.01)));
    }
}
