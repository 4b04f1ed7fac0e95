// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Element-wise activations.

use super::{check_lengths, TileGranularity, TileKernel};
use crate::TensorError;

/// `max(x, 0)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Relu;

/// `max(x, 0)^2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredRelu;

/// `x * sigmoid(x)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silu;

/// `x` for positive inputs, `alpha * (exp(x) - 1)` otherwise.
#[derive(Debug, Clone, Copy)]
pub struct Elu {
    pub alpha: f32,
}

impl Default for Elu {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

fn map(
    op: &'static str,
    src: &[f32],
    dst: &mut [f32],
    f: impl Fn(f32) -> f32,
) -> Result<(), TensorError> {
    check_lengths(op, src, dst)?;
    for (d, &x) in dst.iter_mut().zip(src) {
        *d = f(x);
    }
    Ok(())
}

impl TileKernel for Relu {
    fn name(&self) -> &str {
        "relu"
    }

    fn granularity(&self) -> TileGranularity {
        TileGranularity::Element
    }

    fn apply(&self, src: &[f32], dst: &mut [f32], _row_len: usize) -> Result<(), TensorError> {
        map("relu", src, dst, |x| x.max(0.0))
    }
}

impl TileKernel for SquaredRelu {
    fn name(&self) -> &str {
        "squared_relu"
    }

    fn granularity(&self) -> TileGranularity {
        TileGranularity::Element
    }

    fn apply(&self, src: &[f32], dst: &mut [f32], _row_len: usize) -> Result<(), TensorError> {
        map("squared_relu", src, dst, |x| {
            let r = x.max(0.0);
            r * r
        })
    }
}

impl TileKernel for Silu {
    fn name(&self) -> &str {
        "silu"
    }

    fn granularity(&self) -> TileGranularity {
        TileGranularity::Element
    }

    fn apply(&self, src: &[f32], dst: &mut [f32], _row_len: usize) -> Result<(), TensorError> {
        map("silu", src, dst, |x| x / (1.0 + (-x).exp()))
    }
}

impl TileKernel for Elu {
    fn name(&self) -> &str {
        "elu"
    }

    fn granularity(&self) -> TileGranularity {
        TileGranularity::Element
    }

    fn apply(&self, src: &[f32], dst: &mut [f32], _row_len: usize) -> Result<(), TensorError> {
        let alpha = self.alpha;
        map("elu", src, dst, |x| if x > 0.0 { x } else { alpha * x.exp_m1() })
    }
}
