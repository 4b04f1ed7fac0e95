// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! What is being tiled.

use crate::PlannerError;
use tensor_core::{DType, Shape, TileGranularity};

/// Logical 2-D decomposition of a problem whose last dimension carries an
/// alignment constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct RowShape {
    pub rows: usize,
    pub cols: usize,
}

/// Immutable description of one operator invocation's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ProblemDescriptor {
    pub total_elements: usize,
    pub dtype: DType,
    pub rows: Option<RowShape>,
}

impl ProblemDescriptor {
    /// A problem with no row structure.
    pub fn flat(total_elements: usize, dtype: DType) -> Self {
        Self {
            total_elements,
            dtype,
            rows: None,
        }
    }

    /// A `rows × cols` problem. Fails if the element count overflows.
    pub fn rows(rows: usize, cols: usize, dtype: DType) -> Result<Self, PlannerError> {
        let total_elements = rows.checked_mul(cols).ok_or_else(|| {
            PlannerError::invalid_shape(format!("{rows} × {cols} elements overflow"))
        })?;
        Ok(Self {
            total_elements,
            dtype,
            rows: Some(RowShape { rows, cols }),
        })
    }

    /// Derives the descriptor a kernel of the given granularity needs:
    /// row kernels see `leading × last_dim`, element kernels a flat count.
    pub fn from_shape(
        shape: &Shape,
        dtype: DType,
        granularity: TileGranularity,
    ) -> Result<Self, PlannerError> {
        match granularity {
            TileGranularity::Element => Ok(Self::flat(shape.num_elements(), dtype)),
            TileGranularity::Row => {
                Self::rows(shape.leading_elements(), shape.last_dim().unwrap_or(1), dtype)
            }
        }
    }

    /// Element byte width `W`.
    pub fn element_bytes(&self) -> usize {
        self.dtype.size_bytes()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_elements * self.element_bytes()
    }
}
