// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensors and tile kernels.

use crate::Shape;

/// Errors that can occur while building tensors or applying a tile kernel.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// The provided buffer size does not match the expected size for the given shape and dtype.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// The number of values does not match the shape.
    #[error("shape {shape} holds {expected} elements, got {actual} values")]
    ValueCountMismatch {
        shape: Shape,
        expected: usize,
        actual: usize,
    },

    /// A tile handed to a row kernel does not hold a whole number of rows.
    #[error("{op}: tile of {tile_len} elements is not a whole number of {row_len}-element rows")]
    PartialRow {
        op: &'static str,
        tile_len: usize,
        row_len: usize,
    },

    /// Source and destination tiles differ in length.
    #[error("{op}: source tile has {src} elements, destination has {dst}")]
    TileLengthMismatch {
        op: &'static str,
        src: usize,
        dst: usize,
    },

    /// The dtype name could not be parsed.
    #[error("unknown dtype '{0}'; expected f32, f16, bf16 or i8")]
    UnknownDType(String),

    /// No kernel is registered under the requested name.
    #[error("unknown operator '{0}'")]
    UnknownKernel(String),
}
