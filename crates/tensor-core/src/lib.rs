// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Element types, host tensors, and the tile compute kernels that the
//! pipelined executor injects into its compute stage.
//!
//! This crate provides:
//! - [`DType`]: supported element data types (f32, f16, bf16, i8) and their
//!   byte widths.
//! - [`Element`]: little-endian decode/encode of a single element through
//!   `f32`, so every kernel is written once and runs for every dtype.
//! - [`Shape`] and [`Tensor`]: host-side buffers used to build inputs and
//!   inspect outputs.
//! - [`TileKernel`]: the compute strategy applied to one demarcated tile,
//!   with element-wise kernels (ReLU, squared ReLU, SiLU, ELU, GELU) and
//!   row kernels (softmax, RMS norm).
//!
//! # Design Goals
//! - Kernels never see tiling: they receive a decoded `f32` tile and a row
//!   length, nothing else.
//! - Clean error types via `thiserror`.

mod dtype;
mod element;
mod error;
pub mod ops;
mod shape;
mod tensor;

pub use dtype::DType;
pub use element::Element;
pub use error::TensorError;
pub use ops::{available_kernels, kernel_by_name, reference_apply, TileGranularity, TileKernel};
pub use shape::Shape;
pub use tensor::Tensor;
