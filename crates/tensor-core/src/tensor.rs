// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Owned host tensor.

use crate::element::{decode_values, encode_values};
use crate::{DType, Shape, TensorError};

/// An owned, n-dimensional tensor stored in contiguous memory.
///
/// `Tensor` is the host-side carrier for operator inputs and outputs. The
/// executor only ever sees its byte buffer; typed access goes through
/// [`Tensor::from_f32`] and [`Tensor::to_f32_vec`], which encode and decode
/// per dtype.
///
/// # Memory Layout
/// Data is stored in row-major (C) order as a flat little-endian byte buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    dtype: DType,
    data: Vec<u8>,
}

impl Tensor {
    /// Creates a new tensor filled with zeros.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape, DType};
    /// let t = Tensor::zeros(Shape::matrix(2, 3), DType::F16);
    /// assert_eq!(t.size_bytes(), 12);
    /// ```
    pub fn zeros(shape: Shape, dtype: DType) -> Self {
        let size = shape.size_bytes(dtype);
        Self {
            shape,
            dtype,
            data: vec![0u8; size],
        }
    }

    /// Creates a tensor from raw bytes.
    ///
    /// Returns an error if the buffer size does not match `shape.size_bytes(dtype)`.
    pub fn from_bytes(shape: Shape, dtype: DType, data: Vec<u8>) -> Result<Self, TensorError> {
        let expected = shape.size_bytes(dtype);
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, dtype, data })
    }

    /// Creates a tensor of `dtype` from `f32` values, narrowing each one.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{DType, Shape, Tensor};
    /// let t = Tensor::from_f32(Shape::vector(3), DType::F32, &[1.0, 2.0, 3.0]).unwrap();
    /// assert_eq!(t.to_f32_vec(), vec![1.0, 2.0, 3.0]);
    /// ```
    pub fn from_f32(shape: Shape, dtype: DType, values: &[f32]) -> Result<Self, TensorError> {
        let expected = shape.num_elements();
        if values.len() != expected {
            return Err(TensorError::ValueCountMismatch {
                shape,
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            data: encode_values(dtype, values),
            shape,
            dtype,
        })
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.shape.num_elements()
    }

    /// `true` when the tensor holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the raw byte slice backing this tensor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns a mutable reference to the raw byte buffer.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consumes the tensor and returns its byte buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Returns the memory footprint of this tensor in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Widens every element to `f32`.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        decode_values(self.dtype, &self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros() {
        let t = Tensor::zeros(Shape::matrix(2, 3), DType::F32);
        assert_eq!(t.size_bytes(), 24);
        assert_eq!(t.len(), 6);
        assert!(t.to_f32_vec().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_from_bytes_size_check() {
        let err = Tensor::from_bytes(Shape::vector(4), DType::F16, vec![0u8; 7]).unwrap_err();
        assert!(matches!(
            err,
            TensorError::BufferSizeMismatch {
                expected: 8,
                actual: 7
            }
        ));
    }

    #[test]
    fn test_from_f32_count_check() {
        let err = Tensor::from_f32(Shape::vector(3), DType::F32, &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, TensorError::ValueCountMismatch { expected: 3, actual: 2, .. }));
    }

    #[test]
    fn test_from_f32_narrows_per_dtype() {
        let t = Tensor::from_f32(Shape::vector(2), DType::I8, &[1.6, -7.2]).unwrap();
        assert_eq!(t.size_bytes(), 2);
        assert_eq!(t.to_f32_vec(), vec![2.0, -7.0]);
    }
}
