// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for platform queries.

/// Errors that can occur when resolving or validating platform limits.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// Failed to read a sysfs file.
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse a value from a system file.
    #[error("failed to parse value from {path}: {detail}")]
    ParseError { path: String, detail: String },

    /// The expected sysfs path does not exist.
    #[error("sysfs path not found: {path}")]
    NotAvailable { path: String },

    /// A limit is zero or otherwise unusable for planning.
    #[error("invalid platform limits: {0}")]
    InvalidLimits(String),

    /// No preset with this name.
    #[error("unknown platform '{0}'; expected compact, standard, wide or host")]
    UnknownPreset(String),
}
