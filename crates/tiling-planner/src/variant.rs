// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Variant keys: the small integer that selects a kernel body.
//!
//! A key is composed as `1000 + 100 * layout + 10 * template + dtype`, so
//! `1000` is a flat parallel f32 kernel and `1113` a row-shaped single-core
//! i8 kernel. Selection is a pure lookup on the plan, never a search.

use std::fmt;
use tensor_core::DType;

const KEY_BASE: u32 = 1000;

/// How the problem was decomposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Layout {
    Flat,
    Rows,
}

/// Which kernel body shape runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Template {
    /// Normal SPMD split over the used cores.
    Parallel,
    /// The problem could not be split safely and runs on core 0 alone.
    SingleCoreFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
pub struct VariantKey(u32);

impl VariantKey {
    pub fn new(layout: Layout, template: Template, dtype: DType) -> Self {
        let layout = match layout {
            Layout::Flat => 0,
            Layout::Rows => 1,
        };
        let template = match template {
            Template::Parallel => 0,
            Template::SingleCoreFallback => 1,
        };
        Self(KEY_BASE + 100 * layout + 10 * template + dtype.code())
    }

    /// Wraps a raw key read from a record. Use [`VariantKey::decode`] to
    /// check it.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    /// Splits the key into its parts, or `None` if it is not a key this
    /// planner produces.
    pub fn decode(self) -> Option<(Layout, Template, DType)> {
        let v = self.0.checked_sub(KEY_BASE)?;
        let layout = match v / 100 {
            0 => Layout::Flat,
            1 => Layout::Rows,
            _ => return None,
        };
        let template = match (v / 10) % 10 {
            0 => Template::Parallel,
            1 => Template::SingleCoreFallback,
            _ => return None,
        };
        let dtype = DType::from_code(v % 10)?;
        Some((layout, template, dtype))
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
