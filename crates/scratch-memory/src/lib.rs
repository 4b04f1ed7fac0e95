// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # scratch-memory
//!
//! Models the small, fast local memory each core owns for the lifetime of
//! a kernel invocation.
//!
//! # Key Components
//!
//! - [`ScratchBudget`]: the fixed scratch size with human-readable
//!   parsing (`"192K"`, `"1M"`, ...).
//! - [`ScratchArena`]: one buffer of exactly the budget's size, carved
//!   into aligned [`Region`]s by bump allocation. Carving past the budget
//!   fails with [`MemoryError::OutOfScratch`].
//! - [`SlotRing`]: the ping/pong (or N-way) ring of input/output region
//!   pairs, with per-region [`RegionState`] so a stage can never touch a
//!   region another stage still owns.
//! - [`ScratchStats`]: carve and stage counters.
//!
//! # Ownership Model
//!
//! ```text
//! SlotRing::carve(budget, slots, region_bytes, align)
//!       │
//!       ▼
//!   ScratchArena ── Region(in₀) Region(out₀) Region(in₁) Region(out₁) ...
//! ```
//!
//! The ring owns its arena outright; there is no sharing between cores and
//! therefore no locking.
//!
//! # Example
//! ```
//! use scratch_memory::{ScratchBudget, SlotRing};
//!
//! let mut ring = SlotRing::carve(ScratchBudget::from_kb(4), 2, 1024, 32).unwrap();
//! let slot = ring.slot_for(3);
//! ring.begin_fill(slot).unwrap();
//! ring.fill_view(slot).unwrap().fill(1);
//! ring.finish_fill(slot).unwrap();
//! assert_eq!(slot, 1);
//! ```

mod arena;
mod budget;
mod error;
mod ring;
mod stats;

pub use arena::{Region, ScratchArena};
pub use budget::ScratchBudget;
pub use error::MemoryError;
pub use ring::{RegionState, SlotRing};
pub use stats::ScratchStats;
