// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Completion events for the three hardware pipes.
//!
//! Every issued copy-in, compute or copy-out returns an [`Event`]. Nothing
//! happens to scratch until the operation *retires*, and operations retire
//! only when the issuing core waits on some event. Which in-flight
//! operation retires first is decided by a [`CompletionOrder`], so tests
//! can force the transfer engines to complete out of issue order.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// The independent engines a core drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Pipe {
    /// Global memory → scratch.
    CopyIn,
    Compute,
    /// Scratch → global memory.
    CopyOut,
}

impl fmt::Display for Pipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pipe::CopyIn => "copy-in",
            Pipe::Compute => "compute",
            Pipe::CopyOut => "copy-out",
        };
        f.write_str(name)
    }
}

/// Handle to one issued operation. Signalled once the operation retires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event {
    pub pipe: Pipe,
    pub slot: usize,
    /// Issue sequence number, unique per core.
    pub ticket: u64,
}

/// Policy for which pending operation completes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum CompletionOrder {
    /// Oldest first, like a single in-order engine.
    #[default]
    InOrder,
    /// Newest first.
    Reverse,
    /// Uniformly random among pending operations, reproducible per seed.
    Shuffled { seed: u64 },
}

impl CompletionOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionOrder::InOrder => "in-order",
            CompletionOrder::Reverse => "reverse",
            CompletionOrder::Shuffled { .. } => "shuffled",
        }
    }
}

impl fmt::Display for CompletionOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionOrder::Shuffled { seed } => write!(f, "shuffled(seed={seed})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Per-core picker over the pending queue.
#[derive(Debug)]
pub(crate) struct CompletionScheduler {
    order: CompletionOrder,
    rng: Option<StdRng>,
}

impl CompletionScheduler {
    pub fn new(order: CompletionOrder, core: usize) -> Self {
        let rng = match order {
            CompletionOrder::Shuffled { seed } => {
                Some(StdRng::seed_from_u64(seed.wrapping_add(core as u64)))
            }
            _ => None,
        };
        Self { order, rng }
    }

    /// Index into a non-empty pending queue of length `pending`, ordered
    /// oldest first.
    pub fn next(&mut self, pending: usize) -> usize {
        debug_assert!(pending > 0);
        match (&self.order, self.rng.as_mut()) {
            (CompletionOrder::Reverse, _) => pending - 1,
            (CompletionOrder::Shuffled { .. }, Some(rng)) => rng.gen_range(0..pending),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_order_and_reverse() {
        let mut s = CompletionScheduler::new(CompletionOrder::InOrder, 0);
        assert_eq!(s.next(3), 0);
        let mut s = CompletionScheduler::new(CompletionOrder::Reverse, 0);
        assert_eq!(s.next(3), 2);
    }

    #[test]
    fn test_shuffled_is_reproducible_per_core() {
        let order = CompletionOrder::Shuffled { seed: 7 };
        let picks = |core| {
            let mut s = CompletionScheduler::new(order, core);
            (0..32).map(|_| s.next(3)).collect::<Vec<_>>()
        };
        assert_eq!(picks(1), picks(1));
        assert!(picks(1).iter().all(|&i| i < 3));
        assert!(picks(1).iter().any(|&i| i != 0));
    }

    #[test]
    fn test_order_display() {
        assert_eq!(CompletionOrder::InOrder.to_string(), "in-order");
        assert_eq!(CompletionOrder::Shuffled { seed: 3 }.to_string(), "shuffled(seed=3)");
    }
}
