//! Identifier allocation.
//!
//! An [`IdAllocator`] owns the set of identifiers already in use and draws
//! fresh ones at random from one of two ranges. Every value it hands out is
//! claimed immediately, so a value is never returned twice and never equals
//! one that was present when the allocator was seeded.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;
use serde::Deserialize;

use crate::constants::{COMPACT_RANGE, MAX_REJECTED_DRAWS, WIDE_RANGE};
use crate::error::{Error, Result};

/// An inclusive range of identifier values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IdRange {
    pub min: i64,
    pub max: i64,
}

impl IdRange {
    pub const fn new(min: i64, max: i64) -> Self {
        IdRange { min, max }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.min <= id && id <= self.max
    }

    /// Number of values in the range; zero when `min > max`. Saturates at
    /// `u64::MAX` for the full `i64` span.
    pub fn len(&self) -> u64 {
        if self.min > self.max {
            0
        } else {
            self.max.abs_diff(self.min).saturating_add(1)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Draws identifiers that collide with nothing already claimed.
#[derive(Debug)]
pub struct IdAllocator<R = StdRng> {
    claimed: FxHashSet<i64>,
    wide: IdRange,
    compact: IdRange,
    rng: R,
}

impl IdAllocator<StdRng> {
    /// Creates an allocator seeded with `claimed`, using an OS-seeded generator.
    pub fn new(claimed: impl IntoIterator<Item = i64>) -> Self {
        Self::with_rng(claimed, StdRng::from_os_rng())
    }
}

impl<R: Rng> IdAllocator<R> {
    /// Creates an allocator seeded with `claimed` that draws from `rng`.
    pub fn with_rng(claimed: impl IntoIterator<Item = i64>, rng: R) -> Self {
        IdAllocator {
            claimed: claimed.into_iter().collect(),
            wide: WIDE_RANGE,
            compact: COMPACT_RANGE,
            rng,
        }
    }

    /// Replaces the wide and compact ranges.
    pub fn with_ranges(mut self, wide: IdRange, compact: IdRange) -> Self {
        self.wide = wide;
        self.compact = compact;
        self
    }

    /// Allocates an identifier from the wide range (catalog ids).
    pub fn allocate_wide(&mut self) -> Result<i64> {
        let range = self.wide;
        self.allocate_in(range)
    }

    /// Allocates an identifier from the compact range (modkit ids).
    pub fn allocate_compact(&mut self) -> Result<i64> {
        let range = self.compact;
        self.allocate_in(range)
    }

    /// True when `id` has not been claimed. Does not claim it.
    pub fn is_available(&self, id: i64) -> bool {
        !self.claimed.contains(&id)
    }

    /// Marks `id` as in use.
    pub fn claim(&mut self, id: i64) {
        self.claimed.insert(id);
    }

    /// Number of claimed identifiers, in any range.
    pub fn claimed_count(&self) -> usize {
        self.claimed.len()
    }

    fn allocate_in(&mut self, range: IdRange) -> Result<i64> {
        let used = self.claimed.iter().filter(|id| range.contains(**id)).count() as u64;
        let free = range.len().saturating_sub(used);
        if free == 0 {
            return Err(Error::ExhaustedRange {
                min: range.min,
                max: range.max,
            });
        }

        for _ in 0..MAX_REJECTED_DRAWS {
            let candidate = self.rng.random_range(range.min..=range.max);
            if self.claimed.insert(candidate) {
                return Ok(candidate);
            }
        }

        // Nearly full range: pick uniformly among what is left.
        let pick = self.rng.random_range(0..free);
        let candidate = (range.min..=range.max)
            .filter(|id| !self.claimed.contains(id))
            .nth(pick as usize)
            .ok_or(Error::ExhaustedRange {
                min: range.min,
                max: range.max,
            })?;
        self.claimed.insert(candidate);
        Ok(candidate)
    }
}
