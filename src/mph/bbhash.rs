/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::hash::{fast_range, hash_key};
use crate::rank_sel::BlockRank;
use crate::traits::{BitCount, Rank};
use mem_dbg::*;

/// The maximum number of levels of a function.
pub const MAX_LEVELS: usize = 64;

/// The maximum admissible value of γ.
pub const MAX_GAMMA: f64 = 1000.0;

/// The minimum number of slots of a level.
pub const MIN_LEVEL_SIZE: u64 = 64;

/// Return the number of slots of a level containing `num_keys` keys, or
/// `None` if the number does not fit a `u64`.
///
/// The size is ⌈γ`num_keys`⌉, but at least [`MIN_LEVEL_SIZE`], rounded up to
/// a multiple of 64.
pub fn level_size(num_keys: u64, gamma: f64) -> Option<u64> {
    let slots = (gamma * num_keys as f64).ceil();
    // Also catches NaN
    if !(slots < u64::MAX as f64) {
        return None;
    }
    (slots as u64).max(MIN_LEVEL_SIZE).checked_next_multiple_of(64)
}

/// Return the slot of `key` in a level with given seed and number of slots.
#[inline(always)]
pub(crate) fn slot(key: u64, seed: u64, num_slots: usize) -> usize {
    fast_range(hash_key(key, seed), num_slots as u64) as usize
}

/// A level of a [`Mphf`].
///
/// A level stores the slots that have been hit by exactly one of the keys
/// that reached the level, together with a rank structure and the number of
/// keys placed by previous levels (the offset).
#[derive(Debug, Clone, PartialEq, Eq, MemDbg, MemSize)]
pub struct Level {
    pub(crate) seed: u64,
    pub(crate) offset: u64,
    pub(crate) ranks: BlockRank,
}

impl Level {
    pub(crate) fn new(seed: u64, offset: u64, ranks: BlockRank) -> Self {
        Self {
            seed,
            offset,
            ranks,
        }
    }

    /// The seed used to compute slots in this level.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The number of keys placed by previous levels.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The number of slots of this level.
    pub fn num_slots(&self) -> usize {
        self.ranks.len()
    }

    /// The number of keys placed in this level.
    pub fn num_keys(&self) -> usize {
        self.ranks.count()
    }

    /// The occupied slots and their rank structure.
    pub fn ranks(&self) -> &BlockRank {
        &self.ranks
    }

    /// Return the output of this level for `key`, if the slot of
    /// `key` is occupied.
    #[inline(always)]
    pub fn get(&self, key: u64) -> Option<u64> {
        let pos = slot(key, self.seed, self.ranks.len());
        if self.ranks.get(pos) {
            Some(self.offset + unsafe { self.ranks.rank_unchecked(pos) } as u64)
        } else {
            None
        }
    }
}

/// A BBHash minimal perfect hash function over a set of 64-bit keys.
///
/// An instance maps each of the *n* keys used at construction time to a
/// distinct integer in [0..*n*), using a few bits per key (3.7 with the
/// default γ = 2, about 3 with γ = 1). Construction is performed by
/// [`MphfBuilder`](crate::mph::MphfBuilder), or by [`Mphf::new`] with the
/// same parameters as the C++ BBHash library.
///
/// The structure is made of a sequence of [levels](Level): each level is a bit
/// vector storing the slots hit by exactly one key among those not placed by
/// previous levels. The output of a key is the number of keys placed by
/// previous levels plus the rank of its slot. Keys that are left after the last
/// level are stored, sorted, in a small fallback table.
///
/// Once built or [loaded](Mphf::load), an instance is immutable: it can be
/// shared among threads (e.g., using an [`Arc`](std::sync::Arc)) and queried
/// concurrently without locking.
///
/// # Warning
///
/// There is no way to detect whether a key was part of the construction set:
/// [`get`](Mphf::get) on a key outside of the set returns an arbitrary value
/// in [0..*n*), which may well be the output of some other key. If you need
/// membership testing, use a [`KeyIndex`](crate::mph::KeyIndex) or your own
/// auxiliary structure. [`try_get`](Mphf::try_get) returns `None` on some, but
/// not all, foreign keys.
///
/// # Reference
/// - [Antoine Limasset, Guillaume Rizk, Rayan Chikhi, and Pierre Peterlongo,
///   Fast and scalable minimal perfect hashing for massive key sets](https://arxiv.org/abs/1702.03154)
#[derive(Debug, Clone, PartialEq, MemDbg, MemSize)]
pub struct Mphf {
    pub(crate) n: u64,
    pub(crate) gamma: f64,
    pub(crate) seed: u64,
    pub(crate) levels: Box<[Level]>,
    pub(crate) fallback_keys: Box<[u64]>,
    pub(crate) fallback_values: Box<[u64]>,
}

impl Mphf {
    /// Return the output associated with `key`.
    ///
    /// If `key` was in the construction set, the output is unique in
    /// [0..[`len`](Mphf::len)); otherwise, it is an arbitrary value in the same
    /// range. This method never fails.
    #[inline]
    pub fn get(&self, key: u64) -> u64 {
        match self.try_get(key) {
            Some(value) => value,
            None => fast_range(hash_key(key, !self.seed), self.n),
        }
    }

    /// Return the output associated with `key`, or `None` if `key` falls
    /// through all levels and is not in the fallback table.
    ///
    /// Keys of the construction set always return `Some`. A `None` proves
    /// that `key` was not in the construction set, but `Some` proves nothing.
    #[inline]
    pub fn try_get(&self, key: u64) -> Option<u64> {
        for level in self.levels.iter() {
            if let Some(value) = level.get(key) {
                return Some(value);
            }
        }

        self.fallback_keys
            .binary_search(&key)
            .ok()
            .map(|pos| self.fallback_values[pos])
    }

    /// Return the number of keys.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.n as usize
    }

    /// Return the γ used at construction time.
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Return the global seed used at construction time.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the levels.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Return the number of levels.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Return the number of keys in the fallback table.
    pub fn fallback_len(&self) -> usize {
        self.fallback_keys.len()
    }

    /// Return the number of keys placed by each level.
    pub fn level_sizes(&self) -> Vec<usize> {
        self.levels.iter().map(Level::num_keys).collect()
    }

    /// Return the number of bits per key used by the structure.
    pub fn bits_per_key(&self) -> f64 {
        (self.mem_size(SizeFlags::default()) * 8) as f64 / self.n as f64
    }
}
