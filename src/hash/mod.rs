/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Seeded hashing of 64-bit keys.
//!
//! All hashing goes through [XXH3](xxhash_rust::xxh3) applied to the
//! little-endian representation of the key, so hashes, and thus functions,
//! are identical across platforms.

use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Hash a key with a seed.
#[inline(always)]
#[must_use]
pub fn hash_key(key: u64, seed: u64) -> u64 {
    xxh3_64_with_seed(&key.to_le_bytes(), seed)
}

/// Derive the seed of a level from the global seed and the level index.
///
/// The derivation is deterministic, so identical construction parameters
/// always yield identical functions.
#[inline]
#[must_use]
pub fn level_seed(global_seed: u64, level: usize) -> u64 {
    xxh3_64_with_seed(&(level as u64).to_le_bytes(), global_seed)
}

/// Map a hash uniformly to `[0..n)` using Lemire's multiply-shift trick.
#[inline(always)]
#[must_use]
pub const fn fast_range(hash: u64, n: u64) -> u64 {
    ((hash as u128 * n as u128) >> 64) as u64
}
