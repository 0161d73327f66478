/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{BuildError, Mphf, MphfBuilder};
use dsi_progress_logger::ProgressLog;
use mem_dbg::*;

/// A [`Mphf`] paired with the table of its keys in output order.
///
/// Storing the keys makes it possible to detect keys outside the
/// construction set, at the cost of 64 bits per key: [`get`](KeyIndex::get)
/// returns `None` on foreign keys, and [`key`](KeyIndex::key) inverts the
/// function.
#[derive(Debug, Clone, PartialEq, MemDbg, MemSize)]
pub struct KeyIndex {
    mphf: Mphf,
    keys: Box<[u64]>,
}

impl KeyIndex {
    /// Build an index on the given keys using the given builder.
    pub fn try_new(
        keys: &[u64],
        builder: &MphfBuilder,
        pl: &mut impl ProgressLog,
    ) -> Result<Self, BuildError> {
        let mphf = builder.try_build(keys, pl)?;
        Ok(Self::from_mphf(mphf, keys))
    }

    /// Pair an existing function with its construction set.
    ///
    /// # Panics
    ///
    /// If `keys` is not the construction set of `mphf`.
    pub fn from_mphf(mphf: Mphf, keys: &[u64]) -> Self {
        assert_eq!(mphf.len(), keys.len());
        let mut table = vec![0; keys.len()];
        let mut seen = vec![false; keys.len()];
        for &key in keys {
            let pos = mphf.get(key) as usize;
            assert!(!seen[pos], "Key {} is not in the construction set", key);
            seen[pos] = true;
            table[pos] = key;
        }
        Self {
            mphf,
            keys: table.into_boxed_slice(),
        }
    }

    /// Return the output of `key`, or `None` if `key` was not in the
    /// construction set.
    #[inline]
    pub fn get(&self, key: u64) -> Option<u64> {
        let pos = self.mphf.try_get(key)?;
        (self.keys[pos as usize] == key).then_some(pos)
    }

    /// Return the key with given output.
    pub fn key(&self, pos: usize) -> Option<u64> {
        self.keys.get(pos).copied()
    }

    /// Return whether `key` was in the construction set.
    pub fn contains(&self, key: u64) -> bool {
        self.get(key).is_some()
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// The underlying function.
    pub fn mphf(&self) -> &Mphf {
        &self.mphf
    }

    /// The keys, in output order.
    pub fn keys(&self) -> &[u64] {
        &self.keys
    }

    pub fn into_inner(self) -> (Mphf, Box<[u64]>) {
        (self.mphf, self.keys)
    }
}
