/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use mem_dbg::*;

use crate::prelude::{BitCount, BitLength, BitVec, Rank, RankZero};

/// A rank structure storing an absolute count every eight words.
///
/// The count array has one entry per 512-bit block, holding the number of ones
/// preceding the block, plus a final entry holding the total number of ones.
/// Ranking adds to the block count the popcount of at most eight words.
///
/// This is the rank table used by the levels of an [`Mphf`](crate::mph::Mphf):
/// it costs 12.5% of the bit vector, and it can be recomputed from the bit
/// vector alone, which makes it possible to check its integrity on load.
#[derive(Debug, Clone, PartialEq, Eq, MemDbg, MemSize)]
pub struct BlockRank {
    bits: BitVec,
    counts: Box<[u64]>,
}

impl BlockRank {
    /// The number of words covered by a count.
    pub const WORDS_PER_BLOCK: usize = 8;

    /// Creates a new structure from a given bit vector.
    pub fn new(bits: BitVec) -> Self {
        let counts = Self::compute_counts(bits.as_ref());
        Self { bits, counts }
    }

    /// Compute the count array for the given words.
    pub fn compute_counts(words: &[u64]) -> Box<[u64]> {
        let mut counts = Vec::with_capacity(words.len().div_ceil(Self::WORDS_PER_BLOCK) + 1);
        let mut num_ones = 0;
        for block in words.chunks(Self::WORDS_PER_BLOCK) {
            counts.push(num_ones);
            num_ones += block.iter().map(|w| w.count_ones() as u64).sum::<u64>();
        }
        counts.push(num_ones);
        counts.into_boxed_slice()
    }

    /// Rebuild the structure from a bit vector and a stored count array,
    /// returning `None` if the counts are not the ones of the bit vector.
    pub fn from_parts(bits: BitVec, counts: Box<[u64]>) -> Option<Self> {
        if Self::compute_counts(bits.as_ref()) == counts {
            Some(Self { bits, counts })
        } else {
            None
        }
    }

    pub fn into_inner(self) -> (BitVec, Box<[u64]>) {
        (self.bits, self.counts)
    }

    /// The underlying bit vector.
    pub fn bits(&self) -> &BitVec {
        &self.bits
    }

    /// The count array.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Return the value of the bit at position `pos`.
    #[inline(always)]
    pub fn get(&self, pos: usize) -> bool {
        self.bits.get(pos)
    }
}

impl Rank for BlockRank {
    #[inline(always)]
    unsafe fn rank_unchecked(&self, pos: usize) -> usize {
        let words = self.bits.as_ref();
        let word = pos / 64;
        let block = word / Self::WORDS_PER_BLOCK;
        let mut rank = *self.counts.get_unchecked(block);

        for i in block * Self::WORDS_PER_BLOCK..word {
            rank += words.get_unchecked(i).count_ones() as u64;
        }

        let bit = pos % 64;
        if bit != 0 {
            rank += (words.get_unchecked(word) << (64 - bit)).count_ones() as u64;
        }
        rank as usize
    }
}

impl RankZero for BlockRank {}

impl BitCount for BlockRank {
    fn count(&self) -> usize {
        self.counts[self.counts.len() - 1] as usize
    }
}

impl BitLength for BlockRank {
    fn len(&self) -> usize {
        self.bits.len()
    }
}

impl AsRef<[u64]> for BlockRank {
    fn as_ref(&self) -> &[u64] {
        self.bits.as_ref()
    }
}
