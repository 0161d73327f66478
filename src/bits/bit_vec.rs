/*
 * SPDX-FileCopyrightText: 2023 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Bit vector implementations. There are two flavors:

- `BitVec<Vec<u64>>`: a mutable bit vector with a `Vec<u64>` as underlying
   storage; this is the flavor stored in the levels of an [`Mphf`](crate::mph::Mphf);
- `BitVec<Vec<AtomicU64>>`: a thread-safe mutable bit vector
   with a `Vec<AtomicU64>` as underlying storage, used during construction
   to mark slots from many threads at once.

It is possible to juggle between the two flavors using [`From`].
 */

use crate::traits::*;
use mem_dbg::*;
use rayon::prelude::*;
use std::collections::TryReserveError;
use std::{
    ops::Index,
    sync::atomic::{AtomicU64, Ordering},
};

const BITS: usize = u64::BITS as usize;

/// A bit vector with selectable backend. We provide implementations
/// for `Vec<u64>` and `Vec<AtomicU64>`.
///
/// In the second case, [`BitVec::get`] and [`BitVec::set`] are both
/// thread-safe, as they both take an immutable reference.
#[derive(Debug, Clone, PartialEq, Eq, MemDbg, MemSize)]
pub struct BitVec<B = Vec<u64>> {
    data: B,
    len: usize,
}

/// A thread-safe bit vector.
pub type AtomicBitVec = BitVec<Vec<AtomicU64>>;

macro_rules! panic_if_out_of_bounds {
    ($index: expr, $len: expr) => {
        if $index >= $len {
            panic!("Bit index out of bounds: {} >= {}", $index, $len)
        }
    };
}

/// Convenient, [`vec!`]-like macro to initialize a bit vector.
///
/// ```rust
/// use bbhash::bit_vec;
///
/// let b = bit_vec![0, 1, 1, 0];
/// assert_eq!(b.len(), 4);
/// assert!(b[1]);
/// ```
#[macro_export]
macro_rules! bit_vec {
    () => {
        $crate::bits::BitVec::new(0)
    };
    ($($x:expr),+ $(,)?) => {
        {
            let mut b = $crate::bits::BitVec::new(0);
            $( b.push($x != 0); )*
            b
        }
    };
}

#[inline(always)]
const fn num_words(len: usize) -> usize {
    len.div_ceil(BITS)
}

impl<B> BitLength for BitVec<B> {
    #[inline(always)]
    fn len(&self) -> usize {
        self.len
    }
}

impl<B> BitVec<B> {
    #[inline(always)]
    #[allow(clippy::len_without_is_empty)]
    /// Return the number of bits in this bit vector.
    pub fn len(&self) -> usize {
        self.len
    }

    /// # Safety
    /// `len` must be between 0 (included) the number of
    /// bits in `data` (included), and bits past `len` must be zero.
    #[inline(always)]
    pub unsafe fn from_raw_parts(data: B, len: usize) -> Self {
        Self { data, len }
    }

    #[inline(always)]
    pub fn into_raw_parts(self) -> (B, usize) {
        (self.data, self.len)
    }
}

impl BitVec<Vec<u64>> {
    /// Create a new bit vector of length `len`.
    pub fn new(len: usize) -> Self {
        Self {
            data: vec![0; num_words(len)],
            len,
        }
    }

    /// Create a bit vector from words, checking that the number of words
    /// is exactly the one needed for `len` bits and that the bits past `len`
    /// are zero.
    pub fn from_words(data: Vec<u64>, len: usize) -> Option<Self> {
        if data.len() != num_words(len) {
            return None;
        }
        if len % BITS != 0 {
            let last = data[data.len() - 1];
            if last >> (len % BITS) != 0 {
                return None;
            }
        }
        Some(Self { data, len })
    }

    /// Return the number of bits set to 1 in this bit vector.
    pub fn count_ones(&self) -> usize {
        self.data.par_iter().map(|x| x.count_ones() as usize).sum()
    }

    pub fn get(&self, index: usize) -> bool {
        panic_if_out_of_bounds!(index, self.len);
        unsafe { self.get_unchecked(index) }
    }

    pub fn set(&mut self, index: usize, value: bool) {
        panic_if_out_of_bounds!(index, self.len);
        unsafe { self.set_unchecked(index, value) }
    }

    /// # Safety
    ///
    /// `index` must be between 0 (included) and [`BitVec::len`] (excluded).
    #[inline(always)]
    pub unsafe fn get_unchecked(&self, index: usize) -> bool {
        let word = self.data.get_unchecked(index / BITS);
        (word >> (index % BITS)) & 1 != 0
    }

    /// # Safety
    ///
    /// `index` must be between 0 (included) and [`BitVec::len`] (excluded).
    #[inline(always)]
    pub unsafe fn set_unchecked(&mut self, index: usize, value: bool) {
        let word_index = index / BITS;
        let bit_index = index % BITS;

        // For constant values, this should be inlined with no test.
        if value {
            *self.data.get_unchecked_mut(word_index) |= 1 << bit_index;
        } else {
            *self.data.get_unchecked_mut(word_index) &= !(1 << bit_index);
        }
    }

    /// Append a bit at the end of the bit vector.
    pub fn push(&mut self, b: bool) {
        if self.data.len() * BITS == self.len {
            self.data.push(0);
        }
        let word_index = self.len / BITS;
        let bit_index = self.len % BITS;
        self.data[word_index] |= (b as u64) << bit_index;
        self.len += 1;
    }

    /// Clear every bit that is set in `other`.
    ///
    /// # Panics
    /// If the two bit vectors have different lengths.
    pub fn and_not_assign(&mut self, other: &BitVec) {
        assert_eq!(self.len, other.len);
        self.data
            .par_iter_mut()
            .zip(other.data.par_iter())
            .for_each(|(w, o)| *w &= !o);
    }

    /// Return an iterator over the bits of the bit vector.
    pub fn iter(&self) -> BitIter<'_> {
        BitIter {
            bits: &self.data,
            len: self.len,
            next_bit_pos: 0,
        }
    }
}

impl AsRef<[u64]> for BitVec<Vec<u64>> {
    #[inline(always)]
    fn as_ref(&self) -> &[u64] {
        &self.data
    }
}

impl BitCount for BitVec<Vec<u64>> {
    fn count(&self) -> usize {
        self.count_ones()
    }
}

impl Index<usize> for BitVec<Vec<u64>> {
    type Output = bool;

    fn index(&self, index: usize) -> &Self::Output {
        match self.get(index) {
            false => &false,
            true => &true,
        }
    }
}

impl FromIterator<bool> for BitVec<Vec<u64>> {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        let mut res = Self::new(0);
        for b in iter {
            res.push(b);
        }
        res
    }
}

/// An iterator over the bits of a [`BitVec`].
pub struct BitIter<'a> {
    bits: &'a [u64],
    len: usize,
    next_bit_pos: usize,
}

impl Iterator for BitIter<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.next_bit_pos == self.len {
            return None;
        }
        let word_idx = self.next_bit_pos / BITS;
        let bit_idx = self.next_bit_pos % BITS;
        let bit = (self.bits[word_idx] >> bit_idx) & 1;
        self.next_bit_pos += 1;
        Some(bit != 0)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = self.len - self.next_bit_pos;
        (rem, Some(rem))
    }
}

impl ExactSizeIterator for BitIter<'_> {}

impl<'a> IntoIterator for &'a BitVec<Vec<u64>> {
    type IntoIter = BitIter<'a>;
    type Item = bool;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl BitVec<Vec<AtomicU64>> {
    /// Create a new atomic bit vector of length `len`.
    pub fn new_atomic(len: usize) -> Self {
        Self {
            data: (0..num_words(len)).map(|_| AtomicU64::new(0)).collect(),
            len,
        }
    }

    /// Create a new atomic bit vector of length `len`, reporting
    /// allocation failures instead of aborting.
    pub fn try_new_atomic(len: usize) -> Result<Self, TryReserveError> {
        let n = num_words(len);
        let mut data = Vec::new();
        data.try_reserve_exact(n)?;
        data.extend((0..n).map(|_| AtomicU64::new(0)));
        Ok(Self { data, len })
    }

    /// Return the number of bits set to 1 in this bit vector.
    pub fn count_ones(&self) -> usize {
        // Just to be sure, add a fence to ensure that we will see all the final
        // values
        core::sync::atomic::fence(Ordering::SeqCst);

        self.data
            .par_iter()
            .map(|x| x.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }

    pub fn get(&self, index: usize, order: Ordering) -> bool {
        panic_if_out_of_bounds!(index, self.len);
        unsafe { self.get_unchecked(index, order) }
    }

    pub fn set(&self, index: usize, value: bool, order: Ordering) {
        panic_if_out_of_bounds!(index, self.len);
        unsafe { self.set_unchecked(index, value, order) }
    }

    /// Set the bit at `index` to one, returning its previous value.
    ///
    /// Concurrent calls on the same index see exactly one `false`.
    pub fn fetch_set(&self, index: usize, order: Ordering) -> bool {
        panic_if_out_of_bounds!(index, self.len);
        let mask = 1 << (index % BITS);
        let word = unsafe { self.data.get_unchecked(index / BITS) };
        word.fetch_or(mask, order) & mask != 0
    }

    #[inline(always)]
    unsafe fn get_unchecked(&self, index: usize, order: Ordering) -> bool {
        let word = self.data.get_unchecked(index / BITS).load(order);
        (word >> (index % BITS)) & 1 != 0
    }

    #[inline(always)]
    unsafe fn set_unchecked(&self, index: usize, value: bool, order: Ordering) {
        let word_index = index / BITS;
        let bit_index = index % BITS;

        // For constant values, this should be inlined with no test.
        if value {
            self.data
                .get_unchecked(word_index)
                .fetch_or(1 << bit_index, order);
        } else {
            self.data
                .get_unchecked(word_index)
                .fetch_and(!(1 << bit_index), order);
        }
    }
}

/// Provide conversion from standard to atomic bit vectors.
impl From<BitVec<Vec<u64>>> for BitVec<Vec<AtomicU64>> {
    #[inline]
    fn from(bv: BitVec<Vec<u64>>) -> Self {
        Self {
            data: bv.data.into_iter().map(AtomicU64::new).collect(),
            len: bv.len,
        }
    }
}

/// Provide conversion from atomic to standard bit vectors.
impl From<BitVec<Vec<AtomicU64>>> for BitVec<Vec<u64>> {
    #[inline]
    fn from(bv: BitVec<Vec<AtomicU64>>) -> Self {
        Self {
            data: bv.data.into_iter().map(AtomicU64::into_inner).collect(),
            len: bv.len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_get() {
        let mut b = BitVec::new(0);
        for i in 0..200 {
            b.push(i % 3 == 0);
        }
        assert_eq!(b.len(), 200);
        for i in 0..200 {
            assert_eq!(b[i], i % 3 == 0);
        }
        assert_eq!(b.count_ones(), 67);
    }

    #[test]
    fn test_from_words() {
        assert!(BitVec::from_words(vec![0, 0], 100).is_some());
        assert!(BitVec::from_words(vec![0], 100).is_none());
        assert!(BitVec::from_words(vec![0, 1 << 40], 100).is_none());
        assert!(BitVec::from_words(vec![u64::MAX], 64).is_some());
    }

    #[test]
    fn test_fetch_set() {
        let b = BitVec::new_atomic(130);
        assert!(!b.fetch_set(129, Ordering::Relaxed));
        assert!(b.fetch_set(129, Ordering::Relaxed));
        assert!(b.get(129, Ordering::Relaxed));
        assert!(!b.get(128, Ordering::Relaxed));
        let b: BitVec = b.into();
        assert_eq!(b.count_ones(), 1);
    }
}
