/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::bbhash::{level_size, slot, Level, Mphf, MAX_GAMMA, MAX_LEVELS};
use crate::bits::{AtomicBitVec, BitVec};
use crate::hash::level_seed;
use crate::rank_sel::BlockRank;
use crate::traits::BitCount;
use derivative::Derivative;
use derive_setters::*;
use dsi_progress_logger::*;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::collections::TryReserveError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Keys are probed in chunks of this size.
const CHUNK_SIZE: usize = 1 << 16;

/// A builder for [`Mphf`].
///
/// Construction proceeds by levels: at each level, the keys not placed yet are
/// hashed to a bit array of ⌈γ*k*⌉ slots, where *k* is the number of such keys.
/// Keys hashing to a slot hit by no other key are placed in the level; the
/// remaining keys are passed to the next level. When no keys are left, the
/// [maximum number of levels](MphfBuilder::max_levels) is reached, or the keys
/// left are no more than the [fallback threshold](MphfBuilder::fallback_threshold),
/// the remaining keys are stored in a sorted fallback table.
///
/// Each level is probed in parallel on a dedicated thread pool of
/// [`num_threads`](MphfBuilder::num_threads) threads. Slots are marked using
/// atomic bit vectors, so the result does not depend on the number of threads
/// or on the scheduling, and since level seeds are derived from the
/// [global seed](MphfBuilder::seed) the same parameters always yield the same
/// function.
///
/// # Examples
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use bbhash::mph::MphfBuilder;
/// use dsi_progress_logger::no_logging;
///
/// let keys = (0..1000_u64).map(|x| x * x).collect::<Vec<_>>();
/// let mphf = MphfBuilder::default()
///     .gamma(1.5)
///     .num_threads(2)
///     .try_build(&keys, no_logging![])?;
///
/// let mut outputs = keys.iter().map(|&k| mphf.get(k)).collect::<Vec<_>>();
/// outputs.sort();
/// assert_eq!(outputs, (0..1000).collect::<Vec<_>>());
/// #     Ok(())
/// # }
/// ```
#[derive(Setters, Debug, Clone, Derivative)]
#[derivative(Default)]
pub struct MphfBuilder {
    /// The ratio between the number of slots of a level and the number of
    /// keys reaching the level. It must be between 1 and 1000. The default is
    /// 2.
    ///
    /// Larger values make construction faster and the structure larger.
    #[derivative(Default(value = "2.0"))]
    gamma: f64,

    /// The number of threads used to probe keys. The default is 8.
    #[derivative(Default(value = "8"))]
    num_threads: usize,

    /// The global seed, from which level seeds are derived.
    seed: u64,

    /// The maximum number of levels. The default is 25, and values larger
    /// than [`MAX_LEVELS`] are reduced to [`MAX_LEVELS`].
    #[derivative(Default(value = "25"))]
    max_levels: usize,

    /// Stop building levels when at most this number of keys is left, and
    /// store them in the fallback table. The default is 0.
    fallback_threshold: usize,

    /// A flag checked before building each level; if it is set, the
    /// construction stops with [`BuildError::Stopped`].
    #[setters(strip_option)]
    stop_flag: Option<Arc<AtomicBool>>,
}

/// Build errors.
#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("Empty key set")]
    /// The key set is empty.
    EmptyKeySet,
    #[error("Invalid gamma {0}: it must be between 1 and 1000")]
    /// γ is out of range.
    InvalidGamma(f64),
    #[error("The number of threads must be positive")]
    /// Zero threads were requested.
    InvalidThreads,
    #[error("A level for {0} keys does not fit in memory")]
    /// The number of slots of a level overflows.
    LevelTooLarge(usize),
    #[error("Allocation failure: {0}")]
    /// An allocation failed.
    OutOfMemory(#[from] TryReserveError),
    #[error("Cannot create thread pool: {0}")]
    /// The thread pool could not be created.
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("Duplicate key {0}")]
    /// A duplicate key was detected.
    DuplicateKey(u64),
    #[error("Construction stopped")]
    /// The stop flag was set.
    Stopped,
}

impl Mphf {
    /// Build a function on the given keys using `num_threads` threads and
    /// the given γ.
    ///
    /// This is a shortcut for [`MphfBuilder`] with default seed and number of
    /// levels, and no logging.
    pub fn new(keys: &[u64], num_threads: usize, gamma: f64) -> Result<Self, BuildError> {
        MphfBuilder::default()
            .num_threads(num_threads)
            .gamma(gamma)
            .try_build(keys, no_logging![])
    }
}

/// Probe the keys of a level, returning the occupied slots and the keys that
/// must be passed to the next level.
///
/// Must be called inside the construction thread pool.
fn build_level(keys: &[u64], seed: u64, gamma: f64) -> Result<(BlockRank, Vec<u64>), BuildError> {
    let num_slots = level_size(keys.len() as u64, gamma)
        .and_then(|s| usize::try_from(s).ok())
        .ok_or(BuildError::LevelTooLarge(keys.len()))?;

    let taken = AtomicBitVec::try_new_atomic(num_slots)?;
    let collided = AtomicBitVec::try_new_atomic(num_slots)?;

    // Setting bits is commutative, so the order of probing does not matter
    keys.par_chunks(CHUNK_SIZE).for_each(|chunk| {
        for &key in chunk {
            let pos = slot(key, seed, num_slots);
            if taken.fetch_set(pos, Ordering::Relaxed) {
                collided.set(pos, true, Ordering::Relaxed);
            }
        }
    });

    let leftover: Vec<u64> = keys
        .par_iter()
        .copied()
        .filter(|&key| collided.get(slot(key, seed, num_slots), Ordering::Relaxed))
        .collect();

    let mut bits: BitVec = taken.into();
    bits.and_not_assign(&collided.into());

    Ok((BlockRank::new(bits), leftover))
}

impl MphfBuilder {
    /// Build a function on the given keys.
    ///
    /// Keys must be distinct. Duplicate keys collide at every level, so they
    /// always end up in the fallback table, where they are detected.
    pub fn try_build(
        &self,
        keys: &[u64],
        pl: &mut impl ProgressLog,
    ) -> Result<Mphf, BuildError> {
        if keys.is_empty() {
            return Err(BuildError::EmptyKeySet);
        }
        if !(1.0..=MAX_GAMMA).contains(&self.gamma) {
            return Err(BuildError::InvalidGamma(self.gamma));
        }
        if self.num_threads == 0 {
            return Err(BuildError::InvalidThreads);
        }

        let thread_pool = ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build()?;

        let n = keys.len();
        let max_levels = self.max_levels.min(MAX_LEVELS);
        let mut todo = Vec::new();
        todo.try_reserve_exact(n)?;
        todo.extend_from_slice(keys);

        pl.info(format_args!(
            "Number of keys: {} Gamma: {} Number of threads: {}",
            n,
            self.gamma,
            thread_pool.current_num_threads()
        ));

        let start = Instant::now();
        pl.item_name("key");
        pl.expected_updates(Some(n));
        pl.start("Building levels...");

        let mut levels = Vec::new();
        let mut offset = 0_u64;

        while !todo.is_empty() && todo.len() > self.fallback_threshold && levels.len() < max_levels
        {
            if let Some(stop_flag) = &self.stop_flag {
                if stop_flag.load(Ordering::Relaxed) {
                    pl.done();
                    return Err(BuildError::Stopped);
                }
            }

            let level_index = levels.len();
            let seed = level_seed(self.seed, level_index);
            let (ranks, leftover) = thread_pool.install(|| build_level(&todo, seed, self.gamma))?;
            let placed = ranks.count();

            pl.info(format_args!(
                "Level {}: {} keys, {} slots, {} placed ({:.2}%)",
                level_index,
                todo.len(),
                ranks.len(),
                placed,
                100.0 * placed as f64 / todo.len() as f64
            ));
            pl.update_with_count(placed);

            levels.push(Level::new(seed, offset, ranks));
            offset += placed as u64;
            todo = leftover;
        }

        pl.done();

        todo.sort_unstable();
        if let Some(dup) = todo.windows(2).find(|w| w[0] == w[1]) {
            pl.error(format_args!("Duplicate key {}", dup[0]));
            return Err(BuildError::DuplicateKey(dup[0]));
        }

        if !todo.is_empty() {
            log::debug!(
                "{} keys left after {} levels go to the fallback table",
                todo.len(),
                levels.len()
            );
        }

        debug_assert_eq!(offset + todo.len() as u64, n as u64);
        let fallback_values = (offset..n as u64).collect::<Box<[u64]>>();

        let mphf = Mphf {
            n: n as u64,
            gamma: self.gamma,
            seed: self.seed,
            levels: levels.into_boxed_slice(),
            fallback_keys: todo.into_boxed_slice(),
            fallback_values,
        };

        pl.info(format_args!(
            "Construction completed in {:.3} seconds ({} keys, {:.3} ns/key, {} levels, {} fallback keys, {:.3} bits/key)",
            start.elapsed().as_secs_f64(),
            n,
            start.elapsed().as_nanos() as f64 / n as f64,
            mphf.num_levels(),
            mphf.fallback_len(),
            mphf.bits_per_key()
        ));

        Ok(mphf)
    }
}
