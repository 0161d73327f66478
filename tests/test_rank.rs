/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use bbhash::prelude::*;
use rand::{rngs::SmallRng, Rng, SeedableRng};

#[test]
fn test() {
    let mut rng = SmallRng::seed_from_u64(0);
    let lens = (1..1000)
        .chain((10_000..100_000).step_by(1000))
        .chain((100_000..1_000_000).step_by(100_000));
    for density in [0.1, 0.5, 0.9] {
        for len in lens.clone() {
            let bits = (0..len)
                .map(|_| rng.random_bool(density))
                .collect::<BitVec>();
            let block_rank = BlockRank::new(bits.clone());

            let mut r = 0;
            for (i, bit) in bits.iter().enumerate() {
                assert_eq!(block_rank.rank(i), r);
                if bit {
                    r += 1;
                }
            }
            assert_eq!(block_rank.rank(bits.len() + 1), bits.count_ones());
        }
    }
}

#[test]
fn test_rank_zero() {
    let bits = bit_vec![0, 1, 0, 1, 1, 0, 1, 0, 0, 1];
    let block_rank = BlockRank::new(bits);
    assert_eq!(block_rank.rank_zero(0), 0);
    assert_eq!(block_rank.rank_zero(1), 1);
    assert_eq!(block_rank.rank_zero(2), 1);
    assert_eq!(block_rank.rank_zero(3), 2);
    assert_eq!(block_rank.rank_zero(4), 2);
    assert_eq!(block_rank.rank_zero(5), 2);
    assert_eq!(block_rank.rank_zero(6), 3);
    assert_eq!(block_rank.rank_zero(7), 3);
    assert_eq!(block_rank.rank_zero(8), 4);
    assert_eq!(block_rank.rank_zero(9), 5);
    assert_eq!(block_rank.rank_zero(10), 5);
}

#[test]
fn test_empty() {
    let block_rank = BlockRank::new(BitVec::new(0));
    assert_eq!(block_rank.rank(0), 0);
    assert_eq!(block_rank.count(), 0);
    assert_eq!(block_rank.counts(), &[0]);
}

#[test]
fn test_full_blocks() {
    let bits = (0..4096).map(|_| true).collect::<BitVec>();
    let block_rank = BlockRank::new(bits);
    assert_eq!(block_rank.counts(), &[0, 512, 1024, 1536, 2048, 2560, 3072, 3584, 4096]);
    for i in 0..=4096 {
        assert_eq!(block_rank.rank(i), i);
    }
}

fn ranks_and_count<R: bbhash::traits::Rank + bbhash::traits::BitCount>(r: &R) -> (usize, usize) {
    (r.rank(bbhash::traits::BitLength::len(r)), r.count())
}

#[test]
fn test_traits_module_paths() {
    let block_rank = BlockRank::new(bit_vec![1, 1, 0, 1]);
    assert_eq!(ranks_and_count(&block_rank), (3, 3));
    assert_eq!(ranks_and_count(&&block_rank), (3, 3));
    assert_eq!(ranks_and_count(&Box::new(block_rank)), (3, 3));
}
