/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use bbhash::prelude::*;
use dsi_progress_logger::*;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::collections::HashSet;

#[test]
fn test_key_index() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(0);
    let keys = (0..100_000)
        .map(|_| rng.random::<u64>())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();

    let index = KeyIndex::try_new(&keys, &MphfBuilder::default().num_threads(2), no_logging![])?;
    assert_eq!(index.len(), keys.len());

    for &key in &keys {
        let pos = index.get(key).expect("Key not found");
        assert_eq!(index.key(pos as usize), Some(key));
        assert_eq!(index.mphf().get(key), pos);
    }

    let set = keys.iter().copied().collect::<HashSet<_>>();
    for _ in 0..100_000 {
        let key = rng.random::<u64>();
        assert_eq!(index.contains(key), set.contains(&key));
    }
    Ok(())
}

#[test]
fn test_from_loaded() -> Result<()> {
    let keys = (0..1000).map(|x| x * x).collect::<Vec<u64>>();
    let mphf = Mphf::new(&keys, 1, 1.5)?;
    let mut bytes = Vec::new();
    mphf.serialize(&mut bytes)?;
    let index = KeyIndex::from_mphf(Mphf::deserialize(&mut bytes.as_slice())?, &keys);
    assert!(keys.iter().all(|&key| index.contains(key)));
    assert!(!index.contains(2));
    Ok(())
}
