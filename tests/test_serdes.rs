/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use bbhash::prelude::*;
use dsi_progress_logger::*;
use std::io::Write;
use xxhash_rust::xxh3::xxh3_64;

fn build(n: u64, max_levels: usize) -> Result<(Vec<u64>, Mphf)> {
    let keys = (0..n).map(|x| x.wrapping_mul(0x9E3779B97F4A7C15)).collect::<Vec<_>>();
    let mphf = MphfBuilder::default()
        .max_levels(max_levels)
        .try_build(&keys, no_logging![])?;
    Ok((keys, mphf))
}

#[test]
fn test_store_load() -> Result<()> {
    let tmp = tempfile::NamedTempFile::new()?;
    for n in [1, 10, 1000, 100_000] {
        let (keys, mphf) = build(n, 25)?;
        mphf.store(tmp.path())?;
        let loaded = Mphf::load(tmp.path())?;
        assert_eq!(mphf, loaded);
        for &key in &keys {
            assert_eq!(mphf.get(key), loaded.get(key));
        }
    }
    Ok(())
}

#[test]
fn test_store_load_fallback() -> Result<()> {
    let (keys, mphf) = build(10_000, 2)?;
    assert!(mphf.fallback_len() > 0);
    let mut bytes = Vec::new();
    mphf.serialize(&mut bytes)?;
    let loaded = Mphf::deserialize(&mut bytes.as_slice())?;
    for &key in &keys {
        assert_eq!(mphf.get(key), loaded.get(key));
    }
    Ok(())
}

#[test]
fn test_truncated() -> Result<()> {
    let (_, mphf) = build(100, 2)?;
    let mut bytes = Vec::new();
    mphf.serialize(&mut bytes)?;
    for len in 0..bytes.len() {
        assert!(
            Mphf::deserialize(&mut &bytes[..len]).is_err(),
            "Truncation at {} was accepted",
            len
        );
    }
    Ok(())
}

#[test]
fn test_corrupted() -> Result<()> {
    let (_, mphf) = build(100, 2)?;
    let mut bytes = Vec::new();
    mphf.serialize(&mut bytes)?;
    for pos in 0..bytes.len() {
        for mask in [0x01, 0x80] {
            let mut bad = bytes.clone();
            bad[pos] ^= mask;
            assert!(
                Mphf::deserialize(&mut bad.as_slice()).is_err(),
                "Corruption at {} was accepted",
                pos
            );
        }
    }
    Ok(())
}

#[test]
fn test_trailing_data() -> Result<()> {
    let (_, mphf) = build(100, 25)?;
    let mut tmp = tempfile::NamedTempFile::new()?;
    mphf.serialize(&mut tmp)?;
    tmp.write_all(&[0])?;
    tmp.flush()?;
    assert!(matches!(
        Mphf::load(tmp.path()),
        Err(LoadError::TrailingData)
    ));
    Ok(())
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        Mphf::load("/this/file/does/not/exist"),
        Err(LoadError::Io(_))
    ));
}

#[test]
fn test_garbage() {
    assert!(matches!(
        Mphf::deserialize(&mut &b"not a function at all"[..]),
        Err(LoadError::BadMagic(_))
    ));
    assert!(matches!(
        Mphf::deserialize(&mut &b""[..]),
        Err(LoadError::Truncated)
    ));
}

/// Recompute the trailing checksum, so that only structural checks can
/// reject the stream.
fn reseal(bytes: &mut [u8]) {
    let len = bytes.len() - 8;
    let checksum = xxh3_64(&bytes[..len]);
    bytes[len..].copy_from_slice(&checksum.to_le_bytes());
}

// Offset of the number of slots of the first level
const LEVEL_0_SLOTS: usize = 60;
// Offset of the first word of the first level
const LEVEL_0_WORDS: usize = 76;
// Offset of the first fallback key when there are no levels
const FALLBACK_KEYS: usize = 52;

#[test]
fn test_resealed_rank_table() -> Result<()> {
    let (_, mphf) = build(1000, 25)?;
    let mut bytes = Vec::new();
    mphf.serialize(&mut bytes)?;

    let mut sealed = bytes.clone();
    reseal(&mut sealed);
    assert_eq!(sealed, bytes);

    let num_words = mphf.levels()[0].num_slots() / 64;
    // Skip the words and the number of counts, then alter the second count
    let count = LEVEL_0_WORDS + num_words * 8 + 8 + 8;
    bytes[count] ^= 1;
    reseal(&mut bytes);
    assert!(matches!(
        Mphf::deserialize(&mut bytes.as_slice()),
        Err(LoadError::CorruptRankTable(0))
    ));
    Ok(())
}

#[test]
fn test_resealed_bit_vector() -> Result<()> {
    let (_, mphf) = build(1000, 25)?;
    let mut bytes = Vec::new();
    mphf.serialize(&mut bytes)?;

    // Counts no longer match the words
    bytes[LEVEL_0_WORDS] ^= 1;
    reseal(&mut bytes);
    assert!(matches!(
        Mphf::deserialize(&mut bytes.as_slice()),
        Err(LoadError::CorruptRankTable(0))
    ));
    Ok(())
}

#[test]
fn test_resealed_sizes() -> Result<()> {
    let (_, mphf) = build(1000, 25)?;
    let mut bytes = Vec::new();
    mphf.serialize(&mut bytes)?;

    let mut bad = bytes.clone();
    let num_slots = mphf.levels()[0].num_slots() as u64 + 64;
    bad[LEVEL_0_SLOTS..LEVEL_0_SLOTS + 8].copy_from_slice(&num_slots.to_le_bytes());
    reseal(&mut bad);
    assert!(matches!(
        Mphf::deserialize(&mut bad.as_slice()),
        Err(LoadError::SizeMismatch(_))
    ));

    // A different number of keys implies different level sizes
    let mut bad = bytes.clone();
    bad[20..28].copy_from_slice(&100_000_u64.to_le_bytes());
    reseal(&mut bad);
    assert!(matches!(
        Mphf::deserialize(&mut bad.as_slice()),
        Err(LoadError::SizeMismatch(_))
    ));
    Ok(())
}

#[test]
fn test_resealed_fallback() -> Result<()> {
    let (_, mphf) = build(100, 0)?;
    assert_eq!(mphf.num_levels(), 0);
    let mut bytes = Vec::new();
    mphf.serialize(&mut bytes)?;

    // Unsorted keys
    let mut bad = bytes.clone();
    let (first, second) = bad[FALLBACK_KEYS..FALLBACK_KEYS + 16].split_at_mut(8);
    first.swap_with_slice(second);
    reseal(&mut bad);
    assert!(matches!(
        Mphf::deserialize(&mut bad.as_slice()),
        Err(LoadError::CorruptFallback)
    ));

    // Wrong output
    let mut bad = bytes.clone();
    let values = FALLBACK_KEYS + 100 * 8;
    bad[values..values + 8].copy_from_slice(&5_u64.to_le_bytes());
    reseal(&mut bad);
    assert!(matches!(
        Mphf::deserialize(&mut bad.as_slice()),
        Err(LoadError::CorruptFallback)
    ));
    Ok(())
}
