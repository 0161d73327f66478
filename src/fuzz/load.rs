/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */
use crate::mph::{Mphf, MphfBuilder};
use arbitrary::Arbitrary;
use dsi_progress_logger::no_logging;
use std::collections::BTreeSet;

#[derive(Arbitrary, Debug)]
pub struct Data {
    /// the keys of the function
    keys: Vec<u64>,
    /// (position % len, value to xor) pairs applied to the serialized function
    corruptions: Vec<(u16, u8)>,
    /// length of the serialized function to keep, % len
    truncate: Option<u16>,
    /// raw bytes fed directly to the deserializer
    raw: Vec<u8>,
}

/// Serialize a function, corrupt it, and check that loading either fails
/// or returns the same function.
pub fn harness(data: Data) {
    // whatever happens on raw bytes, it must not panic
    let _ = Mphf::deserialize(&mut data.raw.as_slice());

    let keys = data
        .keys
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();
    if keys.is_empty() {
        return;
    }

    let mphf = MphfBuilder::default()
        .num_threads(1)
        .try_build(&keys, no_logging![])
        .unwrap();
    let mut bytes = Vec::new();
    mphf.serialize(&mut bytes).unwrap();
    let original = bytes.clone();

    let len = bytes.len();
    for (pos, value) in data.corruptions {
        bytes[pos as usize % len] ^= value;
    }
    if let Some(truncate) = data.truncate {
        bytes.truncate(truncate as usize % len);
    }

    match Mphf::deserialize(&mut bytes.as_slice()) {
        Ok(loaded) => {
            assert_eq!(bytes, original, "A corrupted function has been loaded");
            assert_eq!(loaded, mphf);
        }
        Err(_) => assert_ne!(bytes, original, "A valid function failed to load"),
    }
}
