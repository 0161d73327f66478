/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Minimal perfect hash functions.

A minimal perfect hash function maps a static set of *n* keys bijectively to
[0..*n*). Like static functions, it may return any result on a key that is not
part of the original set, which makes it possible to use a constant number of
bits per key, independently of the size of the keys.

[`Mphf`] implements the BBHash construction by Limasset, Rizk, Chikhi, and
Peterlongo on 64-bit keys; [`MphfBuilder`] builds instances in parallel, and
[`serdes`] describes the on-disk format. [`KeyIndex`] adds exact membership.

*/

mod bbhash;
pub use bbhash::*;

mod builder;
pub use builder::*;

pub mod serdes;
pub use serdes::LoadError;

mod key_index;
pub use key_index::KeyIndex;
