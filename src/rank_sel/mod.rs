/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Support for rank operations.

The structures in this module add a counting index to a
[`BitVec`](crate::bits::bit_vec::BitVec) and implement the
[`Rank`](crate::traits::Rank) trait.

*/

mod block_rank;
pub use block_rank::*;
