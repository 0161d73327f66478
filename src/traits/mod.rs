/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Main traits for the bit-level structures.

*/

pub mod rank_sel;
pub use rank_sel::*;

pub mod prelude {
    pub use super::rank_sel::*;
}
