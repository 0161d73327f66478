/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![no_main]

use bbhash::fuzz::load::*;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: Data| harness(data));
