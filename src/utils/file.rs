/*
 *
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Utility wrappers for files of keys.

A key file contains one unsigned 64-bit decimal integer per line; empty lines
are skipped. Files can be optionally compressed with zstd.

*/

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use zstd::stream::read::Decoder;

/**

An iterator on the keys coming from a [`BufRead`].

The lines are read into a reusable internal string buffer that
grows as needed.

For convenience, we implement [`From`] from [`BufRead`].

*/
pub struct KeyLines<B> {
    buf: B,
    line: String,
    line_number: usize,
}

impl<B> KeyLines<B> {
    pub fn new(buf: B) -> Self {
        KeyLines {
            buf,
            line: String::with_capacity(32),
            line_number: 0,
        }
    }
}

impl<B> From<B> for KeyLines<B> {
    fn from(buf: B) -> Self {
        KeyLines::new(buf)
    }
}

impl<B: BufRead> Iterator for KeyLines<B> {
    type Item = Result<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            self.line_number += 1;
            match self.buf.read_line(&mut self.line) {
                Err(e) => return Some(Err(e.into())),
                Ok(0) => return None,
                Ok(_) => {
                    let key = self.line.trim();
                    if key.is_empty() {
                        continue;
                    }
                    return Some(key.parse::<u64>().with_context(|| {
                        format!("Invalid key {:?} at line {}", key, self.line_number)
                    }));
                }
            }
        }
    }
}

/// Read all keys from a file, possibly compressed with zstd.
pub fn read_keys(path: impl AsRef<Path>, zstd: bool) -> Result<Vec<u64>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    if zstd {
        KeyLines::new(BufReader::new(Decoder::new(file)?)).collect()
    } else {
        KeyLines::new(BufReader::new(file)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_lines() -> Result<()> {
        let data = "1\n\n2\r\n18446744073709551615\n";
        let keys = KeyLines::new(data.as_bytes()).collect::<Result<Vec<_>>>()?;
        assert_eq!(keys, vec![1, 2, u64::MAX]);
        Ok(())
    }

    #[test]
    fn test_bad_key() {
        let data = "1\nfoo\n";
        let res = KeyLines::new(data.as_bytes()).collect::<Result<Vec<_>>>();
        assert!(res.is_err());
    }
}
