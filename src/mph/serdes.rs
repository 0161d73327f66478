/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Serialization of [`Mphf`].

The format is little endian and self-describing:

| Field | Type |
|---|---|
| magic | `b"BBHMPHF\0"` |
| version | `u32` (currently 1) |
| γ | `f64` |
| number of keys *n* | `u64` |
| global seed | `u64` |
| number of levels | `u64` |
| for each level: seed, offset, number of slots | `u64` ×3 |
| for each level: number of words, words | `u64`, `[u64]` |
| for each level: number of counts, counts | `u64`, `[u64]` |
| number of fallback keys | `u64` |
| fallback keys, fallback outputs | `[u64]`, `[u64]` |
| XXH3 checksum of all the above | `u64` |

Loading checks every field against the constraints satisfied by a function
built by [`MphfBuilder`](crate::mph::MphfBuilder): slot counts must be the
ones construction would have produced for the keys left at that level,
offsets must chain, count arrays must match the bit vectors, the fallback
table must be sorted and cover exactly the outputs not assigned by the
levels, and the checksum must match. Arrays are read in bounded chunks, so
a forged length cannot cause a large allocation before the stream ends.

*/

use super::bbhash::{level_size, Level, Mphf, MAX_GAMMA, MAX_LEVELS};
use crate::bits::BitVec;
use crate::rank_sel::BlockRank;
use crate::traits::BitCount;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use xxhash_rust::xxh3::Xxh3;

/// The magic cookie at the start of a serialized function.
pub const MAGIC: [u8; 8] = *b"BBHMPHF\0";
/// The current version of the format.
pub const VERSION: u32 = 1;

/// Words are read in chunks of this size.
const READ_CHUNK: usize = 1 << 16;

/// Errors raised while loading a function.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    /// An I/O error other than a premature end of stream.
    Io(#[source] io::Error),
    #[error("Truncated stream")]
    /// The stream ended prematurely.
    Truncated,
    #[error("Bad magic cookie {0:?}")]
    /// The stream does not start with [`MAGIC`].
    BadMagic([u8; 8]),
    #[error("Unsupported version {0}")]
    /// The version is not [`VERSION`].
    UnsupportedVersion(u32),
    #[error("Invalid gamma {0}")]
    /// γ is out of range.
    InvalidGamma(f64),
    #[error("Too many levels: {0}")]
    /// There are more than [`MAX_LEVELS`] levels.
    TooManyLevels(u64),
    #[error("Size mismatch: {0}")]
    /// Some size is inconsistent with the number of keys.
    SizeMismatch(String),
    #[error("Corrupted rank table at level {0}")]
    /// The counts of a level do not match its bit vector.
    CorruptRankTable(usize),
    #[error("Corrupted fallback table")]
    /// The fallback table is not sorted or contains wrong outputs.
    CorruptFallback,
    #[error("Checksum mismatch: stored {stored:#018x}, computed {computed:#018x}")]
    /// The checksum does not match.
    ChecksumMismatch { stored: u64, computed: u64 },
    #[error("Trailing data after the checksum")]
    /// The file continues after the checksum.
    TrailingData,
}

impl From<io::Error> for LoadError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            LoadError::Truncated
        } else {
            LoadError::Io(e)
        }
    }
}

/// A writer computing the checksum of the data written.
struct HashWriter<W> {
    inner: W,
    hasher: Xxh3,
}

impl<W: Write> Write for HashWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// A reader computing the checksum of the data read.
struct HashReader<R> {
    inner: R,
    hasher: Xxh3,
}

impl<R: Read> Read for HashReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.hasher.update(&buf[..read]);
        Ok(read)
    }
}

fn write_u64(writer: &mut impl Write, value: u64) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

fn write_words(writer: &mut impl Write, words: &[u64]) -> io::Result<()> {
    write_u64(writer, words.len() as u64)?;
    for &word in words {
        write_u64(writer, word)?;
    }
    Ok(())
}

fn read_u64(reader: &mut impl Read) -> Result<u64, LoadError> {
    let mut buffer = [0; 8];
    reader.read_exact(&mut buffer)?;
    Ok(u64::from_le_bytes(buffer))
}

/// Read `len` words, allocating memory only as data arrives.
fn read_words(reader: &mut impl Read, len: u64) -> Result<Vec<u64>, LoadError> {
    let len = usize::try_from(len)
        .map_err(|_| LoadError::SizeMismatch(format!("array length {} too large", len)))?;
    let mut words = Vec::with_capacity(len.min(READ_CHUNK));
    let mut buffer = vec![0_u8; len.min(READ_CHUNK) * 8];
    let mut left = len;
    while left > 0 {
        let chunk = left.min(READ_CHUNK);
        let bytes = &mut buffer[..chunk * 8];
        reader.read_exact(bytes)?;
        words.extend(bytes.chunks_exact(8).map(|b| {
            let mut word = [0; 8];
            word.copy_from_slice(b);
            u64::from_le_bytes(word)
        }));
        left -= chunk;
    }
    Ok(words)
}

/// Read a length and check it against the expected one.
fn read_len(reader: &mut impl Read, expected: u64, what: &str) -> Result<u64, LoadError> {
    let len = read_u64(reader)?;
    if len != expected {
        return Err(LoadError::SizeMismatch(format!(
            "{} is {}, expected {}",
            what, len, expected
        )));
    }
    Ok(len)
}

impl Mphf {
    /// Serialize the function to the given writer.
    pub fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        let mut writer = HashWriter {
            inner: writer,
            hasher: Xxh3::new(),
        };

        writer.write_all(&MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        write_u64(&mut writer, self.gamma.to_bits())?;
        write_u64(&mut writer, self.n)?;
        write_u64(&mut writer, self.seed)?;
        write_u64(&mut writer, self.levels.len() as u64)?;

        for level in self.levels.iter() {
            write_u64(&mut writer, level.seed)?;
            write_u64(&mut writer, level.offset)?;
            write_u64(&mut writer, level.num_slots() as u64)?;
            write_words(&mut writer, level.ranks.as_ref())?;
            write_words(&mut writer, level.ranks.counts())?;
        }

        write_words(&mut writer, &self.fallback_keys)?;
        for &value in self.fallback_values.iter() {
            write_u64(&mut writer, value)?;
        }

        let checksum = writer.hasher.digest();
        write_u64(&mut writer.inner, checksum)
    }

    /// Store the function in a file.
    pub fn store(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.serialize(&mut writer)?;
        writer.flush()
    }

    /// Deserialize a function from the given reader.
    ///
    /// The reader is left just after the checksum.
    pub fn deserialize(reader: &mut impl Read) -> Result<Self, LoadError> {
        let mut reader = HashReader {
            inner: reader,
            hasher: Xxh3::new(),
        };

        let mut magic = [0; 8];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(LoadError::BadMagic(magic));
        }

        let mut version = [0; 4];
        reader.read_exact(&mut version)?;
        let version = u32::from_le_bytes(version);
        if version != VERSION {
            return Err(LoadError::UnsupportedVersion(version));
        }

        let gamma = f64::from_bits(read_u64(&mut reader)?);
        if !(1.0..=MAX_GAMMA).contains(&gamma) {
            return Err(LoadError::InvalidGamma(gamma));
        }

        let n = read_u64(&mut reader)?;
        if n == 0 {
            return Err(LoadError::SizeMismatch("no keys".into()));
        }
        let seed = read_u64(&mut reader)?;

        let num_levels = read_u64(&mut reader)?;
        if num_levels > MAX_LEVELS as u64 {
            return Err(LoadError::TooManyLevels(num_levels));
        }

        let mut levels = Vec::with_capacity(num_levels as usize);
        let mut offset = 0_u64;

        for level_index in 0..num_levels as usize {
            let level_seed = read_u64(&mut reader)?;
            read_len(&mut reader, offset, "level offset")?;

            if offset == n {
                return Err(LoadError::SizeMismatch(format!(
                    "level {} has no keys",
                    level_index
                )));
            }
            let expected_slots = level_size(n - offset, gamma).ok_or_else(|| {
                LoadError::SizeMismatch(format!("level {} is too large", level_index))
            })?;
            let num_slots = read_len(&mut reader, expected_slots, "number of slots")?;
            let num_slots = usize::try_from(num_slots).map_err(|_| {
                LoadError::SizeMismatch(format!("level {} is too large", level_index))
            })?;

            let num_words = read_len(&mut reader, num_slots.div_ceil(64) as u64, "number of words")?;
            let words = read_words(&mut reader, num_words)?;
            let bits = BitVec::from_words(words, num_slots).ok_or_else(|| {
                LoadError::SizeMismatch(format!("bit vector of level {}", level_index))
            })?;

            let num_counts = read_len(
                &mut reader,
                num_slots.div_ceil(64 * BlockRank::WORDS_PER_BLOCK) as u64 + 1,
                "number of counts",
            )?;
            let counts = read_words(&mut reader, num_counts)?.into_boxed_slice();
            let ranks = BlockRank::from_parts(bits, counts)
                .ok_or(LoadError::CorruptRankTable(level_index))?;

            let placed = ranks.count() as u64;
            if placed > n - offset {
                return Err(LoadError::SizeMismatch(format!(
                    "level {} places {} keys, but only {} are left",
                    level_index,
                    placed,
                    n - offset
                )));
            }

            levels.push(Level::new(level_seed, offset, ranks));
            offset += placed;
        }

        let fallback_len = read_len(&mut reader, n - offset, "number of fallback keys")?;
        let fallback_keys = read_words(&mut reader, fallback_len)?;
        let fallback_values = read_words(&mut reader, fallback_len)?;

        if fallback_keys.windows(2).any(|w| w[0] >= w[1])
            || fallback_values
                .iter()
                .zip(offset..)
                .any(|(&value, expected)| value != expected)
        {
            return Err(LoadError::CorruptFallback);
        }

        let computed = reader.hasher.digest();
        let stored = read_u64(&mut reader.inner)?;
        if stored != computed {
            return Err(LoadError::ChecksumMismatch { stored, computed });
        }

        log::debug!(
            "Loaded function on {} keys with {} levels and {} fallback keys",
            n,
            levels.len(),
            fallback_keys.len()
        );

        Ok(Self {
            n,
            gamma,
            seed,
            levels: levels.into_boxed_slice(),
            fallback_keys: fallback_keys.into_boxed_slice(),
            fallback_values: fallback_values.into_boxed_slice(),
        })
    }

    /// Load a function from a file.
    ///
    /// Besides the checks performed by [`deserialize`](Mphf::deserialize),
    /// the file must end right after the checksum.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let mut reader = BufReader::new(File::open(path).map_err(LoadError::Io)?);
        let mphf = Self::deserialize(&mut reader)?;
        let mut byte = [0];
        if reader.read(&mut byte)? != 0 {
            return Err(LoadError::TrailingData);
        }
        Ok(mphf)
    }
}
