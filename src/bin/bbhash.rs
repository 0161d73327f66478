/*
 *
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::{ensure, Result};
use bbhash::mph::{Mphf, MphfBuilder};
use bbhash::utils::read_keys;
use clap::{ArgGroup, Args, Parser, Subcommand};
use dsi_progress_logger::*;

#[derive(Parser, Debug)]
#[command(about = "Build, store and query BBHash minimal perfect hash functions on 64-bit keys", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
#[clap(group(
            ArgGroup::new("input")
                .required(true)
                .args(&["filename", "n"]),
))]
struct Input {
    #[arg(short, long)]
    /// A file containing decimal 64-bit keys, one per line.
    filename: Option<String>,
    #[arg(short)]
    /// Use the 64-bit keys [0..n). Mainly useful for testing and debugging.
    n: Option<u64>,
    /// The filename containing the keys is compressed with zstd.
    #[arg(short, long)]
    zstd: bool,
}

impl Input {
    fn keys(&self) -> Result<Vec<u64>> {
        match (&self.filename, self.n) {
            (Some(filename), _) => read_keys(filename, self.zstd),
            (None, Some(n)) => Ok((0..n).collect()),
            (None, None) => unreachable!("clap requires one of the inputs"),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a function and store it.
    Build {
        #[command(flatten)]
        input: Input,
        /// The name of the file that will contain the function.
        func: String,
        /// Use this number of threads.
        #[arg(short, long, default_value_t = 8)]
        threads: usize,
        /// The ratio between slots and keys in each level.
        #[arg(short, long, default_value_t = 2.0)]
        gamma: f64,
        /// The global seed.
        #[arg(short, long, default_value_t = 0)]
        seed: u64,
        /// The maximum number of levels.
        #[arg(long, default_value_t = 25)]
        max_levels: usize,
    },
    /// Load a function and query it on a set of keys.
    Query {
        #[command(flatten)]
        input: Input,
        /// The name of the file containing the function.
        func: String,
        /// Check that the function is a bijection on the keys.
        #[arg(short, long)]
        check: bool,
        /// Print the output associated with each key.
        #[arg(short, long)]
        print: bool,
    },
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .try_init()?;

    let cli = Cli::parse();

    let mut pl = ProgressLogger::default();
    pl.display_memory(true);

    match cli.command {
        Command::Build {
            input,
            func,
            threads,
            gamma,
            seed,
            max_levels,
        } => {
            let keys = input.keys()?;
            let mphf = MphfBuilder::default()
                .num_threads(threads)
                .gamma(gamma)
                .seed(seed)
                .max_levels(max_levels)
                .try_build(&keys, &mut pl)?;
            mphf.store(&func)?;
            log::info!(
                "Stored function on {} keys with {} levels ({:.3} bits/key) in {}",
                mphf.len(),
                mphf.num_levels(),
                mphf.bits_per_key(),
                func
            );
        }
        Command::Query {
            input,
            func,
            check,
            print,
        } => {
            let mphf = Mphf::load(&func)?;
            let keys = input.keys()?;
            let mut seen = if check {
                ensure!(
                    keys.len() == mphf.len(),
                    "The function has {} keys, but {} were provided",
                    mphf.len(),
                    keys.len()
                );
                vec![false; keys.len()]
            } else {
                vec![]
            };

            pl.item_name("key");
            pl.expected_updates(Some(keys.len()));
            pl.start("Querying...");
            for &key in &keys {
                let value = mphf.get(key);
                if print {
                    println!("{}\t{}", key, value);
                }
                if check {
                    ensure!(
                        !seen[value as usize],
                        "Output {} of key {} has already been assigned",
                        value,
                        key
                    );
                    seen[value as usize] = true;
                }
                pl.light_update();
            }
            pl.done_with_count(keys.len());
        }
    }

    Ok(())
}
