/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use bbhash::prelude::*;
use dsi_progress_logger::*;
use log::{LevelFilter, Log, Metadata, Record};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A logger raising a stop flag as soon as the first level is reported.
struct StopAfterFirstLevel {
    stop_flag: Arc<AtomicBool>,
    seen: AtomicBool,
}

impl Log for StopAfterFirstLevel {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if record.args().to_string().contains("Level 0:") {
            self.seen.store(true, Ordering::Relaxed);
            self.stop_flag.store(true, Ordering::Relaxed);
        }
    }

    fn flush(&self) {}
}

// This must be the only test in this file, as it installs a global logger
#[test]
fn test_stop_between_levels() {
    let stop_flag = Arc::new(AtomicBool::new(false));
    let logger: &'static StopAfterFirstLevel = Box::leak(Box::new(StopAfterFirstLevel {
        stop_flag: stop_flag.clone(),
        seen: AtomicBool::new(false),
    }));
    log::set_logger(logger).unwrap();
    log::set_max_level(LevelFilter::Info);

    let mut rng = SmallRng::seed_from_u64(0);
    let keys = (0..100_000).map(|_| rng.random::<u64>()).collect::<Vec<_>>();

    let mut pl = ProgressLogger::default();
    let result = MphfBuilder::default()
        .num_threads(2)
        .stop_flag(stop_flag.clone())
        .try_build(&keys, &mut pl);

    // Level 0 was built and reported before construction stopped
    assert!(logger.seen.load(Ordering::Relaxed));
    assert!(matches!(result, Err(BuildError::Stopped)));

    // Construction completes once the flag is lowered
    stop_flag.store(false, Ordering::Relaxed);
    log::set_max_level(LevelFilter::Off);
    let mphf = MphfBuilder::default()
        .num_threads(2)
        .stop_flag(stop_flag)
        .try_build(&keys, no_logging![])
        .unwrap();
    assert!(mphf.num_levels() > 1);
}
