//! Batch generation into numbered output directories.
//!
//! Body `i` is written to `<root>/<i as six digits>`. Bodies are
//! independent: an existing directory is skipped and a failed body is
//! reported, and in both cases the batch carries on.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use rand::{Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use rayon::prelude::*;

use crate::body::BodyComposer;
use crate::error::{GenError, GenResult};

/// Batch parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub output_root: PathBuf,
    pub count: usize,
    /// Master seed; drawn from the OS when absent.
    pub seed: Option<u64>,
    /// Worker threads; 1 runs sequentially.
    pub jobs: usize,
}

/// What happened to one body of a batch.
#[derive(Debug)]
pub enum BodyOutcome {
    /// The body description that was written.
    Generated(PathBuf),
    /// The directory already existed and was left alone.
    Skipped(PathBuf),
    Failed { dir: PathBuf, error: GenError },
}

/// Per-body outcomes, in body order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub seed: u64,
    pub outcomes: Vec<BodyOutcome>,
}

impl BatchReport {
    #[must_use]
    pub fn generated(&self) -> usize {
        self.count(|o| matches!(o, BodyOutcome::Generated(_)))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, BodyOutcome::Skipped(_)))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, BodyOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&BodyOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Output directory of body `index`.
#[must_use]
pub fn body_dir(root: &Path, index: usize) -> PathBuf {
    root.join(format!("{index:06}"))
}

/// Generate `options.count` bodies under `options.output_root`.
///
/// Only failing to create the root itself (or the worker pool) is an
/// error; per-body problems land in the report.
pub fn run_batch(composer: &BodyComposer, options: &BatchOptions) -> GenResult<BatchReport> {
    let root = &options.output_root;
    fs::create_dir_all(root).map_err(GenError::io(root))?;

    let seed = options.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!(
        "generating {} '{}' bodies into {} (seed {seed})",
        options.count,
        composer.name(),
        root.display()
    );

    // one seed per body, so output does not depend on the worker count
    let mut master = Xoshiro256StarStar::seed_from_u64(seed);
    let seeds: Vec<u64> = (0..options.count).map(|_| master.next_u64()).collect();

    let outcomes: Vec<BodyOutcome> = if options.jobs > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.jobs)
            .build()?;
        pool.install(|| {
            seeds
                .par_iter()
                .enumerate()
                .map(|(i, s)| generate_one(composer, &body_dir(root, i), *s))
                .collect()
        })
    } else {
        seeds
            .iter()
            .enumerate()
            .map(|(i, s)| generate_one(composer, &body_dir(root, i), *s))
            .collect()
    };

    Ok(BatchReport { seed, outcomes })
}

fn generate_one(composer: &BodyComposer, dir: &Path, seed: u64) -> BodyOutcome {
    match fs::create_dir(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            warn!("{}; skipping", GenError::OutputExists { path: dir.to_path_buf() });
            return BodyOutcome::Skipped(dir.to_path_buf());
        }
        Err(e) => {
            let error = GenError::io(dir)(e);
            error!("{}: {} error: {error}", dir.display(), error.kind());
            return BodyOutcome::Failed {
                dir: dir.to_path_buf(),
                error,
            };
        }
    }

    let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
    match composer.generate(dir, &mut rng) {
        Ok(path) => {
            info!("generated {}", path.display());
            BodyOutcome::Generated(path)
        }
        Err(error) => {
            error!("{}: {} error: {error}", dir.display(), error.kind());
            BodyOutcome::Failed {
                dir: dir.to_path_buf(),
                error,
            }
        }
    }
}
