//! Parallel exchange scanning.
//!
//! This module provides a Rayon-backed variant of the optimizer's scan:
//! every (slot, candidate) exchange of a pass is scored concurrently and the
//! winner is selected with the same total order the sequential scan uses, so
//! `par_generate` returns exactly what [`crate::generate`] returns for the
//! same seed and configuration, on any thread count. Enable with the
//! `parallel` feature flag.
//!
//! The search itself stays sequential (each accepted exchange depends on the
//! previous one); only the scoring of one pass fans out.

use rayon::prelude::*;

use crate::config::DesignConfig;
use crate::design::DesignResult;
use crate::error::Result;
use crate::optimize::{CancelToken, Exchange, Optimizer, SearchOutcome, SearchState};
use crate::pipeline;

impl Optimizer<'_> {
    /// Run the search with parallel exchange scoring.
    #[must_use]
    pub fn run_par(&self, cancel: &CancelToken) -> SearchOutcome {
        self.search(cancel, Self::scan_parallel)
    }

    /// Score every (slot, candidate) pair of one pass in parallel.
    fn scan_parallel(&self, state: &SearchState) -> Option<Exchange> {
        let pool = self.pool_size();
        (0..self.slots() * pool)
            .into_par_iter()
            .filter_map(|k| self.score_exchange(state, k / pool, k % pool))
            .reduce_with(|a, b| if b.better_than(&a) { b } else { a })
    }
}

/// Generate an optimized design using parallel exchange scoring.
///
/// Identical output to [`crate::generate`] for the same configuration.
///
/// # Errors
///
/// Same as [`crate::generate`].
pub fn par_generate(config: &DesignConfig) -> Result<DesignResult> {
    par_generate_with_cancel(config, &CancelToken::new())
}

/// Parallel variant of [`crate::generate_with_cancel`].
///
/// # Errors
///
/// Same as [`crate::generate`].
pub fn par_generate_with_cancel(
    config: &DesignConfig,
    cancel: &CancelToken,
) -> Result<DesignResult> {
    pipeline::run_with(config, cancel, Optimizer::run_par)
}
