//! Candidate-row generation.
//!
//! A candidate row is one possible alternative: a level choice per attribute.
//! [`FactorialRows`] enumerates the full factorial lazily in lexicographic
//! order; [`CandidatePool`] materializes it for the optimizer, falling back to
//! a seeded random subset when the factorial exceeds the configured cap.
//!
//! Enumeration is restarted for every request. Nothing is cached across
//! requests, so a fixed seed reproduces the same pool exactly.

use std::collections::HashSet;

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::coding::Codebook;
use crate::config::TaskFormat;
use crate::error::{Error, Result};

/// Lazy lexicographic enumeration of the full factorial.
///
/// Yields one level-index vector per candidate row. The sequence is finite:
/// it ends after `∏ levels` rows.
#[derive(Debug, Clone)]
pub struct FactorialRows {
    radices: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl FactorialRows {
    /// Start a fresh enumeration for the given per-attribute level counts.
    #[must_use]
    pub fn new(radices: Vec<usize>) -> Self {
        let next = if radices.is_empty() || radices.contains(&0) {
            None
        } else {
            Some(vec![0; radices.len()])
        };
        Self { radices, next }
    }

    /// Number of rows the enumeration will yield, saturating on overflow.
    #[must_use]
    pub fn total(&self) -> usize {
        self.radices
            .iter()
            .try_fold(1usize, |acc, &r| acc.checked_mul(r))
            .unwrap_or(usize::MAX)
    }
}

impl Iterator for FactorialRows {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.clone()?;

        // Mixed-radix increment, least significant digit last.
        let mut incremented = current.clone();
        let mut pos = incremented.len();
        loop {
            if pos == 0 {
                self.next = None;
                break;
            }
            pos -= 1;
            incremented[pos] += 1;
            if incremented[pos] < self.radices[pos] {
                self.next = Some(incremented);
                break;
            }
            incremented[pos] = 0;
        }

        Some(current)
    }
}

/// Materialized candidate rows with their coded design-matrix rows.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    rows: Vec<Vec<usize>>,
    coded: Array2<f64>,
    total_factorial: usize,
}

impl CandidatePool {
    /// Build the pool for one request.
    ///
    /// The full factorial is enumerated when it fits within `cap`; otherwise
    /// a seeded uniform subset of `cap` distinct rows is drawn. The
    /// status-quo alternative does not consume pool capacity: it is a fixed
    /// all-reference row appended per task by the optimizer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] when the task format asks for more
    /// alternatives per task than there are distinct candidate rows.
    pub fn new(
        codebook: &Codebook,
        task_format: &TaskFormat,
        cap: usize,
        seed: u64,
    ) -> Result<Self> {
        let radices: Vec<usize> = codebook
            .attributes()
            .iter()
            .map(|a| a.levels.len())
            .collect();
        let enumeration = FactorialRows::new(radices.clone());
        let total = enumeration.total();

        let mut rows: Vec<Vec<usize>> = if total <= cap {
            enumeration.collect()
        } else {
            sample_distinct(&radices, cap, seed)
        };
        rows.sort_unstable();

        if task_format.alternatives > rows.len() {
            return Err(Error::CapacityExceeded {
                requested: task_format.alternatives,
                available: rows.len(),
            });
        }

        let mut coded = Array2::zeros((rows.len(), codebook.columns()));
        for (i, levels) in rows.iter().enumerate() {
            coded.row_mut(i).assign(&codebook.code_row(levels));
        }

        Ok(Self {
            rows,
            coded,
            total_factorial: total,
        })
    }

    /// Number of distinct candidate rows in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Size of the full factorial, saturating on overflow.
    #[must_use]
    pub fn total_factorial(&self) -> usize {
        self.total_factorial
    }

    /// Whether the pool is a subset of the full factorial.
    #[must_use]
    pub fn is_capped(&self) -> bool {
        self.rows.len() < self.total_factorial
    }

    /// Level assignment of candidate `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn levels(&self, index: usize) -> &[usize] {
        &self.rows[index]
    }

    /// Coded design-matrix row of candidate `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn coded_row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.coded.row(index)
    }
}

/// Draw `count` distinct level assignments uniformly, seeded.
///
/// The factorial is far larger than `count` whenever this is reached, so
/// rejection sampling terminates quickly; a generous attempt bound guards the
/// degenerate case and the partial set is returned if it is ever hit.
fn sample_distinct(radices: &[usize], count: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut seen = HashSet::with_capacity(count);
    let mut rows = Vec::with_capacity(count);
    let max_attempts = count.saturating_mul(64);
    let mut attempts = 0;

    while rows.len() < count && attempts < max_attempts {
        attempts += 1;
        let row: Vec<usize> = radices.iter().map(|&r| rng.gen_range(0..r)).collect();
        if seen.insert(row.clone()) {
            rows.push(row);
        }
    }
    rows
}
