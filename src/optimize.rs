//! Fedorov-style row-exchange search.
//!
//! The optimizer holds a full design assignment (one candidate-pool index per
//! non-status-quo slot) and repeatedly scans every (slot, candidate) pair,
//! applying the single exchange that most reduces the D-error. The scan
//! repeats until no exchange improves the D-error, the pass cap is reached,
//! or cancellation is signalled. Reaching the cap is a normal terminal state;
//! cancellation returns the best design found so far.
//!
//! Only the information contribution of the affected task changes under an
//! exchange, so per-task contributions are cached and a trial evaluation
//! rebuilds a single task before taking the determinant.
//!
//! Everything random flows from the explicit seed: a fixed seed and config
//! reproduce the search exactly, swap for swap.

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::candidates::CandidatePool;
use crate::coding::Codebook;
use crate::config::TaskFormat;
use crate::design::Termination;
use crate::evaluate::d_error;
use crate::model::{task_information, ChoiceModel};

/// D-error decrease below which an exchange does not count as an improvement.
const IMPROVEMENT_TOL: f64 = 1e-12;

/// Fresh shuffles tried before settling for a rank-deficient start.
const SEED_ATTEMPTS: usize = 10;

/// Cooperative cancellation signal for a running search.
///
/// Clone the token, hand one clone to the pipeline, and call
/// [`CancelToken::cancel`] from anywhere; the optimizer checks it between
/// slot scans and stops with the best design found so far.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an unsignalled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.0.store(true, AtomicOrdering::Relaxed);
    }

    /// Whether cancellation has been signalled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(AtomicOrdering::Relaxed)
    }
}

/// One candidate exchange and its scores.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Exchange {
    pub slot: usize,
    pub candidate: usize,
    pub d_error: f64,
    pub balance: f64,
}

impl Exchange {
    /// Total order: D-error first, then level balance on exact ties (which
    /// symmetric designs produce routinely), then slot and candidate index.
    /// A total order keeps the sequential and parallel scans agreeing on the
    /// winner regardless of evaluation grouping.
    pub(crate) fn better_than(&self, other: &Self) -> bool {
        if self.d_error != other.d_error {
            return self.d_error < other.d_error;
        }
        if self.balance != other.balance {
            return self.balance < other.balance;
        }
        (self.slot, self.candidate) < (other.slot, other.candidate)
    }
}

/// Result of a completed search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Candidate-pool index per non-status-quo slot, task-major.
    pub assignment: Vec<usize>,
    /// Information matrix of the final design.
    pub information: Array2<f64>,
    /// D-error of the final design.
    pub d_error: f64,
    /// How the search ended.
    pub termination: Termination,
}

/// Row-exchange optimizer over a candidate pool.
pub struct Optimizer<'a> {
    pool: &'a CandidatePool,
    model: &'a ChoiceModel,
    task_format: TaskFormat,
    /// Coded status-quo row, present when the format has one.
    status_quo_row: Option<Vec<f64>>,
    /// Per-attribute level radices, for balance scoring.
    radices: Vec<usize>,
    columns: usize,
    max_passes: usize,
    seed: u64,
}

/// Mutable search state shared by the sequential and parallel scan paths.
pub(crate) struct SearchState {
    pub assignment: Vec<usize>,
    pub task_infos: Vec<Array2<f64>>,
    pub total_info: Array2<f64>,
    pub d_error: f64,
    /// Level usage count per attribute, non-status-quo rows only.
    pub level_counts: Vec<Vec<usize>>,
}

impl<'a> Optimizer<'a> {
    /// Create an optimizer for one request.
    #[must_use]
    pub fn new(
        pool: &'a CandidatePool,
        codebook: &Codebook,
        model: &'a ChoiceModel,
        task_format: TaskFormat,
        max_passes: usize,
        seed: u64,
    ) -> Self {
        let radices: Vec<usize> = codebook
            .attributes()
            .iter()
            .map(|a| a.levels.len())
            .collect();
        let status_quo_row = task_format.status_quo.then(|| {
            let reference = vec![0; radices.len()];
            codebook.code_row(&reference).to_vec()
        });

        Self {
            pool,
            model,
            task_format,
            status_quo_row,
            radices,
            columns: codebook.columns(),
            max_passes,
            seed,
        }
    }

    /// Number of exchangeable slots.
    pub(crate) fn slots(&self) -> usize {
        self.task_format.tasks * self.task_format.alternatives
    }

    /// Number of candidate rows in the pool.
    pub(crate) fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Run the search to a local optimum, the pass cap, or cancellation.
    #[must_use]
    pub fn run(&self, cancel: &CancelToken) -> SearchOutcome {
        self.search(cancel, Self::scan_sequential)
    }

    pub(crate) fn search(
        &self,
        cancel: &CancelToken,
        scan: impl Fn(&Self, &SearchState) -> Option<Exchange>,
    ) -> SearchOutcome {
        let mut state = self.seed_state();
        let mut passes = 0;

        let termination = loop {
            if cancel.is_cancelled() {
                break Termination::Cancelled { passes };
            }
            if passes >= self.max_passes {
                break Termination::IterationCapReached { passes };
            }

            let best = scan(self, &state);
            passes += 1;

            match best {
                Some(exchange) if exchange.d_error < state.d_error - IMPROVEMENT_TOL => {
                    self.apply(&mut state, exchange);
                }
                _ => break Termination::Converged { passes },
            }
        };

        SearchOutcome {
            assignment: state.assignment,
            information: state.total_info,
            d_error: state.d_error,
            termination,
        }
    }

    /// Build the seeded initial state: a shuffled pass over the pool, filled
    /// task-major. Consecutive slots take consecutive shuffled candidates,
    /// so no task repeats a row.
    ///
    /// A shuffled start is occasionally rank-deficient, and the exchange rule
    /// only accepts strict D-error improvements, so a handful of fresh
    /// shuffles is tried until one is identifiable. The RNG stream is
    /// sequential, keeping the whole procedure seed-deterministic.
    pub(crate) fn seed_state(&self) -> SearchState {
        let mut order: Vec<usize> = (0..self.pool.len()).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut first: Option<SearchState> = None;
        for _ in 0..SEED_ATTEMPTS {
            order.shuffle(&mut rng);
            let state = self.build_state(&order);
            if state.d_error.is_finite() {
                return state;
            }
            if first.is_none() {
                first = Some(state);
            }
        }
        first.expect("at least one seed attempt is made")
    }

    fn build_state(&self, order: &[usize]) -> SearchState {
        let assignment: Vec<usize> = (0..self.slots())
            .map(|slot| order[slot % order.len()])
            .collect();

        let task_infos: Vec<Array2<f64>> = (0..self.task_format.tasks)
            .map(|task| self.task_info(&assignment, task, None))
            .collect();
        let mut total_info = Array2::zeros((self.columns, self.columns));
        for info in &task_infos {
            total_info += info;
        }
        let d = d_error(&total_info);

        let mut level_counts: Vec<Vec<usize>> =
            self.radices.iter().map(|&r| vec![0; r]).collect();
        for &candidate in &assignment {
            for (attr, &level) in self.pool.levels(candidate).iter().enumerate() {
                level_counts[attr][level] += 1;
            }
        }

        SearchState {
            assignment,
            task_infos,
            total_info,
            d_error: d,
            level_counts,
        }
    }

    /// Information contribution of one task, optionally overriding one slot
    /// with a trial candidate.
    fn task_info(
        &self,
        assignment: &[usize],
        task: usize,
        replace: Option<(usize, usize)>,
    ) -> Array2<f64> {
        let alternatives = self.task_format.alternatives;
        let total = self.task_format.alternatives_total();
        let mut x = Array2::zeros((total, self.columns));

        for alt in 0..alternatives {
            let slot = task * alternatives + alt;
            let candidate = match replace {
                Some((s, c)) if s == slot => c,
                _ => assignment[slot],
            };
            x.row_mut(alt).assign(&self.pool.coded_row(candidate));
        }
        if let Some(sq) = &self.status_quo_row {
            for (col, &value) in sq.iter().enumerate() {
                x[[alternatives, col]] = value;
            }
        }

        let probabilities = self.model.task_probabilities(x.view());
        task_information(x.view(), probabilities.view())
    }

    /// Score one trial exchange, or `None` if it would duplicate a row
    /// within its task.
    pub(crate) fn score_exchange(
        &self,
        state: &SearchState,
        slot: usize,
        candidate: usize,
    ) -> Option<Exchange> {
        let alternatives = self.task_format.alternatives;
        let task = slot / alternatives;

        // The same profile twice in one task is a dominated, wasted row.
        let task_slots = task * alternatives..(task + 1) * alternatives;
        if task_slots.clone().any(|s| state.assignment[s] == candidate) {
            return None;
        }

        let trial_task = self.task_info(&state.assignment, task, Some((slot, candidate)));
        let trial_info = &state.total_info - &state.task_infos[task] + &trial_task;
        let trial_d = d_error(&trial_info);

        let balance = self.balance_after(state, state.assignment[slot], candidate);

        Some(Exchange {
            slot,
            candidate,
            d_error: trial_d,
            balance,
        })
    }

    /// Sum of squared deviations from uniform level usage after swapping
    /// `out` for `in_` in one slot.
    fn balance_after(&self, state: &SearchState, out: usize, in_: usize) -> f64 {
        let varied = self.slots() as f64;
        let out_levels = self.pool.levels(out);
        let in_levels = self.pool.levels(in_);

        let mut score = 0.0;
        for (attr, &radix) in self.radices.iter().enumerate() {
            let target = varied / radix as f64;
            for level in 0..radix {
                let mut count = state.level_counts[attr][level] as f64;
                if out_levels[attr] == level {
                    count -= 1.0;
                }
                if in_levels[attr] == level {
                    count += 1.0;
                }
                score += (count - target) * (count - target);
            }
        }
        score
    }

    /// Scan every (slot, candidate) pair sequentially.
    fn scan_sequential(&self, state: &SearchState) -> Option<Exchange> {
        let mut best: Option<Exchange> = None;
        for slot in 0..self.slots() {
            for candidate in 0..self.pool.len() {
                if let Some(exchange) = self.score_exchange(state, slot, candidate) {
                    if best.as_ref().map_or(true, |b| exchange.better_than(b)) {
                        best = Some(exchange);
                    }
                }
            }
        }
        best
    }

    /// Apply an accepted exchange, updating the cached contributions.
    fn apply(&self, state: &mut SearchState, exchange: Exchange) {
        let alternatives = self.task_format.alternatives;
        let task = exchange.slot / alternatives;
        let out = state.assignment[exchange.slot];

        for (attr, (&old, &new)) in self
            .pool
            .levels(out)
            .iter()
            .zip(self.pool.levels(exchange.candidate))
            .enumerate()
        {
            state.level_counts[attr][old] -= 1;
            state.level_counts[attr][new] += 1;
        }

        state.assignment[exchange.slot] = exchange.candidate;
        let new_task = self.task_info(&state.assignment, task, None);
        state.total_info = &state.total_info - &state.task_infos[task] + &new_task;
        state.task_infos[task] = new_task;
        state.d_error = d_error(&state.total_info);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coding::Codebook;
    use crate::config::{
        Attribute, CodingScheme, DrawSettings, ModelSpec, ModelType, Parameter, Prior,
    };

    struct Fixture {
        codebook: Codebook,
        pool: CandidatePool,
        model: ChoiceModel,
        task_format: TaskFormat,
    }

    fn fixture(task_format: TaskFormat, seed: u64) -> Fixture {
        let attrs = vec![
            Attribute::new("price", &["low", "mid", "high"]),
            Attribute::new("brand", &["a", "b", "c"]),
        ];
        let spec = ModelSpec::new(
            ModelType::Mnl,
            vec![
                Parameter::new("price", Prior::Fixed(0.0)),
                Parameter::new("brand", Prior::Fixed(0.0)),
            ],
        );
        let codebook = Codebook::new(&attrs, &spec, CodingScheme::Dummy).unwrap();
        let pool = CandidatePool::new(&codebook, &task_format, 10_000, seed).unwrap();
        let model = ChoiceModel::new(
            &codebook,
            ModelType::Mnl,
            DrawSettings::default(),
            task_format.status_quo,
            seed,
        );
        Fixture {
            codebook,
            pool,
            model,
            task_format,
        }
    }

    fn run_fixture(f: &Fixture, max_passes: usize, seed: u64) -> SearchOutcome {
        Optimizer::new(&f.pool, &f.codebook, &f.model, f.task_format, max_passes, seed)
            .run(&CancelToken::new())
    }

    #[test]
    fn test_search_reaches_finite_d_error() {
        let f = fixture(TaskFormat::new(2, 4, false), 17);
        let outcome = run_fixture(&f, 100, 17);

        assert!(outcome.d_error.is_finite());
        assert_eq!(outcome.assignment.len(), 8);
        assert!(matches!(
            outcome.termination,
            Termination::Converged { .. } | Termination::IterationCapReached { .. }
        ));
    }

    #[test]
    fn test_search_is_deterministic() {
        let f = fixture(TaskFormat::new(2, 4, false), 99);
        let a = run_fixture(&f, 100, 99);
        let b = run_fixture(&f, 100, 99);

        assert_eq!(a.assignment, b.assignment);
        assert!((a.d_error - b.d_error).abs() < 1e-15);
        assert_eq!(a.termination, b.termination);
    }

    #[test]
    fn test_search_never_worsens_the_seed() {
        let f = fixture(TaskFormat::new(2, 6, false), 3);
        let optimizer =
            Optimizer::new(&f.pool, &f.codebook, &f.model, f.task_format, 100, 3);
        let seed_d = optimizer.seed_state().d_error;
        let outcome = optimizer.run(&CancelToken::new());

        assert!(outcome.d_error <= seed_d);
    }

    #[test]
    fn test_cancelled_before_start_returns_seed_design() {
        let f = fixture(TaskFormat::new(2, 4, false), 5);
        let optimizer =
            Optimizer::new(&f.pool, &f.codebook, &f.model, f.task_format, 100, 5);
        let seed_d = optimizer.seed_state().d_error;

        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = optimizer.run(&cancel);

        assert_eq!(outcome.termination, Termination::Cancelled { passes: 0 });
        assert_eq!(outcome.assignment.len(), 8);
        assert!(outcome.d_error <= seed_d);
    }

    #[test]
    fn test_pass_cap_is_honored() {
        let f = fixture(TaskFormat::new(2, 4, false), 23);
        let outcome = run_fixture(&f, 1, 23);
        assert!(outcome.termination.passes() <= 1);
    }

    #[test]
    fn test_no_duplicate_rows_within_tasks() {
        let f = fixture(TaskFormat::new(3, 5, false), 41);
        let outcome = run_fixture(&f, 100, 41);

        let alternatives = f.task_format.alternatives;
        for task in 0..f.task_format.tasks {
            let slice = &outcome.assignment[task * alternatives..(task + 1) * alternatives];
            let mut sorted = slice.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), alternatives, "task {task} repeats a row");
        }
    }

    #[test]
    fn test_status_quo_slots_are_not_exchanged() {
        let f = fixture(TaskFormat::new(2, 4, true), 7);
        let outcome = run_fixture(&f, 100, 7);

        // Only the varied slots appear in the assignment; the status-quo row
        // is appended per task during evaluation and never exchanged.
        assert_eq!(outcome.assignment.len(), 8);
        assert!(outcome.d_error.is_finite());
    }

    #[test]
    fn test_exchange_ordering() {
        let a = Exchange {
            slot: 0,
            candidate: 1,
            d_error: 1.0,
            balance: 5.0,
        };
        let b = Exchange {
            slot: 0,
            candidate: 2,
            d_error: 1.0,
            balance: 2.0,
        };
        let c = Exchange {
            slot: 1,
            candidate: 0,
            d_error: 0.5,
            balance: 9.0,
        };

        // Lower D-error wins outright; ties fall back to balance.
        assert!(c.better_than(&a) && c.better_than(&b));
        assert!(b.better_than(&a));
        assert!(!a.better_than(&b));
    }
}
