//! Utility and information model.
//!
//! This module scores a fully assigned design under the configured choice
//! model:
//!
//! - [`ChoiceModel`] holds the realized coefficient vectors — a single prior
//!   vector for multinomial logit, or one vector per draw for the simulated
//!   models — together with any error-component shocks.
//! - [`logit`] computes per-task choice probabilities (softmax in double
//!   precision, probabilities clamped at 1e-12).
//! - [`information`] accumulates the Fisher information matrix per task as
//!   Xᵗ(diag(p) − ppᵗ)X and sums across tasks.
//!
//! Draws are generated once per request from the explicit seed, so scoring
//! the same design twice gives bit-identical results.

pub mod draws;
pub mod information;
pub mod logit;

pub use information::{design_information, task_information};
pub use logit::PROB_EPSILON;

use ndarray::{Array1, Array2, ArrayView2};

use crate::coding::Codebook;
use crate::config::{DrawSettings, ModelType};

/// A choice model evaluated at the analyst's priors.
///
/// For MNL this is a single coefficient vector. For mixed and
/// error-component logit it is a fixed set of coefficient vectors realized
/// from the priors' distributions, plus (for the error-component model) one
/// standard-normal shock per draw shared by all non-status-quo alternatives.
#[derive(Debug, Clone)]
pub struct ChoiceModel {
    model: ModelType,
    /// Realized coefficient vectors, one row per draw (a single row for MNL).
    betas: Array2<f64>,
    /// Error-component shocks, one per draw; empty unless the model is ECL.
    ec_shocks: Array1<f64>,
    /// Whether the last alternative of every task is a fixed status quo.
    status_quo: bool,
}

impl ChoiceModel {
    /// Build the model for one request.
    ///
    /// `seed` drives draw generation for the simulated model types; MNL uses
    /// no randomness.
    #[must_use]
    pub fn new(
        codebook: &Codebook,
        model: ModelType,
        settings: DrawSettings,
        status_quo: bool,
        seed: u64,
    ) -> Self {
        let means = codebook.prior_means();
        let columns = codebook.columns();

        if !model.is_simulated() {
            let mut betas = Array2::zeros((1, columns));
            betas.row_mut(0).assign(&means);
            return Self {
                model,
                betas,
                ec_shocks: Array1::zeros(0),
                status_quo,
            };
        }

        let random: Vec<usize> = codebook
            .coefficients()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.prior.is_random())
            .map(|(i, _)| i)
            .collect();

        // One Halton/pseudo-random dimension per random coefficient, plus one
        // for the error component.
        let ec_dimension = usize::from(matches!(model, ModelType::ErrorComponent));
        let dimensions = random.len() + ec_dimension;
        let normals = draws::standard_normal_draws(dimensions, settings, seed);
        let count = settings.count;

        let mut betas = Array2::zeros((count, columns));
        for r in 0..count {
            betas.row_mut(r).assign(&means);
            for (d, &coef) in random.iter().enumerate() {
                let prior = codebook.coefficients()[coef].prior;
                betas[[r, coef]] = prior.realize(normals[[r, d]]);
            }
        }

        let ec_shocks = if ec_dimension == 1 {
            normals.column(dimensions - 1).to_owned()
        } else {
            Array1::zeros(0)
        };

        Self {
            model,
            betas,
            ec_shocks,
            status_quo,
        }
    }

    /// The model family.
    #[must_use]
    pub fn model(&self) -> ModelType {
        self.model
    }

    /// Number of draws (1 for MNL).
    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.betas.nrows()
    }

    /// Choice probabilities for one task.
    ///
    /// `x` is the task's coded matrix, one row per alternative (status-quo
    /// row last when present). For simulated models the result is the
    /// average of the per-draw MNL probabilities.
    #[must_use]
    pub fn task_probabilities(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        let alternatives = x.nrows();
        let mut average = Array1::zeros(alternatives);

        for r in 0..self.draw_count() {
            let mut utilities = x.dot(&self.betas.row(r));
            if self.model == ModelType::ErrorComponent && !self.ec_shocks.is_empty() {
                // One shared shock across the designed alternatives induces
                // correlation against the status-quo row, which receives none.
                let shock = self.ec_shocks[r];
                let designed = if self.status_quo {
                    alternatives.saturating_sub(1)
                } else {
                    alternatives
                };
                for j in 0..designed {
                    utilities[j] += shock;
                }
            }
            average += &logit::softmax(&utilities);
        }

        average / self.draw_count() as f64
    }
}
