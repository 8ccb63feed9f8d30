//! Multinomial-logit probability kernel.

use ndarray::Array1;

/// Floor applied to every choice probability.
///
/// Softmax underflow would otherwise produce exact zeros, which make the
/// information matrix singular for reasons that are numeric, not structural.
pub const PROB_EPSILON: f64 = 1e-12;

/// Softmax over one task's utilities, clamped to [`PROB_EPSILON`] and
/// renormalized.
///
/// The maximum utility is subtracted before exponentiation, so arbitrarily
/// large utilities do not overflow.
#[must_use]
pub fn softmax(utilities: &Array1<f64>) -> Array1<f64> {
    let max = utilities.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut exp: Array1<f64> = utilities.mapv(|u| (u - max).exp());
    let sum = exp.sum();
    exp.mapv_inplace(|e| (e / sum).max(PROB_EPSILON));
    let clamped_sum = exp.sum();
    exp / clamped_sum
}
