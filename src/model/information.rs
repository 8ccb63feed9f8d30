//! Fisher information accumulation.
//!
//! For one task with coded matrix X (alternatives × coefficients) and choice
//! probabilities p, the multinomial-logit information contribution is
//! Xᵗ(diag(p) − ppᵗ)X. The design's information matrix is the sum of those
//! contributions across tasks, evaluated at the priors.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use super::ChoiceModel;

/// Information contribution of a single task.
///
/// Computed as Σⱼ pⱼ xⱼxⱼᵗ − x̄x̄ᵗ with x̄ = Σⱼ pⱼ xⱼ, which is the same
/// quantity as Xᵗ(diag(p) − ppᵗ)X without materializing the J×J middle
/// factor.
///
/// # Panics
///
/// Panics if `probabilities` does not hold one entry per row of `x`.
#[must_use]
pub fn task_information(x: ArrayView2<'_, f64>, probabilities: ArrayView1<'_, f64>) -> Array2<f64> {
    assert_eq!(
        x.nrows(),
        probabilities.len(),
        "probability vector length {} must match alternative count {}",
        probabilities.len(),
        x.nrows()
    );

    let p = x.ncols();
    let mut info = Array2::zeros((p, p));
    let mut weighted_mean: Array1<f64> = Array1::zeros(p);

    for (row, &prob) in x.rows().into_iter().zip(probabilities) {
        for a in 0..p {
            let ra = row[a] * prob;
            weighted_mean[a] += ra;
            for b in a..p {
                info[[a, b]] += ra * row[b];
            }
        }
    }

    for a in 0..p {
        for b in a..p {
            let value = info[[a, b]] - weighted_mean[a] * weighted_mean[b];
            info[[a, b]] = value;
            info[[b, a]] = value;
        }
    }

    info
}

/// Information matrix of a whole design: the sum of per-task contributions,
/// with probabilities supplied by the choice model at the priors.
///
/// `tasks` holds one coded matrix per task (status-quo row included when the
/// format has one).
#[must_use]
pub fn design_information(tasks: &[Array2<f64>], model: &ChoiceModel) -> Array2<f64> {
    let p = tasks.first().map_or(0, |x| x.ncols());
    let mut info = Array2::zeros((p, p));
    for x in tasks {
        let probabilities = model.task_probabilities(x.view());
        info += &task_information(x.view(), probabilities.view());
    }
    info
}
