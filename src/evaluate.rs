//! Efficiency metrics: D-error and the sample-size (S-error) estimate.
//!
//! D-error is det(I)^(−1/p) for a p-coefficient information matrix I. A
//! singular matrix — a non-identifiable design — yields `f64::INFINITY`,
//! which is a sentinel value, not a failure: callers may retry with another
//! seed or relax the configuration.
//!
//! The S-error estimates the respondents needed for one target coefficient
//! to reach significance: (z / precision)² · [I⁻¹]ⱼⱼ divided by the tasks
//! each respondent answers, rounded up to the next whole respondent.

use ndarray::Array2;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::config::SampleSizeSettings;
use crate::linalg;

/// Determinants at or below this threshold are treated as singular.
const MIN_DETERMINANT: f64 = 1e-300;

/// D-error of an information matrix: det(I)^(−1/p).
///
/// Returns `f64::INFINITY` for an empty, singular, or numerically
/// indefinite matrix. Never negative, never NaN.
#[must_use]
pub fn d_error(information: &Array2<f64>) -> f64 {
    let p = information.nrows();
    if p == 0 {
        return f64::INFINITY;
    }
    let det = linalg::determinant(information);
    if !det.is_finite() || det < MIN_DETERMINANT {
        return f64::INFINITY;
    }
    det.powf(-1.0 / p as f64)
}

/// Two-sided critical value of the standard normal for a confidence level.
///
/// `critical_z(0.95)` is the familiar 1.96.
///
/// # Panics
///
/// Panics if `confidence` lies outside (0, 1); configuration validation
/// rejects such values before the pipeline runs.
#[must_use]
pub fn critical_z(confidence: f64) -> f64 {
    assert!(
        confidence > 0.0 && confidence < 1.0,
        "confidence must lie in (0, 1), got {confidence}"
    );
    let standard_normal = Normal::new(0.0, 1.0).expect("unit normal is well-formed");
    standard_normal.inverse_cdf(1.0 - (1.0 - confidence) / 2.0)
}

/// Sample-size estimate for one target coefficient.
///
/// `target` indexes the coefficient in the information matrix;
/// `prior_mean` is that coefficient's prior point value, used as the default
/// precision so the estimate reduces to the classic significance condition
/// |t| ≥ z. With a zero prior the default precision falls back to 1.0.
///
/// Returns `f64::INFINITY` when the information matrix is singular.
#[must_use]
pub fn s_error(
    information: &Array2<f64>,
    target: usize,
    prior_mean: f64,
    settings: &SampleSizeSettings,
    tasks_per_respondent: usize,
) -> f64 {
    let Some(inverse) = linalg::inverse(information) else {
        return f64::INFINITY;
    };
    let variance = inverse[[target, target]];
    if !variance.is_finite() || variance <= 0.0 {
        return f64::INFINITY;
    }

    let precision = settings.precision.unwrap_or_else(|| {
        if prior_mean.abs() > f64::EPSILON {
            prior_mean.abs()
        } else {
            1.0
        }
    });
    let z = critical_z(settings.confidence);
    let ratio = z / precision;

    let respondents = ratio * ratio * variance / tasks_per_respondent as f64;
    respondents.ceil().max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_d_error_identity() {
        let eye: Array2<f64> = Array2::eye(3);
        assert!((d_error(&eye) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_d_error_scales_inversely_with_information() {
        // Doubling the information halves the D-error.
        let info = array![[2.0, 0.0], [0.0, 8.0]];
        let doubled = &info * 2.0;
        let d1 = d_error(&info);
        let d2 = d_error(&doubled);
        assert!((d2 - d1 / 2.0).abs() < 1e-12);
        assert!(d1 > 0.0);
    }

    #[test]
    fn test_d_error_singular_is_infinite() {
        let info = array![[1.0, 1.0], [1.0, 1.0]];
        assert_eq!(d_error(&info), f64::INFINITY);

        let zero: Array2<f64> = Array2::zeros((2, 2));
        assert_eq!(d_error(&zero), f64::INFINITY);
    }

    #[test]
    fn test_d_error_empty_is_infinite() {
        let empty: Array2<f64> = Array2::zeros((0, 0));
        assert_eq!(d_error(&empty), f64::INFINITY);
    }

    #[test]
    fn test_critical_z_known_values() {
        assert!((critical_z(0.95) - 1.959_964).abs() < 1e-4);
        assert!((critical_z(0.90) - 1.644_854).abs() < 1e-4);
        assert!((critical_z(0.99) - 2.575_829).abs() < 1e-4);
    }

    #[test]
    fn test_s_error_hand_computed() {
        // Diagonal information: variance of coefficient 0 is 1/4.
        let info = array![[4.0, 0.0], [0.0, 1.0]];
        let settings = SampleSizeSettings {
            confidence: 0.95,
            target: None,
            precision: Some(0.5),
        };
        // (1.96 / 0.5)^2 * 0.25 / 2 tasks = 1.9208... -> ceil 2.
        let n = s_error(&info, 0, 0.5, &settings, 2);
        assert!((n - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_s_error_defaults_to_prior_precision() {
        let info = array![[1.0, 0.0], [0.0, 1.0]];
        let settings = SampleSizeSettings::default();
        // precision = |prior| = 0.7: (1.96 / 0.7)^2 / 1 task, ceiled.
        let n = s_error(&info, 0, 0.7, &settings, 1);
        let expected = (critical_z(0.95) / 0.7_f64).powi(2).ceil();
        assert!((n - expected).abs() < 1e-12);
    }

    #[test]
    fn test_s_error_zero_prior_falls_back() {
        let info = array![[1.0, 0.0], [0.0, 1.0]];
        let settings = SampleSizeSettings::default();
        let n = s_error(&info, 0, 0.0, &settings, 1);
        // precision 1.0: (1.96)^2 -> ceil 4.
        assert!((n - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_s_error_more_tasks_need_fewer_respondents() {
        let info = array![[0.5, 0.0], [0.0, 0.5]];
        let settings = SampleSizeSettings::default();
        let few = s_error(&info, 0, 1.0, &settings, 1);
        let many = s_error(&info, 0, 1.0, &settings, 8);
        assert!(many <= few);
        assert!(many >= 1.0);
    }

    #[test]
    fn test_s_error_singular_is_infinite() {
        let info = array![[1.0, 1.0], [1.0, 1.0]];
        let settings = SampleSizeSettings::default();
        assert_eq!(s_error(&info, 0, 1.0, &settings, 4), f64::INFINITY);
    }
}
