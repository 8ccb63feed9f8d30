//! The generation pipeline.
//!
//! One synchronous pass per request: validate the configuration, code the
//! attributes, materialize the candidate pool, optimize the design, evaluate
//! efficiency, and render estimation syntax. All state is request-scoped
//! value data; the pipeline performs no file or network I/O and caches
//! nothing across requests, so a fixed seed and configuration reproduce the
//! result exactly.
//!
//! Cancellation is cooperative: pass a [`CancelToken`] to
//! [`generate_with_cancel`] and the optimizer returns the best design found
//! so far, flagged in the result rather than reported as an error.

use std::fmt::Write as _;

use crate::candidates::CandidatePool;
use crate::coding::Codebook;
use crate::config::DesignConfig;
use crate::design::{CandidateRow, Design, DesignResult, Termination};
use crate::error::{Error, Result};
use crate::evaluate;
use crate::model::ChoiceModel;
use crate::optimize::{CancelToken, Optimizer, SearchOutcome};
use crate::syntax;

/// Generate an optimized design for the given configuration.
///
/// # Errors
///
/// Returns a configuration error for invalid input, or a capacity error when
/// the task format asks for more alternatives than distinct candidate rows
/// exist. A singular final design is not an error: it is reported through an
/// infinite D-error.
///
/// # Example
///
/// ```
/// use dcegen::prelude::*;
///
/// let config = DesignBuilder::new()
///     .attribute("price", &["low", "mid", "high"])
///     .attribute("brand", &["a", "b", "c"])
///     .alternatives(2)
///     .tasks(4)
///     .seed(42)
///     .build()
///     .unwrap();
///
/// let result = generate(&config).unwrap();
/// assert_eq!(result.design.row_count(), 8);
/// assert!(result.d_error.is_finite());
/// ```
pub fn generate(config: &DesignConfig) -> Result<DesignResult> {
    generate_with_cancel(config, &CancelToken::new())
}

/// Generate an optimized design, honoring a cancellation token.
///
/// On cancellation the best design found so far is returned with
/// [`Termination::Cancelled`]; no error is raised.
///
/// # Errors
///
/// Same as [`generate`].
pub fn generate_with_cancel(
    config: &DesignConfig,
    cancel: &CancelToken,
) -> Result<DesignResult> {
    run_with(config, cancel, |optimizer, cancel| optimizer.run(cancel))
}

/// Shared pipeline body; the runner decides how the optimizer executes.
pub(crate) fn run_with(
    config: &DesignConfig,
    cancel: &CancelToken,
    runner: impl Fn(&Optimizer<'_>, &CancelToken) -> SearchOutcome,
) -> Result<DesignResult> {
    config.validate()?;

    let codebook = Codebook::new(&config.attributes, &config.model, config.coding)?;
    let pool = CandidatePool::new(
        &codebook,
        &config.task_format,
        config.candidate_cap,
        config.seed,
    )?;

    // Resolve the sample-size target before the (potentially long) search,
    // so a bad target name fails fast.
    let target = match &config.sample_size.target {
        Some(name) => codebook
            .coefficient_index(name)
            .ok_or_else(|| Error::UnknownTarget { name: name.clone() })?,
        None => 0,
    };

    let model = ChoiceModel::new(
        &codebook,
        config.model.model,
        config.draws,
        config.task_format.status_quo,
        config.seed,
    );
    let optimizer = Optimizer::new(
        &pool,
        &codebook,
        &model,
        config.task_format,
        config.max_passes,
        config.seed,
    );
    let outcome = runner(&optimizer, cancel);

    let design = assemble_design(config, &pool, &outcome.assignment);
    let prior_mean = codebook.coefficients()[target].prior.point();
    let s_error = evaluate::s_error(
        &outcome.information,
        target,
        prior_mean,
        &config.sample_size,
        config.task_format.tasks,
    );
    let explanation = explain(config, &codebook, &pool, &outcome, s_error);

    Ok(DesignResult {
        design,
        d_error: outcome.d_error,
        s_error,
        syntax: syntax::emit(config),
        explanation,
        termination: outcome.termination,
    })
}

/// Turn the optimizer's assignment into design rows, appending the fixed
/// status-quo row per task when the format has one.
fn assemble_design(
    config: &DesignConfig,
    pool: &CandidatePool,
    assignment: &[usize],
) -> Design {
    let task_format = config.task_format;
    let alternatives = task_format.alternatives;
    let mut rows = Vec::with_capacity(task_format.row_count());

    for task in 0..task_format.tasks {
        for alt in 0..alternatives {
            let candidate = assignment[task * alternatives + alt];
            rows.push(CandidateRow {
                task,
                alternative: alt,
                levels: pool.levels(candidate).to_vec(),
                status_quo: false,
            });
        }
        if task_format.status_quo {
            rows.push(CandidateRow {
                task,
                alternative: alternatives,
                levels: vec![0; config.attributes.len()],
                status_quo: true,
            });
        }
    }

    Design::new(config.attributes.clone(), task_format, rows)
}

/// Human-readable summary of the run.
fn explain(
    config: &DesignConfig,
    codebook: &Codebook,
    pool: &CandidatePool,
    outcome: &SearchOutcome,
    s_error: f64,
) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "Row-exchange search over {} candidate row(s) produced a {} design \
         ({}; {} coefficient(s)).",
        pool.len(),
        config.task_format,
        config.model.model,
        codebook.columns(),
    );
    if pool.is_capped() {
        let _ = write!(
            out,
            " The full factorial of {} rows was subsampled to the candidate cap.",
            pool.total_factorial()
        );
    }

    match outcome.termination {
        Termination::Converged { passes } => {
            let _ = write!(
                out,
                " The search converged after {passes} pass(es): no single-row \
                 exchange improves the D-error further."
            );
        }
        Termination::IterationCapReached { passes } => {
            let _ = write!(
                out,
                " The search stopped at the {passes}-pass cap while improvements \
                 were still being found; treat the design as a lower-confidence \
                 local optimum."
            );
        }
        Termination::Cancelled { passes } => {
            let _ = write!(
                out,
                " The search was cancelled after {passes} pass(es); this is the \
                 best design found up to that point."
            );
        }
    }

    if outcome.d_error.is_finite() {
        let _ = write!(out, " Final D-error: {:.4e}.", outcome.d_error);
    } else {
        let _ = write!(
            out,
            " The information matrix is singular (some coefficient has no \
             variation), so the D-error is infinite; retry with a different \
             seed or more tasks."
        );
    }
    if s_error.is_finite() {
        let _ = write!(
            out,
            " Estimated sample size for the target coefficient: {s_error:.0} \
             respondent(s)."
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DesignBuilder;
    use crate::config::{ModelType, Prior, SampleSizeSettings};

    fn base_config(tasks: usize, status_quo: bool) -> DesignConfig {
        DesignBuilder::new()
            .attribute("price", &["low", "mid", "high"])
            .attribute("brand", &["a", "b", "c"])
            .alternatives(2)
            .tasks(tasks)
            .status_quo(status_quo)
            .seed(42)
            .build()
            .unwrap()
    }

    #[test]
    fn test_row_count_invariant() {
        let result = generate(&base_config(4, false)).unwrap();
        assert_eq!(result.design.row_count(), 8);

        let result = generate(&base_config(4, true)).unwrap();
        assert_eq!(result.design.row_count(), 12);
        let status_quo_rows = result
            .design
            .rows()
            .iter()
            .filter(|r| r.status_quo)
            .count();
        assert_eq!(status_quo_rows, 4);
    }

    #[test]
    fn test_determinism_under_fixed_seed() {
        let config = base_config(4, false);
        let a = generate(&config).unwrap();
        let b = generate(&config).unwrap();

        assert_eq!(a.design, b.design);
        assert!((a.d_error - b.d_error).abs() < 1e-15);
        assert!((a.s_error - b.s_error).abs() < 1e-15);
        assert_eq!(a.termination, b.termination);
    }

    #[test]
    fn test_zero_prior_scenario_uses_every_level() {
        // 2 attributes x 3 levels, 2 alternatives, 4 tasks, MNL, zero priors:
        // 8 generated rows must exercise all 3 levels of each attribute,
        // otherwise the information matrix could not be invertible.
        let result = generate(&base_config(4, false)).unwrap();
        assert!(result.d_error.is_finite());

        for counts in result.design.level_counts() {
            assert_eq!(counts.len(), 3);
            for count in counts {
                assert!(count >= 1, "a level went unused");
            }
        }
    }

    #[test]
    fn test_no_duplicate_alternatives_within_tasks() {
        let result = generate(&base_config(6, false)).unwrap();
        assert!(!result.design.has_duplicate_alternatives());
    }

    #[test]
    fn test_capacity_error_scenario() {
        // 2 x 2 levels yield 4 distinct rows; 5 alternatives cannot fit.
        let result = DesignBuilder::new()
            .attribute("a", &["0", "1"])
            .attribute("b", &["0", "1"])
            .alternatives(5)
            .tasks(4)
            .build_and_generate();
        assert_eq!(
            result.err(),
            Some(Error::CapacityExceeded {
                requested: 5,
                available: 4,
            })
        );
    }

    #[test]
    fn test_more_tasks_never_increase_d_error() {
        let small = generate(&base_config(4, false)).unwrap();
        let large = generate(&base_config(8, false)).unwrap();
        assert!(large.d_error <= small.d_error + 1e-9);
    }

    #[test]
    fn test_cancellation_returns_valid_partial_result() {
        let config = base_config(4, false);
        let cancel = CancelToken::new();
        cancel.cancel();

        let cancelled = generate_with_cancel(&config, &cancel).unwrap();
        assert_eq!(cancelled.design.row_count(), 8);
        assert_eq!(cancelled.termination, Termination::Cancelled { passes: 0 });

        // The finished search can only improve on the cancelled snapshot.
        let finished = generate(&config).unwrap();
        assert!(finished.d_error <= cancelled.d_error);
        assert!(cancelled.explanation.contains("cancelled"));
    }

    #[test]
    fn test_csv_round_trip() {
        let result = generate(&base_config(4, true)).unwrap();
        let csv = result.design.to_csv();

        let mut lines = csv.lines();
        let header: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(
            header,
            vec!["RespondentID", "Task", "Alternative", "price", "brand", "Choice"]
        );
        assert_eq!(lines.count(), result.design.row_count());
    }

    #[test]
    fn test_unknown_sample_size_target() {
        let mut config = base_config(4, false);
        config.sample_size = SampleSizeSettings {
            target: Some("nonexistent".to_string()),
            ..SampleSizeSettings::default()
        };
        assert_eq!(
            generate(&config).err(),
            Some(Error::UnknownTarget {
                name: "nonexistent".to_string(),
            })
        );
    }

    #[test]
    fn test_named_sample_size_target() {
        let mut config = base_config(4, false);
        config.sample_size.target = Some("brand_b".to_string());
        let result = generate(&config).unwrap();
        assert!(result.s_error >= 1.0);
    }

    #[test]
    fn test_mixed_logit_pipeline() {
        let config = DesignBuilder::new()
            .attribute("price", &["low", "mid", "high"])
            .attribute("brand", &["a", "b"])
            .alternatives(2)
            .tasks(6)
            .model(ModelType::MixedLogit)
            .prior(
                "price",
                Prior::Normal {
                    mean: -0.5,
                    std_dev: 0.25,
                },
            )
            .draw_count(100)
            .seed(7)
            .build()
            .unwrap();

        let result = generate(&config).unwrap();
        assert!(result.d_error.is_finite());
        assert!(result.s_error >= 1.0);
        assert!(result.syntax.r.contains("rpar"));
    }

    #[test]
    fn test_explanation_mentions_model_and_outcome() {
        let result = generate(&base_config(4, false)).unwrap();
        assert!(result.explanation.contains("Multinomial Logit"));
        assert!(
            result.explanation.contains("converged")
                || result.explanation.contains("cap")
        );
    }
}
